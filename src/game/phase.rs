// Gameflow phase transitions.
//
// The phase string drives everything else: it decides which handler runs on
// a tick and when per-match state is discarded. Transitions are edge
// triggered, so a phase that holds across polls emits nothing.

use tracing::info;

use super::state::MatchState;
use crate::protocol::{EventSink, GameEvent};

pub const CHAMP_SELECT: &str = "ChampSelect";
pub const GAME_START: &str = "GameStart";
pub const IN_PROGRESS: &str = "InProgress";

/// Phases during which a match is being set up or played.
pub fn is_active(phase: &str) -> bool {
    matches!(phase, CHAMP_SELECT | GAME_START | IN_PROGRESS)
}

/// Record a freshly polled (already normalized) phase. Emits `phaseChanged`
/// on transition and resets per-match state when the match is over or a new
/// champ select begins.
pub async fn observe_phase(state: &mut MatchState, phase: &str, sink: &EventSink) {
    if phase == state.phase {
        return;
    }

    let previous = std::mem::replace(&mut state.phase, phase.to_string());
    info!("phase changed: {previous:?} -> {phase:?}");
    sink.emit(GameEvent::PhaseChanged {
        phase: phase.to_string(),
    })
    .await;

    // Leaving champ select invalidates the pickable fingerprint either way,
    // even when the rest of the match state carries over into loading.
    if phase != CHAMP_SELECT {
        state.pickable_key.clear();
        state.aram_pickable_printed = false;
    }
    if !is_active(phase) || (phase == CHAMP_SELECT && previous != CHAMP_SELECT) {
        state.reset_match();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Envelope;
    use tokio::sync::mpsc;

    fn test_sink() -> (EventSink, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(32);
        (EventSink::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::Receiver<Envelope>) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            events.push(envelope.event);
        }
        events
    }

    #[tokio::test]
    async fn emits_once_per_transition() {
        let (sink, mut rx) = test_sink();
        let mut state = MatchState::new();

        observe_phase(&mut state, "Lobby", &sink).await;
        observe_phase(&mut state, "Lobby", &sink).await;
        observe_phase(&mut state, "ChampSelect", &sink).await;
        observe_phase(&mut state, "ChampSelect", &sink).await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                GameEvent::PhaseChanged {
                    phase: "Lobby".into()
                },
                GameEvent::PhaseChanged {
                    phase: "ChampSelect".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn leaving_active_phases_resets_match_state() {
        let (sink, mut rx) = test_sink();
        let mut state = MatchState::new();
        observe_phase(&mut state, "InProgress", &sink).await;
        state.loading_key = "my=1|enemy=2".into();
        state.my_team_ids.insert(5);

        observe_phase(&mut state, "EndOfGame", &sink).await;

        assert!(state.loading_key.is_empty());
        assert!(state.my_team_ids.is_empty());
        assert_eq!(state.phase, "EndOfGame");
        drain(&mut rx);
    }

    #[tokio::test]
    async fn game_start_keeps_champ_select_state() {
        let (sink, _rx) = test_sink();
        let mut state = MatchState::new();
        observe_phase(&mut state, "ChampSelect", &sink).await;
        state.my_team_ids.insert(5);
        state.pickable_key = "1,2".into();
        state.aram_pickable_printed = true;

        observe_phase(&mut state, "GameStart", &sink).await;

        // Roster knowledge survives into loading; the pickable fingerprint
        // does not.
        assert!(state.my_team_ids.contains(&5));
        assert!(state.pickable_key.is_empty());
        assert!(!state.aram_pickable_printed);
    }

    #[tokio::test]
    async fn fresh_champ_select_entry_resets() {
        let (sink, _rx) = test_sink();
        let mut state = MatchState::new();
        observe_phase(&mut state, "Lobby", &sink).await;
        state.loading_key = "stale".into();

        observe_phase(&mut state, "ChampSelect", &sink).await;

        assert!(state.loading_key.is_empty());
        assert_eq!(state.phase, "ChampSelect");
    }
}
