// Per-session mutable state for the match lifecycle.

use std::collections::HashSet;
use tokio::time::Instant;

use super::format::GameMode;

/// A loading-screen summary held back until live telemetry can enrich it
/// with rune/spell detail lines.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTeams {
    pub my_team: String,
    pub enemy_team: String,
    pub mode_label: String,
    pub game_id: Option<i64>,
}

/// Everything the lifecycle tracks between polls: the last seen phase and
/// mode, dedup fingerprints, the local player identity, and the buffered
/// loading summary.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub phase: String,
    pub mode: GameMode,
    pub my_team_ids: HashSet<i64>,
    pub my_team_names: HashSet<String>,
    pub champ_select_key: String,
    pub loading_key: String,
    pub pickable_key: String,
    pub aram_pickable_printed: bool,
    pub live_ready: bool,
    pub pending_teams: Option<PendingTeams>,
    pub last_detail_emit: Option<Instant>,
    pub local_summoner_id: Option<i64>,
}

impl MatchState {
    pub fn new() -> Self {
        MatchState {
            phase: String::new(),
            mode: GameMode::Unknown,
            my_team_ids: HashSet::new(),
            my_team_names: HashSet::new(),
            champ_select_key: String::new(),
            loading_key: String::new(),
            pickable_key: String::new(),
            aram_pickable_printed: false,
            live_ready: false,
            pending_teams: None,
            last_detail_emit: None,
            local_summoner_id: None,
        }
    }

    /// Clear everything tied to a single match. The current phase and the
    /// local summoner identity survive; the mode does not, so the next
    /// session poll re-announces it.
    pub fn reset_match(&mut self) {
        *self = MatchState {
            phase: std::mem::take(&mut self.phase),
            local_summoner_id: self.local_summoner_id,
            ..MatchState::new()
        };
    }
}

impl Default for MatchState {
    fn default() -> Self {
        MatchState::new()
    }
}
