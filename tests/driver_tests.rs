// Integration tests for the companion driver.
//
// These tests exercise the full driver loop end-to-end through the library
// crate's public API: credential discovery, reference loading, phase-driven
// event synthesis, dedup across polls, command handling, and teardown plus
// reconnect after a hard API failure. The client is replaced by a scripted
// gateway that serves one prepared snapshot per poll and repeats the last
// one once the script runs out.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use lcu_companion::config::Config;
use lcu_companion::ddragon::{ChampionRecord, ReferenceSource};
use lcu_companion::game::driver;
use lcu_companion::lcu::client::{Gateway, LcuError};
use lcu_companion::lcu::credentials::{CredentialProvider, LcuCreds};
use lcu_companion::lcu::types::{
    ActivePlayer, ChampSelectSession, CurrentSummoner, GameData, GameflowQueue, GameflowSession,
    LiveAllGameData, LivePlayer, LocalPlayer, PickableChampion, TeamMember,
};
use lcu_companion::protocol::{Command, Envelope, EventSink, GameEvent};

// ===========================================================================
// Test doubles
// ===========================================================================

/// Everything the gateway serves for one poll interval.
#[derive(Clone, Default)]
struct Tick {
    /// Respond to the phase poll with a hard failure instead.
    fail: bool,
    phase: String,
    session: Option<GameflowSession>,
    pickable: Option<Vec<i64>>,
    live: Option<LiveAllGameData>,
}

impl Tick {
    fn phase(phase: &str) -> Self {
        Tick {
            phase: phase.into(),
            ..Default::default()
        }
    }

    fn failure() -> Self {
        Tick {
            fail: true,
            ..Default::default()
        }
    }

    fn with_session(mut self, session: GameflowSession) -> Self {
        self.session = Some(session);
        self
    }

    fn with_pickable(mut self, ids: Vec<i64>) -> Self {
        self.pickable = Some(ids);
        self
    }

    fn with_live(mut self, live: LiveAllGameData) -> Self {
        self.live = Some(live);
        self
    }
}

/// Serves scripted ticks. The phase poll starts each driver tick, so it
/// advances the script; every other endpoint answers from the current tick.
#[derive(Clone)]
struct ScriptedGateway {
    ticks: Arc<Mutex<VecDeque<Tick>>>,
    current: Arc<Mutex<Tick>>,
}

impl ScriptedGateway {
    fn new(ticks: Vec<Tick>) -> Self {
        ScriptedGateway {
            ticks: Arc::new(Mutex::new(ticks.into())),
            current: Arc::new(Mutex::new(Tick::default())),
        }
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn gameflow_phase(&self) -> Result<String, LcuError> {
        let tick = {
            let mut ticks = self.ticks.lock().unwrap();
            if ticks.len() > 1 {
                ticks.pop_front().unwrap()
            } else {
                ticks.front().cloned().unwrap_or_default()
            }
        };
        *self.current.lock().unwrap() = tick.clone();
        if tick.fail {
            return Err(LcuError::Status {
                status: 500,
                body: "injected failure".into(),
            });
        }
        Ok(format!("\"{}\"", tick.phase))
    }

    async fn gameflow_session(&self) -> Result<Option<GameflowSession>, LcuError> {
        Ok(self.current.lock().unwrap().session.clone())
    }

    async fn current_summoner(&self) -> Result<Option<CurrentSummoner>, LcuError> {
        Ok(None)
    }

    async fn pickable_champions(&self) -> Result<Option<Vec<PickableChampion>>, LcuError> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .pickable
            .clone()
            .map(|ids| ids.into_iter().map(PickableChampion::Id).collect()))
    }

    async fn champ_select_session(&self) -> Result<Option<ChampSelectSession>, LcuError> {
        Ok(None)
    }

    async fn live_snapshot(&self) -> Option<LiveAllGameData> {
        self.current.lock().unwrap().live.clone()
    }
}

struct ScriptedProvider {
    creds: Option<LcuCreds>,
}

#[async_trait]
impl CredentialProvider for ScriptedProvider {
    async fn discover(&self) -> anyhow::Result<Option<LcuCreds>> {
        Ok(self.creds.clone())
    }
}

struct StaticReference;

#[async_trait]
impl ReferenceSource for StaticReference {
    async fn fetch_latest_version(&self) -> anyhow::Result<String> {
        Ok("15.1.1".into())
    }

    async fn fetch_champions(&self, _version: &str) -> anyhow::Result<Vec<ChampionRecord>> {
        Ok(vec![
            ChampionRecord {
                key: 103,
                id: "Ahri".into(),
                name: "아리".into(),
            },
            ChampionRecord {
                key: 17,
                id: "Teemo".into(),
                name: "티모".into(),
            },
            ChampionRecord {
                key: 1,
                id: "Annie".into(),
                name: "애니".into(),
            },
        ])
    }

    async fn fetch_items(&self, _version: &str) -> anyhow::Result<HashMap<i64, String>> {
        Ok(HashMap::from([(3006, "광전사의 군화".to_string())]))
    }
}

// ===========================================================================
// Fixtures
// ===========================================================================

fn member(summoner: i64, champion: i64, name: &str) -> TeamMember {
    TeamMember {
        champion_id: Some(champion),
        summoner_id: Some(summoner),
        summoner_name: Some(name.into()),
    }
}

fn aram_queue() -> GameflowQueue {
    GameflowQueue {
        id: Some(450),
        map_id: Some(12),
        game_mode: Some("ARAM".into()),
    }
}

/// Champ-select view of the session: rosters under `myTeam`/`theirTeam`.
fn champ_select_session() -> GameflowSession {
    GameflowSession {
        phase: None,
        game_data: Some(GameData {
            game_id: None,
            queue: Some(aram_queue()),
            team_one: None,
            team_two: None,
            local_player: None,
        }),
        local_player: Some(LocalPlayer {
            summoner_id: Some(10),
        }),
        my_team: Some(vec![member(10, 103, "Faker#KR1")]),
        their_team: Some(vec![member(20, 17, "Chovy#KR1")]),
    }
}

/// Loading view of the session: rosters under `gameData.teamOne/teamTwo`.
fn loading_session(local_player: bool) -> GameflowSession {
    GameflowSession {
        phase: None,
        game_data: Some(GameData {
            game_id: Some(777),
            queue: Some(aram_queue()),
            team_one: Some(vec![member(10, 103, "Faker#KR1")]),
            team_two: Some(vec![member(20, 17, "Chovy#KR1")]),
            local_player: local_player.then(|| LocalPlayer {
                summoner_id: Some(10),
            }),
        }),
        local_player: None,
        my_team: None,
        their_team: None,
    }
}

fn live_snapshot() -> LiveAllGameData {
    let player = |name: &str, team: &str, champ: &str| LivePlayer {
        summoner_name: Some(name.into()),
        team: Some(team.into()),
        champion_name: Some(champ.into()),
        ..Default::default()
    };
    LiveAllGameData {
        all_players: Some(vec![
            player("Faker#KR1", "ORDER", "Ahri"),
            player("Chovy#KR1", "CHAOS", "Teemo"),
        ]),
        active_player: Some(ActivePlayer {
            summoner_name: Some("Faker#KR1".into()),
            team: Some("ORDER".into()),
        }),
        game_data: None,
    }
}

// ===========================================================================
// Harness
// ===========================================================================

/// Run the driver against a script for `virtual_secs` of paused time, then
/// shut it down and collect every emitted event.
async fn run_scenario(ticks: Vec<Tick>, virtual_secs: u64) -> Vec<GameEvent> {
    run_scenario_with(
        ScriptedProvider {
            creds: Some(LcuCreds {
                port: 51234,
                token: "secret".into(),
            }),
        },
        ticks,
        virtual_secs,
        Vec::new(),
    )
    .await
}

async fn run_scenario_with(
    provider: ScriptedProvider,
    ticks: Vec<Tick>,
    virtual_secs: u64,
    commands: Vec<Command>,
) -> Vec<GameEvent> {
    let (event_tx, mut event_rx) = mpsc::channel::<Envelope>(1024);
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(16);
    let gateway = ScriptedGateway::new(ticks);

    let handle = tokio::spawn(driver::run(
        Config::default(),
        provider,
        StaticReference,
        move |_config: &Config, _creds: &LcuCreds| -> anyhow::Result<ScriptedGateway> {
            Ok(gateway.clone())
        },
        EventSink::new(event_tx),
        cmd_rx,
    ));

    tokio::time::sleep(Duration::from_secs(virtual_secs)).await;
    for command in commands {
        cmd_tx.send(command).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cmd_tx.send(Command::Shutdown).await.unwrap();
    handle.await.unwrap().unwrap();

    let mut events = Vec::new();
    while let Ok(envelope) = event_rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

fn count(events: &[GameEvent], predicate: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| predicate(e)).count()
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn aram_match_lifecycle_end_to_end() {
    let events = run_scenario(
        vec![
            Tick::phase("Lobby"),
            Tick::phase("ChampSelect")
                .with_session(champ_select_session())
                .with_pickable(vec![1, 17, 103]),
            Tick::phase("ChampSelect")
                .with_session(champ_select_session())
                .with_pickable(vec![1, 17, 103]),
            Tick::phase("GameStart").with_session(loading_session(true)),
            Tick::phase("InProgress")
                .with_session(loading_session(true))
                .with_live(live_snapshot()),
            Tick::phase("InProgress")
                .with_session(loading_session(true))
                .with_live(live_snapshot()),
        ],
        8,
    )
    .await;

    assert!(matches!(events[0], GameEvent::LcuConnected { port: 51234 }));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::DdragonVersion { version } if version == "15.1.1")));

    // One transition event per distinct phase.
    let phases: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::PhaseChanged { phase } => Some(phase.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec!["Lobby", "ChampSelect", "GameStart", "InProgress"]);

    // Mode announced once, from the champ-select session.
    let modes: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::GameMode { label, .. } => Some(label.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(modes, vec!["칼바람"]);

    // ARAM pickable list resolved through the reference tables, once.
    let pickable: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::AramPickable { champions } => Some(champions),
            _ => None,
        })
        .collect();
    assert_eq!(pickable.len(), 1);
    let names: Vec<&str> = pickable[0].iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["애니", "티모", "아리"]);

    // Champ-select roster summary once despite two identical polls.
    let champ_select: Vec<(String, String)> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ChampSelectTeams { my_team, their_team } => {
                Some((my_team.clone(), their_team.clone()))
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        champ_select,
        vec![("아리".to_string(), "티모".to_string())]
    );

    // Loading summary buffered at GameStart (no telemetry yet), flushed once
    // live data arrives, enriched with detail lines.
    let loading: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::LoadingTeams {
                my_team,
                enemy_team,
                mode_label,
                game_id,
                team_details,
                manual,
            } => Some((my_team, enemy_team, mode_label, game_id, team_details, manual)),
            _ => None,
        })
        .collect();
    assert_eq!(loading.len(), 1);
    let (my_team, enemy_team, mode_label, game_id, team_details, manual) = &loading[0];
    assert_eq!(my_team.as_str(), "아리(나)");
    assert_eq!(enemy_team.as_str(), "티모");
    assert_eq!(mode_label.as_str(), "칼바람");
    assert_eq!(**game_id, Some(777));
    assert!(manual.is_none());
    let details = team_details.as_ref().expect("details attached on flush");
    assert!(details.contains("우리팀:"));
    assert!(details.contains("(나) 아리"));
    assert!(details.contains("상대팀:"));
    assert!(details.contains("티모"));

    // Item and KDA details once within the throttle window, split by side.
    assert_eq!(
        count(&events, |e| matches!(e, GameEvent::Items { .. })),
        1
    );
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::Items { my_team: Some(my), enemy_team: Some(enemy), all_players: None }
            if my == "아리:[]" && enemy == "티모:[]"
    )));
    assert_eq!(count(&events, |e| matches!(e, GameEvent::Kda { .. })), 1);

    assert!(matches!(events.last(), Some(GameEvent::ShutdownAck)));
}

#[tokio::test(start_paused = true)]
async fn hard_failure_tears_down_and_reconnects() {
    let events = run_scenario(
        vec![
            Tick::phase("Lobby"),
            Tick::failure(),
            Tick::phase("Lobby"),
        ],
        6,
    )
    .await;

    let connected = count(&events, |e| matches!(e, GameEvent::LcuConnected { .. }));
    assert_eq!(connected, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::LcuDisconnected { message } if message.contains("500")
    )));

    // The disconnect sits between the two connects.
    let disconnect_pos = events
        .iter()
        .position(|e| matches!(e, GameEvent::LcuDisconnected { .. }))
        .unwrap();
    let second_connect_pos = events
        .iter()
        .rposition(|e| matches!(e, GameEvent::LcuConnected { .. }))
        .unwrap();
    assert!(disconnect_pos < second_connect_pos);
}

#[tokio::test(start_paused = true)]
async fn unresolved_local_summoner_suppresses_loading_summary() {
    // No local player in the session and no current-summoner answer: the
    // rosters cannot be oriented, so no team summary goes out, but phase
    // tracking is unaffected.
    let events = run_scenario(
        vec![
            Tick::phase("Lobby"),
            Tick::phase("GameStart").with_session(loading_session(false)),
            Tick::phase("GameStart").with_session(loading_session(false)),
        ],
        5,
    )
    .await;

    assert!(!events
        .iter()
        .any(|e| matches!(e, GameEvent::LoadingTeams { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::PhaseChanged { phase } if phase == "GameStart")));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::GameMode { .. })));
}

#[tokio::test(start_paused = true)]
async fn control_commands_work_while_disconnected() {
    let events = run_scenario_with(
        ScriptedProvider { creds: None },
        Vec::new(),
        1,
        vec![
            Command::Ping,
            Command::ToggleAutoSend { enabled: true },
            Command::ResetChat,
            // Match commands need a session and are dropped here.
            Command::SendIngameUpdate,
        ],
    )
    .await;

    assert_eq!(
        events,
        vec![
            GameEvent::Pong,
            GameEvent::AutoSend { enabled: true },
            GameEvent::ChatReset,
            GameEvent::ShutdownAck,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_during_reconnect_backoff_is_prompt() {
    // A hard failure on the first poll puts the driver into its reconnect
    // backoff. A shutdown arriving mid-backoff must be honored right away,
    // not after the delay runs out.
    let (event_tx, mut event_rx) = mpsc::channel::<Envelope>(64);
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(16);
    let gateway = ScriptedGateway::new(vec![Tick::failure()]);

    let handle = tokio::spawn(driver::run(
        Config::default(),
        ScriptedProvider {
            creds: Some(LcuCreds {
                port: 51234,
                token: "secret".into(),
            }),
        },
        StaticReference,
        move |_config: &Config, _creds: &LcuCreds| -> anyhow::Result<ScriptedGateway> {
            Ok(gateway.clone())
        },
        EventSink::new(event_tx),
        cmd_rx,
    ));

    // Let the driver connect, fail its first tick, and enter the backoff.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = tokio::time::Instant::now();
    cmd_tx.send(Command::Shutdown).await.unwrap();
    handle.await.unwrap().unwrap();
    assert!(started.elapsed() < Duration::from_millis(500));

    let mut events = Vec::new();
    while let Ok(envelope) = event_rx.try_recv() {
        events.push(envelope.event);
    }
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::LcuDisconnected { .. })));
    assert!(matches!(events.last(), Some(GameEvent::ShutdownAck)));
}

#[tokio::test(start_paused = true)]
async fn ingame_update_command_reports_idle_without_live_game() {
    let events = run_scenario_with(
        ScriptedProvider {
            creds: Some(LcuCreds {
                port: 51234,
                token: "secret".into(),
            }),
        },
        vec![Tick::phase("Lobby")],
        2,
        vec![Command::SendIngameUpdate],
    )
    .await;

    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::SendChatMessage { message }
            if message == "[인게임 업데이트] 현재 게임 진행 중이 아닙니다."
    )));
}
