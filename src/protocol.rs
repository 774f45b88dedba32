// Event and command taxonomy shared between the game core and the
// presentation boundary.
//
// Outbound events are serialized as JSON lines of the shape
// `{"type": "...", "data": {...}, "text": "...", "ts": "..."}` with camelCase
// keys. Inbound commands use the same tagged shape; anything that fails to
// deserialize is logged and dropped by the reader, never fatal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::game::format::GameMode;

// ---------------------------------------------------------------------------
// Outbound events
// ---------------------------------------------------------------------------

/// A champion identifier/name pair as rendered into event payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChampionEntry {
    pub id: i64,
    pub name: String,
}

/// Every event the core emits, with its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum GameEvent {
    /// Client credentials discovered; a session is starting.
    LcuConnected { port: u16 },
    /// The session was torn down after a hard API failure.
    LcuDisconnected { message: String },
    /// Reference tables were loaded against this Data Dragon version.
    DdragonVersion { version: String },
    /// The gameflow phase changed (fires once per distinct transition).
    PhaseChanged { phase: String },
    /// The classified game mode changed.
    GameMode { mode: GameMode, label: String },
    /// ARAM pickable-champion list (emitted on change, once per match at
    /// minimum).
    AramPickable { champions: Vec<ChampionEntry> },
    /// Champ-select roster summary for both sides.
    ChampSelectTeams { my_team: String, their_team: String },
    /// Loading-screen team summary, optionally enriched with rune/spell
    /// detail lines once live telemetry is available.
    LoadingTeams {
        my_team: String,
        enemy_team: String,
        mode_label: String,
        game_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        team_details: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        manual: Option<bool>,
    },
    /// Per-player item summary. Grouped by side when the split is known,
    /// otherwise a single ungrouped list.
    Items {
        #[serde(skip_serializing_if = "Option::is_none")]
        my_team: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        enemy_team: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        all_players: Option<String>,
    },
    /// Per-player level and kill/death/assist summary.
    Kda { all_players: String },
    /// A ready-to-send chat message for the presentation layer.
    SendChatMessage { message: String },
    /// Reply to an inbound `ping`.
    Pong,
    /// Shutdown acknowledged; the driver stops scheduling ticks.
    ShutdownAck,
    /// Auto-send toggled by the presentation layer.
    AutoSend { enabled: bool },
    /// Chat reset requested by the presentation layer.
    ChatReset,
}

/// The wire envelope around a [`GameEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub event: GameEvent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub ts: DateTime<Utc>,
}

impl Envelope {
    pub fn new(event: GameEvent) -> Self {
        Envelope {
            event,
            text: None,
            ts: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event sink
// ---------------------------------------------------------------------------

/// Fire-and-forget handle for emitting events toward the presentation layer.
///
/// Delivery is not awaited for acknowledgement and send failures (receiver
/// gone during shutdown) are ignored.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Envelope>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<Envelope>) -> Self {
        EventSink { tx }
    }

    pub async fn emit(&self, event: GameEvent) {
        let _ = self.tx.send(Envelope::new(event)).await;
    }
}

// ---------------------------------------------------------------------------
// Inbound commands
// ---------------------------------------------------------------------------

/// Commands delivered asynchronously by the presentation layer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Ping,
    Shutdown,
    ToggleAutoSend {
        #[serde(default)]
        enabled: bool,
    },
    ResetChat,
    SendIngameUpdate,
    RecommendChamp,
    ManualGameStart,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
