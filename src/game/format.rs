// Pure formatting and classification helpers for the game core.
//
// Everything here is deterministic string/lookup work: phase and summoner
// name normalization, queue classification, and the roster/item/KDA summary
// lines that end up in emitted events.

use serde::Serialize;

use crate::ddragon::ReferenceData;
use crate::lcu::types::{GameflowQueue, LivePlayer, TeamMember};

/// Consumable items excluded from item summaries.
const FILTERED_ITEM_NAMES: [&str; 2] = ["포로간식", "포로 간식"];

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// The gameflow-phase endpoint returns a JSON string literal; strip the
/// quoting so phase comparisons see the bare name.
pub fn normalize_phase(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        if let Ok(inner) = serde_json::from_str::<String>(trimmed) {
            return inner;
        }
        return trimmed.trim_matches('"').to_string();
    }
    trimmed.to_string()
}

/// Canonical form of a summoner name for cross-API matching: the part before
/// the `#` platform tag, trimmed and lowercased. Empty input yields `None`.
pub fn normalize_summoner_name(name: &str) -> Option<String> {
    let base = name.split('#').next().unwrap_or("").trim();
    if base.is_empty() {
        None
    } else {
        Some(base.to_lowercase())
    }
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// Localized champion name for a numeric champion id, falling back to the
/// id itself, or `"Unknown"` when there is no id at all. A zero id means
/// "no pick yet" and is treated as absent.
pub fn champ_display(refs: &ReferenceData, id: Option<i64>) -> String {
    match id {
        None | Some(0) => "Unknown".to_string(),
        Some(id) => refs
            .champion_by_id(id)
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string()),
    }
}

/// Localized champion name for a live-telemetry player, resolved through the
/// alias table with the raw key as fallback.
pub fn live_champ_display(refs: &ReferenceData, player: &LivePlayer) -> String {
    match player.champion_key() {
        None => "Unknown".to_string(),
        Some(key) => refs
            .champion_by_alias(key)
            .unwrap_or(key)
            .to_string(),
    }
}

/// One roster line: champion names joined by `", "`, with the local player
/// marked `(나)`.
pub fn summarize_team(members: &[TeamMember], refs: &ReferenceData, me: Option<i64>) -> String {
    members
        .iter()
        .map(|member| {
            let name = champ_display(refs, member.champion_id);
            let is_me = me.is_some() && member.summoner_id == me;
            if is_me {
                format!("{name}(나)")
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Display names of a player's real items, with empty slots, unknown ids,
/// and filtered consumables dropped.
pub fn item_names<'a>(player: &LivePlayer, refs: &'a ReferenceData) -> Vec<&'a str> {
    player
        .items
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|item| item.item_id.filter(|id| *id > 0))
        .filter_map(|id| refs.item_name(id))
        .filter(|name| !FILTERED_ITEM_NAMES.contains(name))
        .collect()
}

/// One item line per player: `champ:[item,item,...]`.
pub fn summarize_items(players: &[LivePlayer], refs: &ReferenceData) -> String {
    players
        .iter()
        .map(|player| {
            let champ = live_champ_display(refs, player);
            format!("{champ}:[{}]", item_names(player, refs).join(","))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// One KDA line per player: `champ: L<level> <k>/<d>/<a>`, zeros for
/// anything the feed omitted.
pub fn summarize_kda(players: &[LivePlayer], refs: &ReferenceData) -> String {
    players
        .iter()
        .map(|player| {
            let champ = live_champ_display(refs, player);
            let level = player.level.unwrap_or(0);
            let scores = player.scores.clone().unwrap_or_default();
            format!(
                "{champ}: L{level} {}/{}/{}",
                scores.kills.unwrap_or(0),
                scores.deaths.unwrap_or(0),
                scores.assists.unwrap_or(0)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Queue classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Aram,
    RankedSolo,
    RankedFlex,
    NormalBlind,
    NormalDraft,
    Quickplay,
    Cherry,
    Practice,
    Unknown,
}

/// Classify the gameflow queue. ARAM is recognized by queue id, game-mode
/// string, or map id so the classification survives custom lobbies.
pub fn classify_queue(queue: Option<&GameflowQueue>) -> GameMode {
    let queue_id = queue.and_then(|q| q.id).unwrap_or(0);
    let game_mode = queue.and_then(|q| q.game_mode.as_deref()).unwrap_or("");
    let map_id = queue.and_then(|q| q.map_id).unwrap_or(0);

    if queue_id == 450 || game_mode == "ARAM" || map_id == 12 {
        return GameMode::Aram;
    }
    match queue_id {
        420 => GameMode::RankedSolo,
        440 => GameMode::RankedFlex,
        430 => GameMode::NormalBlind,
        400 => GameMode::NormalDraft,
        490 => GameMode::Quickplay,
        2400 => GameMode::Cherry,
        3140 => GameMode::Practice,
        _ => GameMode::Unknown,
    }
}

/// Human-readable mode label as shown in chat summaries.
pub fn display_mode(mode: GameMode) -> &'static str {
    match mode {
        GameMode::Aram => "칼바람",
        GameMode::RankedSolo => "솔랭",
        GameMode::RankedFlex => "Ranked Flex",
        GameMode::NormalBlind => "일겜(Blind)",
        GameMode::NormalDraft => "일겜",
        GameMode::Quickplay => "Quickplay",
        GameMode::Cherry => "증강 칼바람",
        GameMode::Practice => "연습모드",
        GameMode::Unknown => "Unknown",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
