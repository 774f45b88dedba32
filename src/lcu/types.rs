// Typed records for the shape-optional JSON payloads the client APIs return.
//
// The session and live-telemetry endpoints omit fields freely depending on
// lifecycle timing, so every field the core reads is an explicit `Option`
// with its defaulting handled at the use site.

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Gameflow session API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameflowSession {
    pub phase: Option<String>,
    pub game_data: Option<GameData>,
    pub local_player: Option<LocalPlayer>,
    pub my_team: Option<Vec<TeamMember>>,
    pub their_team: Option<Vec<TeamMember>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    pub game_id: Option<i64>,
    pub queue: Option<GameflowQueue>,
    pub team_one: Option<Vec<TeamMember>>,
    pub team_two: Option<Vec<TeamMember>>,
    pub local_player: Option<LocalPlayer>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameflowQueue {
    pub id: Option<i64>,
    pub map_id: Option<i64>,
    pub game_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub champion_id: Option<i64>,
    pub summoner_id: Option<i64>,
    pub summoner_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalPlayer {
    pub summoner_id: Option<i64>,
}

/// Response of the direct current-summoner lookup, used as the fallback when
/// the session payload carries no local player.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSummoner {
    pub summoner_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Champ select API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectSession {
    pub my_team: Option<Vec<TeamMember>>,
    pub bench_champions: Option<Vec<BenchChampion>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchChampion {
    pub champion_id: Option<i64>,
}

/// The pickable-champions endpoint has returned both bare id arrays and
/// arrays of `{id}` objects across client versions; accept either.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PickableChampion {
    Id(i64),
    Entry { id: Option<i64> },
}

impl PickableChampion {
    pub fn id(&self) -> Option<i64> {
        match self {
            PickableChampion::Id(id) => Some(*id),
            PickableChampion::Entry { id } => *id,
        }
    }
}

// ---------------------------------------------------------------------------
// Live client data API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveAllGameData {
    pub all_players: Option<Vec<LivePlayer>>,
    pub active_player: Option<ActivePlayer>,
    pub game_data: Option<LiveGameData>,
}

impl LiveAllGameData {
    /// The player list, when the snapshot actually reports players. An
    /// absent or empty list means the telemetry feed is not ready yet.
    pub fn players(&self) -> Option<&[LivePlayer]> {
        match self.all_players.as_deref() {
            Some(players) if !players.is_empty() => Some(players),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePlayer {
    pub summoner_name: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameData {
    pub game_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LivePlayer {
    pub summoner_name: Option<String>,
    pub team: Option<String>,
    pub level: Option<i64>,
    pub champion_name: Option<String>,
    pub raw_champion_name: Option<String>,
    pub items: Option<Vec<LiveItem>>,
    pub scores: Option<LiveScores>,
    pub runes: Option<LiveRunes>,
    pub summoner_spells: Option<LiveSummonerSpells>,
}

impl LivePlayer {
    /// Whichever champion identifier the live feed populated for this player.
    pub fn champion_key(&self) -> Option<&str> {
        self.champion_name
            .as_deref()
            .or(self.raw_champion_name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveItem {
    #[serde(rename = "itemID")]
    pub item_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveScores {
    pub kills: Option<i64>,
    pub deaths: Option<i64>,
    pub assists: Option<i64>,
    pub creep_score: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRunes {
    pub keystone: Option<LiveDisplayName>,
    pub primary_rune_tree: Option<LiveDisplayName>,
    pub secondary_rune_tree: Option<LiveDisplayName>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSummonerSpells {
    pub summoner_spell_one: Option<LiveDisplayName>,
    pub summoner_spell_two: Option<LiveDisplayName>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveDisplayName {
    pub display_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gameflow_session_tolerates_missing_fields() {
        let session: GameflowSession = serde_json::from_str(r#"{"phase":"Lobby"}"#).unwrap();
        assert_eq!(session.phase.as_deref(), Some("Lobby"));
        assert!(session.game_data.is_none());
        assert!(session.my_team.is_none());
    }

    #[test]
    fn pickable_champions_accept_both_shapes() {
        let bare: Vec<PickableChampion> = serde_json::from_str("[1, 17, 103]").unwrap();
        let ids: Vec<i64> = bare.iter().filter_map(PickableChampion::id).collect();
        assert_eq!(ids, vec![1, 17, 103]);

        let wrapped: Vec<PickableChampion> =
            serde_json::from_str(r#"[{"id": 22}, {"id": null}, {}]"#).unwrap();
        let ids: Vec<i64> = wrapped.iter().filter_map(PickableChampion::id).collect();
        assert_eq!(ids, vec![22]);
    }

    #[test]
    fn live_item_id_uses_uppercase_suffix() {
        let item: LiveItem = serde_json::from_str(r#"{"itemID": 3006}"#).unwrap();
        assert_eq!(item.item_id, Some(3006));
    }

    #[test]
    fn empty_player_list_is_not_ready() {
        let live: LiveAllGameData = serde_json::from_str(r#"{"allPlayers": []}"#).unwrap();
        assert!(live.players().is_none());

        let live: LiveAllGameData =
            serde_json::from_str(r#"{"allPlayers": [{"summonerName": "A"}]}"#).unwrap();
        assert_eq!(live.players().unwrap().len(), 1);
    }

    #[test]
    fn champion_key_prefers_display_name() {
        let player = LivePlayer {
            champion_name: Some("아리".into()),
            raw_champion_name: Some("game_character_displayname_Ahri".into()),
            ..Default::default()
        };
        assert_eq!(player.champion_key(), Some("아리"));

        let player = LivePlayer {
            raw_champion_name: Some("Ahri".into()),
            ..Default::default()
        };
        assert_eq!(player.champion_key(), Some("Ahri"));
    }
}
