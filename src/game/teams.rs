// Team reconciliation across the two local APIs.
//
// The session API identifies players by summoner id; the live API only has
// display names and a team tag (`"ORDER"` / `"CHAOS"`). These helpers bridge
// the two: partitioning the loading rosters around the local summoner id,
// and splitting live players by tag with a normalized-name fallback when no
// tag is known.

use std::collections::HashSet;

use super::format::normalize_summoner_name;
use crate::lcu::types::{LiveAllGameData, LivePlayer, TeamMember};

/// Live players split into the local player's side and the opposing side.
#[derive(Debug, Clone, Default)]
pub struct TeamSnapshot {
    pub my_players: Vec<LivePlayer>,
    pub enemy_players: Vec<LivePlayer>,
}

/// Whether a live display name refers to a known teammate, by exact match
/// or after platform-tag normalization on both sides.
fn is_known_teammate(name: Option<&str>, my_names: &HashSet<String>) -> bool {
    let Some(name) = name else {
        return false;
    };
    if my_names.contains(name) {
        return true;
    }
    let Some(norm) = normalize_summoner_name(name) else {
        return false;
    };
    my_names
        .iter()
        .any(|n| normalize_summoner_name(n).as_deref() == Some(&norm))
}

/// Split live players into sides. With a known team tag, mine is everyone
/// carrying it and the enemy is everyone carrying a different tag (untagged
/// players fall out entirely). Without a tag, teammates are recognized by
/// name and everyone else counts as enemy.
pub fn split_teams(
    all_players: &[LivePlayer],
    my_tag: Option<&str>,
    my_names: &HashSet<String>,
) -> TeamSnapshot {
    if let Some(tag) = my_tag {
        return TeamSnapshot {
            my_players: all_players
                .iter()
                .filter(|p| p.team.as_deref() == Some(tag))
                .cloned()
                .collect(),
            enemy_players: all_players
                .iter()
                .filter(|p| p.team.as_deref().is_some_and(|t| t != tag))
                .cloned()
                .collect(),
        };
    }

    let (my_players, enemy_players) = all_players
        .iter()
        .cloned()
        .partition(|p| is_known_teammate(p.summoner_name.as_deref(), my_names));
    TeamSnapshot {
        my_players,
        enemy_players,
    }
}

/// The local player's team tag, resolved by locating the active player in
/// the player list by normalized name, falling back to the active player's
/// own tag field.
pub fn resolve_my_team_tag(live: &LiveAllGameData) -> Option<String> {
    let active = live.active_player.as_ref()?;
    let norm_active = active
        .summoner_name
        .as_deref()
        .and_then(normalize_summoner_name);
    let me_entry = norm_active.as_deref().and_then(|norm| {
        live.all_players.as_deref().unwrap_or_default().iter().find(|p| {
            p.summoner_name.as_deref().and_then(normalize_summoner_name).as_deref() == Some(norm)
        })
    });
    me_entry
        .and_then(|p| p.team.clone())
        .or_else(|| active.team.clone())
}

/// Orient the loading-screen rosters around the local summoner id. When the
/// local player appears in neither team both sides come back empty, which
/// suppresses the loading summary for that tick.
pub fn partition_by_local_id(
    team_one: &[TeamMember],
    team_two: &[TeamMember],
    local: Option<i64>,
) -> (Vec<TeamMember>, Vec<TeamMember>) {
    let contains = |team: &[TeamMember]| {
        local.is_some() && team.iter().any(|member| member.summoner_id == local)
    };
    if contains(team_one) {
        (team_one.to_vec(), team_two.to_vec())
    } else if contains(team_two) {
        (team_two.to_vec(), team_one.to_vec())
    } else {
        (Vec::new(), Vec::new())
    }
}
