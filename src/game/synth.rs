// Event synthesis for one connected session.
//
// A `Session` owns the per-match state and turns raw polls of the two local
// APIs into the deduplicated event stream. One `tick` runs per poll
// interval; command handlers run between ticks on the same state, which is
// what keeps dedup fingerprints coherent across both paths.

use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::format::{
    champ_display, classify_queue, display_mode, item_names, live_champ_display, normalize_phase,
    normalize_summoner_name, summarize_items, summarize_kda, summarize_team, GameMode,
};
use super::phase::{self, observe_phase};
use super::state::PendingTeams;
use super::teams::{partition_by_local_id, resolve_my_team_tag, split_teams};
use super::MatchState;
use crate::ddragon::ReferenceData;
use crate::lcu::client::{Gateway, LcuError};
use crate::lcu::types::{
    GameflowSession, LiveAllGameData, LiveDisplayName, LivePlayer, PickableChampion, TeamMember,
};
use crate::protocol::{ChampionEntry, Command, EventSink, GameEvent};

pub struct Session<G: Gateway> {
    gateway: G,
    state: MatchState,
    reference: ReferenceData,
    sink: EventSink,
    detail_interval: Duration,
}

/// The loading rosters oriented around the local player, plus the teammate
/// names used to split live telemetry later.
struct TeamsData {
    my_team: Vec<TeamMember>,
    enemy_team: Vec<TeamMember>,
    game_id: Option<i64>,
    my_team_names: HashSet<String>,
}

/// Order-sensitive fingerprint over one champion-id sequence. Equal
/// sequences always produce equal tokens; reorderings do not.
fn id_fingerprint(ids: &[i64]) -> String {
    format!("{ids:?}")
}

/// Fingerprint over the champion ids of both sides, used to suppress
/// re-emission of unchanged team summaries.
fn fingerprint(mine: &[TeamMember], others: &[TeamMember]) -> String {
    let ids = |team: &[TeamMember]| -> Vec<i64> {
        team.iter().map(|m| m.champion_id.unwrap_or(0)).collect()
    };
    format!(
        "mine={}|others={}",
        id_fingerprint(&ids(mine)),
        id_fingerprint(&ids(others))
    )
}

fn display_or_unknown(value: &Option<LiveDisplayName>) -> &str {
    value
        .as_ref()
        .and_then(|v| v.display_name.as_deref())
        .unwrap_or("?")
}

impl<G: Gateway> Session<G> {
    pub fn new(
        gateway: G,
        reference: ReferenceData,
        sink: EventSink,
        detail_interval: Duration,
    ) -> Self {
        Session {
            gateway,
            state: MatchState::new(),
            reference,
            sink,
            detail_interval,
        }
    }

    // -----------------------------------------------------------------------
    // Poll tick
    // -----------------------------------------------------------------------

    /// One poll of the gameflow phase plus whichever handlers that phase
    /// needs. `first_check` marks the very first tick after connecting; when
    /// the client is already loading or in game at that point, the loading
    /// summary is recorded silently instead of replayed mid-match.
    pub async fn tick(&mut self, first_check: bool) -> Result<(), LcuError> {
        let phase = normalize_phase(&self.gateway.gameflow_phase().await?);
        observe_phase(&mut self.state, &phase, &self.sink).await;

        let mid_game_attach =
            first_check && (phase == phase::GAME_START || phase == phase::IN_PROGRESS);
        if phase == phase::CHAMP_SELECT {
            self.handle_champ_select().await?;
        }
        if phase == phase::GAME_START || phase == phase::IN_PROGRESS {
            self.handle_game_start(mid_game_attach).await?;
        }
        if phase == phase::IN_PROGRESS {
            self.handle_in_progress().await?;
        }
        Ok(())
    }

    /// Dispatch a command that needs session state. Control commands are
    /// handled by the driver and never reach this point.
    pub async fn handle_match_command(&mut self, command: &Command) -> Result<(), LcuError> {
        match command {
            Command::SendIngameUpdate => self.handle_ingame_update().await,
            Command::RecommendChamp => self.handle_recommend_champ().await,
            Command::ManualGameStart => self.handle_manual_game_start().await,
            _ => Ok(()),
        }
    }

    // -----------------------------------------------------------------------
    // Session lookups
    // -----------------------------------------------------------------------

    /// Fetch the gameflow session and re-announce the classified mode when
    /// it changed.
    async fn update_mode_from_session(&mut self) -> Result<Option<GameflowSession>, LcuError> {
        let session = self.gateway.gameflow_session().await?;
        let queue = session
            .as_ref()
            .and_then(|s| s.game_data.as_ref())
            .and_then(|g| g.queue.as_ref());
        let mode = classify_queue(queue);
        if mode != self.state.mode {
            self.state.mode = mode;
            self.sink
                .emit(GameEvent::GameMode {
                    mode,
                    label: display_mode(mode).to_string(),
                })
                .await;
        }
        Ok(session)
    }

    /// Resolve the local summoner id once per session: from the session
    /// payload when it carries one, otherwise via the direct lookup.
    async fn ensure_local_summoner(
        &mut self,
        session: Option<&GameflowSession>,
    ) -> Result<(), LcuError> {
        if self.state.local_summoner_id.is_some() {
            return Ok(());
        }
        let from_session = session
            .and_then(|s| s.local_player.as_ref())
            .and_then(|p| p.summoner_id)
            .or_else(|| {
                session
                    .and_then(|s| s.game_data.as_ref())
                    .and_then(|g| g.local_player.as_ref())
                    .and_then(|p| p.summoner_id)
            });
        if let Some(id) = from_session {
            self.state.local_summoner_id = Some(id);
            return Ok(());
        }
        if let Some(me) = self.gateway.current_summoner().await? {
            self.state.local_summoner_id = me.summoner_id;
        }
        Ok(())
    }

    async fn build_teams_data(&mut self) -> Result<TeamsData, LcuError> {
        let session = self.update_mode_from_session().await?;
        self.ensure_local_summoner(session.as_ref()).await?;

        let game_data = session.as_ref().and_then(|s| s.game_data.as_ref());
        let team_one = game_data.and_then(|g| g.team_one.clone()).unwrap_or_default();
        let team_two = game_data.and_then(|g| g.team_two.clone()).unwrap_or_default();
        let game_id = game_data.and_then(|g| g.game_id);
        let (my_team, enemy_team) =
            partition_by_local_id(&team_one, &team_two, self.state.local_summoner_id);
        let my_team_names = my_team
            .iter()
            .filter_map(|m| m.summoner_name.clone())
            .filter(|n| !n.is_empty())
            .collect();
        Ok(TeamsData {
            my_team,
            enemy_team,
            game_id,
            my_team_names,
        })
    }

    // -----------------------------------------------------------------------
    // Phase handlers
    // -----------------------------------------------------------------------

    async fn handle_champ_select(&mut self) -> Result<(), LcuError> {
        let session = self.update_mode_from_session().await?;
        let pickable = self.gateway.pickable_champions().await?;

        if self.state.mode == GameMode::Aram {
            if let Some(pickable) = pickable {
                let ids: Vec<i64> = pickable
                    .iter()
                    .filter_map(PickableChampion::id)
                    .filter(|id| *id > 0)
                    .collect();
                let key = id_fingerprint(&ids);
                if !ids.is_empty()
                    && (key != self.state.pickable_key || !self.state.aram_pickable_printed)
                {
                    self.state.pickable_key = key;
                    self.state.aram_pickable_printed = true;
                    let champions = ids
                        .iter()
                        .map(|id| ChampionEntry {
                            id: *id,
                            name: champ_display(&self.reference, Some(*id)),
                        })
                        .collect();
                    self.sink.emit(GameEvent::AramPickable { champions }).await;
                }
            }
        }

        let my_team = session
            .as_ref()
            .and_then(|s| s.my_team.clone())
            .unwrap_or_default();
        let their_team = session
            .as_ref()
            .and_then(|s| s.their_team.clone())
            .unwrap_or_default();
        for member in &my_team {
            if let Some(id) = member.summoner_id {
                self.state.my_team_ids.insert(id);
            }
        }
        let key = fingerprint(&my_team, &their_team);
        if key != self.state.champ_select_key {
            self.state.champ_select_key = key;
            self.sink
                .emit(GameEvent::ChampSelectTeams {
                    my_team: summarize_team(&my_team, &self.reference, None),
                    their_team: summarize_team(&their_team, &self.reference, None),
                })
                .await;
        }
        Ok(())
    }

    /// Emit the loading-screen summary once per distinct roster. With
    /// `suppress_emit` (mid-match attach) the fingerprint is recorded
    /// without emitting, so the stale summary never replays.
    async fn handle_game_start(&mut self, suppress_emit: bool) -> Result<(), LcuError> {
        let teams = self.build_teams_data().await?;

        let key = fingerprint(&teams.my_team, &teams.enemy_team);
        if suppress_emit {
            self.state.loading_key = key;
            self.state.pending_teams = None;
        } else if key != self.state.loading_key
            && (!teams.my_team.is_empty() || !teams.enemy_team.is_empty())
        {
            self.state.loading_key = key;
            let my_team =
                summarize_team(&teams.my_team, &self.reference, self.state.local_summoner_id);
            let enemy_team = summarize_team(&teams.enemy_team, &self.reference, None);
            let mode_label = display_mode(self.state.mode).to_string();

            let live = self.gateway.live_snapshot().await;
            match live.as_ref().filter(|l| l.players().is_some()) {
                Some(live) => {
                    let team_details = self.build_rune_spell_lines(live, &teams.my_team_names);
                    self.sink
                        .emit(GameEvent::LoadingTeams {
                            my_team,
                            enemy_team,
                            mode_label,
                            game_id: teams.game_id,
                            team_details: Some(team_details),
                            manual: None,
                        })
                        .await;
                }
                None => {
                    debug!("live telemetry not ready, buffering loading summary");
                    self.state.pending_teams = Some(PendingTeams {
                        my_team,
                        enemy_team,
                        mode_label,
                        game_id: teams.game_id,
                    });
                }
            }
        }
        self.state.my_team_names = teams.my_team_names;
        Ok(())
    }

    async fn handle_in_progress(&mut self) -> Result<(), LcuError> {
        let Some(live) = self.gateway.live_snapshot().await else {
            return Ok(());
        };
        if live.players().is_none() {
            return Ok(());
        }

        if !self.state.live_ready {
            self.state.live_ready = true;
            if let Some(pending) = self.state.pending_teams.take() {
                let team_details =
                    self.build_rune_spell_lines(&live, &self.state.my_team_names);
                self.sink
                    .emit(GameEvent::LoadingTeams {
                        my_team: pending.my_team,
                        enemy_team: pending.enemy_team,
                        mode_label: pending.mode_label,
                        game_id: pending.game_id,
                        team_details: Some(team_details),
                        manual: None,
                    })
                    .await;
            }
        }

        let players = live.players().unwrap_or_default();
        let my_tag = live
            .active_player
            .as_ref()
            .and_then(|a| a.team.as_deref());
        let snapshot = split_teams(players, my_tag, &self.state.my_team_names);

        if let Some(last) = self.state.last_detail_emit {
            if last.elapsed() < self.detail_interval {
                return Ok(());
            }
        }
        self.state.last_detail_emit = Some(Instant::now());

        if !snapshot.my_players.is_empty() || !snapshot.enemy_players.is_empty() {
            self.sink
                .emit(GameEvent::Items {
                    my_team: Some(summarize_items(&snapshot.my_players, &self.reference)),
                    enemy_team: Some(summarize_items(&snapshot.enemy_players, &self.reference)),
                    all_players: None,
                })
                .await;
        } else {
            self.sink
                .emit(GameEvent::Items {
                    my_team: None,
                    enemy_team: None,
                    all_players: Some(summarize_items(players, &self.reference)),
                })
                .await;
        }
        self.sink
            .emit(GameEvent::Kda {
                all_players: summarize_kda(players, &self.reference),
            })
            .await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Command handlers
    // -----------------------------------------------------------------------

    /// Re-announce the loading summary on demand, bypassing dedup.
    async fn handle_manual_game_start(&mut self) -> Result<(), LcuError> {
        let teams = self.build_teams_data().await?;
        self.state.my_team_names = teams.my_team_names.clone();

        let live = self.gateway.live_snapshot().await;
        let team_details = live
            .as_ref()
            .filter(|l| l.players().is_some())
            .map(|l| self.build_rune_spell_lines(l, &teams.my_team_names));

        self.sink
            .emit(GameEvent::LoadingTeams {
                my_team: summarize_team(
                    &teams.my_team,
                    &self.reference,
                    self.state.local_summoner_id,
                ),
                enemy_team: summarize_team(&teams.enemy_team, &self.reference, None),
                mode_label: display_mode(self.state.mode).to_string(),
                game_id: teams.game_id,
                team_details,
                manual: Some(true),
            })
            .await;
        Ok(())
    }

    /// On-demand full state-of-the-game chat message, bypassing the detail
    /// throttle.
    async fn handle_ingame_update(&mut self) -> Result<(), LcuError> {
        let session = self.update_mode_from_session().await?;
        self.ensure_local_summoner(session.as_ref()).await?;

        let live = match self.gateway.live_snapshot().await {
            Some(live) if live.players().is_some() => live,
            _ => {
                self.sink
                    .emit(GameEvent::SendChatMessage {
                        message: "[인게임 업데이트] 현재 게임 진행 중이 아닙니다.".into(),
                    })
                    .await;
                return Ok(());
            }
        };
        let players = live.players().unwrap_or_default();

        let norm_active = live
            .active_player
            .as_ref()
            .and_then(|a| a.summoner_name.as_deref())
            .and_then(normalize_summoner_name);
        let my_tag = resolve_my_team_tag(&live);
        let snapshot = split_teams(players, my_tag.as_deref(), &self.state.my_team_names);

        let game_time = live
            .game_data
            .as_ref()
            .and_then(|g| g.game_time)
            .unwrap_or(0.0);
        let minutes = (game_time / 60.0).floor() as i64;
        let seconds = (game_time % 60.0).floor() as i64;

        let mut lines = vec![
            "[인게임 업데이트]".to_string(),
            format!("{minutes}:{seconds:02}"),
            "우리팀:".to_string(),
        ];
        for player in &snapshot.my_players {
            lines.push(self.ingame_line(player, norm_active.as_deref()));
        }
        lines.push("상대팀:".to_string());
        for player in &snapshot.enemy_players {
            lines.push(self.ingame_line(player, norm_active.as_deref()));
        }

        self.sink
            .emit(GameEvent::SendChatMessage {
                message: lines.join("\n"),
            })
            .await;
        Ok(())
    }

    /// Champ-select recommendation prompt. Outside champ select the session
    /// endpoint 404s and the command is a silent no-op.
    async fn handle_recommend_champ(&mut self) -> Result<(), LcuError> {
        let session = self.update_mode_from_session().await?;
        self.ensure_local_summoner(session.as_ref()).await?;

        let Some(champ_select) = self.gateway.champ_select_session().await? else {
            debug!("recommendChamp outside champ select, ignoring");
            return Ok(());
        };
        let my_team = champ_select.my_team.unwrap_or_default();
        let my_team_str =
            summarize_team(&my_team, &self.reference, self.state.local_summoner_id);

        let message = if self.state.mode == GameMode::Aram {
            let bench = champ_select.bench_champions.unwrap_or_default();
            let bench_str = bench
                .iter()
                .map(|c| champ_display(&self.reference, c.champion_id))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "[챔피언 선택]\n모드: {}\n현재 선택: {my_team_str}\n선택 가능 챔피언: {bench_str}",
                display_mode(GameMode::Aram)
            )
        } else {
            format!(
                "[챔피언 선택]\n모드: {}\n현재 우리팀 선택: {my_team_str}\n조합을 보고 챔피언을 추천해줘.",
                display_mode(self.state.mode)
            )
        };
        self.sink.emit(GameEvent::SendChatMessage { message }).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Detail lines
    // -----------------------------------------------------------------------

    /// Rune and summoner-spell lines per player, grouped by side when the
    /// split is known, otherwise one flat list.
    fn build_rune_spell_lines(
        &self,
        live: &LiveAllGameData,
        my_names: &HashSet<String>,
    ) -> String {
        let all_players = live.all_players.as_deref().unwrap_or_default();
        let norm_active = live
            .active_player
            .as_ref()
            .and_then(|a| a.summoner_name.as_deref())
            .and_then(normalize_summoner_name);
        let my_tag = resolve_my_team_tag(live);
        let snapshot = split_teams(all_players, my_tag.as_deref(), my_names);

        let mut lines = Vec::new();
        if !snapshot.my_players.is_empty() || !snapshot.enemy_players.is_empty() {
            if !snapshot.my_players.is_empty() {
                lines.push("우리팀:".to_string());
                for player in &snapshot.my_players {
                    lines.push(self.rune_spell_line(player, norm_active.as_deref()));
                }
            }
            if !snapshot.enemy_players.is_empty() {
                lines.push("상대팀:".to_string());
                for player in &snapshot.enemy_players {
                    lines.push(self.rune_spell_line(player, norm_active.as_deref()));
                }
            }
        } else {
            for player in all_players {
                lines.push(self.rune_spell_line(player, norm_active.as_deref()));
            }
        }
        lines.join("\n")
    }

    fn is_active_player(&self, player: &LivePlayer, norm_active: Option<&str>) -> bool {
        norm_active.is_some()
            && player
                .summoner_name
                .as_deref()
                .and_then(normalize_summoner_name)
                .as_deref()
                == norm_active
    }

    fn rune_spell_line(&self, player: &LivePlayer, norm_active: Option<&str>) -> String {
        let me = if self.is_active_player(player, norm_active) {
            "(나) "
        } else {
            ""
        };
        let champ = live_champ_display(&self.reference, player);
        let runes = player.runes.clone().unwrap_or_default();
        let spells = player.summoner_spells.clone().unwrap_or_default();
        format!(
            "{me}{champ}: {}({}/{}) {}+{}",
            display_or_unknown(&runes.keystone),
            display_or_unknown(&runes.primary_rune_tree),
            display_or_unknown(&runes.secondary_rune_tree),
            display_or_unknown(&spells.summoner_spell_one),
            display_or_unknown(&spells.summoner_spell_two),
        )
    }

    fn ingame_line(&self, player: &LivePlayer, norm_active: Option<&str>) -> String {
        let me = if self.is_active_player(player, norm_active) {
            "(나) "
        } else {
            ""
        };
        let champ = live_champ_display(&self.reference, player);
        let level = player.level.unwrap_or(0);
        let scores = player.scores.clone().unwrap_or_default();
        format!(
            "{me}{champ} L{level} CS{} {}/{}/{} [{}]",
            scores.creep_score.unwrap_or(0),
            scores.kills.unwrap_or(0),
            scores.deaths.unwrap_or(0),
            scores.assists.unwrap_or(0),
            item_names(player, &self.reference).join(","),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
