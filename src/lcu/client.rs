// HTTP gateway to the local client APIs.
//
// Two data sources live behind one trait: the session/gameflow API (basic
// auth against the discovered port, self-signed certificate) and the live
// client data API on its own fixed port. The session API distinguishes
// tolerated absence (404 where the caller allows it, empty body) from hard
// failure (any other non-success status), while the live API never fails --
// it is legitimately unreachable outside of a running match, so every error
// collapses into absence.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::credentials::LcuCreds;
use super::types::{
    ChampSelectSession, CurrentSummoner, GameflowSession, LiveAllGameData, PickableChampion,
};
use crate::config::Config;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LcuError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Gateway trait
// ---------------------------------------------------------------------------

/// Everything the game core needs from the local client, one method per
/// endpoint. Absence (`Ok(None)` / `None`) is a normal result, never an
/// error; an `Err` from a session-API method is a hard failure that tears
/// the session down.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Raw gameflow phase string (still quoted as returned by the endpoint).
    async fn gameflow_phase(&self) -> Result<String, LcuError>;

    async fn gameflow_session(&self) -> Result<Option<GameflowSession>, LcuError>;

    async fn current_summoner(&self) -> Result<Option<CurrentSummoner>, LcuError>;

    async fn pickable_champions(&self) -> Result<Option<Vec<PickableChampion>>, LcuError>;

    async fn champ_select_session(&self) -> Result<Option<ChampSelectSession>, LcuError>;

    /// One live-telemetry snapshot, or `None` when the feed is unavailable
    /// for any reason (connection refused, timeout, bad status, empty or
    /// malformed body).
    async fn live_snapshot(&self) -> Option<LiveAllGameData>;
}

// ---------------------------------------------------------------------------
// Production gateway
// ---------------------------------------------------------------------------

pub struct LcuGateway {
    http: reqwest::Client,
    base_url: String,
    live_url: String,
    token: String,
    request_timeout: Duration,
    live_timeout: Duration,
}

impl LcuGateway {
    /// Build a gateway for the given credentials. Both local APIs present
    /// self-signed certificates, so certificate validation is disabled for
    /// this client only.
    pub fn new(config: &Config, creds: &LcuCreds) -> Result<Self, LcuError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        Ok(LcuGateway {
            http,
            base_url: format!("https://127.0.0.1:{}", creds.port),
            live_url: format!(
                "https://127.0.0.1:{}/liveclientdata/allgamedata",
                config.connection.live_port
            ),
            token: creds.token.clone(),
            request_timeout: config.request_timeout(),
            live_timeout: config.live_timeout(),
        })
    }

    async fn get(&self, path: &str) -> Result<(u16, String), LcuError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .basic_auth("riot", Some(&self.token))
            .timeout(self.request_timeout)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok((status, body))
    }

    /// GET a JSON payload. With `allow_404`, a 404 means absence; any other
    /// non-success status is a hard failure. An empty body is also absence.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        allow_404: bool,
    ) -> Result<Option<T>, LcuError> {
        let (status, body) = self.get(path).await?;
        if allow_404 && status == 404 {
            return Ok(None);
        }
        if status >= 400 {
            return Err(LcuError::Status { status, body });
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }

    /// GET a plain-text payload, trimmed. Any non-success status is a hard
    /// failure.
    async fn get_text(&self, path: &str) -> Result<String, LcuError> {
        let (status, body) = self.get(path).await?;
        if status >= 400 {
            return Err(LcuError::Status { status, body });
        }
        Ok(body.trim().to_string())
    }
}

#[async_trait]
impl Gateway for LcuGateway {
    async fn gameflow_phase(&self) -> Result<String, LcuError> {
        self.get_text("/lol-gameflow/v1/gameflow-phase").await
    }

    async fn gameflow_session(&self) -> Result<Option<GameflowSession>, LcuError> {
        self.get_json("/lol-gameflow/v1/session", true).await
    }

    async fn current_summoner(&self) -> Result<Option<CurrentSummoner>, LcuError> {
        self.get_json("/lol-summoner/v1/current-summoner", true).await
    }

    async fn pickable_champions(&self) -> Result<Option<Vec<PickableChampion>>, LcuError> {
        self.get_json("/lol-champ-select/v1/pickable-champions", true)
            .await
    }

    async fn champ_select_session(&self) -> Result<Option<ChampSelectSession>, LcuError> {
        self.get_json("/lol-champ-select/v1/session", true).await
    }

    async fn live_snapshot(&self) -> Option<LiveAllGameData> {
        let response = self
            .http
            .get(&self.live_url)
            .timeout(self.live_timeout)
            .send()
            .await;
        let response = match response {
            Ok(r) => r,
            Err(e) => {
                debug!("live telemetry unavailable: {e}");
                return None;
            }
        };
        if !response.status().is_success() {
            debug!("live telemetry returned {}", response.status());
            return None;
        }
        let body = response.text().await.ok()?;
        if body.trim().is_empty() {
            return None;
        }
        match serde_json::from_str(&body) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("live telemetry body unparseable: {e}");
                None
            }
        }
    }
}
