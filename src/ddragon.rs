// Data Dragon reference tables.
//
// Champion and item display names come from Riot's public Data Dragon CDN,
// fetched once per session against the latest published version. A failed
// load is never fatal: the session runs with empty tables and falls back to
// numeric identifiers in rendered summaries.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::Config;
use crate::protocol::{EventSink, GameEvent};

const DDRAGON_BASE: &str = "https://ddragon.leagueoflegends.com";

// ---------------------------------------------------------------------------
// Reference source trait
// ---------------------------------------------------------------------------

/// A champion as recorded in the reference tables: numeric key, internal
/// string id (`"Ahri"`), and the localized display name.
#[derive(Debug, Clone, PartialEq)]
pub struct ChampionRecord {
    pub key: i64,
    pub id: String,
    pub name: String,
}

/// Fetches reference data for one Data Dragon version.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn fetch_latest_version(&self) -> anyhow::Result<String>;

    async fn fetch_champions(&self, version: &str) -> anyhow::Result<Vec<ChampionRecord>>;

    async fn fetch_items(&self, version: &str) -> anyhow::Result<HashMap<i64, String>>;
}

// ---------------------------------------------------------------------------
// Reference tables
// ---------------------------------------------------------------------------

/// In-memory lookup tables built from one Data Dragon snapshot. Champions
/// are indexed both by numeric key (session API payloads) and by string
/// alias (live telemetry payloads).
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    champions_by_id: HashMap<i64, String>,
    champions_by_alias: HashMap<String, String>,
    items: HashMap<i64, String>,
}

impl ReferenceData {
    pub fn empty() -> Self {
        ReferenceData::default()
    }

    pub fn from_tables(champions: Vec<ChampionRecord>, items: HashMap<i64, String>) -> Self {
        let mut champions_by_id = HashMap::new();
        let mut champions_by_alias = HashMap::new();
        for champion in champions {
            champions_by_id.insert(champion.key, champion.name.clone());
            champions_by_alias.insert(champion.id, champion.name.clone());
            // The live feed sometimes reports the localized name itself.
            champions_by_alias.insert(champion.name.clone(), champion.name);
        }
        ReferenceData {
            champions_by_id,
            champions_by_alias,
            items,
        }
    }

    pub fn champion_by_id(&self, id: i64) -> Option<&str> {
        self.champions_by_id.get(&id).map(String::as_str)
    }

    pub fn champion_by_alias(&self, alias: &str) -> Option<&str> {
        self.champions_by_alias.get(alias).map(String::as_str)
    }

    pub fn item_name(&self, id: i64) -> Option<&str> {
        self.items.get(&id).map(String::as_str)
    }
}

/// Fetch the latest reference tables and announce the version. Any failure
/// is logged and degraded to empty tables.
pub async fn load_reference<R: ReferenceSource>(source: &R, sink: &EventSink) -> ReferenceData {
    let version = match source.fetch_latest_version().await {
        Ok(version) => version,
        Err(e) => {
            warn!("failed to resolve Data Dragon version: {e:#}");
            return ReferenceData::empty();
        }
    };

    let (champions, items) = match tokio::try_join!(
        source.fetch_champions(&version),
        source.fetch_items(&version),
    ) {
        Ok(tables) => tables,
        Err(e) => {
            warn!("failed to load Data Dragon tables for {version}: {e:#}");
            return ReferenceData::empty();
        }
    };

    info!(
        "loaded Data Dragon {version}: {} champions, {} items",
        champions.len(),
        items.len()
    );
    sink.emit(GameEvent::DdragonVersion { version }).await;
    ReferenceData::from_tables(champions, items)
}

// ---------------------------------------------------------------------------
// CDN client
// ---------------------------------------------------------------------------

pub struct DataDragonClient {
    http: reqwest::Client,
    locale: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ChampionFile {
    data: HashMap<String, ChampionFileEntry>,
}

#[derive(Debug, Deserialize)]
struct ChampionFileEntry {
    key: String,
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ItemFile {
    data: HashMap<String, ItemFileEntry>,
}

#[derive(Debug, Deserialize)]
struct ItemFileEntry {
    name: String,
}

impl DataDragonClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(DataDragonClient {
            http,
            locale: config.ddragon.locale.clone(),
            timeout: Duration::from_millis(config.ddragon.timeout_ms),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> anyhow::Result<T> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ReferenceSource for DataDragonClient {
    async fn fetch_latest_version(&self) -> anyhow::Result<String> {
        let versions: Vec<String> = self
            .get_json(format!("{DDRAGON_BASE}/api/versions.json"))
            .await?;
        versions
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("version list is empty"))
    }

    async fn fetch_champions(&self, version: &str) -> anyhow::Result<Vec<ChampionRecord>> {
        let file: ChampionFile = self
            .get_json(format!(
                "{DDRAGON_BASE}/cdn/{version}/data/{}/champion.json",
                self.locale
            ))
            .await?;
        let mut champions = Vec::with_capacity(file.data.len());
        for entry in file.data.into_values() {
            let key: i64 = match entry.key.parse() {
                Ok(key) => key,
                Err(_) => {
                    warn!("champion {} has non-numeric key {:?}", entry.id, entry.key);
                    continue;
                }
            };
            champions.push(ChampionRecord {
                key,
                id: entry.id,
                name: entry.name,
            });
        }
        Ok(champions)
    }

    async fn fetch_items(&self, version: &str) -> anyhow::Result<HashMap<i64, String>> {
        let file: ItemFile = self
            .get_json(format!(
                "{DDRAGON_BASE}/cdn/{version}/data/{}/item.json",
                self.locale
            ))
            .await?;
        let mut items = HashMap::with_capacity(file.data.len());
        for (id, entry) in file.data {
            if let Ok(id) = id.parse::<i64>() {
                items.insert(id, entry.name);
            }
        }
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
