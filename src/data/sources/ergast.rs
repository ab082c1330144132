//! Client for the Ergast-compatible F1 results API
//!
//! Fetches `results.json` and `qualifying.json` for a season, following the
//! API's `limit`/`offset` paging, and flattens the nested race tables into
//! row records. Raw response bodies can be cached on disk for offline runs.

use super::ResultsSource;
use crate::{DataConfig, F1Error, QualifyingRecord, RaceResultRecord, Result, Season};
use serde::{Deserialize, Deserializer};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const RESULTS_ENDPOINT: &str = "results";
const QUALIFYING_ENDPOINT: &str = "qualifying";

/// HTTP client for the results API
pub struct ErgastClient {
    client: reqwest::blocking::Client,
    base_url: String,
    page_limit: u32,
    /// Optional cache directory for raw JSON responses
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
    /// Minimum gap between two network requests
    request_delay: Duration,
    last_request: Cell<Option<Instant>>,
}

impl ErgastClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("f1predict/0.1")
            .build()?;

        Ok(ErgastClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_limit: 100,
            cache_dir: None,
            offline_only: false,
            request_delay: Duration::ZERO,
            last_request: Cell::new(None),
        })
    }

    /// Build a client from the `[data]` config section
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        let mut client = Self::new(&config.base_url)?
            .with_page_limit(config.page_limit)
            .with_request_delay(Duration::from_millis(config.request_delay_ms));
        if let Some(dir) = &config.cache_dir {
            client = client.with_cache(dir);
        }
        Ok(client)
    }

    /// Rows requested per page
    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    /// Wait at least `delay` between consecutive page requests
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Create client with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// URL of one page of an endpoint
    pub fn page_url(&self, season: Season, endpoint: &str, offset: u32) -> String {
        format!(
            "{}/{}/{}.json?limit={}&offset={}",
            self.base_url, season, endpoint, self.page_limit, offset
        )
    }

    /// Cache file for a page URL, flattened into one file name
    ///
    /// `None` when no cache directory is configured.
    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| {
            let filename = url
                .replace("https://", "")
                .replace("http://", "")
                .replace(['/', '?', '&', '='], "_")
                + ".json";
            dir.join(filename)
        })
    }

    /// Stored body of a page, if it was fetched before
    fn load_from_cache(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        if path.exists() {
            log::debug!("Page served from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, url: &str, body: &str) -> Result<()> {
        if let Some(path) = self.cache_path(url) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Cached page: {}", path.display());
        }
        Ok(())
    }

    /// Sleep until `request_delay` has passed since the last request
    fn pace(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.request_delay {
                std::thread::sleep(self.request_delay - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }

    /// Body of one page, from the cache when present, otherwise the network
    ///
    /// Transport failures and non-2xx statuses are returned as errors.
    fn fetch_body(&self, season: Season, url: &str) -> Result<String> {
        if let Some(body) = self.load_from_cache(url) {
            return Ok(body);
        }

        if self.offline_only {
            return Err(F1Error::Api {
                season,
                message: format!("No cached data for {} (offline mode)", url),
            });
        }

        self.pace();
        log::debug!("Fetching {}", url);

        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(F1Error::Api {
                season,
                message: format!("HTTP {}: {}", response.status(), url),
            });
        }

        let body = response.text()?;

        if let Err(e) = self.save_to_cache(url, &body) {
            log::warn!("Failed to cache {}: {}", url, e);
        }

        Ok(body)
    }

    /// Fetch every page of an endpoint and return all races in page order
    fn fetch_races(&self, season: Season, endpoint: &str) -> Result<Vec<Race>> {
        let mut races = Vec::new();
        let mut offset = 0;

        loop {
            let url = self.page_url(season, endpoint, offset);
            let page = parse_page(&self.fetch_body(season, &url)?)?;
            let data = page.data;

            log::debug!(
                "{} {}: rows {}..{} of {}",
                season,
                endpoint,
                data.offset,
                data.offset.saturating_add(data.limit).min(data.total),
                data.total
            );
            races.extend(data.race_table.races);

            // The server may cap the limit below what was asked for
            let next = data.offset.saturating_add(data.limit);
            if data.limit == 0 || next >= data.total {
                break;
            }
            offset = next;
        }

        Ok(races)
    }
}

impl ResultsSource for ErgastClient {
    fn race_results(&self, season: Season) -> Result<Vec<RaceResultRecord>> {
        log::info!("Fetching race results for {}", season);
        let races = self.fetch_races(season, RESULTS_ENDPOINT)?;
        let records = flatten_race_results(&races)?;
        log::info!("Fetched {} race results from {} events", records.len(), races.len());
        Ok(records)
    }

    fn qualifying_results(&self, season: Season) -> Result<Vec<QualifyingRecord>> {
        log::info!("Fetching qualifying results for {}", season);
        let races = self.fetch_races(season, QUALIFYING_ENDPOINT)?;
        let records = flatten_qualifying_results(&races)?;
        log::info!("Fetched {} qualifying results", records.len());
        Ok(records)
    }
}

/// Top-level API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    #[serde(rename = "MRData")]
    pub data: MrData,
}

/// Paging envelope around the race table
#[derive(Debug, Deserialize)]
pub struct MrData {
    #[serde(deserialize_with = "u32_from_str")]
    pub limit: u32,
    #[serde(deserialize_with = "u32_from_str")]
    pub offset: u32,
    #[serde(deserialize_with = "u32_from_str")]
    pub total: u32,
    #[serde(rename = "RaceTable")]
    pub race_table: RaceTable,
}

#[derive(Debug, Deserialize)]
pub struct RaceTable {
    #[serde(rename = "Races", default)]
    pub races: Vec<Race>,
}

/// One event; carries whichever result list the endpoint returns
#[derive(Debug, Deserialize)]
pub struct Race {
    #[serde(rename = "raceName")]
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    #[serde(rename = "Results", default)]
    pub results: Vec<ResultEntry>,
    #[serde(rename = "QualifyingResults", default)]
    pub qualifying_results: Vec<QualifyingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Circuit {
    #[serde(rename = "circuitName")]
    pub circuit_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ResultEntry {
    pub position: String,
    pub points: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
}

#[derive(Debug, Deserialize)]
pub struct QualifyingEntry {
    pub position: String,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
}

#[derive(Debug, Deserialize)]
pub struct Driver {
    #[serde(rename = "givenName")]
    pub given_name: String,
    #[serde(rename = "familyName")]
    pub family_name: String,
}

impl Driver {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

#[derive(Debug, Deserialize)]
pub struct Constructor {
    pub name: String,
}

fn u32_from_str<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

/// Parse one response body
pub fn parse_page(body: &str) -> Result<ApiResponse> {
    Ok(serde_json::from_str(body)?)
}

fn parse_position(value: &str, field: &str, race: &str) -> Result<u32> {
    match value.trim().parse::<u32>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(F1Error::Parse(format!(
            "invalid {} '{}' in {}",
            field, value, race
        ))),
    }
}

fn parse_points(value: &str, race: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(p) if p >= 0.0 && p.is_finite() => Ok(p),
        _ => Err(F1Error::Parse(format!("invalid points '{}' in {}", value, race))),
    }
}

/// Flatten race tables into one record per classified result
pub fn flatten_race_results(races: &[Race]) -> Result<Vec<RaceResultRecord>> {
    let mut records = Vec::new();

    for race in races {
        for result in &race.results {
            records.push(RaceResultRecord {
                race: race.race_name.clone(),
                circuit: race.circuit.circuit_name.clone(),
                driver: result.driver.full_name(),
                team: result.constructor.name.clone(),
                position: parse_position(&result.position, "position", &race.race_name)?,
                points: parse_points(&result.points, &race.race_name)?,
            });
        }
    }

    Ok(records)
}

/// Flatten qualifying tables; races with no session yield nothing
pub fn flatten_qualifying_results(races: &[Race]) -> Result<Vec<QualifyingRecord>> {
    let mut records = Vec::new();

    for race in races {
        for result in &race.qualifying_results {
            records.push(QualifyingRecord {
                race: race.race_name.clone(),
                driver: result.driver.full_name(),
                team: result.constructor.name.clone(),
                qualifying_position: parse_position(
                    &result.position,
                    "qualifying position",
                    &race.race_name,
                )?,
            });
        }
    }

    Ok(records)
}
