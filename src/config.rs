//! Environment configuration shared by the REST client and the real-time channel.
//!
//! The service is reached through two endpoints (the REST root and the WebSocket
//! URL) and one mode switch: with `use_api` disabled the crate serves data from a
//! static JSON export instead of the live backend.

use std::env;

use bon::Builder;
use url::Url;

use crate::Result;
use crate::error::Error;

pub const API_URL_VAR: &str = "APIBET_API_URL";
pub const WS_URL_VAR: &str = "APIBET_WS_URL";
pub const USE_API_VAR: &str = "APIBET_USE_API";
pub const STATIC_DATA_URL_VAR: &str = "APIBET_STATIC_DATA_URL";

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
const STATIC_DATA_PATH: &str = "data/matches.json";
const DEFAULT_MATCH_LIMIT: u32 = 500;
const DEFAULT_LOG_LIMIT: u32 = 20;
const DEFAULT_EXPORT_LIMIT: u32 = 1000;
const DEFAULT_MIN_CONFIDENCE: u32 = 70;

/// Client configuration.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
pub struct Config {
    /// REST endpoint root
    #[builder(default = default_api_base())]
    pub api_base: Url,
    /// WebSocket endpoint of the real-time channel
    #[builder(default = default_realtime_url())]
    pub realtime_url: Url,
    /// `true` reads from the live backend, `false` from the static JSON export
    #[builder(default = true)]
    pub use_api: bool,
    /// Location of the static JSON export; defaults to `data/matches.json` under `api_base`
    pub static_data_url: Option<Url>,
    /// Maximum number of matches requested per reload
    #[builder(default = DEFAULT_MATCH_LIMIT)]
    pub match_limit: u32,
    /// Number of scraper log entries requested
    #[builder(default = DEFAULT_LOG_LIMIT)]
    pub log_limit: u32,
    /// Number of rows requested for CSV exports
    #[builder(default = DEFAULT_EXPORT_LIMIT)]
    pub export_limit: u32,
    /// Confidence threshold (percent) for recommendation lists
    #[builder(default = DEFAULT_MIN_CONFIDENCE)]
    pub min_confidence: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Config {
    /// Build a configuration from `APIBET_*` environment variables, falling back to
    /// the defaults for any variable that is not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = match lookup(API_URL_VAR) {
            Some(value) => with_trailing_slash(parse_url(API_URL_VAR, &value)?),
            None => default_api_base(),
        };
        let realtime_url = match lookup(WS_URL_VAR) {
            Some(value) => parse_url(WS_URL_VAR, &value)?,
            None => default_realtime_url(),
        };
        let use_api = match lookup(USE_API_VAR) {
            Some(value) => parse_flag(&value)?,
            None => true,
        };
        let static_data_url = lookup(STATIC_DATA_URL_VAR)
            .map(|value| parse_url(STATIC_DATA_URL_VAR, &value))
            .transpose()?;

        Ok(Self::builder()
            .api_base(api_base)
            .realtime_url(realtime_url)
            .use_api(use_api)
            .maybe_static_data_url(static_data_url)
            .build())
    }

    /// REST root that relative endpoint paths are joined onto.
    ///
    /// Always ends in `/`, so a path prefix such as `/odds` is kept by joins.
    #[must_use]
    pub fn api_root(&self) -> Url {
        with_trailing_slash(self.api_base.clone())
    }

    /// Resolved location of the static JSON export.
    pub fn static_data_url(&self) -> Result<Url> {
        match &self.static_data_url {
            Some(url) => Ok(url.clone()),
            None => Ok(self.api_root().join(STATIC_DATA_PATH)?),
        }
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn default_api_base() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL should be valid")
}

fn default_realtime_url() -> Url {
    Url::parse(DEFAULT_WS_URL).expect("default WebSocket URL should be valid")
}

fn parse_url(var: &str, value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| Error::validation(format!("{var}={value:?}: {e}")))
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::validation(format!(
            "{USE_API_VAR} must be a boolean, got {other:?}"
        ))),
    }
}
