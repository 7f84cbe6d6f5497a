//! Types for the ApiBet REST API.
//!
//! - **Common types**: enums shared by several responses, such as [`MatchStatus`]
//!   and [`Outcome`].
//! - **Request types**: builder-pattern structs for the endpoints that take
//!   parameters (e.g. [`request::MatchesRequest`], [`request::PredictionRequest`]).
//! - **Response types**: structs representing API responses
//!   (e.g. [`response::Match`], [`response::Stats`]).
//!
//! ```
//! use apibet_client::api::types::request::MatchesRequest;
//!
//! let request = MatchesRequest::builder().limit(500).league("euro").build();
//! ```

use serde::{Deserialize, Serialize};

pub mod request;
pub mod response;

/// Lifecycle of a virtual match as reported by the scraper.
///
/// Anything other than [`Finished`](Self::Finished) counts as "scheduled" for
/// filtering purposes: live and expired matches have no confirmed result yet.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum MatchStatus {
    /// Odds published, kick-off in the future
    #[default]
    Scheduled,
    /// In play or about to start
    Live,
    /// Kick-off time passed but no result was scraped yet
    Expired,
    /// Result confirmed
    Finished,
    /// Unknown status from the API (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

impl MatchStatus {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Final 1X2 result of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum Outcome {
    Home,
    Draw,
    Away,
    /// Unknown result from the API (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

/// Outcome of a scraper start/stop command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[non_exhaustive]
pub enum ScraperCommandStatus {
    Started,
    AlreadyRunning,
    Stopped,
    /// The scraper did not stop within the grace period and was killed
    ForcedStop,
    NotRunning,
    /// Unknown status from the API (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

impl ScraperCommandStatus {
    /// Whether the command changed the scraper's state.
    #[must_use]
    pub fn took_effect(&self) -> bool {
        matches!(self, Self::Started | Self::Stopped | Self::ForcedStop)
    }
}

/// Severity tag attached to a recommendation line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum Advice {
    Success,
    Warning,
    Info,
    /// Unknown tag from the API (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_status_keeps_unknown_values() {
        let status: MatchStatus = serde_json::from_str(r#""postponed""#).unwrap();
        assert_eq!(status, MatchStatus::Unknown("postponed".to_owned()));
        assert!(!status.is_finished());

        let status: MatchStatus = serde_json::from_str(r#""finished""#).unwrap();
        assert!(status.is_finished());
        assert_eq!(status.to_string(), "finished");
    }

    #[test]
    fn scraper_command_status_snake_case() {
        let status: ScraperCommandStatus = serde_json::from_str(r#""forced_stop""#).unwrap();
        assert_eq!(status, ScraperCommandStatus::ForcedStop);
        assert!(status.took_effect());

        let status: ScraperCommandStatus = serde_json::from_str(r#""already_running""#).unwrap();
        assert!(!status.took_effect());
    }
}
