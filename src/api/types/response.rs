#![allow(
    clippy::module_name_repetitions,
    reason = "Response suffix is intentional for clarity"
)]

use std::collections::BTreeMap;

use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{Advice, MatchStatus, Outcome, ScraperCommandStatus};
use crate::serde_helpers::StringFromAny;
use crate::types::{Decimal, NaiveDateTime};

/// A virtual-football match with its pre-match odds and, once finished, its result.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct Match {
    pub id: i64,
    #[builder(into)]
    pub external_id: Option<String>,
    #[builder(into)]
    pub league: String,
    #[builder(into)]
    pub team_home: String,
    #[builder(into)]
    pub team_away: String,
    /// Kick-off hour, zero-padded (`"21"`)
    #[serde_as(as = "StringFromAny")]
    #[builder(into)]
    pub hour: String,
    /// Kick-off minute, zero-padded (`"05"`)
    #[serde_as(as = "StringFromAny")]
    #[builder(into)]
    pub minute: String,
    pub scheduled_time: Option<String>,
    pub odd_home: Decimal,
    pub odd_draw: Decimal,
    pub odd_away: Decimal,
    pub odd_over_25: Option<Decimal>,
    pub odd_under_25: Option<Decimal>,
    pub odd_both_score_yes: Option<Decimal>,
    pub odd_both_score_no: Option<Decimal>,
    #[builder(default)]
    pub status: MatchStatus,
    pub goals_home: Option<u32>,
    pub goals_away: Option<u32>,
    pub total_goals: Option<u32>,
    pub result: Option<Outcome>,
    pub scraped_at: Option<String>,
}

impl Match {
    /// Minutes after midnight of the kick-off, used to order a day's fixtures.
    ///
    /// `None` unless the hour is within `0..24` and the minute within `0..60`.
    #[must_use]
    pub fn kickoff_minutes(&self) -> Option<u32> {
        let hour: u32 = self.hour.trim().parse().ok()?;
        let minute: u32 = self.minute.trim().parse().ok()?;
        (hour < 24 && minute < 60).then_some(hour * 60 + minute)
    }

    /// Whether `term` (already lower-cased) occurs in either team name.
    #[must_use]
    pub fn involves_team(&self, term: &str) -> bool {
        self.team_home.to_lowercase().contains(term) || self.team_away.to_lowercase().contains(term)
    }
}

/// Per-league counters in [`Stats::leagues`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct LeagueStats {
    #[serde(default)]
    #[builder(default)]
    pub total: u64,
    #[serde(default)]
    #[builder(default)]
    pub finished: u64,
    #[serde(default)]
    #[builder(default)]
    pub scheduled: u64,
}

/// Summary of the most recent scraper run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct LastExecution {
    pub date: Option<String>,
    pub status: Option<String>,
    pub matches_found: Option<u64>,
    /// `new_matches` in the static export
    #[serde(alias = "new_matches")]
    pub matches_new: Option<u64>,
    pub matches_updated: Option<u64>,
}

/// Aggregate match counters.
///
/// The live API reports `total_matches`/`finished_matches`/`scheduled_matches`;
/// the static export uses `total`/`finished`/`scheduled`. Both deserialize here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct Stats {
    #[serde(default, alias = "total")]
    #[builder(default)]
    pub total_matches: u64,
    #[serde(default, alias = "finished")]
    #[builder(default)]
    pub finished_matches: u64,
    #[serde(default, alias = "scheduled")]
    #[builder(default)]
    pub scheduled_matches: u64,
    #[serde(default)]
    #[builder(default)]
    pub leagues: BTreeMap<String, LeagueStats>,
    pub last_execution: Option<LastExecution>,
    /// Overall prediction accuracy in percent, when the backend reports one
    pub accuracy: Option<Decimal>,
}

/// Response from `POST /api/predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PredictionResponse {
    #[serde(rename = "match")]
    pub fixture: PredictedMatch,
    pub odds: PredictionOdds,
    pub prediction: Prediction,
    #[serde(default)]
    pub recommendations: Vec<AdviceLine>,
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PredictedMatch {
    pub id: i64,
    pub league: String,
    pub team_home: String,
    pub team_away: String,
    #[serde_as(as = "StringFromAny")]
    pub hour: String,
    #[serde_as(as = "StringFromAny")]
    pub minute: String,
}

/// An odd and the normalized probability the server derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct OddProbability {
    pub odd: Option<Decimal>,
    pub probability: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PredictionOdds {
    pub home: OddProbability,
    pub draw: OddProbability,
    pub away: OddProbability,
    pub under_25: Option<OddProbability>,
    pub over_25: Option<OddProbability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Prediction {
    /// Favourite as labelled by the server
    pub result: String,
    pub confidence: Decimal,
    pub is_favorite_strong: bool,
    pub goals: String,
    pub goals_confidence: Decimal,
    pub both_score: String,
    pub both_score_confidence: Decimal,
}

/// One line of advice attached to a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AdviceLine {
    #[serde(rename = "type")]
    pub kind: Advice,
    pub text: String,
}

/// Response from `POST /api/scraper/start` and `POST /api/scraper/stop`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ScraperCommandResponse {
    pub status: ScraperCommandStatus,
    pub message: Option<String>,
    pub pid: Option<u32>,
}

/// Response from `GET /api/scraper/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ScraperStatus {
    /// The server reports `null` when no scraper was ever started
    pub is_running: Option<bool>,
    pub pid: Option<u32>,
    pub last_execution: Option<LastExecution>,
}

impl ScraperStatus {
    #[must_use]
    pub fn running(&self) -> bool {
        self.is_running.unwrap_or(false)
    }
}

/// A single scraper run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct ScraperLog {
    pub id: Option<i64>,
    pub started_at: Option<NaiveDateTime>,
    pub finished_at: Option<NaiveDateTime>,
    pub status: String,
    pub matches_found: Option<u64>,
    pub matches_new: Option<u64>,
    pub matches_updated: Option<u64>,
    pub error_message: Option<String>,
}

impl ScraperLog {
    /// Wall-clock duration of the run; `None` while it is still running.
    #[must_use]
    pub fn duration(&self) -> Option<chrono::TimeDelta> {
        Some(self.finished_at? - self.started_at?)
    }
}

/// Response from `GET /api/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<ScraperLog>,
}

/// `status` field of the analytics endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[non_exhaustive]
pub enum ResponseStatus {
    Success,
    Error,
    /// Unknown status from the API (captures the raw value for debugging).
    #[serde(untagged)]
    Unknown(String),
}

/// `{ "status": ..., "data": ... }` wrapper used by the analytics endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Envelope<T> {
    pub status: ResponseStatus,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Accuracy {
    /// Share of correctly predicted winners, in percent
    pub winner: Decimal,
    /// Share of exactly predicted scores, in percent
    pub exact_score: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct LeagueCount {
    pub league: String,
    pub count: u64,
    #[serde(default)]
    pub finished: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AverageOdds {
    pub home: Option<Decimal>,
    pub draw: Option<Decimal>,
    pub away: Option<Decimal>,
}

/// Payload of `GET /api/analytics/overview`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct AnalyticsOverview {
    #[serde(default)]
    pub accuracy: Accuracy,
    #[serde(default)]
    pub total_matches: u64,
    #[serde(default)]
    pub finished_matches: u64,
    #[serde(default)]
    pub leagues: Vec<LeagueCount>,
    #[serde(default)]
    pub avg_odds: AverageOdds,
}

/// Prediction validation counters kept by the backend scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[non_exhaustive]
pub struct PredictionStats {
    #[serde(default)]
    #[builder(default)]
    pub total_predictions: u64,
    #[serde(default)]
    #[builder(default)]
    pub correct_winners: u64,
    #[serde(default)]
    #[builder(default)]
    pub correct_scores: u64,
    #[serde(default)]
    #[builder(default)]
    pub correct_over_under: u64,
}

impl PredictionStats {
    /// Correct winners as a rounded whole percentage of all predictions.
    #[must_use]
    pub fn winner_accuracy(&self) -> u64 {
        percent(self.correct_winners, self.total_predictions)
    }

    /// Correct over/under calls as a rounded whole percentage of all predictions.
    #[must_use]
    pub fn over_under_accuracy(&self) -> u64 {
        percent(self.correct_over_under, self.total_predictions)
    }
}

fn percent(part: u64, total: u64) -> u64 {
    let total = total.max(1);
    (part * 100 + total / 2) / total
}

/// Response from `GET /api/predictions/stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct PredictionStatsResponse {
    pub status: ResponseStatus,
    pub stats: Option<PredictionStats>,
    /// Whether the backend validation scheduler is running
    #[serde(default)]
    pub scheduler_running: bool,
    pub error: Option<String>,
}

/// A suggested bet on an upcoming match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Recommendation {
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub match_date: Option<String>,
    pub predicted_winner: Outcome,
    pub predicted_score: Option<String>,
    /// Confidence in percent
    pub confidence: Decimal,
    pub odds: Decimal,
    /// Expected value edge in percent
    pub value: Decimal,
}

/// Response from `GET /api/recommendations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RecommendationsResponse {
    pub status: ResponseStatus,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub error: Option<String>,
}

/// Response from `GET /api/export/csv`. The CSV is rendered server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct CsvExport {
    pub status: ResponseStatus,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub rows: u64,
    pub error: Option<String>,
}

/// The static JSON export served when the live backend is disabled or offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct StaticData {
    pub generated_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub stats: Stats,
    pub last_execution: Option<LastExecution>,
    #[serde(default)]
    pub matches: Vec<Match>,
}
