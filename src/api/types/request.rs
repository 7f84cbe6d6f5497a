#![allow(
    clippy::module_name_repetitions,
    reason = "Request suffix is intentional for clarity"
)]

use bon::Builder;
use serde::Serialize;
use serde_with::skip_serializing_none;

use super::MatchStatus;

/// Query for `GET /api/matches`.
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct MatchesRequest {
    pub limit: Option<u32>,
    #[builder(into)]
    pub league: Option<String>,
    /// The server understands `finished` and `scheduled` here
    pub status: Option<MatchStatus>,
}

/// Body for `POST /api/predict`. The match is identified by its kick-off time.
#[derive(Debug, Clone, Builder, Serialize)]
#[non_exhaustive]
pub struct PredictionRequest {
    /// Two-digit hour, e.g. `"21"`
    #[builder(into)]
    pub hour: String,
    /// Two-digit minute, e.g. `"05"`
    #[builder(into)]
    pub minute: String,
}

/// Query for `GET /api/logs`.
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct LogsRequest {
    pub limit: Option<u32>,
}

/// Query for `GET /api/recommendations`.
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct RecommendationsRequest {
    /// Minimum confidence in percent
    pub min_confidence: Option<u32>,
}

/// Query for `GET /api/export/csv`.
#[skip_serializing_none]
#[derive(Debug, Clone, Builder, Default, Serialize)]
#[non_exhaustive]
pub struct ExportRequest {
    pub limit: Option<u32>,
}
