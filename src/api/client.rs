//! Client for the ApiBet REST API.
//!
//! # Example
//!
//! ```no_run
//! use apibet_client::Config;
//! use apibet_client::api::{Client, types::request::MatchesRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(&Config::default())?;
//!
//! let request = MatchesRequest::builder().limit(500).build();
//! for fixture in client.matches(&request).await? {
//!     println!("{}:{} {} vs {}", fixture.hour, fixture.minute, fixture.team_home, fixture.team_away);
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::{
    Client as ReqwestClient, Method, StatusCode,
    header::{HeaderMap, HeaderValue},
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::types::request::{
    ExportRequest, LogsRequest, MatchesRequest, PredictionRequest, RecommendationsRequest,
};
use super::types::response::{
    AnalyticsOverview, CsvExport, Envelope, LogsResponse, Match, PredictionResponse,
    PredictionStatsResponse, Recommendation, RecommendationsResponse, ResponseStatus,
    ScraperCommandResponse, ScraperLog, ScraperStatus, StaticData, Stats,
};
use crate::config::Config;
use crate::error::Error;
use crate::{Result, ToQueryParams as _};

/// HTTP client for the ApiBet REST API and its static JSON export.
///
/// Live-only endpoints (prediction, scraper control, logs, analytics, export)
/// fail with a validation error when the configuration disables the live API.
#[derive(Clone, Debug)]
pub struct Client {
    host: Url,
    static_data_url: Url,
    use_api: bool,
    client: ReqwestClient,
}

impl Default for Client {
    fn default() -> Self {
        Client::new(&Config::default()).expect("Client with default configuration should succeed")
    }
}

impl Client {
    /// Creates a client for the endpoints in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the static data URL cannot be resolved or the HTTP
    /// client cannot be created.
    pub fn new(config: &Config) -> Result<Client> {
        let mut headers = HeaderMap::new();

        headers.insert("User-Agent", HeaderValue::from_static("apibet_client"));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Connection", HeaderValue::from_static("keep-alive"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = ReqwestClient::builder().default_headers(headers).build()?;

        Ok(Self {
            host: config.api_root(),
            static_data_url: config.static_data_url()?,
            use_api: config.use_api,
            client,
        })
    }

    /// Returns the base URL of the API.
    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    /// Whether this client talks to the live backend.
    #[must_use]
    pub fn uses_api(&self) -> bool {
        self.use_api
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.host.join(path)?)
    }

    fn require_live(&self, operation: &str) -> Result<()> {
        if self.use_api {
            Ok(())
        } else {
            Err(Error::live_api_required(operation))
        }
    }

    async fn get<Req: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        req: &Req,
    ) -> Result<Res> {
        let query = req.query_params();
        let request = self
            .client
            .request(Method::GET, format!("{}{query}", self.endpoint(path)?))
            .build()?;
        crate::execute(&self.client, request).await
    }

    async fn post<Body: Serialize, Res: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&Body>,
    ) -> Result<Res> {
        let mut builder = self.client.request(Method::POST, self.endpoint(path)?);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        crate::execute(&self.client, builder.build()?).await
    }

    /// Lists matches ordered by kick-off time.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn matches(&self, request: &MatchesRequest) -> Result<Vec<Match>> {
        self.get("api/matches", request).await
    }

    /// Retrieves a single match by its numeric id.
    ///
    /// # Errors
    ///
    /// Returns a [`Status`](crate::error::Status) error with `404` if the match does not exist.
    pub async fn match_by_id(&self, id: i64) -> Result<Match> {
        self.get(&format!("api/matches/{id}"), &()).await
    }

    /// Retrieves aggregate match counters, per-league breakdown and the last scraper run.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn stats(&self) -> Result<Stats> {
        self.get("api/stats", &()).await
    }

    /// Asks the server to predict the match kicking off at the requested time.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode, or if no match is scheduled at that time.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse> {
        self.require_live("prediction")?;
        self.post("api/predict", Some(request)).await
    }

    /// Starts the continuous scraper on the server.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode or if the request fails.
    pub async fn start_scraper(&self) -> Result<ScraperCommandResponse> {
        self.require_live("scraper control")?;
        self.post::<(), _>("api/scraper/start", None).await
    }

    /// Stops the scraper, forcibly if it does not stop in time.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode or if the request fails.
    pub async fn stop_scraper(&self) -> Result<ScraperCommandResponse> {
        self.require_live("scraper control")?;
        self.post::<(), _>("api/scraper/stop", None).await
    }

    /// Reports whether the scraper runs and how its last run went.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode or if the request fails.
    pub async fn scraper_status(&self) -> Result<ScraperStatus> {
        self.require_live("scraper status")?;
        self.get("api/scraper/status", &()).await
    }

    /// Lists the most recent scraper runs.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode or if the request fails.
    pub async fn logs(&self, request: &LogsRequest) -> Result<Vec<ScraperLog>> {
        self.require_live("scraper logs")?;
        let response: LogsResponse = self.get("api/logs", request).await?;
        Ok(response.logs)
    }

    /// Retrieves accuracy KPIs, league distribution and average odds.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode, if the request fails, or if the server
    /// answers with a non-success envelope.
    pub async fn analytics_overview(&self) -> Result<AnalyticsOverview> {
        const PATH: &str = "api/analytics/overview";

        self.require_live("analytics")?;
        let envelope: Envelope<AnalyticsOverview> = self.get(PATH, &()).await?;
        ensure_success(&envelope.status, envelope.error.as_deref(), PATH)?;
        envelope
            .data
            .ok_or_else(|| Error::status(StatusCode::OK, Method::GET, PATH.to_owned(), "missing data"))
    }

    /// Retrieves prediction validation counters and the scheduler state.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode, if the request fails, or if the server
    /// answers with a non-success status.
    pub async fn prediction_stats(&self) -> Result<PredictionStatsResponse> {
        const PATH: &str = "api/predictions/stats";

        self.require_live("prediction stats")?;
        let response: PredictionStatsResponse = self.get(PATH, &()).await?;
        ensure_success(&response.status, response.error.as_deref(), PATH)?;
        Ok(response)
    }

    /// Lists recommended bets at or above the requested confidence.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode, if the request fails, or if the server
    /// answers with a non-success status.
    pub async fn recommendations(
        &self,
        request: &RecommendationsRequest,
    ) -> Result<Vec<Recommendation>> {
        const PATH: &str = "api/recommendations";

        self.require_live("recommendations")?;
        let response: RecommendationsResponse = self.get(PATH, request).await?;
        ensure_success(&response.status, response.error.as_deref(), PATH)?;
        Ok(response.recommendations)
    }

    /// Asks the server to render matches as CSV. The file content is returned as-is.
    ///
    /// # Errors
    ///
    /// Returns an error in static mode, if the request fails, or if the server
    /// answers with a non-success status.
    pub async fn export_csv(&self, request: &ExportRequest) -> Result<CsvExport> {
        const PATH: &str = "api/export/csv";

        self.require_live("CSV export")?;
        let export: CsvExport = self.get(PATH, request).await?;
        ensure_success(&export.status, export.error.as_deref(), PATH)?;
        Ok(export)
    }

    /// Fetches the static JSON export. Works in both live and static mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub async fn static_data(&self) -> Result<StaticData> {
        let request = self
            .client
            .request(Method::GET, self.static_data_url.clone())
            .build()?;
        crate::execute(&self.client, request).await
    }
}

/// Map a `{"status": "error", "error": ...}` body to a [`Status`](crate::error::Status) error.
fn ensure_success(status: &ResponseStatus, error: Option<&str>, path: &str) -> Result<()> {
    if *status == ResponseStatus::Success {
        return Ok(());
    }

    let message = error.map_or_else(|| format!("unexpected status {status}"), str::to_owned);

    #[cfg(feature = "tracing")]
    tracing::warn!(path, %message, "API reported failure");

    Err(Error::status(
        StatusCode::OK,
        Method::GET,
        path.to_owned(),
        message,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Kind, Status};

    #[test]
    fn ensure_success_reports_server_error_message() {
        ensure_success(&ResponseStatus::Success, None, "api/recommendations").unwrap();

        let err = ensure_success(
            &ResponseStatus::Error,
            Some("scheduler offline"),
            "api/predictions/stats",
        )
        .unwrap_err();
        assert_eq!(err.kind(), Kind::Status);
        let status = err.downcast_ref::<Status>().unwrap();
        assert_eq!(status.message, "scheduler offline");
        assert_eq!(status.path, "api/predictions/stats");
    }

    #[test]
    fn static_mode_rejects_live_only_calls() {
        let config = Config::builder().use_api(false).build();
        let client = Client::new(&config).unwrap();

        let err = client.require_live("scraper control").unwrap_err();
        assert_eq!(err.kind(), Kind::Validation);
        assert!(err.to_string().contains("scraper control requires live API mode"));
    }

    #[test]
    fn endpoints_resolve_against_host() {
        let config = Config::builder()
            .api_base(Url::parse("http://odds.local:9000/").unwrap())
            .build();
        let client = Client::new(&config).unwrap();

        assert_eq!(
            client.endpoint("api/matches/42").unwrap().as_str(),
            "http://odds.local:9000/api/matches/42"
        );
        assert_eq!(
            client.static_data_url.as_str(),
            "http://odds.local:9000/data/matches.json"
        );
    }

    #[test]
    fn endpoints_keep_host_path_prefix() {
        let config = Config::builder()
            .api_base(Url::parse("http://h/odds").unwrap())
            .build();
        let client = Client::new(&config).unwrap();

        assert_eq!(client.host().as_str(), "http://h/odds/");
        assert_eq!(
            client.endpoint("api/matches").unwrap().as_str(),
            "http://h/odds/api/matches"
        );
    }
}
