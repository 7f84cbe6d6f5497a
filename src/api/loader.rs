//! REST-backed [`DataLoader`].

use async_trait::async_trait;

use super::Client;
use super::types::request::MatchesRequest;
use super::types::response::{PredictionStats, StaticData};
use crate::Result;
use crate::config::Config;
use crate::refresh::{DataLoader, DataSource, MatchData};

/// Loads dashboard data from the live API, falling back to the static export.
///
/// In live mode a reload fetches the match list and then the counters; failing
/// counters are tolerated (the previous ones stay). If the match list cannot be
/// fetched, the static export is tried once and its data is labelled
/// [`DataSource::Cache`]. In static mode only the export is read.
#[derive(Clone, Debug)]
pub struct DashboardLoader {
    client: Client,
    match_limit: u32,
}

impl DashboardLoader {
    /// Create a loader with its own [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self::with_client(Client::new(config)?, config.match_limit))
    }

    #[must_use]
    pub fn with_client(client: Client, match_limit: u32) -> Self {
        Self {
            client,
            match_limit,
        }
    }

    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn load_live(&self) -> Result<MatchData> {
        let request = MatchesRequest::builder().limit(self.match_limit).build();
        let matches = self.client.matches(&request).await?;

        let stats = match self.client.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "Stats unavailable, keeping previous counters");
                #[cfg(not(feature = "tracing"))]
                let _ = &e;
                None
            }
        };

        Ok(MatchData::new(matches, stats, DataSource::Api))
    }

    async fn load_static(&self, source: DataSource) -> Result<MatchData> {
        let StaticData {
            matches, stats, ..
        } = self.client.static_data().await?;
        Ok(MatchData::new(matches, Some(stats), source))
    }
}

#[async_trait]
impl DataLoader for DashboardLoader {
    async fn load_matches(&self) -> Result<MatchData> {
        if !self.client.uses_api() {
            return self.load_static(DataSource::Static).await;
        }

        match self.load_live().await {
            Ok(data) => Ok(data),
            Err(live_error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %live_error, "Live API failed, trying static export");

                self.load_static(DataSource::Cache).await.map_err(|fallback_error| {
                    #[cfg(feature = "tracing")]
                    tracing::error!(error = %fallback_error, "API offline and no cached data");
                    #[cfg(not(feature = "tracing"))]
                    let _ = &fallback_error;
                    live_error
                })
            }
        }
    }

    async fn load_prediction_stats(&self) -> Result<Option<PredictionStats>> {
        let response = self.client.prediction_stats().await?;

        #[cfg(feature = "tracing")]
        if response.stats.is_none() {
            tracing::warn!("Prediction stats response carried no counters, keeping previous ones");
        }

        Ok(response.stats)
    }
}
