//! Session refresh coordination.
//!
//! **Feature flag:** `realtime`
//!
//! A [`RefreshCoordinator`] owns the in-memory [`Session`] (match list, aggregate
//! stats, prediction stats) and is the only writer of it. Reloads come from push
//! notifications, from the user, or both at once; the coordinator keeps them
//! consistent:
//!
//! - every reload carries a sequence number and only the newest completed reload
//!   is applied, so a slow early response never overwrites a fresh one;
//! - a triggered reload while one is already running is folded into a single
//!   follow-up reload;
//! - a new [`Session`] replaces the old one whole. Readers hold an `Arc` to a
//!   snapshot and never observe half an update.
//!
//! Data comes from a [`DataLoader`]; [`DashboardLoader`](crate::api::loader::DashboardLoader)
//! is the REST-backed implementation.

use async_trait::async_trait;

use crate::Result;
use crate::api::types::response::{Match, PredictionStats, Stats};

pub mod coordinator;
pub mod session;

pub use coordinator::{Outcome, RefreshCoordinator, RefreshEvent, ReloadTarget};
pub use session::{DataSource, MatchFilter, Session, StatusFilter};

/// Match list and counters returned by one load.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct MatchData {
    pub matches: Vec<Match>,
    /// `None` when the counters could not be fetched; the previous ones are kept
    pub stats: Option<Stats>,
    pub source: DataSource,
}

impl MatchData {
    #[must_use]
    pub fn new(matches: Vec<Match>, stats: Option<Stats>, source: DataSource) -> Self {
        Self {
            matches,
            stats,
            source,
        }
    }
}

/// Source of dashboard data.
#[async_trait]
pub trait DataLoader: Send + Sync + 'static {
    /// Load the match list and aggregate counters.
    async fn load_matches(&self) -> Result<MatchData>;

    /// Load prediction validation counters.
    ///
    /// `Ok(None)` means the source answered without counters; the previous ones
    /// are kept.
    async fn load_prediction_stats(&self) -> Result<Option<PredictionStats>>;
}
