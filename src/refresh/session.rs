use std::collections::BTreeMap;
use std::sync::Arc;

use bon::Builder;

use crate::api::types::response::{Match, PredictionStats, Stats};
use crate::types::{DateTime, Utc};

/// Where the data in a [`Session`] came from.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum DataSource {
    /// Live REST API
    #[strum(to_string = "API")]
    Api,
    /// Static JSON export, by configuration
    #[strum(to_string = "static export")]
    Static,
    /// Static JSON export used because the live API failed
    #[strum(to_string = "cache")]
    Cache,
}

/// An immutable snapshot of everything the dashboard shows.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub matches: Arc<[Match]>,
    pub stats: Stats,
    pub prediction_stats: Option<PredictionStats>,
    /// `None` until the first successful load
    pub source: Option<DataSource>,
    pub loaded_at: Option<DateTime<Utc>>,
    /// Sequence number of the match reload this snapshot came from
    pub sequence: u64,
    /// Sequence number of the prediction stats reload this snapshot carries
    pub stats_sequence: u64,
}

impl Session {
    /// Whether any load has been applied yet.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.source.is_some()
    }

    /// Matches passing `filter`, in kick-off order.
    #[must_use]
    pub fn filtered(&self, filter: &MatchFilter) -> Vec<&Match> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let mut matches: Vec<&Match> = self
            .matches
            .iter()
            .filter(|m| filter.league.as_ref().is_none_or(|league| &m.league == league))
            .filter(|m| filter.status.accepts(m))
            .filter(|m| search.as_deref().is_none_or(|term| m.involves_team(term)))
            .collect();

        matches.sort_by_key(|m| m.kickoff_minutes().unwrap_or(u32::MAX));
        matches
    }

    /// Number of matches per league.
    #[must_use]
    pub fn league_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for m in self.matches.iter() {
            *counts.entry(m.league.as_str()).or_default() += 1;
        }
        counts
    }
}

/// Result-state filter of the match table.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    /// Matches with a confirmed result
    Finished,
    /// Everything without a confirmed result (scheduled, live, expired)
    Scheduled,
}

impl StatusFilter {
    fn accepts(self, m: &Match) -> bool {
        match self {
            Self::All => true,
            Self::Finished => m.status.is_finished(),
            Self::Scheduled => !m.status.is_finished(),
        }
    }
}

/// View filter over [`Session::matches`].
///
/// ```
/// use apibet_client::refresh::{MatchFilter, StatusFilter};
///
/// let filter = MatchFilter::builder()
///     .league("euro")
///     .status(StatusFilter::Finished)
///     .search("lions")
///     .build();
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq, Builder)]
pub struct MatchFilter {
    /// Exact league name; `None` shows all leagues
    #[builder(into)]
    pub league: Option<String>,
    #[builder(default)]
    pub status: StatusFilter,
    /// Case-insensitive substring of either team name
    #[builder(into)]
    pub search: Option<String>,
}
