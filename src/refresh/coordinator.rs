#![expect(
    clippy::module_name_repetitions,
    reason = "Coordinator types expose their domain in the name for clarity"
)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{broadcast, watch};

use super::{DataLoader, DataSource, MatchData, Session};
use crate::Result;
use crate::api::types::response::PredictionStats;
use crate::types::Utc;

const EVENT_CAPACITY: usize = 64;

/// What happened to a completed reload.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The result replaced the session
    Applied {
        /// Sequence number of the reload
        sequence: u64,
    },
    /// A newer reload was applied first; the result was discarded
    Stale {
        /// Sequence number of the reload
        sequence: u64,
    },
}

/// Observer notification about reloads.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshEvent {
    /// A match reload replaced the session
    Applied {
        /// Sequence number of the reload
        sequence: u64,
        /// Where the data came from
        source: DataSource,
        /// Number of matches in the new session
        matches: usize,
    },
    /// A match reload finished after a newer one and was discarded
    Stale {
        /// Sequence number of the discarded reload
        sequence: u64,
    },
    /// A reload failed; the session is unchanged
    LoadFailed {
        /// What was being loaded
        target: ReloadTarget,
        /// Error description
        message: String,
    },
}

/// Kind of data a reload fetches.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReloadTarget {
    Matches,
    PredictionStats,
}

#[derive(Debug, Default)]
struct Coalesce {
    running: bool,
    pending: bool,
}

struct Inner<L> {
    loader: L,
    session: watch::Sender<Arc<Session>>,
    next_sequence: AtomicU64,
    next_stats_sequence: AtomicU64,
    coalesce: Mutex<Coalesce>,
    events: broadcast::Sender<RefreshEvent>,
}

/// Single writer of the dashboard [`Session`].
///
/// Cheap to clone; clones share the session.
///
/// # Example
///
/// ```ignore
/// let coordinator = RefreshCoordinator::new(DashboardLoader::new(&config)?);
/// coordinator.reload().await?;
///
/// let session = coordinator.session();
/// println!("{} matches from {:?}", session.matches.len(), session.source);
/// ```
pub struct RefreshCoordinator<L> {
    inner: Arc<Inner<L>>,
}

impl<L> Clone for RefreshCoordinator<L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: DataLoader> RefreshCoordinator<L> {
    /// Create a coordinator with an empty session. Nothing is loaded until asked.
    pub fn new(loader: L) -> Self {
        let (session, _) = watch::channel(Arc::new(Session::default()));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                loader,
                session,
                next_sequence: AtomicU64::new(0),
                next_stats_sequence: AtomicU64::new(0),
                coalesce: Mutex::new(Coalesce::default()),
                events,
            }),
        }
    }

    #[must_use]
    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// The current snapshot.
    #[must_use]
    pub fn session(&self) -> Arc<Session> {
        Arc::clone(&self.inner.session.borrow())
    }

    /// Receiver notified each time a new snapshot is published.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Session>> {
        self.inner.session.subscribe()
    }

    /// Subscribe to reload notifications.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<RefreshEvent> {
        self.inner.events.subscribe()
    }

    /// Reload the match list now and wait for the result.
    ///
    /// Not coalesced with [`trigger_reload`](Self::trigger_reload), but still
    /// guarded: if a newer reload finishes first this one is reported as
    /// [`Outcome::Stale`] and discarded.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. The session is left untouched.
    pub async fn reload(&self) -> Result<Outcome> {
        self.inner.reload().await
    }

    /// Reload prediction stats now and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns the loader's error. The session is left untouched.
    pub async fn reload_prediction_stats(&self) -> Result<Outcome> {
        self.inner.reload_prediction_stats().await
    }

    /// Request a match reload in the background.
    ///
    /// While a triggered reload is running, further triggers are folded into one
    /// follow-up reload that starts when the current one finishes. Failures are
    /// reported through [`events`](Self::events).
    pub fn trigger_reload(&self) {
        {
            let mut coalesce = self.inner.lock_coalesce();
            if coalesce.running {
                coalesce.pending = true;
                #[cfg(feature = "tracing")]
                tracing::debug!("Reload already running, queued one follow-up");
                return;
            }
            coalesce.running = true;
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            loop {
                // Failures were already logged and published
                _ = inner.reload().await;

                let mut coalesce = inner.lock_coalesce();
                if coalesce.pending {
                    coalesce.pending = false;
                } else {
                    coalesce.running = false;
                    break;
                }
            }
        });
    }

    /// Request a prediction stats reload in the background.
    pub fn trigger_stats_reload(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            _ = inner.reload_prediction_stats().await;
        });
    }
}

impl<L: DataLoader> Inner<L> {
    fn lock_coalesce(&self) -> std::sync::MutexGuard<'_, Coalesce> {
        self.coalesce.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn reload(&self) -> Result<Outcome> {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed) + 1;

        #[cfg(feature = "tracing")]
        tracing::debug!(sequence, "Reloading matches");

        match self.loader.load_matches().await {
            Ok(data) => Ok(self.apply(sequence, data)),
            Err(e) => {
                self.report_failure(ReloadTarget::Matches, &e);
                Err(e)
            }
        }
    }

    async fn reload_prediction_stats(&self) -> Result<Outcome> {
        let sequence = self.next_stats_sequence.fetch_add(1, Ordering::Relaxed) + 1;

        match self.loader.load_prediction_stats().await {
            Ok(stats) => Ok(self.apply_prediction_stats(sequence, stats)),
            Err(e) => {
                self.report_failure(ReloadTarget::PredictionStats, &e);
                Err(e)
            }
        }
    }

    /// Replace the session with `data` unless a newer reload already landed.
    fn apply(&self, sequence: u64, data: MatchData) -> Outcome {
        let MatchData {
            matches,
            stats,
            source,
        } = data;
        let count = matches.len();

        let applied = self.session.send_if_modified(|current| {
            if sequence <= current.sequence {
                return false;
            }
            *current = Arc::new(Session {
                matches: matches.into(),
                stats: stats.unwrap_or_else(|| current.stats.clone()),
                prediction_stats: current.prediction_stats.clone(),
                source: Some(source),
                loaded_at: Some(Utc::now()),
                sequence,
                stats_sequence: current.stats_sequence,
            });
            true
        });

        if applied {
            #[cfg(feature = "tracing")]
            tracing::info!(sequence, %source, matches = count, "Session updated");
            _ = self.events.send(RefreshEvent::Applied {
                sequence,
                source,
                matches: count,
            });
            Outcome::Applied { sequence }
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!(sequence, "Discarding stale reload");
            _ = self.events.send(RefreshEvent::Stale { sequence });
            Outcome::Stale { sequence }
        }
    }

    fn apply_prediction_stats(&self, sequence: u64, stats: Option<PredictionStats>) -> Outcome {
        let applied = self.session.send_if_modified(|current| {
            if sequence <= current.stats_sequence {
                return false;
            }
            let mut next = Session::clone(current);
            if stats.is_some() {
                next.prediction_stats = stats;
            }
            next.stats_sequence = sequence;
            *current = Arc::new(next);
            true
        });

        if applied {
            Outcome::Applied { sequence }
        } else {
            Outcome::Stale { sequence }
        }
    }

    fn report_failure(&self, target: ReloadTarget, error: &crate::error::Error) {
        #[cfg(feature = "tracing")]
        tracing::warn!(%target, %error, "Reload failed");

        _ = self.events.send(RefreshEvent::LoadFailed {
            target,
            message: error.to_string(),
        });
    }
}
