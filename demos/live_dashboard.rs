//! Headless live dashboard.
//!
//! Loads the match list, connects to the real-time channel and logs every
//! notification, status change and session refresh for a few minutes. Endpoints
//! come from `APIBET_*` variables (a `.env` file is honoured).
//!
//! ```sh
//! RUST_LOG=info,apibet_client=debug cargo run --example live_dashboard
//! ```

use std::time::Duration;

use apibet_client::Config;
use apibet_client::api::loader::DashboardLoader;
use apibet_client::realtime::Client;
use apibet_client::refresh::{MatchFilter, StatusFilter};
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const RUN_FOR: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    info!(api = %config.api_base, realtime = %config.realtime_url, use_api = config.use_api);

    let client = Client::new(&config, DashboardLoader::new(&config)?);
    client.set_analytics_visible(true);

    match client.refresh().await {
        Ok(outcome) => info!(?outcome, "Initial load"),
        Err(e) => warn!(error = %e, "Initial load failed"),
    }
    client.connect()?;

    let mut notifications = client.notifications();
    let mut status = client.status_events();
    let mut sessions = client.coordinator().subscribe();
    let deadline = Instant::now() + RUN_FOR;

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Ok(notification) = notification else { break };
                info!(level = %notification.level, "{}", notification.message);
            }
            event = status.recv() => {
                let Ok(event) = event else { break };
                info!(?event, state = ?client.connection_state(), "Connection");
            }
            changed = sessions.changed() => {
                if changed.is_err() {
                    break;
                }
                let session = sessions.borrow_and_update().clone();
                let upcoming = session.filtered(
                    &MatchFilter::builder().status(StatusFilter::Scheduled).build(),
                );
                info!(
                    source = ?session.source,
                    matches = session.matches.len(),
                    upcoming = upcoming.len(),
                    finished = session.stats.finished_matches,
                    leagues = ?session.league_counts(),
                    "Session refreshed"
                );
                if let Some(next) = upcoming.first() {
                    info!(
                        "Next: {} x {} at {}:{} ({} / {} / {})",
                        next.team_home,
                        next.team_away,
                        next.hour,
                        next.minute,
                        next.odd_home,
                        next.odd_draw,
                        next.odd_away
                    );
                }
            }
            () = sleep_until(deadline) => break,
        }
    }

    client.close()?;
    Ok(())
}
