//! ApiBet REST API client and types.
//!
//! **Feature flag:** `api`
//!
//! ## Available Endpoints
//!
//! | Endpoint | Description |
//! |----------|-------------|
//! | `GET /api/matches` | List matches with odds and results |
//! | `GET /api/matches/{id}` | Get match by id |
//! | `GET /api/stats` | Aggregate counters and last scraper run |
//! | `POST /api/predict` | Server-side prediction for a kick-off time |
//! | `POST /api/scraper/start` | Start the scraper |
//! | `POST /api/scraper/stop` | Stop the scraper |
//! | `GET /api/scraper/status` | Scraper state |
//! | `GET /api/logs` | Recent scraper runs |
//! | `GET /api/analytics/overview` | Accuracy KPIs, league distribution, average odds |
//! | `GET /api/predictions/stats` | Prediction validation counters |
//! | `GET /api/recommendations` | Suggested bets above a confidence threshold |
//! | `GET /api/export/csv` | Server-rendered CSV export |
//! | `GET data/matches.json` | Static export used without (or instead of) the live API |
//!
//! # Example
//!
//! ```no_run
//! use apibet_client::Config;
//! use apibet_client::api::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(&Config::from_env()?)?;
//!
//! let stats = client.stats().await?;
//! println!("{} matches, {} finished", stats.total_matches, stats.finished_matches);
//! # Ok(())
//! # }
//! ```

pub mod client;
#[cfg(feature = "realtime")]
pub mod loader;
pub mod types;

pub use client::Client;
