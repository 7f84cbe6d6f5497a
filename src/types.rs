//! Third-party types that appear in this crate's public API.
//!
//! Re-exported so callers can name odds and timestamps without depending on
//! `rust_decimal` or `chrono` themselves.

/// Timestamps: scraper runs and exports use naive local times, sessions use UTC.
pub use chrono::{DateTime, NaiveDateTime, Utc};
/// Exact decimal for odds, probabilities and confidence percentages.
pub use rust_decimal::Decimal;
/// Compile-time [`Decimal`] literal.
///
/// ```
/// use apibet_client::types::dec;
/// let home_odd = dec!(1.85);
/// assert!(home_odd > dec!(1));
/// ```
pub use rust_decimal_macros::dec;
