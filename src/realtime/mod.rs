//! Real-time channel for dashboard updates.
//!
//! **Feature flag:** `realtime`
//!
//! The server pushes small JSON events over a WebSocket whenever the scraper
//! stores new fixtures or results. This module decodes them ([`InboundEvent`]),
//! decides how to react ([`dispatch`]) and wires the reactions into a
//! [`RefreshCoordinator`](crate::refresh::RefreshCoordinator) through [`Client`].
//!
//! | Event | Reaction |
//! |-------|----------|
//! | `connected` | logged |
//! | `new_matches` | full reload, info notification |
//! | `results_updated` | full reload, prediction stats if analytics is visible, success notification |
//! | `result_updated` | same as `results_updated`, notification names the fixture and score |
//! | `pong`, `heartbeat`, anything else | logged |
//!
//! The connection sends a literal `ping` every 25 seconds while open and
//! reconnects up to five times with a linearly growing delay.

pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::Client;
pub use dispatcher::{Level, Notification, Reaction, View, dispatch};
pub use types::{EventParser, InboundEvent, parse_events};
