//! Core WebSocket infrastructure.
//!
//! **Feature flag:** `ws`
//!
//! Generic connection management, independent of what travels over the wire.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: one background task per connection handling connect,
//!   bounded reconnects, liveness pings and message fan-out
//! - [`machine::StateMachine`]: the pure reconnect state machine the task drives
//! - [`Transport`] / [`Link`]: how a connection is opened and read;
//!   [`TungsteniteTransport`] in production, in-memory fakes in tests
//! - [`MessageParser`]: turns text frames into typed messages
//!
//! # Example
//!
//! ```ignore
//! let connection = ConnectionManager::new(
//!     "ws://localhost:8000/ws".to_owned(),
//!     Config::default(),
//!     EventParser,
//!     TungsteniteTransport,
//! );
//! connection.connect()?;
//!
//! let mut status = connection.status_events();
//! while let Ok(event) = status.recv().await {
//!     println!("{event:?}");
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod machine;
pub mod traits;
pub mod transport;

pub use connection::{ConnectionManager, ConnectionState, StatusEvent};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
pub use traits::*;
pub use transport::{Link, OpenError, Transport, TransportEvent, TungsteniteTransport};
