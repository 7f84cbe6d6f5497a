#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

use tokio_tungstenite::tungstenite;

use crate::error::{Error, Kind};

/// Failures of the real-time channel surfaced to callers.
///
/// Transport trouble during normal operation never shows up here: the
/// connection manager turns it into reconnects and [`StatusEvent`](super::StatusEvent)s.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Sending on or closing an open link failed
    Connection(tungstenite::Error),
    /// A text frame was not valid JSON
    MessageParse(serde_json::Error),
    /// The connection task is gone; no further commands are accepted
    ManagerStopped,
    /// A subscriber fell behind and missed messages
    Lagged {
        /// Number of messages that were missed
        count: u64,
    },
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "real-time link failed: {e}"),
            Self::MessageParse(e) => write!(f, "undecodable real-time frame: {e}"),
            Self::ManagerStopped => f.write_str("real-time connection task stopped"),
            Self::Lagged { count } => write!(f, "subscriber lagged, {count} messages missed"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e),
            Self::MessageParse(e) => Some(e),
            Self::ManagerStopped | Self::Lagged { .. } => None,
        }
    }
}

impl From<WsError> for Error {
    fn from(e: WsError) -> Self {
        Error::with_source(Kind::WebSocket, e)
    }
}

impl From<tungstenite::Error> for Error {
    fn from(e: tungstenite::Error) -> Self {
        WsError::Connection(e).into()
    }
}
