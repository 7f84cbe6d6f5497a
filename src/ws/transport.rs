//! Transport capability used by the connection manager.
//!
//! A [`Transport`] opens [`Link`]s; a link sends text frames, closes, and yields
//! [`TransportEvent`]s. The manager never touches a socket directly, so tests and
//! alternative runtimes can plug in their own transport.

use std::fmt;

use async_trait::async_trait;
use futures::{SinkExt as _, StreamExt as _};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest as _;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::error::WsError;
use crate::Result;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Something that happened on an open link.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// An inbound text frame
    Text(String),
    /// A transport error; a [`TransportEvent::Closed`] follows when it is fatal
    Error(String),
    /// The link is closed
    Closed {
        /// Close code sent by the peer, if any
        code: Option<u16>,
        /// Close reason sent by the peer
        reason: String,
    },
}

/// Why a link could not be opened.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// The transport could not even be constructed (e.g. malformed endpoint).
    /// Not retried.
    Construct(String),
    /// The connection attempt failed; handled like an error followed by a close.
    Connect(String),
}

impl fmt::Display for OpenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct(reason) => write!(f, "cannot construct transport: {reason}"),
            Self::Connect(reason) => write!(f, "connection failed: {reason}"),
        }
    }
}

impl std::error::Error for OpenError {}

#[async_trait]
pub trait Link: Send + 'static {
    /// Send a text frame.
    async fn send(&mut self, text: String) -> Result<()>;

    /// Close the link. Further events are not expected.
    async fn close(&mut self) -> Result<()>;

    /// Wait for the next event. `None` means the link ended without a close frame.
    ///
    /// Must be cancel-safe: the manager polls it inside `select!`.
    async fn next_event(&mut self) -> Option<TransportEvent>;
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Link: Link;

    async fn open(&self, endpoint: &str) -> std::result::Result<Self::Link, OpenError>;
}

/// Production transport backed by `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteTransport;

#[async_trait]
impl Transport for TungsteniteTransport {
    type Link = TungsteniteLink;

    async fn open(&self, endpoint: &str) -> std::result::Result<Self::Link, OpenError> {
        let request = endpoint
            .into_client_request()
            .map_err(|e| OpenError::Construct(e.to_string()))?;

        let (stream, _) = connect_async(request)
            .await
            .map_err(|e| OpenError::Connect(e.to_string()))?;

        Ok(TungsteniteLink {
            stream,
            failed: false,
        })
    }
}

pub struct TungsteniteLink {
    stream: WsStream,
    /// Set after a stream error; the next event reports the implied close.
    failed: bool,
}

#[async_trait]
impl Link for TungsteniteLink {
    async fn send(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(WsError::Connection)?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.close(None).await.map_err(WsError::Connection)?;
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.failed {
            return Some(TransportEvent::Closed {
                code: None,
                reason: "transport error".to_owned(),
            });
        }

        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(TransportEvent::Text(text.to_string())),
                Ok(Message::Close(frame)) => {
                    let (code, reason) = frame.map_or((None, String::new()), |frame| {
                        (Some(u16::from(frame.code)), frame.reason.to_string())
                    });
                    return Some(TransportEvent::Closed { code, reason });
                }
                Ok(_) => {
                    // Binary frames and protocol-level ping/pong carry nothing for us.
                }
                Err(e) => {
                    self.failed = true;
                    return Some(TransportEvent::Error(e.to_string()));
                }
            }
        }
    }
}
