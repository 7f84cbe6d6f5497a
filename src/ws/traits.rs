//! Decoding seam between the connection manager and message types.

use serde::de::DeserializeOwned;

/// Turns an inbound text frame into zero or more typed messages.
///
/// The realtime module's `EventParser` is the production implementation:
///
/// ```ignore
/// impl MessageParser<InboundEvent> for EventParser {
///     fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<InboundEvent>> {
///         parse_events(bytes)
///     }
/// }
/// ```
pub trait MessageParser<M: DeserializeOwned>: Send + Sync + 'static {
    /// Decode one frame. Returning an empty vector is valid (e.g. blank frames).
    ///
    /// An `Err` marks the frame as undecodable; the connection manager logs and
    /// drops it, and the connection stays up.
    fn parse(&self, bytes: &[u8]) -> crate::Result<Vec<M>>;
}
