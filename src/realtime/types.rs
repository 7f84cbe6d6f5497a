//! Messages pushed by the real-time server.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, DisplayFromStr, PickFirst, serde_as};

use crate::Result;
use crate::ws::{MessageParser, WsError};

/// A decoded server push.
///
/// Every valid JSON frame decodes. Frames whose `type` is missing or
/// unrecognized become [`InboundEvent::Unknown`]; a recognized `type` with an
/// odd payload keeps its variant with defaulted fields. Only malformed JSON
/// fails to decode.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Handshake greeting sent right after the socket opens
    Connected {
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// The scraper stored new fixtures
    NewMatches { count: u64 },
    /// A batch of results was stored
    ResultsUpdated { count: u64 },
    /// A single result was stored
    ResultUpdated {
        /// Human-readable fixture, e.g. `"Lions x Tigers"`
        #[serde(rename = "match")]
        fixture: String,
        score: String,
    },
    /// Reply to a `ping`
    Pong,
    /// Server keep-alive
    Heartbeat,
    /// Anything else, kept verbatim
    #[serde(untagged)]
    Unknown(Value),
}

/// Wire shape of the known events.
///
/// Only the tag is strict. Payload fields that are missing or mistyped fall
/// back to their defaults so a recognized event still reaches dispatch.
#[serde_as]
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Known {
    Connected {
        #[serde_as(as = "DefaultOnError")]
        #[serde(default)]
        message: Option<String>,
    },
    NewMatches {
        #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
        #[serde(default)]
        count: u64,
    },
    ResultsUpdated {
        #[serde_as(as = "DefaultOnError<PickFirst<(_, DisplayFromStr)>>")]
        #[serde(default)]
        count: u64,
    },
    ResultUpdated {
        #[serde_as(as = "DefaultOnError")]
        #[serde(rename = "match", default)]
        fixture: String,
        #[serde_as(as = "DefaultOnError")]
        #[serde(default)]
        score: String,
    },
    Pong,
    Heartbeat,
}

impl From<Known> for InboundEvent {
    fn from(known: Known) -> Self {
        match known {
            Known::Connected { message } => Self::Connected { message },
            Known::NewMatches { count } => Self::NewMatches { count },
            Known::ResultsUpdated { count } => Self::ResultsUpdated { count },
            Known::ResultUpdated { fixture, score } => Self::ResultUpdated { fixture, score },
            Known::Pong => Self::Pong,
            Known::Heartbeat => Self::Heartbeat,
        }
    }
}

impl InboundEvent {
    /// Classify an already-parsed JSON value.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        match Known::deserialize(&value) {
            Ok(known) => known.into(),
            Err(_) => Self::Unknown(value),
        }
    }

    /// The wire `type` tag, if any.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::Connected { .. } => Some("connected"),
            Self::NewMatches { .. } => Some("new_matches"),
            Self::ResultsUpdated { .. } => Some("results_updated"),
            Self::ResultUpdated { .. } => Some("result_updated"),
            Self::Pong => Some("pong"),
            Self::Heartbeat => Some("heartbeat"),
            Self::Unknown(value) => value.get("type").and_then(Value::as_str),
        }
    }
}

impl<'de> Deserialize<'de> for InboundEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Parse a text frame into events.
///
/// Accepts a single object or an array of objects. Empty frames yield nothing.
///
/// # Errors
///
/// Returns an error if the frame is not valid JSON.
pub fn parse_events(bytes: &[u8]) -> Result<Vec<InboundEvent>> {
    let trimmed = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map_or(&[][..], |start| &bytes[start..]);

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let events: Vec<InboundEvent> = if trimmed.first() == Some(&b'[') {
        serde_json::from_slice(trimmed).map_err(WsError::MessageParse)?
    } else {
        vec![serde_json::from_slice(trimmed).map_err(WsError::MessageParse)?]
    };
    Ok(events)
}

/// [`MessageParser`] for the real-time channel.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct EventParser;

impl MessageParser<InboundEvent> for EventParser {
    fn parse(&self, bytes: &[u8]) -> Result<Vec<InboundEvent>> {
        parse_events(bytes)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse_one(text: &str) -> InboundEvent {
        let mut events = parse_events(text.as_bytes()).unwrap();
        assert_eq!(events.len(), 1, "expected a single event");
        events.remove(0)
    }

    #[test]
    fn decodes_known_events() {
        assert_eq!(
            parse_one(r#"{"type":"connected","message":"welcome"}"#),
            InboundEvent::Connected {
                message: Some("welcome".to_owned())
            }
        );
        assert_eq!(
            parse_one(r#"{"type":"new_matches","count":3}"#),
            InboundEvent::NewMatches { count: 3 }
        );
        assert_eq!(
            parse_one(r#"{"type":"results_updated","count":1,"league":"euro"}"#),
            InboundEvent::ResultsUpdated { count: 1 }
        );
        assert_eq!(
            parse_one(r#"{"type":"result_updated","match":"Lions x Tigers","score":"2-1"}"#),
            InboundEvent::ResultUpdated {
                fixture: "Lions x Tigers".to_owned(),
                score: "2-1".to_owned()
            }
        );
        assert_eq!(parse_one(r#"{"type":"pong"}"#), InboundEvent::Pong);
        assert_eq!(parse_one(r#" {"type":"heartbeat"} "#), InboundEvent::Heartbeat);
    }

    #[test]
    fn unrecognized_or_untyped_frames_are_unknown() {
        let event = parse_one(r#"{"type":"maintenance","eta":30}"#);
        assert_eq!(event, InboundEvent::Unknown(json!({"type": "maintenance", "eta": 30})));
        assert_eq!(event.kind(), Some("maintenance"));

        let event = parse_one(r#"{"count":3}"#);
        assert!(matches!(event, InboundEvent::Unknown(_)));
        assert_eq!(event.kind(), None);

        assert!(matches!(parse_one("42"), InboundEvent::Unknown(_)));
    }

    #[test]
    fn known_tags_tolerate_odd_payloads() {
        assert_eq!(
            parse_one(r#"{"type":"result_updated","match":"Lions x Tigers"}"#),
            InboundEvent::ResultUpdated {
                fixture: "Lions x Tigers".to_owned(),
                score: String::new()
            }
        );
        assert_eq!(
            parse_one(r#"{"type":"result_updated","match":7,"score":null}"#),
            InboundEvent::ResultUpdated {
                fixture: String::new(),
                score: String::new()
            }
        );
        assert_eq!(
            parse_one(r#"{"type":"new_matches","count":"3"}"#),
            InboundEvent::NewMatches { count: 3 }
        );
        assert_eq!(
            parse_one(r#"{"type":"new_matches"}"#),
            InboundEvent::NewMatches { count: 0 }
        );
        assert_eq!(
            parse_one(r#"{"type":"results_updated","count":null}"#),
            InboundEvent::ResultsUpdated { count: 0 }
        );
        assert_eq!(
            parse_one(r#"{"type":"results_updated","count":"many"}"#),
            InboundEvent::ResultsUpdated { count: 0 }
        );
        assert_eq!(
            parse_one(r#"{"type":"connected","message":{"text":"hi"}}"#),
            InboundEvent::Connected { message: None }
        );
    }

    #[test]
    fn malformed_json_fails() {
        let error = parse_events(b"{\"type\":\"new_matches\",").unwrap_err();
        assert_eq!(error.kind(), crate::error::Kind::WebSocket);
        assert!(error.downcast_ref::<WsError>().is_some(), "{error}");

        parse_events(b"pong").unwrap_err();
    }

    #[test]
    fn arrays_and_empty_frames() {
        let events = parse_events(br#"[{"type":"pong"},{"type":"new_matches","count":2}]"#).unwrap();
        assert_eq!(
            events,
            vec![InboundEvent::Pong, InboundEvent::NewMatches { count: 2 }]
        );

        assert!(parse_events(b"  \n").unwrap().is_empty());
    }

    #[test]
    fn serializes_with_wire_tags() {
        let json = serde_json::to_value(InboundEvent::ResultUpdated {
            fixture: "Lions x Tigers".to_owned(),
            score: "0-0".to_owned(),
        })
        .unwrap();
        assert_eq!(
            json,
            json!({"type": "result_updated", "match": "Lions x Tigers", "score": "0-0"})
        );
    }
}
