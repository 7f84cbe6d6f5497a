//! Maps inbound events to reactions.
//!
//! Dispatch is pure: it decides what should happen and leaves doing it to the
//! caller ([`Client`](super::Client) in production).

use super::types::InboundEvent;

/// Severity of a user-facing notification.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-facing message.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Visibility state the dispatcher consults.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct View {
    /// Whether the analytics panel is on screen
    pub analytics_visible: bool,
}

impl View {
    #[must_use]
    pub const fn new(analytics_visible: bool) -> Self {
        Self { analytics_visible }
    }
}

/// What to do in response to an event.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Reload the match list and aggregate counters
    pub reload_matches: bool,
    /// Reload prediction validation counters
    pub reload_prediction_stats: bool,
    pub notification: Option<Notification>,
}

impl Reaction {
    /// No side effects besides logging.
    #[must_use]
    pub fn observe() -> Self {
        Self::default()
    }

    /// `true` when the reaction has no side effects.
    #[must_use]
    pub fn is_observe_only(&self) -> bool {
        !self.reload_matches && !self.reload_prediction_stats && self.notification.is_none()
    }

    fn reload(level: Level, message: String, view: View, with_stats: bool) -> Self {
        Self {
            reload_matches: true,
            reload_prediction_stats: with_stats && view.analytics_visible,
            notification: Some(Notification::new(level, message)),
        }
    }
}

/// Decide the reaction to `event` for the current `view`.
#[must_use]
pub fn dispatch(event: &InboundEvent, view: View) -> Reaction {
    match event {
        InboundEvent::NewMatches { count } => Reaction::reload(
            Level::Info,
            format!(
                "{count} new {} added",
                plural(*count, "match", "matches")
            ),
            view,
            false,
        ),
        InboundEvent::ResultsUpdated { count } => Reaction::reload(
            Level::Success,
            format!("{count} {} updated", plural(*count, "result", "results")),
            view,
            true,
        ),
        InboundEvent::ResultUpdated { fixture, score } => {
            let message = if score.is_empty() {
                format!("{fixture}: result updated")
            } else {
                format!("{fixture}: {score}")
            };
            Reaction::reload(Level::Info, message, view, true)
        }
        InboundEvent::Connected { .. }
        | InboundEvent::Pong
        | InboundEvent::Heartbeat
        | InboundEvent::Unknown(_) => Reaction::observe(),
    }
}

fn plural<'a>(count: u64, one: &'a str, many: &'a str) -> &'a str {
    if count > 1 { many } else { one }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_matches_reloads_and_pluralizes() {
        let reaction = dispatch(&InboundEvent::NewMatches { count: 3 }, View::new(true));
        assert!(reaction.reload_matches);
        assert!(!reaction.reload_prediction_stats);
        assert_eq!(
            reaction.notification,
            Some(Notification::new(Level::Info, "3 new matches added"))
        );

        let reaction = dispatch(&InboundEvent::NewMatches { count: 1 }, View::default());
        assert_eq!(
            reaction.notification.map(|n| n.message),
            Some("1 new match added".to_owned())
        );
    }

    #[test]
    fn results_reload_stats_only_when_analytics_visible() {
        let event = InboundEvent::ResultsUpdated { count: 2 };

        let hidden = dispatch(&event, View::new(false));
        assert!(hidden.reload_matches);
        assert!(!hidden.reload_prediction_stats);
        assert_eq!(
            hidden.notification,
            Some(Notification::new(Level::Success, "2 results updated"))
        );

        let visible = dispatch(&event, View::new(true));
        assert!(visible.reload_matches);
        assert!(visible.reload_prediction_stats);
    }

    #[test]
    fn single_result_names_fixture_and_score() {
        let event = InboundEvent::ResultUpdated {
            fixture: "Lions x Tigers".to_owned(),
            score: "2-1".to_owned(),
        };
        let reaction = dispatch(&event, View::new(true));

        assert!(reaction.reload_matches);
        assert!(reaction.reload_prediction_stats);
        assert_eq!(
            reaction.notification,
            Some(Notification::new(Level::Info, "Lions x Tigers: 2-1"))
        );
    }

    #[test]
    fn recognized_events_with_odd_payloads_still_reload() {
        let frame = br#"[
            {"type":"result_updated","match":"Lions x Tigers"},
            {"type":"new_matches","count":"3"},
            {"type":"results_updated","count":null}
        ]"#;
        let events = crate::realtime::parse_events(frame).unwrap();
        let reactions: Vec<_> = events
            .iter()
            .map(|event| dispatch(event, View::new(true)))
            .collect();

        assert!(reactions.iter().all(|reaction| reaction.reload_matches));
        assert_eq!(
            reactions[0].notification,
            Some(Notification::new(Level::Info, "Lions x Tigers: result updated"))
        );
        assert!(reactions[0].reload_prediction_stats);
        assert_eq!(
            reactions[1].notification.as_ref().map(|n| n.message.as_str()),
            Some("3 new matches added")
        );
        assert!(reactions[2].reload_prediction_stats);
    }

    #[test]
    fn control_and_unknown_events_are_observed_only() {
        let events = [
            InboundEvent::Connected { message: None },
            InboundEvent::Pong,
            InboundEvent::Heartbeat,
            InboundEvent::Unknown(json!({"type": "maintenance"})),
        ];

        for event in events {
            assert!(
                dispatch(&event, View::new(true)).is_observe_only(),
                "{event:?} should be observe-only"
            );
        }
    }

    #[test]
    fn zero_count_reads_singular() {
        let reaction = dispatch(&InboundEvent::ResultsUpdated { count: 0 }, View::default());
        assert_eq!(
            reaction.notification.map(|n| n.message),
            Some("0 result updated".to_owned())
        );
    }
}
