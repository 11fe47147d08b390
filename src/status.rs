use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::DashboardError;
use crate::i18n::Translator;

pub const PLACEHOLDER: &str = "-";

const STATUS_RUNNING_KEY: &str = "status.running";
const STATUS_STOPPED_KEY: &str = "status.stopped";
const STATUS_RUNNING_DEFAULT: &str = "Running";
const STATUS_STOPPED_DEFAULT: &str = "Stopped";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Notification {
    RunFinished,
}

/// One status push from the backend. Every field is optional on the wire; `null`, absent and
/// mistyped values all fall back to their defaults.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusMessage {
    #[serde(deserialize_with = "lenient")]
    pub current_position: i64,
    #[serde(deserialize_with = "lenient")]
    pub magazin_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub running: bool,
    #[serde(deserialize_with = "lenient")]
    pub total_cards_processed: i64,
    #[serde(deserialize_with = "lenient")]
    pub current_run_cards: i64,
    #[serde(deserialize_with = "lenient")]
    pub current_run_time: f64,
    #[serde(deserialize_with = "notification_marker")]
    pub notification: Option<Notification>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!("Ignoring status field value {}: {}", value, e);
        T::default()
    }))
}

fn notification_marker<'de, D>(deserializer: D) -> Result<Option<Notification>, D::Error>
where
    D: Deserializer<'de>,
{
    let marker = match Value::deserialize(deserializer)? {
        Value::String(marker) => marker,
        Value::Null => return Ok(None),
        other => {
            warn!("Ignoring notification marker {}", other);
            return Ok(None);
        }
    };
    Ok(match marker.as_str() {
        "run_finished" => Some(Notification::RunFinished),
        "none" | "" => None,
        other => {
            debug!("Ignoring unknown notification marker {}", other);
            None
        }
    })
}

impl StatusMessage {
    /// Fails only when `raw` is not JSON or not a JSON object.
    pub fn parse(raw: &str) -> Result<Self, DashboardError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| DashboardError::MalformedStatus { source: e })?;
        if !value.is_object() {
            return Err(DashboardError::MalformedStatus {
                source: serde::de::Error::custom(format!("expected a JSON object, got {}", value)),
            });
        }
        serde_json::from_value(value).map_err(|e| DashboardError::MalformedStatus { source: e })
    }
}

/// Enablement of the start, stop and emergency buttons. Only constructible from the running
/// flag, so the three can never disagree with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonStates {
    running: bool,
}

impl ButtonStates {
    pub fn for_running(running: bool) -> Self {
        Self { running }
    }

    pub fn start_enabled(&self) -> bool {
        !self.running
    }

    pub fn stop_enabled(&self) -> bool {
        self.running
    }

    pub fn emergency_enabled(&self) -> bool {
        self.running
    }
}

/// Rendering-ready projection of a [`StatusMessage`].
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub position: String,
    pub magazine: String,
    pub status_label: String,
    pub total_cards: String,
    pub current_run_cards: String,
    pub elapsed: String,
    pub running: bool,
    pub buttons: ButtonStates,
}

impl DisplayState {
    /// What the dashboard shows before the first valid status push.
    pub fn placeholder() -> Self {
        Self {
            position: PLACEHOLDER.to_string(),
            magazine: PLACEHOLDER.to_string(),
            status_label: PLACEHOLDER.to_string(),
            total_cards: PLACEHOLDER.to_string(),
            current_run_cards: PLACEHOLDER.to_string(),
            elapsed: PLACEHOLDER.to_string(),
            running: false,
            buttons: ButtonStates::for_running(false),
        }
    }

    pub fn derive(status: &StatusMessage, translator: &Translator) -> Self {
        Self {
            position: status.current_position.to_string(),
            magazine: status
                .magazin_name
                .as_deref()
                .filter(|name| !name.is_empty())
                .unwrap_or(PLACEHOLDER)
                .to_string(),
            status_label: status_label(status.running, translator),
            total_cards: status.total_cards_processed.to_string(),
            current_run_cards: status.current_run_cards.to_string(),
            elapsed: format_elapsed(status.current_run_time),
            running: status.running,
            buttons: ButtonStates::for_running(status.running),
        }
    }
}

/// Formats seconds as `M:SS`. Negative and non-finite input counts as zero.
pub fn format_elapsed(seconds: f64) -> String {
    let seconds = if seconds.is_finite() && seconds > 0. {
        seconds
    } else {
        0.
    };
    let minutes = (seconds / 60.).floor() as u64;
    let secs = (seconds.floor() as u64) % 60;
    format!("{}:{:02}", minutes, secs)
}

pub fn status_label(running: bool, translator: &Translator) -> String {
    if running {
        translator.resolve_or(STATUS_RUNNING_KEY, STATUS_RUNNING_DEFAULT)
    } else {
        translator.resolve_or(STATUS_STOPPED_KEY, STATUS_STOPPED_DEFAULT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::LocaleTable;
    use proptest::prelude::*;

    #[test]
    fn test_parse_full_message() {
        let status = StatusMessage::parse(
            r#"{"current_position": 12, "magazin_name": "M1", "running": true,
                "total_cards_processed": 340, "current_run_cards": 40,
                "current_run_time": 125.7, "notification": "run_finished"}"#,
        )
        .unwrap();
        assert_eq!(status.current_position, 12);
        assert_eq!(status.magazin_name.as_deref(), Some("M1"));
        assert!(status.running);
        assert_eq!(status.total_cards_processed, 340);
        assert_eq!(status.current_run_cards, 40);
        assert_eq!(status.notification, Some(Notification::RunFinished));
    }

    #[test]
    fn test_parse_partial_message() {
        let status = StatusMessage::parse(r#"{"running": null, "magazin_name": null}"#).unwrap();
        assert_eq!(status, StatusMessage::default());

        let status = StatusMessage::parse("{}").unwrap();
        assert_eq!(status, StatusMessage::default());
    }

    #[test]
    fn test_parse_notification_markers() {
        let none = StatusMessage::parse(r#"{"notification": "none"}"#).unwrap();
        assert_eq!(none.notification, None);
        let unknown = StatusMessage::parse(r#"{"notification": "jam_detected"}"#).unwrap();
        assert_eq!(unknown.notification, None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            StatusMessage::parse("{not json"),
            Err(DashboardError::MalformedStatus { .. })
        ));
        assert!(matches!(
            StatusMessage::parse("42"),
            Err(DashboardError::MalformedStatus { .. })
        ));
        assert!(matches!(
            StatusMessage::parse("[1, 2]"),
            Err(DashboardError::MalformedStatus { .. })
        ));
    }

    #[test]
    fn test_mistyped_fields_fall_back() {
        let status = StatusMessage::parse(
            r#"{"current_position": 3.0, "running": "yes", "magazin_name": 7,
                "current_run_cards": 12, "notification": "run_finished"}"#,
        )
        .unwrap();
        assert_eq!(status.current_position, 0);
        assert!(!status.running);
        assert_eq!(status.magazin_name, None);
        assert_eq!(status.current_run_cards, 12);
        assert_eq!(status.notification, Some(Notification::RunFinished));

        let status = StatusMessage::parse(r#"{"running": true, "notification": 1}"#).unwrap();
        assert!(status.running);
        assert_eq!(status.notification, None);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(125.7), "2:05");
        assert_eq!(format_elapsed(0.), "0:00");
        assert_eq!(format_elapsed(59.99), "0:59");
        assert_eq!(format_elapsed(3600.), "60:00");
        assert_eq!(format_elapsed(-4.), "0:00");
        assert_eq!(format_elapsed(f64::NAN), "0:00");
        assert_eq!(format_elapsed(f64::INFINITY), "0:00");
    }

    #[test]
    fn test_derive_display_state() {
        let translator = Translator::default();
        let status = StatusMessage {
            current_position: 3,
            running: true,
            current_run_time: 61.,
            ..Default::default()
        };
        let display = DisplayState::derive(&status, &translator);
        assert_eq!(display.position, "3");
        assert_eq!(display.magazine, PLACEHOLDER);
        assert_eq!(display.status_label, "Running");
        assert_eq!(display.elapsed, "1:01");
        assert!(!display.buttons.start_enabled());
    }

    #[test]
    fn test_status_label_fallbacks() {
        let mut translator = Translator::new("en");
        assert_eq!(status_label(false, &translator), "Stopped");

        translator.load(
            LocaleTable::from_json(r#"{"en": {"title": "T", "status": {"running": "Go"}}}"#)
                .unwrap(),
        );
        assert_eq!(status_label(true, &translator), "Go");
        assert_eq!(status_label(false, &translator), "Stopped");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_elapsed_format(seconds in 0f64..1_000_000f64) {
            let expected = format!(
                "{}:{:02}",
                (seconds / 60.).floor() as u64,
                (seconds.floor() as u64) % 60
            );
            prop_assert_eq!(format_elapsed(seconds), expected);
        }

        #[test]
        fn prop_buttons_follow_running(running in any::<bool>()) {
            let buttons = ButtonStates::for_running(running);
            prop_assert_eq!(buttons.start_enabled(), !running);
            prop_assert_eq!(buttons.stop_enabled(), running);
            prop_assert_eq!(buttons.emergency_enabled(), running);
        }
    }
}
