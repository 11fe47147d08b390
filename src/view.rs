use std::collections::HashMap;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::channel::ChannelEvent;
use crate::config::LanguageStore;
use crate::errors::DashboardError;
use crate::i18n::{DEFAULT_LANGUAGE, LocaleTable, TITLE_KEY, Translator};
use crate::notification::{AudibleCue, GateOutcome, NotificationGate, NotificationRecord};
use crate::status::{DisplayState, StatusMessage};

const TITLE_DEFAULT: &str = "Card Sort Control";

/// Every translated label the dashboard shows, with the English text used when the locale table
/// has no entry for it.
pub const TRANSLATED_LABELS: &[(&str, &str)] = &[
    ("status.currentPosition", "Current position"),
    ("status.magazine", "Magazine"),
    ("status.state", "Status"),
    ("status.totalCards", "Total cards processed"),
    ("status.currentRunCards", "Cards in current run"),
    ("status.currentRunTime", "Current run time"),
    ("control.magazinName", "Magazine name"),
    ("control.start", "Start"),
    ("control.stop", "Stop"),
    ("control.emergency", "Emergency stop"),
    ("control.export", "Export CSV"),
    ("connection.open", "Connected"),
    ("connection.connecting", "Connecting..."),
    ("connection.closed", "Disconnected, retrying"),
    ("dialog.ok", "OK"),
    ("dialog.cancel", "Cancel"),
    ("messages.confirmEmergency", "Really trigger the emergency stop?"),
    ("messages.startError", "Error starting the process"),
    ("messages.stopError", "Error stopping the process"),
    ("messages.emergencyError", "Error during emergency stop"),
    ("messages.exportError", "Failed to export CSV"),
    ("messages.exportSuccess", "CSV exported to"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageButton {
    pub code: String,
    pub active: bool,
}

/// Fully resolved static text of the dashboard for one language.
#[derive(Clone, Debug, PartialEq)]
pub struct TranslatedLabels {
    pub title: String,
    pub languages: Vec<LanguageButton>,
    labels: HashMap<&'static str, String>,
}

impl Default for TranslatedLabels {
    fn default() -> Self {
        Self::resolve(&Translator::default())
    }
}

impl TranslatedLabels {
    pub fn resolve(translator: &Translator) -> Self {
        let labels = TRANSLATED_LABELS
            .iter()
            .map(|(key, english)| (*key, translator.resolve_or(key, english)))
            .collect();
        let languages = translator
            .languages()
            .into_iter()
            .map(|code| LanguageButton {
                active: code == translator.language(),
                code,
            })
            .collect();
        Self {
            title: translator.resolve_or(TITLE_KEY, TITLE_DEFAULT),
            languages,
            labels,
        }
    }

    /// The label for `key`, or the key itself for labels outside [`TRANSLATED_LABELS`].
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.labels.get(key).map(String::as_str).unwrap_or(key)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Open,
    Closed { reason: String, retry_in: Duration },
}

/// Where the dashboard is drawn. Implementations only store or draw what they are given.
pub trait RenderTarget {
    /// Applies every status field of one message at once.
    fn apply_display_state(&mut self, state: &DisplayState);
    fn apply_translations(&mut self, labels: &TranslatedLabels);
    fn show_notification(&mut self, record: &NotificationRecord) -> Result<(), DashboardError>;
    fn hide_notification(&mut self);

    /// User-visible alert for failures outside the status pipeline.
    fn alert(&mut self, message: &str) {
        warn!("{}", message);
    }

    fn connection_changed(&mut self, _status: &ConnectionStatus) {}
}

/// Owns the dashboard state: translations, the notification slot and the last valid status.
///
/// All methods run on the consumer side of the channel inbox, one event at a time.
pub struct Dashboard {
    translator: Translator,
    gate: NotificationGate,
    store: Box<dyn LanguageStore>,
    last_status: Option<StatusMessage>,
    display: DisplayState,
    connection: ConnectionStatus,
}

impl Dashboard {
    pub fn new(store: Box<dyn LanguageStore>) -> Self {
        let language = store
            .language()
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
        Self {
            translator: Translator::new(language),
            gate: NotificationGate::new(),
            store,
            last_status: None,
            display: DisplayState::placeholder(),
            connection: ConnectionStatus::Connecting,
        }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn gate(&self) -> &NotificationGate {
        &self.gate
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn labels(&self) -> TranslatedLabels {
        TranslatedLabels::resolve(&self.translator)
    }

    /// Pushes the initial placeholder state and labels to a fresh target.
    pub fn attach(&self, target: &mut dyn RenderTarget) {
        target.apply_translations(&self.labels());
        target.apply_display_state(&self.display);
        target.connection_changed(&self.connection);
    }

    pub fn load_translations(&mut self, table: LocaleTable, target: &mut dyn RenderTarget) {
        self.translator.load(table);
        self.rerender(target);
    }

    /// Switches language and re-renders every translated text. Unknown languages are a logged
    /// no-op and return `false`.
    pub fn set_language(&mut self, language: &str, target: &mut dyn RenderTarget) -> bool {
        if let Err(e) = self.translator.set_language(language) {
            warn!("{}", e);
            return false;
        }
        if let Err(e) = self.store.save_language(language) {
            error!("Could not persist language selection: {}", e);
        }
        info!("Language set to {}", language);
        self.rerender(target);
        true
    }

    fn rerender(&mut self, target: &mut dyn RenderTarget) {
        target.apply_translations(&self.labels());
        if let Some(status) = &self.last_status {
            self.display = DisplayState::derive(status, &self.translator);
            target.apply_display_state(&self.display);
        }
    }

    pub fn handle_channel_event(
        &mut self,
        event: ChannelEvent,
        target: &mut dyn RenderTarget,
        cue: &mut dyn AudibleCue,
    ) {
        match event {
            ChannelEvent::Opened => self.set_connection(ConnectionStatus::Open, target),
            ChannelEvent::Frame(raw) => {
                if let Err(e) = self.handle_frame(&raw, target, cue) {
                    warn!("Dropping status message: {}", e);
                }
            }
            ChannelEvent::Closed { reason, retry_in } => {
                self.set_connection(ConnectionStatus::Closed { reason, retry_in }, target)
            }
        }
    }

    fn set_connection(&mut self, status: ConnectionStatus, target: &mut dyn RenderTarget) {
        target.connection_changed(&status);
        self.connection = status;
    }

    /// Status model, then view, then notification gate. A malformed frame changes nothing.
    pub fn handle_frame(
        &mut self,
        raw: &str,
        target: &mut dyn RenderTarget,
        cue: &mut dyn AudibleCue,
    ) -> Result<Option<GateOutcome>, DashboardError> {
        let status = StatusMessage::parse(raw)?;

        let display = DisplayState::derive(&status, &self.translator);
        target.apply_display_state(&display);
        self.display = display;

        let mut outcome = None;
        if let Some(notification) = status.notification {
            let offered = self.gate.offer(notification, &self.translator, target, cue);
            if offered == GateOutcome::Suppressed {
                debug!("Notification pending acknowledgment, ignoring new marker");
            }
            outcome = Some(offered);
        }
        self.last_status = Some(status);
        Ok(outcome)
    }

    pub fn acknowledge(&mut self, target: &mut dyn RenderTarget) -> Option<NotificationRecord> {
        self.gate.acknowledge(target)
    }

    /// Translated alert text for a failed backend request, `"<prefix>: <reason>"`.
    pub fn alert_text(&self, prefix_key: &str, reason: &str) -> String {
        let english = TRANSLATED_LABELS
            .iter()
            .find(|(key, _)| *key == prefix_key)
            .map(|(_, english)| *english)
            .unwrap_or(prefix_key);
        format!("{}: {}", self.translator.resolve_or(prefix_key, english), reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryLanguageStore;
    use crate::notification::Silent;

    #[derive(Default)]
    struct LastApplied {
        display: Option<DisplayState>,
        labels: Option<TranslatedLabels>,
        applications: usize,
    }

    impl RenderTarget for LastApplied {
        fn apply_display_state(&mut self, state: &DisplayState) {
            self.display = Some(state.clone());
            self.applications += 1;
        }

        fn apply_translations(&mut self, labels: &TranslatedLabels) {
            self.labels = Some(labels.clone());
        }

        fn show_notification(&mut self, _record: &NotificationRecord) -> Result<(), DashboardError> {
            Ok(())
        }

        fn hide_notification(&mut self) {}
    }

    fn table() -> LocaleTable {
        LocaleTable::from_json(
            r#"{
                "de": {"title": "Kartensortierung", "status": {"running": "Läuft", "stopped": "Gestoppt"},
                       "control": {"start": "Starten"}},
                "en": {"title": "Card Sort Control", "status": {"running": "Running", "stopped": "Stopped"}}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_labels_fall_back_to_english() {
        let labels = TranslatedLabels::default();
        assert_eq!(labels.title, TITLE_DEFAULT);
        assert_eq!(labels.get("control.start"), "Start");
        assert_eq!(labels.get("not.a.label"), "not.a.label");
        assert!(labels.languages.is_empty());
    }

    #[test]
    fn test_malformed_frame_keeps_display() {
        let mut dashboard = Dashboard::new(Box::new(MemoryLanguageStore::default()));
        let mut target = LastApplied::default();
        dashboard
            .handle_frame(r#"{"current_position": 4, "running": true}"#, &mut target, &mut Silent)
            .unwrap();
        let before = dashboard.display().clone();

        assert!(dashboard.handle_frame("{not json", &mut target, &mut Silent).is_err());
        assert_eq!(dashboard.display(), &before);
        assert_eq!(target.applications, 1);
    }

    #[test]
    fn test_language_switch_rerenders_status() {
        let mut dashboard = Dashboard::new(Box::new(MemoryLanguageStore::with_language("de")));
        let mut target = LastApplied::default();
        dashboard.load_translations(table(), &mut target);
        dashboard
            .handle_frame(r#"{"running": true}"#, &mut target, &mut Silent)
            .unwrap();
        assert_eq!(target.display.as_ref().unwrap().status_label, "Läuft");

        assert!(dashboard.set_language("en", &mut target));
        assert_eq!(target.display.as_ref().unwrap().status_label, "Running");
        let labels = target.labels.clone().unwrap();
        assert_eq!(labels.title, "Card Sort Control");
        assert_eq!(
            labels.languages,
            vec![
                LanguageButton {
                    code: "de".to_string(),
                    active: false
                },
                LanguageButton {
                    code: "en".to_string(),
                    active: true
                },
            ]
        );

        // same language again renders the same text
        assert!(dashboard.set_language("en", &mut target));
        assert_eq!(target.labels.as_ref(), Some(&labels));
    }

    #[test]
    fn test_unknown_language_is_noop() {
        let mut dashboard = Dashboard::new(Box::new(MemoryLanguageStore::default()));
        let mut target = LastApplied::default();
        dashboard.load_translations(table(), &mut target);
        let labels = target.labels.clone();

        assert!(!dashboard.set_language("fr", &mut target));
        assert_eq!(dashboard.translator().language(), "de");
        assert_eq!(target.labels, labels);
    }

    #[test]
    fn test_alert_text() {
        let dashboard = Dashboard::new(Box::new(MemoryLanguageStore::default()));
        assert_eq!(
            dashboard.alert_text("messages.stopError", "connection refused"),
            "Error stopping the process: connection refused"
        );
    }
}
