pub mod cue;

use log::{error, info};

use crate::i18n::Translator;
use crate::status::Notification;
use crate::view::RenderTarget;

pub use cue::{AudibleCue, Silent, TerminalBell};

const RUN_FINISHED_KEY: &str = "messages.runFinished";
const RUN_FINISHED_DEFAULT: &str = "Run Finished!";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRecord {
    pub message: String,
    pub kind: NotificationKind,
    pub acknowledged: bool,
}

impl NotificationRecord {
    fn for_notification(notification: Notification, translator: &Translator) -> Self {
        match notification {
            Notification::RunFinished => Self {
                message: translator.resolve_or(RUN_FINISHED_KEY, RUN_FINISHED_DEFAULT),
                kind: NotificationKind::Success,
                acknowledged: false,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateOutcome {
    /// A new notification is now visible.
    Shown,
    /// Another notification is still waiting for acknowledgment.
    Suppressed,
}

/// Single-slot, acknowledgment-gated notification state.
///
/// The gate is either idle (empty slot) or showing exactly one unacknowledged record. Only
/// [`NotificationGate::acknowledge`] empties the slot; status pushes arriving in the meantime
/// never replace or duplicate the visible record.
#[derive(Debug, Default)]
pub struct NotificationGate {
    slot: Option<NotificationRecord>,
}

impl NotificationGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shown(&self) -> bool {
        self.slot.is_some()
    }

    pub fn current(&self) -> Option<&NotificationRecord> {
        self.slot.as_ref()
    }

    pub fn offer(
        &mut self,
        notification: Notification,
        translator: &Translator,
        target: &mut dyn RenderTarget,
        cue: &mut dyn AudibleCue,
    ) -> GateOutcome {
        if self.slot.is_some() {
            return GateOutcome::Suppressed;
        }

        let record = NotificationRecord::for_notification(notification, translator);
        info!("Showing notification: {}", record.message);
        // the slot is taken even when rendering fails, otherwise the next push would show it again
        if let Err(e) = target.show_notification(&record) {
            error!("{}", e);
        }
        self.slot = Some(record);

        if let Err(e) = cue.play() {
            error!("{}", e);
        }
        GateOutcome::Shown
    }

    /// Operator acknowledgment. Returns the acknowledged record, or `None` when nothing was shown.
    pub fn acknowledge(&mut self, target: &mut dyn RenderTarget) -> Option<NotificationRecord> {
        let mut record = self.slot.take()?;
        record.acknowledged = true;
        target.hide_notification();
        info!("Notification acknowledged: {}", record.message);
        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DashboardError;
    use crate::i18n::LocaleTable;
    use crate::status::DisplayState;
    use crate::view::TranslatedLabels;

    #[derive(Default)]
    struct ModalCounter {
        visible: usize,
        shown: usize,
        fail_render: bool,
    }

    impl RenderTarget for ModalCounter {
        fn apply_display_state(&mut self, _state: &DisplayState) {}
        fn apply_translations(&mut self, _labels: &TranslatedLabels) {}

        fn show_notification(&mut self, _record: &NotificationRecord) -> Result<(), DashboardError> {
            self.shown += 1;
            if self.fail_render {
                return Err(DashboardError::NotificationRenderFailure {
                    reason: "no window".to_string(),
                });
            }
            self.visible += 1;
            Ok(())
        }

        fn hide_notification(&mut self) {
            self.visible = self.visible.saturating_sub(1);
        }
    }

    #[derive(Default)]
    struct CountingCue {
        played: usize,
        fail: bool,
    }

    impl AudibleCue for CountingCue {
        fn play(&mut self) -> Result<(), DashboardError> {
            self.played += 1;
            if self.fail {
                return Err(DashboardError::AudioCue {
                    reason: "no output device".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_single_visible_notification() {
        let translator = Translator::default();
        let mut gate = NotificationGate::new();
        let mut target = ModalCounter::default();
        let mut cue = CountingCue::default();

        let first = gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue);
        let second = gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue);
        assert_eq!(first, GateOutcome::Shown);
        assert_eq!(second, GateOutcome::Suppressed);
        assert_eq!(target.visible, 1);
        assert_eq!(cue.played, 1);

        let record = gate.acknowledge(&mut target).unwrap();
        assert!(record.acknowledged);
        assert_eq!(record.message, RUN_FINISHED_DEFAULT);
        assert_eq!(target.visible, 0);
        assert!(!gate.is_shown());

        let third = gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue);
        assert_eq!(third, GateOutcome::Shown);
        assert_eq!(target.shown, 2);
    }

    #[test]
    fn test_acknowledge_when_idle() {
        let mut gate = NotificationGate::new();
        let mut target = ModalCounter::default();
        assert!(gate.acknowledge(&mut target).is_none());
    }

    #[test]
    fn test_cue_failure_does_not_block() {
        let translator = Translator::default();
        let mut gate = NotificationGate::new();
        let mut target = ModalCounter::default();
        let mut cue = CountingCue {
            fail: true,
            ..Default::default()
        };
        assert_eq!(
            gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue),
            GateOutcome::Shown
        );
        assert_eq!(target.visible, 1);
        assert!(gate.is_shown());
    }

    #[test]
    fn test_render_failure_still_gates() {
        let translator = Translator::default();
        let mut gate = NotificationGate::new();
        let mut target = ModalCounter {
            fail_render: true,
            ..Default::default()
        };
        let mut cue = CountingCue::default();
        gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue);
        assert!(gate.is_shown());
        assert_eq!(
            gate.offer(Notification::RunFinished, &translator, &mut target, &mut cue),
            GateOutcome::Suppressed
        );
        assert_eq!(target.shown, 1);
    }

    #[test]
    fn test_translated_message() {
        let mut translator = Translator::new("en");
        translator.load(
            LocaleTable::from_json(
                r#"{"en": {"title": "T", "messages": {"runFinished": "Magazine done"}}}"#,
            )
            .unwrap(),
        );
        let mut gate = NotificationGate::new();
        gate.offer(
            Notification::RunFinished,
            &translator,
            &mut ModalCounter::default(),
            &mut CountingCue::default(),
        );
        let record = gate.current().unwrap();
        assert_eq!(record.message, "Magazine done");
        assert_eq!(record.kind, NotificationKind::Success);
    }
}
