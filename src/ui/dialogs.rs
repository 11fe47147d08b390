use egui::{Align, Button, Color32, Id, Layout, Modal, RichText};

use cardsort_dashboard::backend::ControlCommand;
use cardsort_dashboard::notification::NotificationKind;

use super::{LiveDashboardApp, PALETTE_GREEN};

const DIALOG_MIN_WIDTH: f32 = 500.;
const DIALOG_BUTTON_WIDTH: f32 = 120.;
const MESSAGE_TEXT_SIZE: f32 = 18.;

impl LiveDashboardApp {
    /// The acknowledgment dialog. Only the OK button closes it; escape and clicks on the backdrop
    /// are ignored.
    pub(crate) fn notification_view(&mut self, ctx: &egui::Context) {
        let Some(record) = self.screen.notification.clone() else {
            return;
        };
        let ok_label = self.screen.labels.get("dialog.ok").to_string();

        let mut acknowledged = false;
        Modal::new(Id::new("notification")).show(ctx, |ui| {
            ui.set_min_width(DIALOG_MIN_WIDTH);
            ui.with_layout(Layout::top_down(Align::Center), |ui| {
                let color = match record.kind {
                    NotificationKind::Success => PALETTE_GREEN,
                    NotificationKind::Info => Color32::LIGHT_BLUE,
                };
                ui.add_space(20.);
                ui.label(
                    RichText::new(&record.message)
                        .size(MESSAGE_TEXT_SIZE)
                        .color(color),
                );
                ui.add_space(30.);
                if ui
                    .add(Button::new(ok_label).min_size([DIALOG_BUTTON_WIDTH, 36.].into()))
                    .clicked()
                {
                    acknowledged = true;
                }
                ui.add_space(10.);
            });
        });

        if acknowledged {
            self.dashboard.acknowledge(&mut self.screen);
        }
    }

    pub(crate) fn emergency_confirmation(&mut self, ctx: &egui::Context) {
        if !self.confirm_emergency {
            return;
        }
        let question = self
            .screen
            .labels
            .get("messages.confirmEmergency")
            .to_string();
        let confirm_label = self.screen.labels.get("control.emergency").to_string();
        let cancel_label = self.screen.labels.get("dialog.cancel").to_string();

        let mut confirmed = None;
        let response = Modal::new(Id::new("emergency-confirmation")).show(ctx, |ui| {
            ui.set_min_width(DIALOG_MIN_WIDTH / 1.5);
            ui.label(RichText::new(question).size(MESSAGE_TEXT_SIZE));
            ui.add_space(20.);
            ui.horizontal(|ui| {
                if ui
                    .add(Button::new(RichText::new(confirm_label).strong()).fill(Color32::DARK_RED))
                    .clicked()
                {
                    confirmed = Some(true);
                }
                if ui.button(cancel_label).clicked() {
                    confirmed = Some(false);
                }
            });
        });
        if response.should_close() && confirmed.is_none() {
            confirmed = Some(false);
        }

        if let Some(confirmed) = confirmed {
            self.confirm_emergency = false;
            if confirmed {
                self.send_command(ControlCommand::EmergencyStop);
            }
        }
    }

    /// Alerts from failed requests, oldest first.
    pub(crate) fn alerts_view(&mut self, ctx: &egui::Context) {
        let Some(message) = self.screen.alerts.front().cloned() else {
            return;
        };
        let ok_label = self.screen.labels.get("dialog.ok").to_string();

        let mut dismissed = false;
        egui::Window::new("alert")
            .title_bar(false)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_TOP, [0., 40.])
            .show(ctx, |ui| {
                ui.label(RichText::new(message).color(Color32::LIGHT_RED));
                ui.add_space(10.);
                if ui.button(ok_label).clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.screen.alerts.pop_front();
        }
    }
}
