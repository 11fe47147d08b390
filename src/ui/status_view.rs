use egui::{Button, Color32, CornerRadius, Frame, Grid, Layout, Margin, RichText};

use cardsort_dashboard::backend::{ControlCommand, StartRequest};
use cardsort_dashboard::view::ConnectionStatus;

use super::{LiveDashboardApp, PALETTE_GREEN, PALETTE_ORANGE};

const DEFAULT_BUTTON_CORNER_RADIUS: u8 = 4;
const VALUE_TEXT_SIZE: f32 = 18.;

impl LiveDashboardApp {
    pub(crate) fn status_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header")
            .min_height(36.)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(egui::Align::Center), |ui| {
                    ui.heading(&self.screen.labels.title);
                    ui.add_space(10.);
                    self.connection_indicator(ui);

                    ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                        // iterate a copy, switching languages replaces the labels
                        let languages = self.screen.labels.languages.clone();
                        for language in languages.iter().rev() {
                            if ui
                                .selectable_label(language.active, language.code.to_uppercase())
                                .clicked()
                            {
                                self.dashboard
                                    .set_language(&language.code, &mut self.screen);
                            }
                        }
                    });
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let display = &self.screen.display;
            let labels = &self.screen.labels;
            Grid::new("status")
                .num_columns(2)
                .spacing([40., 8.])
                .striped(true)
                .show(ui, |ui| {
                    let rows = [
                        ("status.currentPosition", &display.position),
                        ("status.magazine", &display.magazine),
                        ("status.state", &display.status_label),
                        ("status.totalCards", &display.total_cards),
                        ("status.currentRunCards", &display.current_run_cards),
                        ("status.currentRunTime", &display.elapsed),
                    ];
                    for (key, value) in rows {
                        ui.label(labels.get(key));
                        let mut text = RichText::new(value.as_str()).size(VALUE_TEXT_SIZE);
                        if key == "status.state" && display.running {
                            text = text.color(PALETTE_GREEN);
                        }
                        ui.label(text);
                        ui.end_row();
                    }
                });

            ui.separator();
            self.controls(ui);
        });
    }

    fn connection_indicator(&self, ui: &mut egui::Ui) {
        let labels = &self.screen.labels;
        let (text, color) = match &self.screen.connection {
            ConnectionStatus::Open => (labels.get("connection.open").to_string(), PALETTE_GREEN),
            ConnectionStatus::Connecting => (
                labels.get("connection.connecting").to_string(),
                Color32::LIGHT_GRAY,
            ),
            ConnectionStatus::Closed { retry_in, .. } => (
                format!(
                    "{} ({}s)",
                    labels.get("connection.closed"),
                    retry_in.as_secs()
                ),
                PALETTE_ORANGE,
            ),
        };
        let response = ui.label(RichText::new(format!("● {}", text)).color(color));
        if let ConnectionStatus::Closed { reason, .. } = &self.screen.connection {
            response.on_hover_text(reason);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        let buttons = self.screen.display.buttons;
        let start_label = self.screen.labels.get("control.start").to_string();
        let stop_label = self.screen.labels.get("control.stop").to_string();
        let emergency_label = self.screen.labels.get("control.emergency").to_string();
        let export_label = self.screen.labels.get("control.export").to_string();

        Frame::new().inner_margin(Margin::same(8)).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.screen.labels.get("control.magazinName"));
                ui.text_edit_singleline(&mut self.magazine_input);
                let start = Button::new(start_label)
                    .corner_radius(CornerRadius::same(DEFAULT_BUTTON_CORNER_RADIUS));
                if ui.add_enabled(buttons.start_enabled(), start).clicked() {
                    let request = StartRequest {
                        magazin_name: self.magazine_input.trim().to_string(),
                        ..Default::default()
                    };
                    self.send_command(ControlCommand::Start(request));
                }
            });

            ui.add_space(8.);
            ui.horizontal(|ui| {
                let stop = Button::new(stop_label)
                    .corner_radius(CornerRadius::same(DEFAULT_BUTTON_CORNER_RADIUS));
                if ui.add_enabled(buttons.stop_enabled(), stop).clicked() {
                    self.send_command(ControlCommand::Stop);
                }

                let emergency = Button::new(RichText::new(emergency_label).strong())
                    .fill(Color32::DARK_RED)
                    .corner_radius(CornerRadius::same(DEFAULT_BUTTON_CORNER_RADIUS));
                if ui.add_enabled(buttons.emergency_enabled(), emergency).clicked() {
                    self.confirm_emergency = true;
                }

                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button(export_label).clicked() {
                        self.send_command(ControlCommand::ExportCsv);
                    }
                });
            });
        });
    }
}
