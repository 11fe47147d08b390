mod dialogs;
mod status_view;

use std::collections::VecDeque;
use std::time::Duration;

use egui::{Color32, Visuals, style::Widgets};
use log::{debug, warn};

use cardsort_dashboard::backend::{ControlCommand, ControlOutcome};
use cardsort_dashboard::notification::AudibleCue;
use cardsort_dashboard::runtime::{BackendEvent, RuntimeHandles};
use cardsort_dashboard::status::DisplayState;
use cardsort_dashboard::view::{ConnectionStatus, Dashboard, RenderTarget, TranslatedLabels};
use cardsort_dashboard::{DashboardError, NotificationRecord};

const REFRESH_RATE_MS: u64 = 100;
const MAX_EVENTS_PER_REFRESH: usize = 10;

pub(crate) const PALETTE_BLACK: Color32 = Color32::from_rgb(12, 12, 12);
pub(crate) const PALETTE_BROWN: Color32 = Color32::from_rgb(72, 30, 20);
pub(crate) const PALETTE_MAROON: Color32 = Color32::from_rgb(155, 57, 34);
pub(crate) const PALETTE_ORANGE: Color32 = Color32::from_rgb(242, 97, 63);
pub(crate) const PALETTE_GREEN: Color32 = Color32::from_rgb(76, 175, 80);

/// What the window currently shows. Filled exclusively through [`RenderTarget`].
pub(crate) struct DashboardScreen {
    display: DisplayState,
    labels: TranslatedLabels,
    notification: Option<NotificationRecord>,
    alerts: VecDeque<String>,
    connection: ConnectionStatus,
    title_changed: bool,
}

impl Default for DashboardScreen {
    fn default() -> Self {
        Self {
            display: DisplayState::placeholder(),
            labels: TranslatedLabels::default(),
            notification: None,
            alerts: VecDeque::new(),
            connection: ConnectionStatus::Connecting,
            title_changed: true,
        }
    }
}

impl RenderTarget for DashboardScreen {
    fn apply_display_state(&mut self, state: &DisplayState) {
        self.display = state.clone();
    }

    fn apply_translations(&mut self, labels: &TranslatedLabels) {
        self.title_changed |= self.labels.title != labels.title;
        self.labels = labels.clone();
    }

    fn show_notification(&mut self, record: &NotificationRecord) -> Result<(), DashboardError> {
        self.notification = Some(record.clone());
        Ok(())
    }

    fn hide_notification(&mut self) {
        self.notification = None;
    }

    fn alert(&mut self, message: &str) {
        warn!("{}", message);
        self.alerts.push_back(message.to_string());
    }

    fn connection_changed(&mut self, status: &ConnectionStatus) {
        self.connection = status.clone();
    }
}

/// `LiveDashboardApp` shows the live machine status pushed by the backend.
///
/// Channel events and backend results are drained at the start of every frame and applied one
/// at a time through the [`Dashboard`]; the frame is then drawn from the [`DashboardScreen`].
pub struct LiveDashboardApp {
    handles: RuntimeHandles,
    dashboard: Dashboard,
    screen: DashboardScreen,
    cue: Box<dyn AudibleCue>,
    magazine_input: String,
    confirm_emergency: bool,
}

impl LiveDashboardApp {
    pub fn new(
        handles: RuntimeHandles,
        dashboard: Dashboard,
        cue: Box<dyn AudibleCue>,
        cc: &eframe::CreationContext<'_>,
    ) -> Self {
        let default_visuals = Visuals {
            dark_mode: true,
            hyperlink_color: PALETTE_MAROON,
            faint_bg_color: PALETTE_BLACK,
            extreme_bg_color: PALETTE_BROWN,
            panel_fill: PALETTE_BLACK,
            button_frame: true,
            widgets: Widgets::dark(),
            striped: true,
            ..Default::default()
        };
        cc.egui_ctx.set_visuals(default_visuals);

        let mut screen = DashboardScreen::default();
        dashboard.attach(&mut screen);

        Self {
            handles,
            dashboard,
            screen,
            cue,
            magazine_input: String::new(),
            confirm_emergency: false,
        }
    }

    fn drain_channel(&mut self) {
        // bounded per frame so a chatty backend cannot starve rendering
        for _ in 0..MAX_EVENTS_PER_REFRESH {
            let Ok(event) = self.handles.inbox.try_recv() else {
                break;
            };
            self.dashboard
                .handle_channel_event(event, &mut self.screen, self.cue.as_mut());
        }
    }

    fn drain_backend_events(&mut self) {
        while let Ok(event) = self.handles.backend_events.try_recv() {
            match event {
                BackendEvent::Translations(Ok(table)) => {
                    self.dashboard.load_translations(table, &mut self.screen)
                }
                BackendEvent::Translations(Err(e)) => warn!("{}, retrying", e),
                BackendEvent::Control(ControlOutcome::Done(command)) => {
                    debug!("{} request accepted", command.action())
                }
                BackendEvent::Control(ControlOutcome::Exported(result)) => {
                    let message = format!(
                        "{}: {}",
                        self.screen.labels.get("messages.exportSuccess"),
                        result.csv_path
                    );
                    self.screen.alert(&message);
                }
                BackendEvent::Control(ControlOutcome::Failed { command, error }) => {
                    let message = self
                        .dashboard
                        .alert_text(command.error_key(), &error.to_string());
                    self.screen.alert(&message);
                }
            }
        }
    }

    pub(crate) fn send_command(&mut self, command: ControlCommand) {
        if let Err(e) = self.handles.commands.send(command) {
            let message = self
                .dashboard
                .alert_text(e.0.error_key(), "background runtime is not running");
            self.screen.alert(&message);
        }
    }
}

impl eframe::App for LiveDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_channel();
        self.drain_backend_events();

        if self.screen.title_changed {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(
                self.screen.labels.title.clone(),
            ));
            self.screen.title_changed = false;
        }

        self.status_view(ctx);
        self.notification_view(ctx);
        self.emergency_confirmation(ctx);
        self.alerts_view(ctx);

        ctx.request_repaint_after(Duration::from_millis(REFRESH_RATE_MS));
    }
}
