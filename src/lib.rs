// Library interface for the card sort dashboard
// The UI binary and the integration tests both build on these modules

pub mod backend;
pub mod channel;
pub mod config;
pub mod errors;
pub mod i18n;
pub mod notification;
pub mod runtime;
pub mod status;
pub mod view;

// Re-export commonly used types
pub use channel::{ChannelEvent, ChannelManager, ChannelState, Connector, run_channel};
pub use errors::DashboardError;
pub use i18n::{LocaleTable, Translator};
pub use notification::{AudibleCue, GateOutcome, NotificationGate, NotificationRecord};
pub use status::{ButtonStates, DisplayState, StatusMessage, format_elapsed};
pub use view::{Dashboard, RenderTarget, TranslatedLabels};
