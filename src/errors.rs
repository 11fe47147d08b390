// Error types for the card sort dashboard

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum DashboardError {
    // Push channel errors
    #[snafu(display("Malformed status message: {source}"))]
    MalformedStatus { source: serde_json::Error },
    #[snafu(display("Push channel closed: {reason}"))]
    ChannelClosed { reason: String },
    #[snafu(display("Could not connect to {url}: {reason}"))]
    ChannelConnect { url: String, reason: String },
    #[snafu(display("Invalid server url {url}: {reason}"))]
    InvalidServerUrl { url: String, reason: String },
    #[snafu(display("Could not start the background runtime"))]
    RuntimeStart { source: io::Error },

    // Translation errors
    #[snafu(display("Translation not found for key: {key}"))]
    TranslationMissing { key: String },
    #[snafu(display("Language {language} not available"))]
    UnknownLanguage { language: String },
    #[snafu(display("Locale table not loaded yet"))]
    LocaleTableNotLoaded,
    #[snafu(display("Failed to load translations: {reason}"))]
    TranslationLoad { reason: String },

    // Notification errors
    #[snafu(display("Could not render notification: {reason}"))]
    NotificationRenderFailure { reason: String },
    #[snafu(display("Could not play notification sound: {reason}"))]
    AudioCue { reason: String },

    // Backend control requests
    #[snafu(display("{action} failed: {reason}"))]
    ControlRequestFailure { action: String, reason: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error accessing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
