// HTTP glue towards the card sorting backend: process control, CSV export and translations

use log::{debug, info};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

use crate::errors::DashboardError;
use crate::i18n::LocaleTable;

const TRANSLATIONS_PATH: &str = "/static/translations.json";

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct StartRequest {
    pub magazin_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_magazine: Option<bool>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StopRequest {
    pub emergency: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ExportResult {
    pub csv_path: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Operator actions sent to the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCommand {
    Start(StartRequest),
    Stop,
    EmergencyStop,
    ExportCsv,
}

impl ControlCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::Start(_) => "start",
            Self::Stop => "stop",
            Self::EmergencyStop => "emergency stop",
            Self::ExportCsv => "export",
        }
    }

    /// Translation key of the alert prefix shown when the command fails.
    pub fn error_key(&self) -> &'static str {
        match self {
            Self::Start(_) => "messages.startError",
            Self::Stop => "messages.stopError",
            Self::EmergencyStop => "messages.emergencyError",
            Self::ExportCsv => "messages.exportError",
        }
    }
}

/// Outcome of a command, reported back to the UI.
#[derive(Debug)]
pub enum ControlOutcome {
    Done(ControlCommand),
    Exported(ExportResult),
    Failed {
        command: ControlCommand,
        error: DashboardError,
    },
}

#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn execute(&self, command: ControlCommand) -> ControlOutcome {
        let result = match &command {
            ControlCommand::Start(request) => self.start(request).await.map(|_| None),
            ControlCommand::Stop => self.stop(false).await.map(|_| None),
            ControlCommand::EmergencyStop => self.stop(true).await.map(|_| None),
            ControlCommand::ExportCsv => self.export_all().await.map(Some),
        };
        match result {
            Ok(Some(export)) => ControlOutcome::Exported(export),
            Ok(None) => ControlOutcome::Done(command),
            Err(error) => ControlOutcome::Failed { command, error },
        }
    }

    pub async fn start(&self, request: &StartRequest) -> Result<(), DashboardError> {
        info!("Starting run for magazine {}", request.magazin_name);
        let response = self
            .http
            .post(self.url("/process/start"))
            .json(request)
            .send()
            .await;
        check(response, "start").await.map(|_| ())
    }

    pub async fn stop(&self, emergency: bool) -> Result<(), DashboardError> {
        info!("Stopping run (emergency: {})", emergency);
        let response = self
            .http
            .post(self.url("/process/stop"))
            .json(&StopRequest { emergency })
            .send()
            .await;
        check(response, "stop").await.map(|_| ())
    }

    pub async fn export_all(&self) -> Result<ExportResult, DashboardError> {
        let response = self.http.post(self.url("/csv/export-all")).send().await;
        let response = check(response, "export").await?;
        response
            .json::<ExportResult>()
            .await
            .map_err(|e| DashboardError::ControlRequestFailure {
                action: "export".to_string(),
                reason: e.to_string(),
            })
    }

    pub async fn fetch_translations(&self) -> Result<LocaleTable, DashboardError> {
        let url = self.url(TRANSLATIONS_PATH);
        debug!("Fetching translations from {}", url);
        let load_error = |reason: String| DashboardError::TranslationLoad { reason };
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| load_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(load_error(format!("{} returned {}", url, response.status())));
        }
        let body = response.text().await.map_err(|e| load_error(e.to_string()))?;
        LocaleTable::from_json(&body)
    }
}

async fn check(
    response: Result<Response, reqwest::Error>,
    action: &str,
) -> Result<Response, DashboardError> {
    let failure = |reason: String| DashboardError::ControlRequestFailure {
        action: action.to_string(),
        reason,
    };
    let response = response.map_err(|e| failure(e.to_string()))?;
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(failure(error_detail(&body).unwrap_or_else(|| status.to_string())))
}

/// The backend reports failures as `{"detail": ...}`; the detail may be a string or structured.
fn error_detail(body: &str) -> Option<String> {
    let error = serde_json::from_str::<ErrorBody>(body).ok()?;
    match error.detail {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
