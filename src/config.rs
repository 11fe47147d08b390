use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::errors::DashboardError;
use crate::i18n::DEFAULT_LANGUAGE;

const APP_DIR_NAME: &str = "cardsort-dashboard";
const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 5000;
/// Lower bound for `reconnect_delay_ms`.
pub const MIN_RECONNECT_DELAY_MS: u64 = 500;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub language: String,
    pub server_url: String,
    pub reconnect_delay_ms: u64,
    pub notification_sound: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
            notification_sound: true,
        }
    }
}

impl AppConfig {
    pub fn reconnect_delay(&self) -> Duration {
        if self.reconnect_delay_ms < MIN_RECONNECT_DELAY_MS {
            warn!(
                "reconnect_delay_ms {} is below {}, using the minimum",
                self.reconnect_delay_ms, MIN_RECONNECT_DELAY_MS
            );
        }
        Duration::from_millis(self.reconnect_delay_ms.max(MIN_RECONNECT_DELAY_MS))
    }

    pub fn default_path() -> Result<PathBuf, DashboardError> {
        Ok(dirs::config_dir()
            .ok_or(DashboardError::NoConfigDir)?
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME))
    }

    /// Reads the config at `path`. A missing file yields `None`.
    pub fn from_file(path: &Path) -> Result<Option<Self>, DashboardError> {
        if !path.exists() {
            return Ok(None);
        }
        let file =
            std::fs::File::open(path).map_err(|e| DashboardError::ConfigIOError { source: e })?;
        serde_json::from_reader(file)
            .map(Some)
            .map_err(|e| DashboardError::ConfigSerializeError { source: e })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), DashboardError> {
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| DashboardError::ConfigIOError { source: e })?;
        }

        let file =
            std::fs::File::create(path).map_err(|e| DashboardError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| DashboardError::ConfigSerializeError { source: e })
    }
}

/// Where the selected language survives restarts.
pub trait LanguageStore {
    fn language(&self) -> Option<String>;
    fn save_language(&mut self, language: &str) -> Result<(), DashboardError>;
}

/// An [`AppConfig`] bound to the file it was read from.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    pub config: AppConfig,
}

impl ConfigFile {
    pub fn open(path: PathBuf) -> Result<Self, DashboardError> {
        let config = AppConfig::from_file(&path)?.unwrap_or_default();
        info!("Using config file {:?}", path);
        Ok(Self { path, config })
    }

    pub fn open_default() -> Result<Self, DashboardError> {
        Self::open(AppConfig::default_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), DashboardError> {
        self.config.save_to(&self.path)
    }
}

impl LanguageStore for ConfigFile {
    fn language(&self) -> Option<String> {
        Some(self.config.language.clone())
    }

    fn save_language(&mut self, language: &str) -> Result<(), DashboardError> {
        self.config.language = language.to_string();
        self.save()
    }
}

/// Keeps the language for the lifetime of the process only.
#[derive(Debug, Default)]
pub struct MemoryLanguageStore {
    language: Option<String>,
}

impl MemoryLanguageStore {
    pub fn with_language(language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
        }
    }
}

impl LanguageStore for MemoryLanguageStore {
    fn language(&self) -> Option<String> {
        self.language.clone()
    }

    fn save_language(&mut self, language: &str) -> Result<(), DashboardError> {
        self.language = Some(language.to_string());
        Ok(())
    }
}
