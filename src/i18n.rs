use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use log::{debug, info, warn};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::errors::DashboardError;

/// Language used when nothing has been persisted yet.
pub const DEFAULT_LANGUAGE: &str = "de";
/// Key every language must carry for the window title.
pub const TITLE_KEY: &str = "title";

/// A node in a language's translation tree: a leaf string, a nested group of keys, or any other
/// JSON value, which is kept out of lookups.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TranslationNode {
    Text(String),
    Group(HashMap<String, TranslationNode>),
    Other(IgnoredAny),
}

/// Translations for every language, keyed by language code.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct LocaleTable {
    languages: BTreeMap<String, HashMap<String, TranslationNode>>,
}

impl LocaleTable {
    pub fn from_json(raw: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(raw).map_err(|e| DashboardError::TranslationLoad {
            reason: e.to_string(),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, DashboardError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DashboardError::TranslationLoad {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Self::from_json(&raw)
    }

    pub fn has_language(&self, language: &str) -> bool {
        self.languages.contains_key(language)
    }

    /// Language codes in a stable (sorted) order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Walks the dotted `key` through the tree of `language`. Groups and empty strings do not count
    /// as a translation.
    pub fn lookup(&self, language: &str, key: &str) -> Option<&str> {
        let mut nodes = self.languages.get(language)?;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            match nodes.get(segment)? {
                TranslationNode::Text(text) if segments.peek().is_none() && !text.is_empty() => {
                    return Some(text.as_str());
                }
                TranslationNode::Group(children) if segments.peek().is_some() => nodes = children,
                _ => return None,
            }
        }
        None
    }
}

/// Resolves dotted translation keys against the current language.
///
/// Resolution never fails: a missing table, language or key echoes the key back and logs a
/// warning, so rendering can always proceed.
#[derive(Debug)]
pub struct Translator {
    table: Option<LocaleTable>,
    language: String,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Translator {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            table: None,
            language: language.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.table.is_some()
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn languages(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|table| table.languages().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Installs the locale table. If the selected language is not part of it we fall back to
    /// [`DEFAULT_LANGUAGE`] when that one exists.
    pub fn load(&mut self, table: LocaleTable) {
        for language in table.languages() {
            if table.lookup(language, TITLE_KEY).is_none() {
                warn!("Language {} has no '{}' translation", language, TITLE_KEY);
            }
        }
        if !table.has_language(&self.language) && table.has_language(DEFAULT_LANGUAGE) {
            warn!(
                "Language {} not available, falling back to {}",
                self.language, DEFAULT_LANGUAGE
            );
            self.language = DEFAULT_LANGUAGE.to_string();
        }
        info!(
            "Translations loaded, {} languages available",
            table.languages().count()
        );
        self.table = Some(table);
    }

    /// Switches the current language. Unknown languages leave the selection untouched.
    pub fn set_language(&mut self, language: &str) -> Result<(), DashboardError> {
        let table = self
            .table
            .as_ref()
            .ok_or(DashboardError::LocaleTableNotLoaded)?;
        if !table.has_language(language) {
            return Err(DashboardError::UnknownLanguage {
                language: language.to_string(),
            });
        }
        self.language = language.to_string();
        Ok(())
    }

    pub fn try_resolve(&self, key: &str) -> Result<&str, DashboardError> {
        self.table
            .as_ref()
            .and_then(|table| table.lookup(&self.language, key))
            .ok_or_else(|| DashboardError::TranslationMissing {
                key: key.to_string(),
            })
    }

    pub fn resolve(&self, key: &str) -> String {
        match self.try_resolve(key) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!("{}", e);
                key.to_string()
            }
        }
    }

    /// Like [`Translator::resolve`], but uses `fallback` instead of echoing the key.
    pub fn resolve_or(&self, key: &str, fallback: &str) -> String {
        match self.try_resolve(key) {
            Ok(text) => text.to_string(),
            Err(e) => {
                debug!("{}, using fallback", e);
                fallback.to_string()
            }
        }
    }
}
