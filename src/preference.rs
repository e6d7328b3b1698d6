//! Persisted locale preference and startup locale detection.
//!
//! The preference is one small JSON file recording the last explicitly
//! chosen locale. Detection order at startup: persisted preference, then the
//! process environment, then the configured default.

use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::config::I18nConfig;

/// Environment variables consulted for the host locale, in glibc precedence
/// order.
const ENV_VARS: [&str; 4] = ["LANGUAGE", "LC_ALL", "LC_MESSAGES", "LANG"];

/// On-disk shape of the persisted preference.
#[derive(Debug, Clone, Deserialize, Serialize)]
struct StoredPreference {
    /// The last explicitly chosen locale code.
    locale: String,
}

/// File-backed store for the last explicitly chosen locale.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    /// Path of the JSON preference file.
    path: PathBuf,
}

impl PreferenceStore {
    /// Creates a store backed by the given file path. The file is only
    /// created on the first [`save`](Self::save).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the persisted locale, if any.
    ///
    /// A missing or unreadable file is treated as "no preference".
    #[must_use]
    pub fn load(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<StoredPreference>(&content) {
            Ok(stored) => Some(stored.locale),
            Err(error) => {
                tracing::debug!("Ignoring malformed preference file {:?}: {}", self.path, error);
                None
            }
        }
    }

    /// Persists the locale as the new preference.
    ///
    /// # Errors
    /// Returns the underlying IO error when the file cannot be written.
    pub fn save(&self, locale: &str) -> std::io::Result<()> {
        let stored = StoredPreference { locale: locale.to_string() };
        let content = serde_json::to_string(&stored).map_err(std::io::Error::other)?;
        std::fs::write(&self.path, content)
    }
}

/// Picks the startup locale.
///
/// Order: a persisted preference that is still in the allow-list, then the
/// first supported candidate derived from the environment, then
/// `default_locale`.
#[must_use]
pub fn detect_locale(config: &I18nConfig, store: Option<&PreferenceStore>) -> String {
    if let Some(saved) = store.and_then(PreferenceStore::load)
        && config.is_supported(&saved)
    {
        return saved;
    }

    if let Some(env_locale) = detect_from_env(config) {
        return env_locale;
    }

    config.default_locale.clone()
}

/// First supported locale derived from the environment, if any.
fn detect_from_env(config: &I18nConfig) -> Option<String> {
    ENV_VARS.iter().find_map(|var| {
        let value = std::env::var(var).ok()?;
        candidates_from_env_value(&value)
            .into_iter()
            .find(|candidate| config.is_supported(candidate))
    })
}

/// Expands an environment value like `ja_JP.UTF-8` into lookup candidates
/// (`ja-JP`, then `ja`). `C` and `POSIX` carry no language information.
fn candidates_from_env_value(value: &str) -> Vec<String> {
    let trimmed = value.split(['.', '@']).next().unwrap_or(value).trim();
    if trimmed.is_empty() || trimmed == "C" || trimmed == "POSIX" {
        return Vec::new();
    }

    let normalized = trimmed.replace('_', "-");
    let mut candidates = vec![normalized.clone()];
    if let Some(language) = normalized.split('-').next()
        && language != normalized
        && !language.is_empty()
    {
        candidates.push(language.to_string());
    }
    candidates
}
