//! Error taxonomy for configuration, loading, and session operations.
//!
//! A missing translation is deliberately not represented here: resolution
//! misses always degrade to the key string and never become an error value.

use std::time::Duration;

use thiserror::Error;

/// One failed configuration check, addressed by its JSON field path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "supportedLocales[0]").
    pub field_path: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for one field.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Errors while reading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields failed validation.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The configuration file could not be read.
    #[error("Failed to load configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Renders validation errors as a numbered list for the enum display.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// A failed attempt to produce translation data for one locale.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Neither a registered loader nor a load path covers the locale.
    #[error("no loader registered for locale '{0}' and no load path configured")]
    NoLoader(String),

    /// The default network loader failed to fetch.
    #[error("failed to fetch translations: {0}")]
    Http(#[from] reqwest::Error),

    /// The fetched body was not a valid translation file.
    #[error("failed to parse translation data: {0}")]
    Parse(#[from] serde_json::Error),

    /// A caller-supplied loader reported a failure.
    #[error("loader failed: {0}")]
    Loader(String),
}

/// Errors surfaced by session operations.
///
/// Loading-path failures are always propagated to the caller; debug logging
/// is additive and never replaces propagation.
#[derive(Error, Debug)]
pub enum I18nError {
    /// `set_locale` was called with a code outside the allow-list. The
    /// observable current locale is unchanged.
    #[error("locale '{0}' is not in the supported locales")]
    UnsupportedLocale(String),

    /// A load attempt failed; the dataset is unmodified for that locale.
    #[error("failed to load locale '{locale}': {source}")]
    LoadFailure {
        /// Locale whose load failed.
        locale: String,
        /// Underlying loader failure.
        #[source]
        source: LoadError,
    },

    /// The `wait_until_loaded` deadline elapsed before the locale's data
    /// arrived. Distinct from [`I18nError::LoadFailure`]; the underlying
    /// load keeps running.
    #[error("timed out after {timeout:?} waiting for locale '{locale}' to load")]
    LoadTimeout {
        /// Locale being waited on.
        locale: String,
        /// Deadline that elapsed.
        timeout: Duration,
    },
}
