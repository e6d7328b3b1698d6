//! ランタイム設定の定義と読み込み。
//!
//! Runtime configuration: the recognized options, validation, and an
//! optional JSON config file loader.

use std::path::Path;

use serde::{
    Deserialize,
    Serialize,
};

use crate::error::{
    ConfigError,
    ValidationError,
};

/// Recognized configuration options for the localization runtime.
///
/// Created once at startup; afterwards only amended (e.g. a newly registered
/// locale appended to `supported_locales`), never wholesale replaced outside
/// a re-init.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct I18nConfig {
    /// Locale used absent any other signal.
    pub default_locale: String,

    /// Allow-list of locale codes the session may switch to.
    pub supported_locales: Vec<String>,

    /// URL template for the default network loader; must contain the literal
    /// token `{locale}`.
    pub load_path: Option<String>,

    /// Locale tried when the current one lacks a translation. Defaults to
    /// `default_locale` when unset.
    pub fallback_locale: Option<String>,

    /// Enables diagnostic logging.
    pub debug: bool,

    /// Emits a warning per missing translation lookup.
    pub missing_translation_warnings: bool,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string()],
            load_path: None,
            fallback_locale: None,
            debug: false,
            missing_translation_warnings: true,
        }
    }
}

impl I18nConfig {
    /// 設定のバリデーションを行う。
    ///
    /// # Errors
    /// - Empty default locale or supported-locale entry
    /// - Default or fallback locale outside `supported_locales`
    /// - `load_path` without a `{locale}` token
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.default_locale.is_empty() {
            errors.push(ValidationError::new(
                "defaultLocale",
                "The default locale cannot be empty. Please specify a locale code, for example: \"en\"",
            ));
        } else if !self.is_supported(&self.default_locale) {
            errors.push(ValidationError::new(
                "defaultLocale",
                format!("'{}' must be a member of 'supportedLocales'", self.default_locale),
            ));
        }

        if self.supported_locales.is_empty() {
            errors.push(ValidationError::new(
                "supportedLocales",
                "At least one locale is required. Example: [\"en\", \"ja\"]",
            ));
        }

        for (index, locale) in self.supported_locales.iter().enumerate() {
            if locale.is_empty() {
                errors.push(ValidationError::new(
                    format!("supportedLocales[{index}]"),
                    "Locale codes cannot be empty",
                ));
            }
        }

        if let Some(fallback) = &self.fallback_locale
            && !self.is_supported(fallback)
        {
            errors.push(ValidationError::new(
                "fallbackLocale",
                format!("'{fallback}' must be a member of 'supportedLocales'"),
            ));
        }

        if let Some(load_path) = &self.load_path
            && !load_path.contains("{locale}")
        {
            errors.push(ValidationError::new(
                "loadPath",
                format!(
                    "The template '{load_path}' must contain the literal token \"{{locale}}\""
                ),
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Checks membership in the supported-locale allow-list.
    #[must_use]
    pub fn is_supported(&self, locale: &str) -> bool {
        self.supported_locales.iter().any(|supported| supported == locale)
    }

    /// Appends a locale to the allow-list; a no-op when already present.
    pub fn add_supported_locale(&mut self, locale: &str) {
        if !self.is_supported(locale) {
            self.supported_locales.push(locale.to_string());
        }
    }

    /// The effective fallback locale: the configured one, else the default
    /// locale.
    #[must_use]
    pub fn resolved_fallback_locale(&self) -> &str {
        self.fallback_locale.as_deref().unwrap_or(&self.default_locale)
    }
}

/// 設定ファイルを読み込む。
///
/// Reads an `I18nConfig` from a JSON file.
///
/// # Returns
/// - `Ok(Some(config))`: the file exists, parses, and validates
/// - `Ok(None)`: the file does not exist
/// - `Err(ConfigError)`: read, parse, or validation failure
///
/// # Errors
/// - File read error
/// - JSON parse error
/// - Validation error
pub fn load_from_file(path: &Path) -> Result<Option<I18nConfig>, ConfigError> {
    if !path.exists() {
        tracing::debug!("Configuration file not found: {:?}", path);
        return Ok(None);
    }

    tracing::debug!("Loading configuration from: {:?}", path);

    let content = std::fs::read_to_string(path)?;
    let config: I18nConfig = serde_json::from_str(&content)?;
    config.validate().map_err(ConfigError::ValidationErrors)?;

    Ok(Some(config))
}
