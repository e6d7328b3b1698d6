//! Locale loader boundary: caller-supplied async loaders and the default
//! network loader.
//!
//! Loaders produce the whole [`TranslationTree`] for one locale. Failures
//! propagate as [`LoadError`]; no retries happen here, retry policy belongs
//! to the caller.

use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::LoadError;
use crate::types::TranslationTree;

/// Boxed future type produced by a registered loader.
type LoadFuture = BoxFuture<'static, Result<TranslationTree, LoadError>>;

/// Cloneable handle to a caller-supplied asynchronous loader for one locale.
#[derive(Clone)]
pub struct LocaleLoader {
    /// Factory invoked once per load attempt.
    load_fn: Arc<dyn Fn() -> LoadFuture + Send + Sync>,
}

impl LocaleLoader {
    /// Wraps an async closure as a loader.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use ui_i18n_runtime::loader::LocaleLoader;
    /// use ui_i18n_runtime::types::TranslationTree;
    ///
    /// let loader = LocaleLoader::new(|| async {
    ///     Ok(TranslationTree::from_json(&json!({ "app": { "title": "Hello" } })))
    /// });
    /// ```
    pub fn new<F, Fut>(load_fn: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TranslationTree, LoadError>> + Send + 'static,
    {
        Self { load_fn: Arc::new(move || load_fn().boxed()) }
    }

    /// Runs one load attempt.
    pub async fn load(&self) -> Result<TranslationTree, LoadError> {
        (self.load_fn)().await
    }
}

impl fmt::Debug for LocaleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocaleLoader").field("load_fn", &"<async fn>").finish()
    }
}

/// Substitutes the literal `{locale}` token in a load-path template.
#[must_use]
pub fn expand_load_path(template: &str, locale: &str) -> String {
    template.replace("{locale}", locale)
}

/// Default network loader: fetches `template` with `{locale}` substituted
/// and parses the body as a JSON translation file.
///
/// # Errors
/// - [`LoadError::Http`] on connection or non-success status
/// - [`LoadError::Parse`] when the body is not valid JSON
pub async fn fetch_locale(template: &str, locale: &str) -> Result<TranslationTree, LoadError> {
    let url = expand_load_path(template, locale);
    tracing::debug!("Fetching translations for '{}' from {}", locale, url);

    let response = reqwest::get(&url).await?.error_for_status()?;
    let body = response.text().await?;
    let json: Value = serde_json::from_str(&body)?;

    Ok(TranslationTree::from_json(&json))
}
