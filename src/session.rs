//! セッション状態の管理。
//!
//! Process-wide localization state: current locale, loaded dataset,
//! configuration, loader registry, and the publish/subscribe channel that
//! downstream UI bindings attach to. The pure resolver stays free of all of
//! this; state is injected here, at the session boundary.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{
    Mutex,
    broadcast,
};

use crate::config::I18nConfig;
use crate::error::{
    I18nError,
    LoadError,
};
use crate::loader::{
    self,
    LocaleLoader,
};
use crate::preference::PreferenceStore;
use crate::resolver;
use crate::types::{
    Dataset,
    TranslateParams,
    TranslationTree,
};

/// Default deadline for [`I18nSession::wait_until_loaded`].
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Events published on session state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nEvent {
    /// The current locale switched to the contained code.
    LocaleChanged(String),
    /// The dataset was replaced or merged into.
    DatasetChanged,
}

/// Shared localization session state.
///
/// Cloning is cheap and every clone observes the same state.
///
/// # ロック順序
///
/// 複数のロックを同時に取得する場合は、以下の順序を厳守してください：
/// 1. `config`
/// 2. `current_locale`
/// 3. `dataset`
/// 4. `loaders`
///
/// Concurrent `set_locale` calls race: no lock is held across a load await,
/// and the last write to the current locale wins. A pending load whose
/// locale is no longer current still completes and merges its data; stale
/// data is unused but harmless.
#[derive(Clone)]
pub struct I18nSession {
    /// Runtime configuration; amended in place, never wholesale replaced.
    config: Arc<Mutex<I18nConfig>>,
    /// Active locale code.
    current_locale: Arc<Mutex<String>>,
    /// Loaded translation trees, keyed by locale.
    dataset: Arc<Mutex<Dataset>>,
    /// Registered per-locale loaders.
    loaders: Arc<Mutex<HashMap<String, LocaleLoader>>>,
    /// Optional store persisting the last explicitly chosen locale.
    preference: Arc<Mutex<Option<PreferenceStore>>>,
    /// Publish side of the state-change channel.
    events: broadcast::Sender<I18nEvent>,
}

impl I18nSession {
    /// Creates a session; the current locale starts at the configured
    /// default.
    #[must_use]
    pub fn new(config: I18nConfig) -> Self {
        let current_locale = config.default_locale.clone();
        let (events, _) = broadcast::channel(16);
        Self {
            config: Arc::new(Mutex::new(config)),
            current_locale: Arc::new(Mutex::new(current_locale)),
            dataset: Arc::new(Mutex::new(Dataset::new())),
            loaders: Arc::new(Mutex::new(HashMap::new())),
            preference: Arc::new(Mutex::new(None)),
            events,
        }
    }

    /// Snapshot of the current configuration.
    pub async fn config(&self) -> I18nConfig {
        self.config.lock().await.clone()
    }

    /// The active locale code.
    pub async fn current_locale(&self) -> String {
        self.current_locale.lock().await.clone()
    }

    /// Subscribes to locale/dataset change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<I18nEvent> {
        self.events.subscribe()
    }

    /// Attaches a preference store; successful explicit locale switches are
    /// persisted to it.
    pub async fn set_preference_store(&self, store: PreferenceStore) {
        *self.preference.lock().await = Some(store);
    }

    /// Switches the current locale.
    ///
    /// An unsupported locale leaves the observable state untouched. When the
    /// locale's translations are absent they are loaded first; on load
    /// failure the locale is NOT switched and the error returns to the
    /// caller.
    ///
    /// # Errors
    /// - [`I18nError::UnsupportedLocale`] for a code outside the allow-list
    /// - [`I18nError::LoadFailure`] when the required load fails
    pub async fn set_locale(&self, locale: &str) -> Result<(), I18nError> {
        let config = self.config.lock().await.clone();
        if !config.is_supported(locale) {
            if config.debug {
                tracing::warn!("Cannot switch to unsupported locale '{}'", locale);
            }
            return Err(I18nError::UnsupportedLocale(locale.to_string()));
        }

        let already_loaded = self.dataset.lock().await.contains_key(locale);
        if !already_loaded {
            self.load_locale(locale).await?;
        }

        *self.current_locale.lock().await = locale.to_string();
        tracing::debug!("Locale switched to '{}'", locale);

        self.persist_preference(locale).await;
        self.emit(I18nEvent::LocaleChanged(locale.to_string()));
        Ok(())
    }

    /// Replaces the dataset wholesale (direct injection, e.g. tests or
    /// build-time bundling).
    pub async fn set_translations(&self, dataset: Dataset) {
        *self.dataset.lock().await = dataset;
        self.emit(I18nEvent::DatasetChanged);
    }

    /// Deep-merges one locale's tree into the dataset, leaving other locales
    /// untouched, and appends the locale to the allow-list.
    ///
    /// The merged tree is installed with a single map insertion under the
    /// lock, so concurrent readers never observe a partially merged locale.
    pub async fn merge_locale_data(&self, locale: &str, tree: TranslationTree) {
        {
            let mut dataset = self.dataset.lock().await;
            let merged = match dataset.remove(locale) {
                Some(mut existing) => {
                    existing.merge(tree);
                    existing
                }
                None => tree,
            };
            dataset.insert(locale.to_string(), merged);
        }
        self.config.lock().await.add_supported_locale(locale);
        self.emit(I18nEvent::DatasetChanged);
    }

    /// Registers in-memory translation data for a locale; merged
    /// immediately, no loader involved.
    pub async fn register_locale_data(&self, locale: &str, tree: TranslationTree) {
        self.merge_locale_data(locale, tree).await;
    }

    /// Registers an asynchronous loader for a locale and appends the locale
    /// to the allow-list.
    pub async fn register_loader(&self, locale: &str, loader: LocaleLoader) {
        self.loaders.lock().await.insert(locale.to_string(), loader);
        self.config.lock().await.add_supported_locale(locale);
    }

    /// Loads one locale's translations and merges them into the dataset.
    ///
    /// Uses the registered loader for the locale when present, else the
    /// default network loader via the configured load path. No automatic
    /// retries. A load for a locale that is no longer current still merges;
    /// the data is merely unused.
    ///
    /// # Errors
    /// [`I18nError::LoadFailure`]; the dataset stays unmodified for the
    /// locale.
    pub async fn load_locale(&self, locale: &str) -> Result<(), I18nError> {
        let loader = self.loaders.lock().await.get(locale).cloned();
        let result = match loader {
            Some(loader) => loader.load().await,
            None => {
                let load_path = self.config.lock().await.load_path.clone();
                match load_path {
                    Some(template) => loader::fetch_locale(&template, locale).await,
                    None => Err(LoadError::NoLoader(locale.to_string())),
                }
            }
        };

        match result {
            Ok(tree) => {
                self.merge_locale_data(locale, tree).await;
                Ok(())
            }
            Err(source) => {
                tracing::debug!("Load failed for locale '{}': {}", locale, source);
                Err(I18nError::LoadFailure { locale: locale.to_string(), source })
            }
        }
    }

    /// The active locale's tree, or `None` when it is not loaded yet.
    ///
    /// Returns a copy; trees handed out are never mutated in place.
    pub async fn current_translations(&self) -> Option<TranslationTree> {
        let locale = self.current_locale.lock().await.clone();
        self.dataset.lock().await.get(&locale).cloned()
    }

    /// Waits until the active locale's translations are present.
    ///
    /// Resolves immediately, without invoking any loader, when the tree is
    /// already in the dataset. Otherwise the load runs as a spawned task and
    /// only the wait is bounded by `timeout` (default
    /// [`DEFAULT_LOAD_TIMEOUT`]): a timed-out load is never aborted and may
    /// still complete later, silently populating the dataset.
    ///
    /// # Errors
    /// - [`I18nError::LoadFailure`] when the load finishes with an error
    ///   before the deadline
    /// - [`I18nError::LoadTimeout`] when the deadline elapses first
    pub async fn wait_until_loaded(&self, timeout: Option<Duration>) -> Result<(), I18nError> {
        let locale = self.current_locale.lock().await.clone();
        if self.dataset.lock().await.contains_key(&locale) {
            return Ok(());
        }

        let deadline = timeout.unwrap_or(DEFAULT_LOAD_TIMEOUT);
        let session = self.clone();
        let task_locale = locale.clone();
        let load = tokio::spawn(async move { session.load_locale(&task_locale).await });

        match tokio::time::timeout(deadline, load).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(I18nError::LoadFailure {
                locale,
                source: LoadError::Loader(format!("load task failed: {join_error}")),
            }),
            Err(_) => Err(I18nError::LoadTimeout { locale, timeout: deadline }),
        }
    }

    /// Translates a key for the current locale, falling back to the
    /// configured fallback locale, then degrading to the key itself.
    pub async fn translate(&self, key: &str, params: &TranslateParams) -> String {
        self.resolve(key, None, params).await
    }

    /// Like [`translate`](Self::translate), with a same-locale fallback key
    /// tried before any cross-locale lookup.
    pub async fn translate_with_fallback_key(
        &self,
        key: &str,
        fallback_key: &str,
        params: &TranslateParams,
    ) -> String {
        self.resolve(key, Some(fallback_key), params).await
    }

    /// Shared resolution path for the two translate call shapes.
    async fn resolve(
        &self,
        key: &str,
        fallback_key: Option<&str>,
        params: &TranslateParams,
    ) -> String {
        let config = self.config.lock().await.clone();
        let locale = self.current_locale.lock().await.clone();
        let dataset = self.dataset.lock().await;
        let resolved = resolver::try_translate_with_fallback(
            &dataset,
            &locale,
            key,
            fallback_key,
            Some(config.resolved_fallback_locale()),
            params,
        );
        drop(dataset);

        resolved.unwrap_or_else(|| {
            if config.missing_translation_warnings {
                tracing::warn!("Missing translation for key '{}' in locale '{}'", key, locale);
            }
            key.to_string()
        })
    }

    /// Persists an explicit locale choice when a store is attached. Write
    /// failures are logged, never fatal.
    async fn persist_preference(&self, locale: &str) {
        if let Some(store) = self.preference.lock().await.as_ref() {
            if let Err(error) = store.save(locale) {
                tracing::warn!("Failed to persist locale preference: {}", error);
            }
        }
    }

    /// Broadcasts an event; a send error only means nobody subscribed.
    fn emit(&self, event: I18nEvent) {
        let _ = self.events.send(event);
    }
}

impl std::fmt::Debug for I18nSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("I18nSession")
            .field("config", &"<I18nConfig>")
            .field("current_locale", &"<String>")
            .field("dataset", &"<Dataset>")
            .field("loaders", &"<HashMap<String, LocaleLoader>>")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::test_utils::{
        dataset,
        params,
        tree,
    };
    use crate::types::ParamValue;

    /// Session over a fixed ja/en dataset with "en" as fallback locale.
    async fn session_ja_en() -> I18nSession {
        let config = I18nConfig {
            default_locale: "ja".to_string(),
            supported_locales: vec!["ja".to_string(), "en".to_string()],
            fallback_locale: Some("en".to_string()),
            ..I18nConfig::default()
        };
        let session = I18nSession::new(config);
        session
            .set_translations(dataset(&[
                ("ja", json!({ "app": { "title": "こんにちは" } })),
                ("en", json!({ "app": { "title": "Hello" }, "common": { "ok": "OK" } })),
            ]))
            .await;
        session
    }

    /// new: デフォルトロケールで開始する
    #[googletest::test]
    #[tokio::test]
    async fn new_session_starts_at_default_locale() {
        let session = I18nSession::new(I18nConfig::default());

        assert_eq!(session.current_locale().await, "en");
        assert!(session.current_translations().await.is_none());
    }

    /// set_locale: unsupported codes never change the observable locale
    #[googletest::test]
    #[tokio::test]
    async fn set_locale_rejects_unsupported_code_without_state_change() {
        let session = session_ja_en().await;

        let result = session.set_locale("fr").await;

        expect_that!(matches!(result, Err(I18nError::UnsupportedLocale(_))), eq(true));
        expect_that!(session.current_locale().await, eq("ja"));
    }

    /// set_locale: switches directly when the data is already loaded
    #[googletest::test]
    #[tokio::test]
    async fn set_locale_switches_when_data_is_present() {
        let session = session_ja_en().await;

        session.set_locale("en").await.unwrap();

        expect_that!(session.current_locale().await, eq("en"));
        expect_that!(session.translate("app.title", &params(&[])).await, eq("Hello"));
    }

    /// set_locale: subscribers see the locale-changed event
    #[googletest::test]
    #[tokio::test]
    async fn set_locale_emits_locale_changed_event() {
        let session = session_ja_en().await;
        let mut events = session.subscribe();

        session.set_locale("en").await.unwrap();

        assert_eq!(events.recv().await.unwrap(), I18nEvent::LocaleChanged("en".to_string()));
    }

    /// translate: current locale first, then the configured fallback locale
    #[googletest::test]
    #[tokio::test]
    async fn translate_uses_current_locale_then_fallback_locale() {
        let session = session_ja_en().await;

        expect_that!(session.translate("app.title", &params(&[])).await, eq("こんにちは"));
        // Missing in ja, present in the fallback locale.
        expect_that!(session.translate("common.ok", &params(&[])).await, eq("OK"));
        // Missing everywhere degrades to the key.
        expect_that!(session.translate("app.welcome", &params(&[])).await, eq("app.welcome"));
    }

    /// translate_with_fallback_key: same-locale key beats cross-locale lookup
    #[googletest::test]
    #[tokio::test]
    async fn translate_with_fallback_key_prefers_same_locale_key() {
        let session = session_ja_en().await;
        session
            .merge_locale_data("ja", tree(&json!({ "common": { "cancel": "キャンセル" } })))
            .await;

        let result =
            session.translate_with_fallback_key("common.missing", "common.cancel", &params(&[])).await;

        expect_that!(result, eq("キャンセル"));
    }

    /// translate: parameters are interpolated into the resolved leaf
    #[googletest::test]
    #[tokio::test]
    async fn translate_interpolates_parameters() {
        let session = session_ja_en().await;
        session
            .merge_locale_data("ja", tree(&json!({ "greet": "ようこそ、{name}さん" })))
            .await;

        let result = session
            .translate("greet", &params(&[("name", ParamValue::from("カシヲ"))]))
            .await;

        expect_that!(result, eq("ようこそ、カシヲさん"));
    }

    /// merge_locale_data: 他のロケールには影響しない
    #[googletest::test]
    #[tokio::test]
    async fn merge_locale_data_leaves_other_locales_untouched() {
        let session = session_ja_en().await;

        session.merge_locale_data("ja", tree(&json!({ "app": { "title": "やあ" } }))).await;

        expect_that!(session.translate("app.title", &params(&[])).await, eq("やあ"));
        session.set_locale("en").await.unwrap();
        expect_that!(session.translate("app.title", &params(&[])).await, eq("Hello"));
    }

    /// merge_locale_data: the locale joins the allow-list
    #[googletest::test]
    #[tokio::test]
    async fn merge_locale_data_appends_to_supported_locales() {
        let session = session_ja_en().await;

        session.merge_locale_data("fr", tree(&json!({ "app": { "title": "Bonjour" } }))).await;

        expect_that!(session.config().await.is_supported("fr"), eq(true));
        session.set_locale("fr").await.unwrap();
        expect_that!(session.translate("app.title", &params(&[])).await, eq("Bonjour"));
    }

    /// set_translations: 全データを置き換える
    #[googletest::test]
    #[tokio::test]
    async fn set_translations_replaces_dataset_wholesale() {
        let session = session_ja_en().await;
        let mut events = session.subscribe();

        session.set_translations(dataset(&[("ja", json!({ "only": "これだけ" }))])).await;

        expect_that!(session.translate("app.title", &params(&[])).await, eq("app.title"));
        expect_that!(session.translate("only", &params(&[])).await, eq("これだけ"));
        assert_eq!(events.recv().await.unwrap(), I18nEvent::DatasetChanged);
    }

    /// load_locale: no loader and no load path is a load failure
    #[googletest::test]
    #[tokio::test]
    async fn load_locale_without_loader_or_load_path_fails() {
        let session = I18nSession::new(I18nConfig::default());

        let result = session.load_locale("en").await;

        expect_that!(
            matches!(
                result,
                Err(I18nError::LoadFailure { source: LoadError::NoLoader(_), .. })
            ),
            eq(true)
        );
    }

    /// current_translations: アクティブロケールのツリーのコピーを返す
    #[googletest::test]
    #[tokio::test]
    async fn current_translations_returns_copy_of_active_tree() {
        let session = session_ja_en().await;

        let tree = session.current_translations().await.unwrap();

        expect_that!(crate::resolver::resolve_leaf(&tree, "app.title"), some(eq("こんにちは")));
    }
}
