//! ui-i18n-runtime
//!
//! コンポーネントベース UI 向けのローカライズランタイム。
//!
//! A localization runtime for component-based UIs: per-locale translation
//! trees, dotted-key resolution with parameter interpolation, a two-tier
//! key/locale fallback chain, and an async session owning the current
//! locale, dataset, and loader boundary.

pub mod config;
pub mod error;
pub mod loader;
pub mod preference;
pub mod resolver;
pub mod session;
pub mod types;

mod test_utils;

// 主要な型を再エクスポート
pub use config::I18nConfig;
pub use error::{
    ConfigError,
    I18nError,
    LoadError,
};
pub use loader::LocaleLoader;
pub use session::{
    I18nEvent,
    I18nSession,
};
pub use types::{
    Dataset,
    ParamValue,
    TranslateParams,
    TranslationTree,
};
