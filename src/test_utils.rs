//! テスト用ユーティリティ関数
//!
//! Shared helpers for building datasets, trees, and parameter maps in tests.
#![cfg(test)]

use serde_json::Value;

use crate::types::{
    Dataset,
    ParamValue,
    TranslateParams,
    TranslationTree,
};

/// Builds a tree from a `json!` literal.
pub(crate) fn tree(json: &Value) -> TranslationTree {
    TranslationTree::from_json(json)
}

/// Builds a dataset from `(locale, json!)` pairs.
pub(crate) fn dataset(locales: &[(&str, Value)]) -> Dataset {
    locales
        .iter()
        .map(|(locale, json)| ((*locale).to_string(), TranslationTree::from_json(json)))
        .collect()
}

/// Builds a parameter map from `(name, value)` pairs.
pub(crate) fn params(pairs: &[(&str, ParamValue)]) -> TranslateParams {
    pairs.iter().map(|(name, value)| ((*name).to_string(), value.clone())).collect()
}
