//! Pure translation resolution: key-path traversal, parameter interpolation,
//! and the key/locale fallback lattice.
//!
//! Everything here is synchronous and side-effect-free. Missing keys or
//! locales never error; the `translate*` functions degrade to returning the
//! key itself so untranslated text stays visible in the UI. Diagnostics for
//! misses are the session's concern, not the resolver's.

use crate::types::{
    Dataset,
    TranslateParams,
    TranslationNode,
    TranslationTree,
};

/// Resolves a dot-delimited key to a leaf string inside one tree.
///
/// Splits `key` on `.` and descends one segment at a time by exact,
/// case-sensitive match. Returns `None` when a segment is missing, when the
/// path runs into a leaf before its last segment, or when it ends on a
/// subtree instead of a string.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use ui_i18n_runtime::resolver::resolve_leaf;
/// use ui_i18n_runtime::types::TranslationTree;
///
/// let tree = TranslationTree::from_json(&json!({ "menu": { "add": "Add" } }));
///
/// assert_eq!(resolve_leaf(&tree, "menu.add"), Some("Add"));
/// assert_eq!(resolve_leaf(&tree, "menu"), None);
/// assert_eq!(resolve_leaf(&tree, "menu.add.extra"), None);
/// ```
#[must_use]
pub fn resolve_leaf<'a>(tree: &'a TranslationTree, key: &str) -> Option<&'a str> {
    let mut current = tree;
    let mut segments = key.split('.').peekable();
    while let Some(segment) = segments.next() {
        match current.get(segment)? {
            TranslationNode::Leaf(value) => {
                // A leaf only counts when the path ends here.
                return if segments.peek().is_none() { Some(value) } else { None };
            }
            TranslationNode::Tree(subtree) => {
                if segments.peek().is_none() {
                    return None;
                }
                current = subtree;
            }
        }
    }
    None
}

/// Substitutes `{name}` placeholders in a template.
///
/// One simultaneous left-to-right pass: each `{name}` whose name is present
/// in `params` is replaced with the value's string form (integers in default
/// decimal form), and substituted text is never rescanned. A parameter value
/// that itself contains `{other}` therefore comes through verbatim instead
/// of being expanded again. Placeholders with no matching parameter are left
/// literal.
///
/// With empty `params` the template is returned unchanged.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use ui_i18n_runtime::resolver::interpolate;
/// use ui_i18n_runtime::types::ParamValue;
///
/// let params = HashMap::from([("name".to_string(), ParamValue::from("カシヲ"))]);
///
/// assert_eq!(interpolate("ようこそ、{name}さん", &params), "ようこそ、カシヲさん");
/// ```
#[must_use]
pub fn interpolate(template: &str, params: &TranslateParams) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let (head, tail) = rest.split_at(open);
        out.push_str(head);

        let Some(close) = tail.find('}') else {
            // No closing brace left; the remainder is literal.
            out.push_str(tail);
            return out;
        };
        let (token, remainder) = tail.split_at(close + 1);
        let name = token
            .strip_prefix('{')
            .and_then(|inner| inner.strip_suffix('}'))
            .unwrap_or_default();

        if let Some(value) = params.get(name) {
            out.push_str(&value.to_string());
            rest = remainder;
        } else {
            // Unknown name: emit the '{' alone and rescan right after it, so
            // a later literal occurrence of a known placeholder still matches.
            let (brace, after) = tail.split_at(1);
            out.push_str(brace);
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

/// Resolves and interpolates one `(locale, key)` pair.
///
/// Returns `None` when the locale has no tree or the key does not resolve to
/// a leaf; the caller decides how to degrade.
#[must_use]
pub fn try_translate(
    dataset: &Dataset,
    locale: &str,
    key: &str,
    params: &TranslateParams,
) -> Option<String> {
    let tree = dataset.get(locale)?;
    let leaf = resolve_leaf(tree, key)?;
    Some(interpolate(leaf, params))
}

/// Translates a key for one locale, degrading to the key itself on a miss.
///
/// Returning the key unchanged is deliberate: it keeps missing translations
/// visible in the rendered UI.
///
/// # Examples
/// ```
/// use std::collections::HashMap;
/// use serde_json::json;
/// use ui_i18n_runtime::resolver::translate;
/// use ui_i18n_runtime::types::TranslationTree;
///
/// let dataset = HashMap::from([
///     ("ja".to_string(), TranslationTree::from_json(&json!({ "app": { "title": "こんにちは" } }))),
/// ]);
/// let params = HashMap::new();
///
/// assert_eq!(translate(&dataset, "ja", "app.title", &params), "こんにちは");
/// assert_eq!(translate(&dataset, "ja", "app.welcome", &params), "app.welcome");
/// ```
#[must_use]
pub fn translate(dataset: &Dataset, locale: &str, key: &str, params: &TranslateParams) -> String {
    try_translate(dataset, locale, key, params).unwrap_or_else(|| key.to_string())
}

/// Fallback resolution across key and locale, stopping at the first hit.
///
/// The order is strict: same-locale key fallback is tried before any
/// cross-locale lookup.
/// 1. `(locale, key)`
/// 2. `(locale, fallback_key)` when a fallback key is given
/// 3. `(fallback_locale, key)` when given and different from `locale`
/// 4. `(fallback_locale, fallback_key)` when both are given
#[must_use]
pub fn try_translate_with_fallback(
    dataset: &Dataset,
    locale: &str,
    key: &str,
    fallback_key: Option<&str>,
    fallback_locale: Option<&str>,
    params: &TranslateParams,
) -> Option<String> {
    try_translate(dataset, locale, key, params)
        .or_else(|| {
            fallback_key.and_then(|fb_key| try_translate(dataset, locale, fb_key, params))
        })
        .or_else(|| {
            fallback_locale
                .filter(|fb_locale| *fb_locale != locale)
                .and_then(|fb_locale| try_translate(dataset, fb_locale, key, params))
        })
        .or_else(|| match (fallback_key, fallback_locale) {
            (Some(fb_key), Some(fb_locale)) => try_translate(dataset, fb_locale, fb_key, params),
            _ => None,
        })
}

/// [`try_translate_with_fallback`], degrading to the original key when every
/// step of the chain misses.
#[must_use]
pub fn translate_with_fallback(
    dataset: &Dataset,
    locale: &str,
    key: &str,
    fallback_key: Option<&str>,
    fallback_locale: Option<&str>,
    params: &TranslateParams,
) -> String {
    try_translate_with_fallback(dataset, locale, key, fallback_key, fallback_locale, params)
        .unwrap_or_else(|| key.to_string())
}
