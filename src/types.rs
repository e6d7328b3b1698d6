//! Core data types: translation trees, datasets, and interpolation parameters.

use std::collections::HashMap;
use std::fmt;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use serde_json::Value;

/// All loaded translations, keyed by locale code (e.g. "en", "ja").
pub type Dataset = HashMap<String, TranslationTree>;

/// Named interpolation parameters for a single translation call.
pub type TranslateParams = HashMap<String, ParamValue>;

/// A node inside a [`TranslationTree`]: either a translated string or a
/// nested subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TranslationNode {
    /// A string value at the end of a key path.
    Leaf(String),
    /// A nested container addressed by further key segments.
    Tree(TranslationTree),
}

/// Nested translation data for one locale.
///
/// Built from a JSON object where every leaf is a string. Any other value
/// type (number, bool, null, array) is dropped during conversion and behaves
/// as a missing key at resolution time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TranslationTree(HashMap<String, TranslationNode>);

impl TranslationTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Converts a JSON value into a tree, keeping string leaves and nested
    /// objects and silently dropping everything else.
    ///
    /// A non-object root yields an empty tree.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use ui_i18n_runtime::types::TranslationTree;
    ///
    /// let tree = TranslationTree::from_json(&json!({
    ///     "menu": { "add": "Add", "count": 3 }
    /// }));
    ///
    /// assert!(tree.get("menu").is_some());
    /// ```
    #[must_use]
    pub fn from_json(json: &Value) -> Self {
        let mut tree = Self::new();
        if let Value::Object(map) = json {
            for (key, value) in map {
                match value {
                    Value::String(s) => {
                        tree.0.insert(key.clone(), TranslationNode::Leaf(s.clone()));
                    }
                    Value::Object(_) => {
                        tree.0.insert(key.clone(), TranslationNode::Tree(Self::from_json(value)));
                    }
                    // Non-string leaves behave as missing keys.
                    _ => {}
                }
            }
        }
        tree
    }

    /// Looks up a direct child by exact segment match.
    #[must_use]
    pub fn get(&self, segment: &str) -> Option<&TranslationNode> {
        self.0.get(segment)
    }

    /// Inserts or replaces a direct child.
    pub fn insert(&mut self, segment: impl Into<String>, node: TranslationNode) {
        self.0.insert(segment.into(), node);
    }

    /// Returns `true` when the tree has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Deep-merges `other` into this tree.
    ///
    /// Incoming leaves override existing values, subtrees merge recursively,
    /// and keys only present on one side are kept as-is.
    pub fn merge(&mut self, other: Self) {
        for (key, incoming) in other.0 {
            match (self.0.get_mut(&key), incoming) {
                (Some(TranslationNode::Tree(existing)), TranslationNode::Tree(sub)) => {
                    existing.merge(sub);
                }
                (_, incoming) => {
                    self.0.insert(key, incoming);
                }
            }
        }
    }
}

impl<'de> Deserialize<'de> for TranslationTree {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Deserialize through Value so malformed leaves degrade to missing
        // keys instead of failing the whole file.
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

/// A value substituted into a `{name}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// Substituted verbatim.
    Str(String),
    /// Rendered in default decimal form.
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    /// from_json: 文字列リーフとオブジェクトを保持する
    #[googletest::test]
    fn from_json_keeps_string_leaves_and_objects() {
        let tree = TranslationTree::from_json(&json!({
            "app": {
                "title": "Hello",
                "menu": { "add": "Add" }
            },
            "ok": "OK"
        }));

        expect_that!(tree.len(), eq(2));
        let Some(TranslationNode::Tree(app)) = tree.get("app") else {
            panic!("expected subtree under 'app'");
        };
        expect_that!(app.get("title"), some(eq(&TranslationNode::Leaf("Hello".to_string()))));
        expect_that!(tree.get("ok"), some(eq(&TranslationNode::Leaf("OK".to_string()))));
    }

    /// from_json: non-string leaves are dropped, not coerced
    #[googletest::test]
    fn from_json_drops_non_string_leaves() {
        let tree = TranslationTree::from_json(&json!({
            "count": 3,
            "flag": true,
            "nothing": null,
            "list": ["a", "b"],
            "name": "kept"
        }));

        expect_that!(tree.len(), eq(1));
        expect_that!(tree.get("count"), none());
        expect_that!(tree.get("list"), none());
        expect_that!(tree.get("name"), some(anything()));
    }

    /// from_json: ルートがオブジェクト以外なら空ツリー
    #[rstest]
    #[case::array_root(json!(["a"]))]
    #[case::string_root(json!("hello"))]
    #[case::number_root(json!(42))]
    fn from_json_non_object_root_is_empty(#[case] value: serde_json::Value) {
        let tree = TranslationTree::from_json(&value);

        assert!(tree.is_empty());
    }

    /// deserialize: serde deserialization applies the same lossy rules
    #[googletest::test]
    fn deserialize_goes_through_lossy_conversion() {
        let tree: TranslationTree =
            serde_json::from_str(r#"{"title": "Hello", "count": 3}"#).unwrap();

        expect_that!(tree.len(), eq(1));
        expect_that!(tree.get("title"), some(eq(&TranslationNode::Leaf("Hello".to_string()))));
    }

    /// merge: 深いマージでリーフは上書き、サブツリーは統合
    #[googletest::test]
    fn merge_overrides_leaves_and_merges_subtrees() {
        let mut base = TranslationTree::from_json(&json!({
            "menu": { "add": "Add", "remove": "Remove" },
            "title": "Old"
        }));
        let incoming = TranslationTree::from_json(&json!({
            "menu": { "add": "Add item" },
            "title": "New",
            "footer": "Footer"
        }));

        base.merge(incoming);

        let Some(TranslationNode::Tree(menu)) = base.get("menu") else {
            panic!("expected subtree under 'menu'");
        };
        expect_that!(menu.get("add"), some(eq(&TranslationNode::Leaf("Add item".to_string()))));
        expect_that!(menu.get("remove"), some(eq(&TranslationNode::Leaf("Remove".to_string()))));
        expect_that!(base.get("title"), some(eq(&TranslationNode::Leaf("New".to_string()))));
        expect_that!(base.get("footer"), some(eq(&TranslationNode::Leaf("Footer".to_string()))));
    }

    /// merge: an incoming subtree replaces an existing leaf
    #[googletest::test]
    fn merge_replaces_leaf_with_subtree() {
        let mut base = TranslationTree::from_json(&json!({ "menu": "flat" }));
        let incoming = TranslationTree::from_json(&json!({ "menu": { "add": "Add" } }));

        base.merge(incoming);

        expect_that!(matches!(base.get("menu"), Some(TranslationNode::Tree(_))), eq(true));
    }

    /// ParamValue: Display 表現の確認
    #[rstest]
    #[case::string(ParamValue::from("カシヲ"), "カシヲ")]
    #[case::positive(ParamValue::from(42_i64), "42")]
    #[case::negative(ParamValue::from(-7_i32), "-7")]
    #[case::unsigned(ParamValue::from(7_u32), "7")]
    fn param_value_display(#[case] value: ParamValue, #[case] expected: &str) {
        assert_eq!(value.to_string(), expected);
    }
}
