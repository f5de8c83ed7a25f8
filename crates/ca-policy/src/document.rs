// document.rs — Option-typed accessors over untyped JSON documents.
//
// Policy records and requirement templates are both plain serde_json
// values. "Field absent" is modelled as `None` everywhere; a JSON `null`
// reads the same as an absent key. Descending into anything that is not a
// mapping is a shape mismatch and reported as a MatchFault.

use std::fmt;

use serde_json::Value;

use crate::error::MatchFault;

/// A dotted key path into a document, used for fault messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    /// The document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path starting at a top-level key.
    pub fn at(key: &str) -> Self {
        Self(vec![key.to_string()])
    }

    pub fn push(&mut self, key: &str) {
        self.0.push(key.to_string());
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0.join("."))
        }
    }
}

/// Human-readable name of a JSON value's type.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Look up `key` under `parent`, where `parent` sits at `path`.
///
/// - absent or `null` parent → `Ok(None)`
/// - mapping parent → the child, with `null` children reported as `None`
/// - any other parent → [`MatchFault::ShapeMismatch`]
pub fn lookup<'a>(
    parent: Option<&'a Value>,
    key: &str,
    path: &KeyPath,
) -> Result<Option<&'a Value>, MatchFault> {
    match parent {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(map.get(key).filter(|v| !v.is_null())),
        Some(other) => Err(MatchFault::ShapeMismatch {
            path: path.to_string(),
            found: kind_of(other),
        }),
    }
}

/// Follow a sequence of keys from `root`.
pub fn lookup_path<'a>(root: &'a Value, keys: &[&str]) -> Result<Option<&'a Value>, MatchFault> {
    let mut path = KeyPath::root();
    let mut current = Some(root);
    for key in keys {
        current = lookup(current, key, &path)?;
        path.push(key);
    }
    Ok(current)
}

/// Coerce a value into a sequence for list comparison.
///
/// Absent and `null` become empty, a list is returned element-wise, and any
/// other value becomes a one-element sequence.
pub fn normalize(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_reads_mapping_child() {
        let doc = json!({ "users": { "includeRoles": ["GlobalAdmin"] } });
        let users = lookup(Some(&doc), "users", &KeyPath::root()).unwrap();
        assert_eq!(users, Some(&json!({ "includeRoles": ["GlobalAdmin"] })));
    }

    #[test]
    fn lookup_missing_and_null_are_absent() {
        let doc = json!({ "users": null });
        assert_eq!(lookup(Some(&doc), "users", &KeyPath::root()), Ok(None));
        assert_eq!(lookup(Some(&doc), "platforms", &KeyPath::root()), Ok(None));
        assert_eq!(lookup(None, "anything", &KeyPath::root()), Ok(None));
        assert_eq!(lookup(Some(&Value::Null), "anything", &KeyPath::root()), Ok(None));
    }

    #[test]
    fn lookup_into_scalar_is_shape_mismatch() {
        let doc = json!("enabled");
        let err = lookup(Some(&doc), "users", &KeyPath::at("conditions")).unwrap_err();
        assert_eq!(
            err,
            MatchFault::ShapeMismatch {
                path: "conditions".to_string(),
                found: "a string",
            }
        );
    }

    #[test]
    fn lookup_path_reports_full_path_on_mismatch() {
        let doc = json!({ "conditions": { "users": ["not", "a", "mapping"] } });
        let err = lookup_path(&doc, &["conditions", "users", "includeRoles"]).unwrap_err();
        assert_eq!(err.to_string(), "expected a mapping at 'conditions.users', found a list");
    }

    #[test]
    fn lookup_path_through_absent_parent_is_absent() {
        let doc = json!({ "displayName": "p" });
        assert_eq!(lookup_path(&doc, &["conditions", "users", "includeRoles"]), Ok(None));
    }

    #[test]
    fn normalize_shapes() {
        assert!(normalize(None).is_empty());
        assert!(normalize(Some(&Value::Null)).is_empty());
        assert_eq!(normalize(Some(&json!("mfa"))), vec![&json!("mfa")]);
        let list = json!(["a", "b"]);
        assert_eq!(normalize(Some(&list)), vec![&json!("a"), &json!("b")]);
    }

    #[test]
    fn root_path_displays_placeholder() {
        assert_eq!(KeyPath::root().to_string(), "<root>");
        let mut path = KeyPath::at("conditions");
        path.push("users");
        assert_eq!(path.to_string(), "conditions.users");
        path.pop();
        assert_eq!(path.to_string(), "conditions");
    }
}
