//! Identity keys for array elements.
//!
//! The [`KeyBuilder`] evaluates one node of the identification parameter
//! tree against an object and returns the string that identifies that
//! object among its siblings. Evaluation order at each node:
//!
//! 1. `when` guards, first match wins; the branch's `name` prefixes its key.
//! 2. `_use` fields, joined with `~`.
//! 3. `look` entries (`.`, `..` or a field), joined with `~`; an array of
//!    objects contributes the keys of its elements joined with `|`.
//! 4. `incr` appends `#n`, counting identical keys within the enclosing
//!    object.
//!
//! Empty parts never produce a dangling separator.

use std::collections::HashMap;

use jcmp_params::{IdParam, IdParamTree, ParamId, PARENT_PATH, SELF_PATH};
use jcmp_types::{format_number, Value};

use crate::error::{DiffError, DiffResult};

/// Separator between the parts of a composite key.
pub const KEY_SEPARATOR: &str = "~";
/// Separator between the keys of the elements of a looked-up array.
pub const LIST_SEPARATOR: &str = "|";

const TEXT_FIELD: &str = "#text";

/// The chain of objects enclosing the value being examined, innermost first.
///
/// Lives on the stack of the traversal; nothing in the document points
/// back up.
#[derive(Clone, Copy, Debug)]
pub struct Lineage<'a> {
    pub node: &'a Value,
    pub up: Option<&'a Lineage<'a>>,
}

impl<'a> Lineage<'a> {
    /// The outermost link.
    pub fn root(node: &'a Value) -> Self {
        Self { node, up: None }
    }

    /// A link below `up`.
    pub fn below(node: &'a Value, up: Option<&'a Lineage<'a>>) -> Self {
        Self { node, up }
    }

    /// Number of links, this one included.
    pub fn depth(&self) -> usize {
        1 + self.up.map_or(0, Lineage::depth)
    }
}

/// Which document of the pair a value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Occurrence counters behind `incr`, for one side of one comparison pass.
///
/// A counter is scoped by the depth of the enclosing lineage and the
/// document path of the array being keyed. Paths carry the identity keys
/// of the enclosing elements, so two arrays under different objects count
/// independently.
#[derive(Debug, Default)]
pub struct IncrementTable {
    counts: HashMap<(usize, String, String), usize>,
}

impl IncrementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more occurrence of `name&key` under `enclosing` at `path`
    /// and return the decorated key.
    pub fn next(
        &mut self,
        enclosing: Option<&Lineage<'_>>,
        path: &str,
        name: &str,
        key: &str,
    ) -> String {
        let depth = enclosing.map_or(0, Lineage::depth);
        let counter = self
            .counts
            .entry((depth, path.to_string(), concat(name, "&", key)))
            .or_insert(0);
        *counter += 1;
        format!("{key}#{counter}")
    }
}

/// Interprets identification parameters against objects.
#[derive(Clone, Copy, Debug)]
pub struct KeyBuilder<'t> {
    tree: &'t IdParamTree,
}

impl<'t> KeyBuilder<'t> {
    pub fn new(tree: &'t IdParamTree) -> Self {
        Self { tree }
    }

    /// Build the identity key of `object` with the rule `param`.
    ///
    /// `enclosing` is the lineage of objects around `object`; `path` is the
    /// document path used in errors. The result may be empty only when the
    /// rule sits inside a `when` branch.
    pub fn build_key(
        &self,
        param: ParamId,
        object: &Value,
        enclosing: Option<&Lineage<'_>>,
        counters: &mut IncrementTable,
        path: &str,
    ) -> DiffResult<String> {
        let node = self.tree.get(param);
        let mut key = String::new();

        let branch = node
            .when
            .iter()
            .find(|guard| guard_text(object.get(&guard.prop)).as_deref() == Some(guard.is.as_str()));

        if let Some(guard) = branch {
            let sub = self.build_key(guard.param, object, enclosing, counters, path)?;
            key = concat(&self.tree.get(guard.param).name, KEY_SEPARATOR, &sub);
        } else if !node.use_fields.is_empty() {
            for field in &node.use_fields {
                let part = self.field_text(node, object, field, path)?;
                key = concat(&key, KEY_SEPARATOR, &part);
            }
            if key.is_empty() && !node.within_when() {
                return Err(DiffError::EmptyIdentityKey {
                    path: path.to_string(),
                    rule: node.full_path().to_string(),
                });
            }
        } else {
            for &looked in &node.look {
                let part = self.look_key(node, looked, object, enclosing, counters, path)?;
                key = concat(&key, KEY_SEPARATOR, &part);
            }
            if key.is_empty() && !node.within_when() {
                let rule = node.full_path().to_string();
                let path = path.to_string();
                return Err(if node.when.is_empty() {
                    DiffError::EmptyIdentityKey { path, rule }
                } else {
                    DiffError::NoBranchMatched { path, rule }
                });
            }
        }

        if node.incr {
            key = counters.next(enclosing, path, &node.name, &key);
        }

        Ok(key)
    }

    fn look_key(
        &self,
        node: &IdParam,
        looked: ParamId,
        object: &Value,
        enclosing: Option<&Lineage<'_>>,
        counters: &mut IncrementTable,
        path: &str,
    ) -> DiffResult<String> {
        let target = self.tree.get(looked);

        if target.at == PARENT_PATH {
            let Some(parent) = enclosing else {
                return Err(DiffError::MissingParent {
                    path: path.to_string(),
                    rule: node.full_path().to_string(),
                });
            };
            return self.build_key(looked, parent.node, parent.up, counters, path);
        }

        if target.at == SELF_PATH {
            return self.build_key(looked, object, enclosing, counters, path);
        }

        let here = Lineage::below(object, enclosing);
        match object.get(&target.at) {
            None => Ok(format!("({})", target.at)),
            Some(Value::Null) => Ok(target.at.clone()),
            Some(inner @ Value::Object(_)) => {
                self.build_key(looked, inner, Some(&here), counters, path)
            }
            Some(Value::Array(items)) => {
                let mut keys = Vec::with_capacity(items.len());
                for item in items {
                    if !matches!(item, Value::Object(_)) {
                        return Err(self.unsupported(node, &target.at, item, path));
                    }
                    let sub = self.build_key(looked, item, Some(&here), counters, path)?;
                    if !sub.is_empty() || !target.within_when() {
                        keys.push(sub);
                    }
                }
                Ok(keys.join(LIST_SEPARATOR))
            }
            Some(other) => Err(self.unsupported(node, &target.at, other, path)),
        }
    }

    fn field_text(
        &self,
        node: &IdParam,
        object: &Value,
        field: &str,
        path: &str,
    ) -> DiffResult<String> {
        match object.get(field) {
            None => Ok(format!("({field})")),
            Some(Value::Null) => Ok(field.to_string()),
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(Value::Number(n)) => Ok(format_number(*n)),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(inner @ Value::Object(_)) => self.field_text(node, inner, TEXT_FIELD, path),
            Some(other @ Value::Array(_)) => Err(self.unsupported(node, field, other, path)),
        }
    }

    fn unsupported(&self, node: &IdParam, field: &str, value: &Value, path: &str) -> DiffError {
        DiffError::UnsupportedKeyValue {
            path: path.to_string(),
            rule: node.full_path().to_string(),
            field: field.to_string(),
            kind: value.kind(),
        }
    }
}

/// Text a guard compares against its expected value.
fn guard_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Array(_) => None,
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) if n.fract() != 0.0 => Some(n.to_string()),
        Value::Number(n) => Some(format_number(*n)),
        Value::String(s) => Some(s.clone()),
        Value::Object(fields) => guard_text(fields.get(TEXT_FIELD)),
    }
}

/// Join two parts with `sep`, skipping empty ones.
pub(crate) fn concat(first: &str, sep: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first}{sep}{second}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(json: &str) -> IdParamTree {
        IdParamTree::from_json(json).unwrap()
    }

    fn value(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn rule(tree: &IdParamTree, field: &str) -> ParamId {
        tree.child_for(tree.root(), field).unwrap()
    }

    fn key_of(tree: &IdParamTree, field: &str, object: &Value) -> DiffResult<String> {
        let mut counters = IncrementTable::new();
        KeyBuilder::new(tree).build_key(rule(tree, field), object, None, &mut counters, "items")
    }

    #[test]
    fn concat_skips_empty_parts() {
        assert_eq!(concat("", "~", "b"), "b");
        assert_eq!(concat("a", "~", ""), "a");
        assert_eq!(concat("a", "~", "b"), "a~b");
    }

    #[test]
    fn use_fields_are_joined() {
        let t = tree(r#"{"_for": {"items": {"_use": ["id", "rev", "live", "ratio"]}}}"#);
        let object = value(json!({"id": 7, "rev": "b", "live": true, "ratio": 0.5}));
        assert_eq!(key_of(&t, "items", &object).unwrap(), "7~b~true~0.500000");
    }

    #[test]
    fn absent_null_and_text_fields() {
        let t = tree(r#"{"_for": {"items": {"_use": ["missing", "nothing", "code"]}}}"#);
        let object = value(json!({"nothing": null, "code": {"@lang": "en", "#text": "X1"}}));
        assert_eq!(key_of(&t, "items", &object).unwrap(), "(missing)~nothing~X1");
    }

    #[test]
    fn array_field_in_use_is_unsupported() {
        let t = tree(r#"{"_for": {"items": {"_use": ["tags"]}}}"#);
        let err = key_of(&t, "items", &value(json!({"tags": [1]}))).unwrap_err();
        match err {
            DiffError::UnsupportedKeyValue { field, .. } => assert_eq!(field, "tags"),
            other => panic!("expected UnsupportedKeyValue, got {:?}", other),
        }
    }

    #[test]
    fn empty_key_outside_when_fails() {
        let t = tree(r#"{"_for": {"items": {"_use": ["name"]}}}"#);
        let err = key_of(&t, "items", &value(json!({"name": ""}))).unwrap_err();
        assert!(matches!(err, DiffError::EmptyIdentityKey { .. }), "got {err:?}");
    }

    #[test]
    fn first_matching_guard_wins_and_prefixes_name() {
        let t = tree(
            r#"{"_for": {"items": {"when": [
                {"prop": "type", "is": "a", "name": "A", "_use": ["x"]},
                {"prop": "type", "is": "a", "name": "second", "_use": ["y"]},
                {"prop": "n", "is": "3", "_use": ["y"]}
            ]}}}"#,
        );
        let first = value(json!({"type": "a", "x": 1, "y": 2}));
        assert_eq!(key_of(&t, "items", &first).unwrap(), "A~1");

        let numeric = value(json!({"type": "b", "n": 3, "y": "z"}));
        assert_eq!(key_of(&t, "items", &numeric).unwrap(), "z");
    }

    #[test]
    fn unmatched_guards_fall_through_to_use() {
        let t = tree(
            r#"{"_for": {"items": {
                "when": [{"prop": "type", "is": "a", "_use": ["x"]}],
                "_use": ["id"]
            }}}"#,
        );
        let object = value(json!({"type": "other", "id": "k"}));
        assert_eq!(key_of(&t, "items", &object).unwrap(), "k");
    }

    #[test]
    fn unmatched_guards_with_nothing_else_fail() {
        let t = tree(r#"{"_for": {"items": {"when": [{"prop": "type", "is": "a", "_use": ["x"]}]}}}"#);
        let err = key_of(&t, "items", &value(json!({"type": "b"}))).unwrap_err();
        match err {
            DiffError::NoBranchMatched { path, rule } => {
                assert_eq!(path, "items");
                assert_eq!(rule, "items");
            }
            other => panic!("expected NoBranchMatched, got {:?}", other),
        }
    }

    #[test]
    fn empty_key_inside_when_is_tolerated() {
        let t = tree(
            r#"{"_for": {"items": {"when": [
                {"prop": "type", "is": "a", "name": "A", "_use": ["label"]}
            ]}}}"#,
        );
        let object = value(json!({"type": "a", "label": ""}));
        assert_eq!(key_of(&t, "items", &object).unwrap(), "A");
    }

    #[test]
    fn look_into_object_self_and_array() {
        let t = tree(
            r#"{"_for": {"items": {"look": [
                {"at": ".", "_use": ["id"]},
                {"at": "owner", "_use": ["name"]},
                {"at": "parts", "_use": ["ref"]},
                {"at": "absent", "_use": ["x"]},
                {"at": "blank", "_use": ["x"]}
            ]}}}"#,
        );
        let object = value(json!({
            "id": 1,
            "owner": {"name": "ann"},
            "parts": [{"ref": "p1"}, {"ref": "p2"}],
            "blank": null
        }));
        assert_eq!(
            key_of(&t, "items", &object).unwrap(),
            "1~ann~p1|p2~(absent)~blank"
        );
    }

    #[test]
    fn look_at_scalar_is_unsupported() {
        let t = tree(r#"{"_for": {"items": {"look": [{"at": "id", "_use": ["x"]}]}}}"#);
        let err = key_of(&t, "items", &value(json!({"id": 4}))).unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedKeyValue { .. }), "got {err:?}");
    }

    #[test]
    fn look_at_parent_uses_lineage() {
        let t = tree(r#"{"_for": {"items": {"look": [{"at": "..", "_use": ["group"]}, {"at": ".", "_use": ["id"]}]}}}"#);
        let owner = value(json!({"group": "g1"}));
        let object = value(json!({"id": 2}));
        let lineage = Lineage::root(&owner);
        let mut counters = IncrementTable::new();

        let key = KeyBuilder::new(&t)
            .build_key(rule(&t, "items"), &object, Some(&lineage), &mut counters, "items")
            .unwrap();
        assert_eq!(key, "g1~2");

        let err = key_of(&t, "items", &object).unwrap_err();
        assert!(matches!(err, DiffError::MissingParent { .. }), "got {err:?}");
    }

    #[test]
    fn increments_count_per_array_path() {
        let t = tree(r#"{"_for": {"items": {"_use": ["kind"], "incr": true}}}"#);
        let builder = KeyBuilder::new(&t);
        let param = rule(&t, "items");
        let owner = value(json!({"n": 1}));
        let in_owner = Lineage::root(&owner);
        let object = value(json!({"kind": "x"}));
        let mut counters = IncrementTable::new();

        let mut next = |path: &str| {
            builder
                .build_key(param, &object, Some(&in_owner), &mut counters, path)
                .unwrap()
        };
        assert_eq!(next("groups>a>items"), "x#1");
        assert_eq!(next("groups>a>items"), "x#2");
        assert_eq!(next("groups>b>items"), "x#1");
    }

    #[test]
    fn increments_count_per_lineage_depth() {
        let mut counters = IncrementTable::new();
        let top = value(json!({}));
        let mid = value(json!({}));
        let root = Lineage::root(&top);
        let below = Lineage::below(&mid, Some(&root));

        assert_eq!(counters.next(Some(&root), "items", "n", "x"), "x#1");
        assert_eq!(counters.next(Some(&below), "items", "n", "x"), "x#1");
        assert_eq!(counters.next(Some(&below), "items", "n", "x"), "x#2");
        assert_eq!(counters.next(None, "items", "n", "x"), "x#1");
    }

    #[test]
    fn lineage_depth() {
        let top = value(json!({}));
        let mid = value(json!({}));
        let root = Lineage::root(&top);
        let below = Lineage::below(&mid, Some(&root));
        assert_eq!(below.depth(), 2);
        assert!(below.up.is_some());
    }
}
