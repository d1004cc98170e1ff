//! Turning arrays into identity-keyed associations.
//!
//! Arrays are compared as maps from identity key to element, so that
//! reordering alone never shows up as a difference. Before keys are built:
//!
//! - nested arrays are flattened into one sequence;
//! - unless the rule says `keep`, elements that occur identically on both
//!   sides are removed pairwise, so only the diverging ones are keyed.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use jcmp_params::ParamId;
use jcmp_types::Value;

use crate::error::{DiffError, DiffResult};
use crate::key::{IncrementTable, KeyBuilder, Lineage, Side};
use crate::options::ComparisonOptions;

/// An array element together with its position in the flattened array.
pub type Positioned<'v> = (usize, &'v Value);

/// Flatten nested arrays, depth first, into their leaf elements.
pub fn flatten(items: &[Value]) -> Vec<&Value> {
    let mut out = Vec::with_capacity(items.len());
    push_leaves(items, &mut out);
    out
}

fn push_leaves<'v>(items: &'v [Value], out: &mut Vec<&'v Value>) {
    for item in items {
        match item {
            Value::Array(inner) => push_leaves(inner, out),
            other => out.push(other),
        }
    }
}

/// Remove the elements present identically on both sides.
///
/// Matching is by canonical rendering and pairwise: an element that occurs
/// twice on one side and once on the other survives once. Positions refer
/// to the input sequences.
pub fn clear_siblings<'v>(
    first: &[&'v Value],
    second: &[&'v Value],
) -> (Vec<Positioned<'v>>, Vec<Positioned<'v>>) {
    let first_renders: Vec<String> = first.iter().map(|v| v.render()).collect();
    let second_renders: Vec<String> = second.iter().map(|v| v.render()).collect();

    let mut available: HashMap<&str, usize> = HashMap::new();
    for render in &second_renders {
        *available.entry(render.as_str()).or_insert(0) += 1;
    }

    let mut cleared: HashMap<&str, usize> = HashMap::new();
    let mut kept_first = Vec::new();
    for (position, (value, render)) in first.iter().zip(&first_renders).enumerate() {
        match available.get_mut(render.as_str()) {
            Some(left) if *left > 0 => {
                *left -= 1;
                *cleared.entry(render.as_str()).or_insert(0) += 1;
            }
            _ => kept_first.push((position, *value)),
        }
    }

    let mut kept_second = Vec::new();
    for (position, (value, render)) in second.iter().zip(&second_renders).enumerate() {
        match cleared.get_mut(render.as_str()) {
            Some(left) if *left > 0 => *left -= 1,
            _ => kept_second.push((position, *value)),
        }
    }

    (kept_first, kept_second)
}

/// Builds keyed associations from array elements.
#[derive(Clone, Copy, Debug)]
pub struct ArrayAligner<'o> {
    options: &'o ComparisonOptions,
    keys: KeyBuilder<'o>,
}

impl<'o> ArrayAligner<'o> {
    pub fn new(options: &'o ComparisonOptions) -> Self {
        Self {
            options,
            keys: KeyBuilder::new(&options.params),
        }
    }

    /// Key every element of one side of an array.
    ///
    /// `enclosing` is the lineage of the object holding the array. In
    /// strict mode two elements with one key must render identically
    /// (a warning is logged); in fast mode the last one wins.
    pub fn align<'v>(
        &self,
        param: Option<ParamId>,
        elements: &[Positioned<'v>],
        side: Side,
        enclosing: Option<&Lineage<'_>>,
        counters: &mut IncrementTable,
        path: &str,
    ) -> DiffResult<BTreeMap<String, &'v Value>> {
        let mut keyed: BTreeMap<String, &'v Value> = BTreeMap::new();

        for &(position, element) in elements {
            let key = self.key_of(param, position, element, enclosing, counters, path)?;

            if self.options.fast {
                keyed.insert(key, element);
                continue;
            }

            match keyed.get(&key) {
                Some(existing) if *existing == element => {
                    warn!(path, key = %key, ?side, "identical elements share an identity");
                }
                Some(_) => {
                    return Err(DiffError::DuplicateIdentity {
                        path: path.to_string(),
                        key,
                    });
                }
                None => {
                    keyed.insert(key, element);
                }
            }
        }

        debug!(
            path,
            ?side,
            elements = elements.len(),
            keys = keyed.len(),
            "aligned array"
        );
        Ok(keyed)
    }

    fn key_of(
        &self,
        param: Option<ParamId>,
        position: usize,
        element: &Value,
        enclosing: Option<&Lineage<'_>>,
        counters: &mut IncrementTable,
        path: &str,
    ) -> DiffResult<String> {
        if let Some(text) = element.scalar_text() {
            return Ok(text);
        }

        let rule = param.filter(|&id| self.options.params.get(id).has_identity_rule());
        let key = match rule {
            Some(id) => self.keys.build_key(id, element, enclosing, counters, path)?,
            None if self.options.index_fallback => format!("#{}", position + 1),
            None => {
                return Err(DiffError::MissingIdentityRule {
                    path: path.to_string(),
                })
            }
        };

        if key.is_empty() {
            return Err(DiffError::EmptyIdentityKey {
                path: path.to_string(),
                rule: rule
                    .map(|id| self.options.params.get(id).full_path().to_string())
                    .unwrap_or_default(),
            });
        }
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jcmp_params::IdParamTree;
    use serde_json::json;

    fn values(json: serde_json::Value) -> Vec<Value> {
        match Value::from(json) {
            Value::Array(items) => items,
            other => panic!("expected array, got {:?}", other),
        }
    }

    fn positioned(items: &[Value]) -> Vec<Positioned<'_>> {
        items.iter().enumerate().collect()
    }

    fn options(params: &str) -> ComparisonOptions {
        ComparisonOptions::new(IdParamTree::from_json(params).unwrap())
    }

    fn items_rule(options: &ComparisonOptions) -> Option<ParamId> {
        options.params.child_for(options.params.root(), "items")
    }

    #[test]
    fn flatten_matrices() {
        let items = values(json!([1, [2, [3, 4]], [], 5]));
        let flat: Vec<String> = flatten(&items).iter().map(|v| v.render()).collect();
        assert_eq!(flat, vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn clear_siblings_is_pairwise() {
        let first = values(json!([{"a": 1}, {"a": 1}, {"a": 2}]));
        let second = values(json!([{"a": 1}, {"a": 3}]));
        let first_refs: Vec<&Value> = first.iter().collect();
        let second_refs: Vec<&Value> = second.iter().collect();

        let (kept_first, kept_second) = clear_siblings(&first_refs, &second_refs);
        let positions: Vec<usize> = kept_first.iter().map(|(p, _)| *p).collect();
        assert_eq!(positions, vec![1, 2]);
        assert_eq!(kept_second.len(), 1);
        assert_eq!(kept_second[0].0, 1);
    }

    #[test]
    fn scalars_key_themselves() {
        let opts = options("{}");
        let items = values(json!([3, 1.5, "x", true, null]));
        let mut counters = IncrementTable::new();
        let keyed = ArrayAligner::new(&opts)
            .align(None, &positioned(&items), Side::First, None, &mut counters, "list")
            .unwrap();
        let keys: Vec<&String> = keyed.keys().collect();
        assert_eq!(keys, vec!["1.500000", "3", "null", "true", "x"]);
    }

    #[test]
    fn objects_need_a_rule_or_fallback() {
        let items = values(json!([{"a": 1}, {"a": 2}]));
        let mut counters = IncrementTable::new();

        let strict = options("{}");
        let err = ArrayAligner::new(&strict)
            .align(None, &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap_err();
        assert_eq!(err, DiffError::MissingIdentityRule { path: "items".into() });

        let lenient = options("{}").with_index_fallback(true);
        let keyed = ArrayAligner::new(&lenient)
            .align(None, &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap();
        let keys: Vec<&String> = keyed.keys().collect();
        assert_eq!(keys, vec!["#1", "#2"]);
    }

    #[test]
    fn rule_keys_objects() {
        let opts = options(r#"{"_for": {"items": {"_use": ["id"]}}}"#);
        let items = values(json!([{"id": 2, "v": "b"}, {"id": 1, "v": "a"}]));
        let mut counters = IncrementTable::new();
        let keyed = ArrayAligner::new(&opts)
            .align(items_rule(&opts), &positioned(&items), Side::Second, None, &mut counters, "items")
            .unwrap();
        assert_eq!(keyed["1"].get("v"), Some(&Value::from("a")));
        assert_eq!(keyed["2"].get("v"), Some(&Value::from("b")));
    }

    #[test]
    fn duplicates_strict_and_fast() {
        let items = values(json!([{"id": 1, "v": "x"}, {"id": 1, "v": "y"}]));
        let mut counters = IncrementTable::new();

        let strict = options(r#"{"_for": {"items": {"_use": ["id"]}}}"#);
        let err = ArrayAligner::new(&strict)
            .align(items_rule(&strict), &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap_err();
        match err {
            DiffError::DuplicateIdentity { key, .. } => assert_eq!(key, "1"),
            other => panic!("expected DuplicateIdentity, got {:?}", other),
        }

        let fast = options(r#"{"_for": {"items": {"_use": ["id"]}}}"#).with_fast(true);
        let keyed = ArrayAligner::new(&fast)
            .align(items_rule(&fast), &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap();
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed["1"].get("v"), Some(&Value::from("y")));
    }

    #[test]
    fn identical_duplicates_only_warn() {
        let opts = options(r#"{"_for": {"items": {"_use": ["id"]}}}"#);
        let items = values(json!([{"id": 1}, {"id": 1}]));
        let mut counters = IncrementTable::new();
        let keyed = ArrayAligner::new(&opts)
            .align(items_rule(&opts), &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap();
        assert_eq!(keyed.len(), 1);
    }

    #[test]
    fn empty_key_is_fatal_even_inside_when() {
        let opts = options(
            r#"{"_for": {"items": {"when": [{"prop": "t", "is": "a", "_use": ["label"]}]}}}"#,
        );
        let items = values(json!([{"t": "a", "label": ""}]));
        let mut counters = IncrementTable::new();
        let err = ArrayAligner::new(&opts)
            .align(items_rule(&opts), &positioned(&items), Side::First, None, &mut counters, "items")
            .unwrap_err();
        assert!(matches!(err, DiffError::EmptyIdentityKey { .. }), "got {err:?}");
    }
}
