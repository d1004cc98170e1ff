//! The delta tree produced by a comparison.
//!
//! A [`DiffNode`] mirrors the shape of the compared documents, but only
//! along the paths where something differs. Its JSON form is the one the
//! command line prints:
//!
//! | node                | JSON                          |
//! |---------------------|-------------------------------|
//! | `Unchanged`         | `{}`                          |
//! | `OnlyInFirst(v)`    | `{"_del_": v}`                |
//! | `OnlyInSecond(v)`   | `{"_new_": v}`                |
//! | `Changed(a, b)`     | `{"_one_": a, "_two_": b}`    |
//! | `Subtree(entries)`  | `{"key": node, ...}`          |

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use jcmp_types::Value;

/// JSON key wrapping a value found only in the first document.
pub const DELETED_KEY: &str = "_del_";
/// JSON key wrapping a value found only in the second document.
pub const NEW_KEY: &str = "_new_";
/// JSON key of the first side of a changed value.
pub const ONE_KEY: &str = "_one_";
/// JSON key of the second side of a changed value.
pub const TWO_KEY: &str = "_two_";

/// One node of the structural delta.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DiffNode {
    /// Nothing differs here.
    #[default]
    Unchanged,
    /// Present in the first document only (or its alias).
    OnlyInFirst(Value),
    /// Present in the second document only (or its alias).
    OnlyInSecond(Value),
    /// Same place, different scalar values.
    Changed(Value, Value),
    /// Differences below this point, keyed by field name or identity key.
    Subtree(BTreeMap<String, DiffNode>),
}

/// Counts of the leaves of a delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub only_in_first: usize,
    pub only_in_second: usize,
    pub changed: usize,
}

impl DiffStats {
    /// Total number of leaves.
    pub fn total(&self) -> usize {
        self.only_in_first + self.only_in_second + self.changed
    }
}

impl DiffNode {
    /// Build a subtree, dropping unchanged entries.
    ///
    /// An empty result is still a `Subtree`, which [`is_unchanged`] treats
    /// as no difference.
    ///
    /// [`is_unchanged`]: DiffNode::is_unchanged
    pub fn subtree<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, DiffNode)>,
    {
        Self::Subtree(
            entries
                .into_iter()
                .filter(|(_, node)| !node.is_unchanged())
                .collect(),
        )
    }

    /// Returns `true` if this node reports no difference at all.
    pub fn is_unchanged(&self) -> bool {
        match self {
            Self::Unchanged => true,
            Self::Subtree(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Child of a subtree by key.
    pub fn get(&self, key: &str) -> Option<&DiffNode> {
        match self {
            Self::Subtree(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Entries of a subtree; empty for every other node.
    pub fn entries(&self) -> impl Iterator<Item = (&String, &DiffNode)> {
        let entries = match self {
            Self::Subtree(entries) => Some(entries.iter()),
            _ => None,
        };
        entries.into_iter().flatten()
    }

    /// Add an entry, turning `Unchanged` into a subtree first.
    ///
    /// Unchanged entries are ignored. Entries added to a leaf node replace
    /// it with a subtree holding only the new entry.
    pub fn insert(&mut self, key: impl Into<String>, node: DiffNode) {
        if node.is_unchanged() {
            return;
        }
        match self {
            Self::Subtree(entries) => {
                entries.insert(key.into(), node);
            }
            other => {
                let mut entries = BTreeMap::new();
                entries.insert(key.into(), node);
                *other = Self::Subtree(entries);
            }
        }
    }

    /// Fold every entry of `other` into this node.
    pub fn merge(&mut self, other: DiffNode) {
        match other {
            Self::Subtree(entries) => {
                for (key, node) in entries {
                    self.insert(key, node);
                }
            }
            Self::Unchanged => {}
            leaf => *self = leaf,
        }
    }

    /// Count the leaves of this delta.
    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        self.accumulate(&mut stats);
        stats
    }

    fn accumulate(&self, stats: &mut DiffStats) {
        match self {
            Self::Unchanged => {}
            Self::OnlyInFirst(_) => stats.only_in_first += 1,
            Self::OnlyInSecond(_) => stats.only_in_second += 1,
            Self::Changed(_, _) => stats.changed += 1,
            Self::Subtree(entries) => {
                for node in entries.values() {
                    node.accumulate(stats);
                }
            }
        }
    }

    /// Pretty JSON rendering of the delta.
    pub fn to_json_pretty(&self) -> String {
        // Serializing this type into a String cannot fail.
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

impl Serialize for DiffNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unchanged => serializer.serialize_map(Some(0))?.end(),
            Self::OnlyInFirst(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(DELETED_KEY, value)?;
                map.end()
            }
            Self::OnlyInSecond(value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(NEW_KEY, value)?;
                map.end()
            }
            Self::Changed(one, two) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(ONE_KEY, one)?;
                map.serialize_entry(TWO_KEY, two)?;
                map.end()
            }
            Self::Subtree(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, node) in entries {
                    map.serialize_entry(key, node)?;
                }
                map.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_subtree_is_unchanged() {
        assert!(DiffNode::Unchanged.is_unchanged());
        assert!(DiffNode::Subtree(BTreeMap::new()).is_unchanged());
        assert!(!DiffNode::OnlyInFirst(Value::Null).is_unchanged());
    }

    #[test]
    fn subtree_drops_unchanged_entries() {
        let node = DiffNode::subtree([
            ("a".to_string(), DiffNode::Unchanged),
            ("b".to_string(), DiffNode::Changed(1.0.into(), 2.0.into())),
            ("c".to_string(), DiffNode::Subtree(BTreeMap::new())),
        ]);
        assert_eq!(node.entries().count(), 1);
        assert!(node.get("b").is_some());
    }

    #[test]
    fn serializes_to_wire_shape() {
        let node = DiffNode::subtree([
            ("gone".to_string(), DiffNode::OnlyInFirst("x".into())),
            ("added".to_string(), DiffNode::OnlyInSecond(true.into())),
            ("moved".to_string(), DiffNode::Changed(1.0.into(), 2.5.into())),
        ]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            json!({
                "added": {"_new_": true},
                "gone": {"_del_": "x"},
                "moved": {"_one_": 1, "_two_": 2.5}
            })
        );
        assert_eq!(serde_json::to_string(&DiffNode::Unchanged).unwrap(), "{}");
    }

    #[test]
    fn insert_and_merge() {
        let mut node = DiffNode::Unchanged;
        node.insert("a", DiffNode::Unchanged);
        assert_eq!(node, DiffNode::Unchanged);

        node.insert("a", DiffNode::OnlyInFirst("1".into()));
        let mut other = DiffNode::Unchanged;
        other.insert("b", DiffNode::OnlyInSecond("2".into()));
        node.merge(other);
        node.merge(DiffNode::Unchanged);

        let keys: Vec<&String> = node.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn stats_count_leaves() {
        let mut node = DiffNode::Unchanged;
        node.insert("a", DiffNode::OnlyInFirst("1".into()));
        node.insert(
            "b",
            DiffNode::subtree([
                ("c".to_string(), DiffNode::Changed(1.0.into(), 2.0.into())),
                ("d".to_string(), DiffNode::OnlyInSecond("2".into())),
            ]),
        );
        let stats = node.stats();
        assert_eq!(stats.only_in_first, 1);
        assert_eq!(stats.only_in_second, 1);
        assert_eq!(stats.changed, 1);
        assert_eq!(stats.total(), 3);
    }
}
