//! The recursive value comparator.
//!
//! [`Comparator`] walks two value trees in parallel. Objects go through the
//! map differ with the `_for` rules of the current parameter; arrays are
//! keyed by the [`ArrayAligner`] and then diffed as maps whose entries all
//! share the array's parameter.
//!
//! One comparator is one comparison pass: it owns the `incr` counters of
//! both sides, so it must not be reused for an unrelated pair of documents.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use jcmp_params::ParamId;
use jcmp_types::{Value, ValueKind};

use crate::align::{clear_siblings, flatten, ArrayAligner};
use crate::alias::{AliasRenderer, TemplateRenderer};
use crate::delta::DiffNode;
use crate::error::{DiffError, DiffResult};
use crate::key::{IncrementTable, Lineage, Side};
use crate::options::ComparisonOptions;

/// Separator between the segments of a document path.
pub const PATH_SEPARATOR: &str = ">";

/// Compare two documents with the given options.
pub fn compare_values(
    first: &Value,
    second: &Value,
    options: &ComparisonOptions,
) -> DiffResult<DiffNode> {
    Comparator::new(options).compare(first, second)
}

/// A single comparison pass over two value trees.
pub struct Comparator<'o> {
    options: &'o ComparisonOptions,
    aligner: ArrayAligner<'o>,
    aliases: &'o dyn AliasRenderer,
    first_counters: IncrementTable,
    second_counters: IncrementTable,
}

impl<'o> Comparator<'o> {
    pub fn new(options: &'o ComparisonOptions) -> Self {
        Self {
            options,
            aligner: ArrayAligner::new(options),
            aliases: &TemplateRenderer,
            first_counters: IncrementTable::new(),
            second_counters: IncrementTable::new(),
        }
    }

    /// Use another alias renderer.
    pub fn with_renderer(mut self, aliases: &'o dyn AliasRenderer) -> Self {
        self.aliases = aliases;
        self
    }

    /// Compare two whole documents, starting at the root parameter.
    pub fn compare(&mut self, first: &Value, second: &Value) -> DiffResult<DiffNode> {
        let root = self.options.params.root();
        self.compare_at(Some(root), Some(first), Some(second), None, None, "")
    }

    /// Compare two values found at `path`, governed by `param`.
    ///
    /// `None` and `Null` both mean the value is absent. `first_up` and
    /// `second_up` are the lineages of the objects holding each value.
    pub fn compare_at(
        &mut self,
        param: Option<ParamId>,
        first: Option<&Value>,
        second: Option<&Value>,
        first_up: Option<&Lineage<'_>>,
        second_up: Option<&Lineage<'_>>,
        path: &str,
    ) -> DiffResult<DiffNode> {
        let first = first.filter(|v| !v.is_null());
        let second = second.filter(|v| !v.is_null());

        let (first, second) = match (first, second) {
            (None, None) => return Ok(DiffNode::Unchanged),
            (Some(one), None) => return Ok(DiffNode::OnlyInFirst(self.display(param, one, path)?)),
            (None, Some(two)) => return Ok(DiffNode::OnlyInSecond(self.display(param, two, path)?)),
            (Some(one), Some(two)) => (one, two),
        };

        match (first, second) {
            (Value::Object(one), Value::Object(two)) => {
                let first_here = Lineage::below(first, first_up);
                let second_here = Lineage::below(second, second_up);
                let one: BTreeMap<String, &Value> =
                    one.iter().map(|(k, v)| (k.clone(), v)).collect();
                let two: BTreeMap<String, &Value> =
                    two.iter().map(|(k, v)| (k.clone(), v)).collect();
                self.diff_maps(
                    param,
                    &one,
                    &two,
                    false,
                    (Some(&first_here), Some(&second_here)),
                    path,
                )
            }
            (Value::Array(_), _) | (_, Value::Array(_)) => {
                let first_items = elements(first);
                let second_items = elements(second);
                self.check_promotion(first, second, &first_items, &second_items, path)?;
                self.compare_arrays(
                    param,
                    (first, second),
                    (first_items, second_items),
                    (first_up, second_up),
                    path,
                )
            }
            (one, two) if one.kind() == two.kind() => {
                if one == two {
                    Ok(DiffNode::Unchanged)
                } else {
                    Ok(DiffNode::Changed(one.clone(), two.clone()))
                }
            }
            (one, two) => Err(incompatible(path, one.kind(), two.kind())),
        }
    }

    /// A single value facing an array is only accepted when it could be an
    /// element of that array.
    fn check_promotion(
        &self,
        first: &Value,
        second: &Value,
        first_items: &[&Value],
        second_items: &[&Value],
        path: &str,
    ) -> DiffResult<()> {
        let (array_items, single, single_is_first) = match (first, second) {
            (Value::Array(_), Value::Array(_)) => return Ok(()),
            (Value::Array(_), single) => (first_items, single, false),
            (single, _) => (second_items, single, true),
        };

        match array_items.first() {
            None => Ok(()),
            Some(element) if element.kind() == single.kind() => Ok(()),
            Some(_) if single_is_first => Err(incompatible(path, single.kind(), ValueKind::Array)),
            Some(_) => Err(incompatible(path, ValueKind::Array, single.kind())),
        }
    }

    fn compare_arrays<'v>(
        &mut self,
        param: Option<ParamId>,
        (first, second): (&'v Value, &'v Value),
        (first_items, second_items): (Vec<&'v Value>, Vec<&'v Value>),
        (first_up, second_up): (Option<&Lineage<'_>>, Option<&Lineage<'_>>),
        path: &str,
    ) -> DiffResult<DiffNode> {
        // A one-sided array is shown whole, in its source order.
        match (first_items.is_empty(), second_items.is_empty()) {
            (true, true) => return Ok(DiffNode::Unchanged),
            (false, true) => return Ok(DiffNode::OnlyInFirst(self.display(param, first, path)?)),
            (true, false) => return Ok(DiffNode::OnlyInSecond(self.display(param, second, path)?)),
            (false, false) => {}
        }

        let (first_kind, second_kind) = (first_items[0].kind(), second_items[0].kind());
        if first_kind != second_kind {
            return Err(incompatible(path, first_kind, second_kind));
        }

        let keep = param.is_some_and(|id| self.options.params.get(id).keep);
        let (first_kept, second_kept) = if keep {
            (
                first_items.iter().copied().enumerate().collect(),
                second_items.iter().copied().enumerate().collect(),
            )
        } else {
            clear_siblings(&first_items, &second_items)
        };

        debug!(
            path,
            first = first_items.len(),
            second = second_items.len(),
            diverging_first = first_kept.len(),
            diverging_second = second_kept.len(),
            "comparing arrays"
        );

        let first_keyed = self.aligner.align(
            param,
            &first_kept,
            Side::First,
            first_up,
            &mut self.first_counters,
            path,
        )?;
        let second_keyed = self.aligner.align(
            param,
            &second_kept,
            Side::Second,
            second_up,
            &mut self.second_counters,
            path,
        )?;

        self.diff_maps(
            param,
            &first_keyed,
            &second_keyed,
            true,
            (first_up, second_up),
            path,
        )
    }

    /// Diff two keyed associations.
    ///
    /// Entries of objects (`from_array == false`) take the `_for` rule of
    /// their field; entries of an aligned array keep the array's rule.
    fn diff_maps(
        &mut self,
        param: Option<ParamId>,
        first: &BTreeMap<String, &Value>,
        second: &BTreeMap<String, &Value>,
        from_array: bool,
        (first_up, second_up): (Option<&Lineage<'_>>, Option<&Lineage<'_>>),
        path: &str,
    ) -> DiffResult<DiffNode> {
        let keys: BTreeSet<&String> = first.keys().chain(second.keys()).collect();
        let mut entries = BTreeMap::new();

        for key in keys {
            let child = if from_array {
                param
            } else {
                param.and_then(|id| self.options.params.child_for(id, key))
            };
            let child_path = join_path(path, key);
            let node = self.compare_at(
                child,
                first.get(key).copied(),
                second.get(key).copied(),
                first_up,
                second_up,
                &child_path,
            )?;
            if !node.is_unchanged() {
                entries.insert(key.clone(), node);
            }
        }

        Ok(DiffNode::Subtree(entries))
    }

    /// What a one-sided value looks like in the delta.
    fn display(&self, param: Option<ParamId>, value: &Value, path: &str) -> DiffResult<Value> {
        let rule = param.map(|id| self.options.params.get(id));
        let failure = |e: crate::alias::TemplateError| DiffError::TemplateFailure {
            path: path.to_string(),
            reason: e.0,
        };

        match value {
            Value::Object(_) => {
                if let Some(template) = rule.and_then(|r| r.single_template()) {
                    return self.aliases.render(template, value).map(Value::String).map_err(failure);
                }
            }
            Value::Array(items) if !items.is_empty() && items.iter().all(|i| matches!(i, Value::Object(_))) => {
                if let Some(template) = rule.and_then(|r| r.each_template()) {
                    return self.aliases.render_each(template, items).map(Value::String).map_err(failure);
                }
            }
            _ => return Ok(value.clone()),
        }

        if self.options.allow_raw {
            Ok(value.clone())
        } else {
            Err(DiffError::MissingAlias {
                path: path.to_string(),
                kind: value.kind(),
            })
        }
    }
}

/// Elements of an array (flattened), or the value itself.
fn elements(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => flatten(items),
        single => vec![single],
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}{PATH_SEPARATOR}{key}")
    }
}

fn incompatible(path: &str, first: ValueKind, second: ValueKind) -> DiffError {
    DiffError::IncompatibleTypes {
        path: path.to_string(),
        first,
        second,
    }
}
