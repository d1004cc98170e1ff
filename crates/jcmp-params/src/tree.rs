//! The resolved identification parameter tree.
//!
//! [`IdParamTree`] stores every node of a [`ParamSpec`] in a flat arena.
//! Nodes refer to each other through [`ParamId`] indices. Everything that
//! depends on a node's ancestors (full path, `when` ancestry, inherited
//! templates) is folded into the node while the tree is built.
//!
//! # Invariants
//!
//! - Node 0 is the root; every other node has exactly one parent.
//! - Full paths, `within_when` and inherited templates are computed once,
//!   while the tree is built, and never change afterwards.
//! - A [`ParamId`] is only ever produced by the tree that owns the node.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use crate::error::{ParamError, ParamResult};
use crate::spec::ParamSpec;

/// `at` value designating the object being keyed.
pub const SELF_PATH: &str = ".";
/// `at` value designating the object enclosing the one being keyed.
pub const PARENT_PATH: &str = "..";

/// Index of a node within an [`IdParamTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(usize);

/// A resolved `when` branch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guard {
    /// Field whose text is tested.
    pub prop: String,
    /// Expected text.
    pub is: String,
    /// Rule applied when the guard matches.
    pub param: ParamId,
}

/// A resolved node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdParam {
    pub at: String,
    pub use_fields: Vec<String>,
    pub look: Vec<ParamId>,
    pub when: Vec<Guard>,
    pub for_fields: BTreeMap<String, ParamId>,
    pub name: String,
    pub incr: bool,
    pub keep: bool,
    within_when: bool,
    full_path: String,
    tpl1: String,
    tpl_n: String,
}

impl IdParam {
    /// Whether this node or one of its ancestors is a `when` branch.
    ///
    /// Empty keys are tolerated inside such branches.
    pub fn within_when(&self) -> bool {
        self.within_when
    }

    /// Dotted path from the root, used in error messages and logs.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Alias template for a single object, if any.
    pub fn single_template(&self) -> Option<&str> {
        (!self.tpl1.is_empty()).then_some(self.tpl1.as_str())
    }

    /// Alias template for each element of an array of objects, if any.
    pub fn each_template(&self) -> Option<&str> {
        (!self.tpl_n.is_empty()).then_some(self.tpl_n.as_str())
    }

    /// Whether this node says anything about how to key objects.
    pub fn has_identity_rule(&self) -> bool {
        !self.use_fields.is_empty() || !self.look.is_empty() || !self.when.is_empty()
    }

    fn is_self_ref(&self) -> bool {
        self.at == SELF_PATH
    }
}

/// The resolved, read-only parameter tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdParamTree {
    nodes: Vec<IdParam>,
}

impl Default for IdParamTree {
    fn default() -> Self {
        Self::empty()
    }
}

impl IdParamTree {
    /// A tree with a single rule-less root.
    pub fn empty() -> Self {
        Self {
            nodes: vec![IdParam {
                at: String::new(),
                use_fields: Vec::new(),
                look: Vec::new(),
                when: Vec::new(),
                for_fields: BTreeMap::new(),
                name: String::new(),
                incr: false,
                keep: false,
                within_when: false,
                full_path: String::new(),
                tpl1: String::new(),
                tpl_n: String::new(),
            }],
        }
    }

    /// Resolve a parsed parameter document.
    pub fn resolve(spec: ParamSpec) -> ParamResult<Self> {
        let mut tree = Self { nodes: Vec::new() };
        let at = spec.at.clone();
        tree.insert(spec, at, None, false)?;
        debug!(nodes = tree.nodes.len(), "resolved identification parameters");
        Ok(tree)
    }

    /// Parse and resolve a JSON parameter document.
    pub fn from_json(json: &str) -> ParamResult<Self> {
        Self::resolve(ParamSpec::from_json(json)?)
    }

    /// Load parameters from `source`: the path of an existing file, or
    /// else the JSON text itself.
    pub fn load(source: &str) -> ParamResult<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(ParamError::Empty);
        }

        let path = Path::new(trimmed);
        if path.is_file() {
            debug!(path = %path.display(), "reading identification parameters from file");
            let json = std::fs::read_to_string(path).map_err(|source| ParamError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            return Self::from_json(&json);
        }

        Self::from_json(trimmed)
    }

    /// The root node's id.
    pub fn root(&self) -> ParamId {
        ParamId(0)
    }

    /// Access a node.
    pub fn get(&self, id: ParamId) -> &IdParam {
        &self.nodes[id.0]
    }

    /// Rule for the values found under `field` of the objects governed by `id`.
    pub fn child_for(&self, id: ParamId, field: &str) -> Option<ParamId> {
        self.get(id).for_fields.get(field).copied()
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Human-readable outline of the resolved tree.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_node(self.root(), 0, None, &mut out);
        out
    }

    // ---------------------------------------------------------------
    // Resolution
    // ---------------------------------------------------------------

    fn insert(
        &mut self,
        spec: ParamSpec,
        at: String,
        parent: Option<ParamId>,
        is_when: bool,
    ) -> ParamResult<ParamId> {
        let id = ParamId(self.nodes.len());

        let (full_path, within_when, parent_tpl1, parent_tpl_n) = match parent {
            None => (at.clone(), is_when, String::new(), String::new()),
            Some(p) => {
                let up = self.get(p);
                let full_path = if is_when || at == SELF_PATH {
                    up.full_path.clone()
                } else if up.full_path.is_empty() {
                    at.clone()
                } else {
                    format!("{}.{}", up.full_path, at)
                };
                let same_place = full_path == up.full_path;
                (
                    full_path,
                    is_when || up.within_when,
                    if same_place { up.tpl1.clone() } else { String::new() },
                    if same_place { up.tpl_n.clone() } else { String::new() },
                )
            }
        };

        let mut tpl1 = spec.tpl1.concat();
        if tpl1.is_empty() {
            tpl1 = parent_tpl1;
        }
        let mut tpl_n = spec.tpl_n.concat();
        if tpl_n.is_empty() {
            tpl_n = parent_tpl_n;
        }
        if tpl_n.is_empty() {
            tpl_n = tpl1.clone();
        }

        self.nodes.push(IdParam {
            at,
            use_fields: spec.use_fields,
            look: Vec::new(),
            when: Vec::new(),
            for_fields: BTreeMap::new(),
            name: spec.name,
            incr: spec.incr,
            keep: spec.keep,
            within_when,
            full_path,
            tpl1,
            tpl_n,
        });

        for (field, child) in spec.for_fields {
            if field.is_empty() || field == SELF_PATH || field == PARENT_PATH {
                return Err(self.invalid(id, format!("'_for' cannot target '{field}'")));
            }
            let child_at = if child.at.is_empty() {
                field.clone()
            } else {
                child.at.clone()
            };
            if child_at == PARENT_PATH {
                return Err(self.invalid(id, "'..' is only allowed in 'look' entries"));
            }
            let child_id = self.insert(child, child_at, Some(id), false)?;
            self.nodes[id.0].for_fields.insert(field, child_id);
        }

        for guard in spec.when {
            if guard.prop.is_empty() {
                return Err(self.invalid(id, "a 'when' entry needs a 'prop'"));
            }
            let guard_at = if guard.param.at.is_empty() {
                self.get(id).at.clone()
            } else {
                guard.param.at.clone()
            };
            let guard_id = self.insert(guard.param, guard_at, Some(id), true)?;
            self.nodes[id.0].when.push(Guard {
                prop: guard.prop,
                is: guard.is,
                param: guard_id,
            });
        }

        for looked in spec.look {
            if looked.at.is_empty() {
                return Err(self.invalid(id, "a 'look' entry needs an 'at'"));
            }
            let looked_at = looked.at.clone();
            let looked_id = self.insert(looked, looked_at, Some(id), false)?;
            self.nodes[id.0].look.push(looked_id);
        }

        Ok(id)
    }

    fn invalid(&self, id: ParamId, reason: impl Into<String>) -> ParamError {
        let path = self.get(id).full_path.clone();
        ParamError::Invalid {
            path: if path.is_empty() { "<root>".to_string() } else { path },
            reason: reason.into(),
        }
    }

    // ---------------------------------------------------------------
    // Description
    // ---------------------------------------------------------------

    fn describe_node(&self, id: ParamId, depth: usize, label: Option<String>, out: &mut String) {
        let node = self.get(id);
        let indent = "  ".repeat(depth);
        let head = label.unwrap_or_else(|| {
            if node.full_path.is_empty() {
                "<root>".to_string()
            } else {
                node.full_path.clone()
            }
        });

        let mut traits = Vec::new();
        if !node.use_fields.is_empty() {
            traits.push(format!("use {}", node.use_fields.join(", ")));
        }
        if !node.name.is_empty() {
            traits.push(format!("name {}", node.name));
        }
        if node.incr {
            traits.push("incr".to_string());
        }
        if node.keep {
            traits.push("keep".to_string());
        }
        if let Some(tpl) = node.single_template() {
            traits.push(format!("tpl1 {tpl:?}"));
        }
        if let Some(tpl) = node.each_template().filter(|t| Some(*t) != node.single_template()) {
            traits.push(format!("tplN {tpl:?}"));
        }

        if traits.is_empty() {
            let _ = writeln!(out, "{indent}{head}");
        } else {
            let _ = writeln!(out, "{indent}{head} [{}]", traits.join("; "));
        }

        for guard in &node.when {
            let label = format!("when {} = {:?}", guard.prop, guard.is);
            self.describe_node(guard.param, depth + 1, Some(label), out);
        }
        for &looked in &node.look {
            let target = self.get(looked);
            let label = if target.is_self_ref() {
                "look .".to_string()
            } else {
                format!("look {}", target.at)
            };
            self.describe_node(looked, depth + 1, Some(label), out);
        }
        for &child in node.for_fields.values() {
            self.describe_node(child, depth + 1, None, out);
        }
    }
}
