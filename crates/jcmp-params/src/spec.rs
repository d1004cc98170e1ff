//! The JSON form of identification parameters, as users write it.
//!
//! ```json
//! {
//!   "_for": {
//!     "items": {
//!       "_use": ["id"],
//!       "_for": { "tags": { "keep": true } }
//!     },
//!     "events": {
//!       "when": [
//!         { "prop": "type", "is": "login", "name": "login", "_use": ["user"] },
//!         { "prop": "type", "is": "move", "name": "move",
//!           "look": [{ "at": "from", "_use": ["x", "y"] }] }
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ParamResult;

/// One node of the identification parameter DSL.
///
/// Every field is optional; an empty node is valid and only carries the
/// structure of its children.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Path segment relative to the parent. `.` is the node itself, `..` its parent.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub at: String,

    /// Fields whose values, joined in order, form the key.
    #[serde(rename = "_use", default, skip_serializing_if = "Vec::is_empty")]
    pub use_fields: Vec<String>,

    /// Nested look-ups composing a key from deeper (or enclosing) objects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub look: Vec<ParamSpec>,

    /// Conditional branches, first match wins.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub when: Vec<GuardSpec>,

    /// Parameters for the arrays found under each named field.
    #[serde(rename = "_for", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub for_fields: BTreeMap<String, ParamSpec>,

    /// Label prefixed to keys produced by a `when` branch.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Append a per-scope occurrence counter to every key.
    #[serde(default, skip_serializing_if = "is_false")]
    pub incr: bool,

    /// Keep identical siblings instead of clearing them before alignment.
    #[serde(default, skip_serializing_if = "is_false")]
    pub keep: bool,

    /// Alias template for a single object, as lines joined at load time.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tpl1: Vec<String>,

    /// Alias template applied to each element of an array of objects.
    #[serde(rename = "tplN", default, skip_serializing_if = "Vec::is_empty")]
    pub tpl_n: Vec<String>,
}

/// A `when` branch: taken when `prop` renders as `is`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardSpec {
    #[serde(default)]
    pub prop: String,
    #[serde(default)]
    pub is: String,
    #[serde(flatten)]
    pub param: ParamSpec,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ParamSpec {
    /// Parse a parameter document.
    pub fn from_json(json: &str) -> ParamResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
