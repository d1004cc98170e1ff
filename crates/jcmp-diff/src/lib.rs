//! Structural comparison engine for jcmp.
//!
//! Compares two decoded documents node by node and produces a [`DiffNode`]
//! tree holding only what differs. Arrays are aligned by identity rather
//! than by position: each element gets a key computed from the
//! identification parameters, and the arrays are then diffed as maps.
//!
//! # Key Types
//!
//! - [`Comparator`] / [`compare_values`] -- Recursive value comparison
//! - [`ArrayAligner`] -- Array to identity-keyed association, duplicate policy
//! - [`KeyBuilder`] / [`Lineage`] / [`IncrementTable`] -- Identity key evaluation
//! - [`DiffNode`] / [`DiffStats`] -- The delta tree and its leaf counts
//! - [`ComparisonOptions`] -- Run configuration shared by every comparison
//! - [`AliasRenderer`] / [`TemplateRenderer`] -- Display aliases for one-sided objects

pub mod alias;
pub mod align;
pub mod compare;
pub mod delta;
pub mod error;
pub mod key;
pub mod options;

pub use alias::{AliasRenderer, TemplateError, TemplateRenderer, ARRAY_ALIAS_SEPARATOR};
pub use align::{clear_siblings, flatten, ArrayAligner};
pub use compare::{compare_values, Comparator, PATH_SEPARATOR};
pub use delta::{DiffNode, DiffStats};
pub use error::{DiffError, DiffResult};
pub use key::{IncrementTable, KeyBuilder, Lineage, Side};
pub use options::{ComparisonOptions, DEFAULT_PARALLELISM};
