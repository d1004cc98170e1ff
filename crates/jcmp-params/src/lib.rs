//! Identification parameters for jcmp.
//!
//! Arrays cannot be compared position by position when their elements may
//! be reordered. An identification parameter ("IDParam") tree tells the
//! comparison engine, for each place in a document where an array occurs,
//! how to compute a stable identity for every element of that array.
//!
//! The tree is written by users as JSON ([`ParamSpec`]) and resolved once
//! into an arena ([`IdParamTree`]) where parent links are plain indices.
//!
//! # Key Types
//!
//! - [`ParamSpec`] / [`GuardSpec`] -- The user-facing JSON DSL
//! - [`IdParamTree`] / [`IdParam`] / [`ParamId`] -- The resolved, read-only tree
//! - [`ParamError`] -- Parsing, loading, and validation failures

pub mod error;
pub mod spec;
pub mod tree;

pub use error::{ParamError, ParamResult};
pub use spec::{GuardSpec, ParamSpec};
pub use tree::{Guard, IdParam, IdParamTree, ParamId, PARENT_PATH, SELF_PATH};
