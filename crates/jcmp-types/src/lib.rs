//! Foundation types for jcmp.
//!
//! This crate provides the decoded document representation shared by every
//! other jcmp crate. Decoders produce a [`Value`] tree, the comparison engine
//! consumes it, and the delta it produces embeds it.
//!
//! # Key Types
//!
//! - [`Value`] -- Closed sum type for decoded JSON/XML documents
//! - [`ValueKind`] -- The kind of a [`Value`], used in type-mismatch reports
//! - [`FileKind`] -- Which decoder a document needs (JSON or XML)
//! - [`format_number`] -- Stable text rendering of numbers used in identity keys

pub mod error;
pub mod kind;
pub mod text;
pub mod value;

pub use error::TypeError;
pub use kind::FileKind;
pub use text::format_number;
pub use value::{Value, ValueKind};
