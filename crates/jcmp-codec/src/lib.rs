//! Decoding of JSON and XML documents into the jcmp value tree.
//!
//! JSON maps directly onto [`Value`]. XML is projected into the same shape:
//! the root element becomes a single-field object, attributes become `@name`
//! fields, repeated children become arrays, and text lives either as the
//! element's value or under `#text` when the element also has attributes or
//! children.
//!
//! # Key Types
//!
//! - [`decode`] / [`load_file`] -- Decode text or a file of a given [`FileKind`]
//! - [`DocumentLoader`] / [`FsLoader`] -- Pluggable document source
//! - [`CodecError`] -- I/O and decoding failures
//!
//! [`Value`]: jcmp_types::Value
//! [`FileKind`]: jcmp_types::FileKind

pub mod error;
pub mod json;
pub mod loader;
pub mod xml;

pub use error::{CodecError, CodecResult};
pub use json::decode_json;
pub use loader::{decode, load_file, DocumentLoader, FsLoader};
pub use xml::{decode_xml, ATTRIBUTE_PREFIX, TEXT_FIELD};
