use std::path::Path;

use tracing::debug;

use jcmp_types::{FileKind, Value};

use crate::error::{CodecError, CodecResult};
use crate::json::decode_json;
use crate::xml::decode_xml;

/// Decode document text of the given kind.
pub fn decode(text: &str, kind: FileKind) -> CodecResult<Value> {
    match kind {
        FileKind::Json => decode_json(text),
        FileKind::Xml => decode_xml(text),
    }
}

/// Read and decode a file.
pub fn load_file(path: &Path, kind: FileKind) -> CodecResult<Value> {
    let text = std::fs::read_to_string(path).map_err(|source| CodecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = decode(&text, kind).map_err(|source| CodecError::Document {
        path: path.to_path_buf(),
        source: Box::new(source),
    })?;
    debug!(path = %path.display(), %kind, bytes = text.len(), "decoded document");
    Ok(value)
}

/// A source of documents, keyed by path.
///
/// Folder comparisons load every file through this trait so they can run
/// against something other than the file system.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path, kind: FileKind) -> CodecResult<Value>;
}

/// Loads documents from the file system.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsLoader;

impl DocumentLoader for FsLoader {
    fn load(&self, path: &Path, kind: FileKind) -> CodecResult<Value> {
        load_file(path, kind)
    }
}
