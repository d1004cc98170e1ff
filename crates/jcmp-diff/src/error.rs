//! Error types for the diff crate.
//!
//! Every variant carries the document path where the problem was found
//! (segments joined with `>`), and, where a rule was involved, the full
//! path of that identification parameter.

use jcmp_types::ValueKind;

/// Errors that can occur during a comparison.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiffError {
    /// The two documents hold values of unrelated kinds at the same place.
    #[error("incompatible types at '{path}': {first} in the first document vs {second} in the second")]
    IncompatibleTypes {
        path: String,
        first: ValueKind,
        second: ValueKind,
    },

    /// A rule produced an empty key outside any `when` branch.
    #[error("empty identity key at '{path}' (rule '{rule}')")]
    EmptyIdentityKey { path: String, rule: String },

    /// `when` guards exist, none matched, and nothing else produced a key.
    #[error("no 'when' branch matched at '{path}' (rule '{rule}')")]
    NoBranchMatched { path: String, rule: String },

    /// Two array elements share a key but differ in content.
    #[error("duplicate identity '{key}' at '{path}' for elements with different content")]
    DuplicateIdentity { path: String, key: String },

    /// An array holds objects but no rule tells how to key them.
    #[error("no identification parameter for the array of objects at '{path}'")]
    MissingIdentityRule { path: String },

    /// A `..` look-up was evaluated with no enclosing object.
    #[error("no parent object for '..' at '{path}' (rule '{rule}')")]
    MissingParent { path: String, rule: String },

    /// A key was requested from a value that cannot provide one.
    #[error("cannot build a key from the {kind} in '{field}' at '{path}' (rule '{rule}')")]
    UnsupportedKeyValue {
        path: String,
        rule: String,
        field: String,
        kind: ValueKind,
    },

    /// An object must be displayed, no template applies and raw output is off.
    #[error("no alias template to display the {kind} at '{path}' and raw output is disabled")]
    MissingAlias { path: String, kind: ValueKind },

    /// An alias template could not be rendered.
    #[error("alias template failed at '{path}': {reason}")]
    TemplateFailure { path: String, reason: String },

    /// The comparison options are not usable.
    #[error("invalid comparison options: {0}")]
    InvalidOptions(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
