use std::path::Path;

use tracing::info;

use jcmp_codec::{DocumentLoader, FsLoader};
use jcmp_diff::{compare_values, ComparisonOptions, DiffNode};

use crate::error::FsResult;

/// Compare two files of `options.file_kind`.
pub fn compare_files(first: &Path, second: &Path, options: &ComparisonOptions) -> FsResult<DiffNode> {
    compare_files_with(&FsLoader, first, second, options)
}

/// Compare two documents obtained through `loader`.
pub fn compare_files_with(
    loader: &dyn DocumentLoader,
    first: &Path,
    second: &Path,
    options: &ComparisonOptions,
) -> FsResult<DiffNode> {
    let one = loader.load(first, options.file_kind)?;
    let two = loader.load(second, options.file_kind)?;
    let delta = compare_values(&one, &two, options)?;

    if !options.silent {
        let stats = delta.stats();
        info!(
            first = %first.display(),
            second = %second.display(),
            differences = stats.total(),
            "compared files"
        );
    }
    Ok(delta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use jcmp_diff::DiffError;
    use jcmp_params::IdParamTree;
    use jcmp_types::{FileKind, Value};

    use crate::error::FsError;

    #[test]
    fn compares_two_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.json");
        let two = dir.path().join("two.json");
        fs::write(&one, r#"{"items": [{"id": 1, "v": "x"}], "a": 1}"#).unwrap();
        fs::write(&two, r#"{"items": [{"id": 1, "v": "y"}], "a": 1}"#).unwrap();

        let params = IdParamTree::from_json(r#"{"_for": {"items": {"_use": ["id"]}}}"#).unwrap();
        let delta = compare_files(&one, &two, &ComparisonOptions::new(params)).unwrap();

        let v = delta.get("items").and_then(|n| n.get("1")).and_then(|n| n.get("v"));
        assert_eq!(v, Some(&DiffNode::Changed("x".into(), "y".into())));
    }

    #[test]
    fn compares_two_xml_files() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.xml");
        let two = dir.path().join("two.xml");
        fs::write(&one, r#"<r><i id="1">a</i><i id="2">b</i></r>"#).unwrap();
        fs::write(&two, r#"<r><i id="2">b</i><i id="1">c</i></r>"#).unwrap();

        let params =
            IdParamTree::from_json(r#"{"_for": {"r": {"_for": {"i": {"_use": ["@id"]}}}}}"#).unwrap();
        let options = ComparisonOptions::new(params).with_file_kind(FileKind::Xml);
        let delta = compare_files(&one, &two, &options).unwrap();

        let text = delta
            .get("r")
            .and_then(|n| n.get("i"))
            .and_then(|n| n.get("1"))
            .and_then(|n| n.get("#text"));
        assert_eq!(text, Some(&DiffNode::Changed(Value::from("a"), Value::from("c"))));
    }

    #[test]
    fn errors_are_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let one = dir.path().join("one.json");
        let two = dir.path().join("two.json");
        fs::write(&one, r#"{"a": 1}"#).unwrap();
        fs::write(&two, r#"{"a": "1"}"#).unwrap();

        match compare_files(&one, &two, &ComparisonOptions::default()) {
            Err(FsError::Diff(DiffError::IncompatibleTypes { path, .. })) => assert_eq!(path, "a"),
            other => panic!("expected IncompatibleTypes, got {:?}", other),
        }

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            compare_files(&one, &missing, &ComparisonOptions::default()),
            Err(FsError::Codec(_))
        ));
    }
}
