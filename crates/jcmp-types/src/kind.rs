//! Document kinds understood by the codec.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// The format of the documents being compared.
///
/// Both sides of a comparison always share one kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    #[default]
    Json,
    Xml,
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Xml => write!(f, "XML"),
        }
    }
}

impl FromStr for FileKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            _ => Err(TypeError::UnknownFileKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("JSON".parse::<FileKind>().unwrap(), FileKind::Json);
        assert_eq!("xml".parse::<FileKind>().unwrap(), FileKind::Xml);
    }

    #[test]
    fn parse_unknown_kind_fails() {
        let err = "yaml".parse::<FileKind>().unwrap_err();
        assert_eq!(err, TypeError::UnknownFileKind("yaml".into()));
    }

    #[test]
    fn display_and_default() {
        assert_eq!(FileKind::Xml.to_string(), "XML");
        assert_eq!(FileKind::Json.to_string(), "JSON");
        assert_eq!(FileKind::default(), FileKind::Json);
    }
}
