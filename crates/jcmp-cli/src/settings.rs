//! Settings file and flag merging.
//!
//! ```toml
//! idparams = "ids.json"
//! xml = false
//! fast = false
//! index_fallback = false
//! allow_raw = true
//! parallel = 4
//! stop_at_first = false
//! ignore = ["README.json"]
//! ```
//!
//! Every key is optional. Command-line flags win over the file.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use jcmp_diff::{ComparisonOptions, DEFAULT_PARALLELISM};
use jcmp_params::IdParamTree;
use jcmp_types::FileKind;

use crate::cli::ComparisonFlags;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub idparams: Option<String>,
    pub xml: bool,
    pub fast: bool,
    pub index_fallback: bool,
    pub allow_raw: bool,
    pub parallel: usize,
    pub stop_at_first: bool,
    pub ignore: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            idparams: None,
            xml: false,
            fast: false,
            index_fallback: false,
            allow_raw: true,
            parallel: DEFAULT_PARALLELISM,
            stop_at_first: false,
            ignore: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read settings file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("cannot parse settings file {}", path.display()))
    }

    /// Settings from the given file, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Overlay the flags that were given on the command line.
    pub fn with_flags(mut self, flags: &ComparisonFlags) -> Self {
        if let Some(idparams) = &flags.idparams {
            self.idparams = Some(idparams.clone());
        }
        if let Some(parallel) = flags.parallel {
            self.parallel = parallel;
        }
        if let Some(ignore) = &flags.ignore {
            self.ignore.extend(
                ignore
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string),
            );
        }
        self.xml |= flags.xml;
        self.fast |= flags.fast;
        self.index_fallback |= flags.index_fallback;
        self.stop_at_first |= flags.stop_at_first;
        self.allow_raw &= !flags.no_raw;
        self
    }

    /// Build validated comparison options, loading the identification parameters.
    pub fn to_options(&self, silent: bool) -> anyhow::Result<ComparisonOptions> {
        let params = match &self.idparams {
            Some(source) => IdParamTree::load(source)
                .context("cannot load identification parameters")?,
            None => IdParamTree::empty(),
        };
        let file_kind = if self.xml { FileKind::Xml } else { FileKind::Json };

        let mut options = ComparisonOptions::new(params)
            .with_file_kind(file_kind)
            .with_parallelism(self.parallel)
            .with_fast(self.fast)
            .with_stop_at_first(self.stop_at_first)
            .with_silent(silent)
            .with_allow_raw(self.allow_raw)
            .with_index_fallback(self.index_fallback);
        options.ignored.extend(self.ignore.iter().cloned());
        options.validate()?;
        Ok(options)
    }
}
