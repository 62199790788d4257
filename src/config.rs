//! Generation settings
//!
//! Settings come from defaults, an optional TOML file and command line
//! overrides, in that order:
//!
//! ```toml
//! data_root = "design/data"
//! template_root = "templates"
//! strict_undefined = true
//!
//! [markers]
//! start = "@regmark-start"
//! end = "@regmark-end"
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::marker::Markers;
use crate::register::DuplicatePolicy;

/// Errors that can occur when loading or parsing a config file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Settings shared by every file of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Data files are resolved here; the host file's directory when unset
    pub data_root: Option<PathBuf>,
    /// Templates are resolved here; the host file's directory when unset
    pub template_root: Option<PathBuf>,
    /// Marker tokens recognized in host files
    pub markers: Markers,
    /// Undefined template variables are errors instead of empty strings
    pub strict_undefined: bool,
    /// Handling of repeated names in register tables
    pub duplicates: DuplicatePolicy,
    /// Compute everything but never write
    pub dry_run: bool,
}

/// TOML structure for deserializing config files
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    data_root: Option<PathBuf>,
    template_root: Option<PathBuf>,
    #[serde(default)]
    strict_undefined: bool,
    #[serde(default)]
    strict_names: bool,
    #[serde(default)]
    markers: Markers,
}

impl Config {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a TOML file; relative roots are taken relative to
    /// the file's directory
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = content.parse()?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.data_root = config.data_root.map(|root| base.join(root));
        config.template_root = config.template_root.map(|root| base.join(root));
        Ok(config)
    }

    /// Set the data root
    pub fn with_data_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_root = Some(root.into());
        self
    }

    /// Set the template root
    pub fn with_template_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.template_root = Some(root.into());
        self
    }

    /// Set the marker tokens
    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    /// Enable or disable strict undefined variables
    pub fn with_strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    /// Set the duplicate name policy for tables
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Data root for a host document
    pub fn data_root_for(&self, document: &Path) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| document_dir(document))
    }

    /// Template root for a host document
    pub fn template_root_for(&self, document: &Path) -> PathBuf {
        self.template_root
            .clone()
            .unwrap_or_else(|| document_dir(document))
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    /// Load config from a TOML string
    fn from_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;

        Ok(Config {
            data_root: parsed.data_root,
            template_root: parsed.template_root,
            markers: parsed.markers,
            strict_undefined: parsed.strict_undefined,
            duplicates: if parsed.strict_names {
                DuplicatePolicy::Reject
            } else {
                DuplicatePolicy::LastWriteWins
            },
            dry_run: false,
        })
    }
}

fn document_dir(document: &Path) -> PathBuf {
    document
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}
