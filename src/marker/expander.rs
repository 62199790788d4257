//! Rendering of scanned regions

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use super::{Markers, Region};
use crate::template::{TemplateError, TemplateStore};

/// Errors that can occur while rendering a region
#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("failed to read data file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data file exists but does not parse
    #[error("failed to parse data file {}: {message}", path.display())]
    DataLoad { path: PathBuf, message: String },

    #[error("unsupported data file format: {} (expected .json or .toml)", path.display())]
    UnsupportedDataFormat { path: PathBuf },

    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Output that would break the region boundaries on the next run
    #[error("template '{template}' rendered the marker '{marker}'")]
    MarkerInOutput { template: String, marker: String },
}

/// Supported data file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Toml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(DataFormat::Json),
            Some("toml") => Some(DataFormat::Toml),
            _ => None,
        }
    }
}

/// Load a data file as a template context
pub fn load_data(path: &Path) -> Result<serde_json::Value, ExpandError> {
    let format = DataFormat::from_path(path).ok_or_else(|| ExpandError::UnsupportedDataFormat {
        path: path.to_path_buf(),
    })?;
    let text = fs::read_to_string(path).map_err(|source| ExpandError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: Result<serde_json::Value, String> = match format {
        DataFormat::Json => serde_json::from_str(&text).map_err(|e| e.to_string()),
        DataFormat::Toml => toml::from_str(&text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| ExpandError::DataLoad {
        path: path.to_path_buf(),
        message,
    })
}

/// Prefix every line of `text` with `indent`, terminating each line with
/// `line_ending`
pub fn indent_lines(text: &str, indent: &str, line_ending: &str) -> String {
    let mut out = String::with_capacity(text.len() + indent.len());
    for line in text.split('\n') {
        out.push_str(indent);
        out.push_str(line.strip_suffix('\r').unwrap_or(line));
        out.push_str(line_ending);
    }
    out
}

/// Renders regions through a template store
#[derive(Debug)]
pub struct Expander<'a> {
    store: &'a TemplateStore,
    markers: &'a Markers,
}

impl<'a> Expander<'a> {
    pub fn new(store: &'a TemplateStore, markers: &'a Markers) -> Self {
        Self { store, markers }
    }

    /// Render the region's template against its data, without indentation
    pub fn render(&self, region: &Region) -> Result<String, ExpandError> {
        let data = load_data(&region.data_ref)?;
        let rendered = self.store.render(&region.template_ref, &data)?;

        if let Some(marker) = self.markers.find_in(&rendered) {
            return Err(ExpandError::MarkerInOutput {
                template: region.template_ref.clone(),
                marker: marker.to_string(),
            });
        }
        Ok(rendered)
    }

    /// Render the region and indent it like its end marker
    pub fn expand(&self, region: &Region) -> Result<String, ExpandError> {
        let body = indent_lines(&self.render(region)?, &region.indent, region.line_ending);

        if body == region.previous_body {
            debug!("region at line {} is up to date", region.line);
        } else {
            debug!("region at line {} regenerated:\n{}", region.line, body);
        }
        Ok(body)
    }
}
