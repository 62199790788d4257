//! Marker-delimited generated regions inside host files
//!
//! A region is declared by a block of marker lines anywhere in a host file:
//!
//! ```text
//! /* marker_template_start
//!  * data: ../data/wfg_core_reg.json
//!  * template: header/registers.h.j2
//!  * marker_template_code */
//! ... generated lines, replaced on every run ...
//! /* marker_template_end */
//! ```
//!
//! The scanner splits a document into literal text and regions; the
//! expander renders each region's template against its data file and
//! indents the result like the end marker line.

mod expander;
mod scanner;

pub use expander::{indent_lines, load_data, DataFormat, ExpandError, Expander};
pub use scanner::{scan, Document, Region, ScanContext, Segment};

use serde::Deserialize;

/// The tokens that make up the marker protocol.
///
/// Markers match anywhere on a line, so they can sit inside whatever comment
/// syntax the host language uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Markers {
    /// Opens a region
    pub start: String,
    /// Key of the data file declaration
    pub data: String,
    /// Key of the template declaration
    pub template: String,
    /// Last line before the generated code
    pub code: String,
    /// First line after the generated code
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: "marker_template_start".to_string(),
            data: "data:".to_string(),
            template: "template:".to_string(),
            code: "marker_template_code".to_string(),
            end: "marker_template_end".to_string(),
        }
    }
}

impl Markers {
    /// First line marker (start, code or end) contained in `text`
    pub fn find_in(&self, text: &str) -> Option<&str> {
        [&self.start, &self.code, &self.end]
            .into_iter()
            .find(|marker| text.contains(marker.as_str()))
            .map(|marker| marker.as_str())
    }
}
