//! Error types for marker scanning and the generation pipeline

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::config::ConfigError;
use crate::marker::ExpandError;
use crate::register::TableError;
use crate::writer::WriteError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Errors raised while walking the marker lines of a host document.
///
/// Every variant carries the 1-based line number and the byte span of the
/// offending line so it can be reported with source context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// A declaration line without its `key:` token
    #[error("line {line}: expected a '{key}' declaration")]
    MalformedReference { key: String, line: usize, span: Span },

    /// Declared data file does not exist
    #[error("line {line}: data file not found: {}", path.display())]
    DataNotFound { path: PathBuf, line: usize, span: Span },

    /// Declared template file does not exist
    #[error("line {line}: template file not found: {}", path.display())]
    TemplateNotFound { path: PathBuf, line: usize, span: Span },

    /// Start marker with no matching end marker before end of input
    #[error("line {line}: region is never closed")]
    UnterminatedRegion { line: usize, span: Span },

    /// Start marker while another region is still open
    #[error("line {line}: region start inside the region opened at line {open}")]
    NestedRegion { open: usize, line: usize, span: Span },

    /// Code or end marker outside of the place the protocol allows it
    #[error("line {line}: unexpected '{marker}'")]
    UnexpectedMarker {
        marker: String,
        line: usize,
        span: Span,
    },
}

impl ScanError {
    /// Line the error points at (1-based)
    pub fn line(&self) -> usize {
        match self {
            ScanError::MalformedReference { line, .. }
            | ScanError::DataNotFound { line, .. }
            | ScanError::TemplateNotFound { line, .. }
            | ScanError::UnterminatedRegion { line, .. }
            | ScanError::NestedRegion { line, .. }
            | ScanError::UnexpectedMarker { line, .. } => *line,
        }
    }

    /// Byte span of the offending line
    pub fn span(&self) -> Span {
        match self {
            ScanError::MalformedReference { span, .. }
            | ScanError::DataNotFound { span, .. }
            | ScanError::TemplateNotFound { span, .. }
            | ScanError::UnterminatedRegion { span, .. }
            | ScanError::NestedRegion { span, .. }
            | ScanError::UnexpectedMarker { span, .. } => span.clone(),
        }
    }

    fn label(&self) -> String {
        match self {
            ScanError::MalformedReference { key, .. } => {
                format!("this line should contain '{}' followed by a path", key)
            }
            ScanError::DataNotFound { path, .. } => format!("no file at {}", path.display()),
            ScanError::TemplateNotFound { path, .. } => format!("no file at {}", path.display()),
            ScanError::UnterminatedRegion { .. } => "region opened here".to_string(),
            ScanError::NestedRegion { open, .. } => {
                format!("region from line {} is still open", open)
            }
            ScanError::UnexpectedMarker { marker, .. } => format!("'{}' not allowed here", marker),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let span = self.span();
        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, span.start)
            .with_message(self.to_string())
            .with_label(
                Label::new((filename, span))
                    .with_message(self.label())
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("{}: {}", filename, self),
        }
    }
}

/// Errors that can occur while converting tables or generating files
#[derive(Debug, Error)]
pub enum Error {
    /// Register table could not be turned into a register map
    #[error("{}: {source}", path.display())]
    Table { path: PathBuf, source: TableError },

    /// Host document violates the marker protocol
    #[error("{}: {source}", path.display())]
    Scan {
        path: PathBuf,
        /// Document text, kept for source-context reports
        text: String,
        source: ScanError,
    },

    /// A region could not be rendered
    #[error("{}:{line}: {source}", path.display())]
    Expand {
        path: PathBuf,
        line: usize,
        source: ExpandError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to serialize register map: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Only CSV tables can be converted
    #[error("{}: only .csv tables can be converted", path.display())]
    UnsupportedTable { path: PathBuf },

    /// Output list given but not one per input
    #[error("{inputs} input file(s) but {outputs} output file(s)")]
    PairMismatch { inputs: usize, outputs: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Human-readable report, with source context when the error has a location
    pub fn report(&self) -> String {
        match self {
            Error::Scan { path, text, source } => {
                source.format(text, &path.display().to_string())
            }
            other => other.to_string(),
        }
    }
}
