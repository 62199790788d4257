//! Line-oriented marker scanner
//!
//! The scanner is a small state machine over the lines of a host document:
//!
//! ```text
//! Copying --start--> AwaitingData --data:--> AwaitingTemplate --template:-->
//!     AwaitingCode --code--> InRegionBody --end--> Copying
//! ```
//!
//! Every marker and declaration line is copied through unchanged. Lines
//! between the code and end markers are the previously generated body and
//! are replaced when the document is assembled.

use std::convert::Infallible;
use std::mem;
use std::path::{Path, PathBuf};

use log::debug;

use super::Markers;
use crate::error::{ScanError, Span};

/// A generated block bounded by a code marker and an end marker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Leading whitespace of the end marker line
    pub indent: String,
    /// Terminator of the end marker line, `"\r\n"` or `"\n"`
    pub line_ending: &'static str,
    /// Resolved path of the data file
    pub data_ref: PathBuf,
    /// Template identifier, relative to the template root
    pub template_ref: String,
    /// Text currently between the code and end markers
    pub previous_body: String,
    /// Line of the start marker (1-based)
    pub line: usize,
}

/// A piece of a scanned document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Copied unchanged, line terminators included
    Literal(String),
    /// Replaced by freshly rendered text
    Region(Region),
}

/// A host document split into literal text and regions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    segments: Vec<Segment>,
}

impl Document {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Regions in document order
    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Region(region) => Some(region),
            Segment::Literal(_) => None,
        })
    }

    /// Stitch the document back together, replacing each region by the
    /// output of `expand`. Stops at the first failing region.
    pub fn assemble<E, F>(&self, mut expand: F) -> Result<String, E>
    where
        F: FnMut(&Region) -> Result<String, E>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Region(region) => out.push_str(&expand(region)?),
            }
        }
        // each line was stored with a terminator, the source has one less
        out.pop();
        Ok(out)
    }

    /// The document as it was scanned
    pub fn source(&self) -> String {
        let assembled: Result<String, Infallible> =
            self.assemble(|region| Ok(region.previous_body.clone()));
        match assembled {
            Ok(text) => text,
            Err(never) => match never {},
        }
    }
}

/// Where declared files are looked up and which markers to recognize
#[derive(Debug, Clone, Copy)]
pub struct ScanContext<'a> {
    pub markers: &'a Markers,
    pub data_root: &'a Path,
    pub template_root: &'a Path,
}

impl<'a> ScanContext<'a> {
    pub fn new(markers: &'a Markers, data_root: &'a Path, template_root: &'a Path) -> Self {
        Self {
            markers,
            data_root,
            template_root,
        }
    }
}

/// Location of the start marker of the region being scanned
#[derive(Debug, Clone)]
struct Opened {
    line: usize,
    span: Span,
}

#[derive(Debug)]
enum State {
    Copying,
    AwaitingData {
        open: Opened,
    },
    AwaitingTemplate {
        open: Opened,
        data_ref: PathBuf,
    },
    AwaitingCode {
        open: Opened,
        data_ref: PathBuf,
        template_ref: String,
    },
    InRegionBody {
        open: Opened,
        data_ref: PathBuf,
        template_ref: String,
        body: String,
    },
}

struct Line<'s> {
    number: usize,
    span: Span,
    text: &'s str,
}

impl Line<'_> {
    fn opened(&self) -> Opened {
        Opened {
            line: self.number,
            span: self.span.clone(),
        }
    }

    fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }

    fn unexpected(&self, marker: &str) -> ScanError {
        ScanError::UnexpectedMarker {
            marker: marker.to_string(),
            line: self.number,
            span: self.span.clone(),
        }
    }

    /// Leading whitespace, reused as indentation of generated lines
    fn indent(&self) -> &str {
        &self.text[..self.text.len() - self.text.trim_start().len()]
    }

    /// Line terminator as written in the source
    fn ending(&self) -> &'static str {
        if self.text.ends_with('\r') {
            "\r\n"
        } else {
            "\n"
        }
    }

    /// Value following `key`, trimmed
    fn reference(&self, key: &str) -> Result<&str, ScanError> {
        match self.text.split_once(key) {
            Some((_, value)) if !value.trim().is_empty() => Ok(value.trim()),
            _ => Err(ScanError::MalformedReference {
                key: key.to_string(),
                line: self.number,
                span: self.span.clone(),
            }),
        }
    }
}

struct Scanner<'c> {
    ctx: ScanContext<'c>,
    segments: Vec<Segment>,
    literal: String,
}

impl<'c> Scanner<'c> {
    fn copy(&mut self, line: &Line<'_>) {
        self.literal.push_str(line.text);
        self.literal.push('\n');
    }

    fn flush(&mut self) {
        if !self.literal.is_empty() {
            let text = mem::take(&mut self.literal);
            self.segments.push(Segment::Literal(text));
        }
    }

    fn reject_nested(&self, open: &Opened, line: &Line<'_>) -> Result<(), ScanError> {
        if line.contains(&self.ctx.markers.start) {
            return Err(ScanError::NestedRegion {
                open: open.line,
                line: line.number,
                span: line.span.clone(),
            });
        }
        Ok(())
    }

    fn step(&mut self, state: State, line: &Line<'_>) -> Result<State, ScanError> {
        let markers = self.ctx.markers;

        match state {
            State::Copying => {
                if line.contains(&markers.start) {
                    self.copy(line);
                    return Ok(State::AwaitingData {
                        open: line.opened(),
                    });
                }
                for marker in [&markers.code, &markers.end] {
                    if line.contains(marker) {
                        return Err(line.unexpected(marker));
                    }
                }
                self.copy(line);
                Ok(State::Copying)
            }

            State::AwaitingData { open } => {
                self.reject_nested(&open, line)?;
                let data_ref = self.ctx.data_root.join(line.reference(&markers.data)?);
                if !data_ref.is_file() {
                    return Err(ScanError::DataNotFound {
                        path: data_ref,
                        line: line.number,
                        span: line.span.clone(),
                    });
                }
                self.copy(line);
                Ok(State::AwaitingTemplate { open, data_ref })
            }

            State::AwaitingTemplate { open, data_ref } => {
                self.reject_nested(&open, line)?;
                let template_ref = line.reference(&markers.template)?;
                let path = self.ctx.template_root.join(template_ref);
                if !path.is_file() {
                    return Err(ScanError::TemplateNotFound {
                        path,
                        line: line.number,
                        span: line.span.clone(),
                    });
                }
                self.copy(line);
                Ok(State::AwaitingCode {
                    open,
                    data_ref,
                    template_ref: template_ref.to_string(),
                })
            }

            State::AwaitingCode {
                open,
                data_ref,
                template_ref,
            } => {
                self.reject_nested(&open, line)?;
                if line.contains(&markers.end) {
                    return Err(line.unexpected(&markers.end));
                }
                self.copy(line);
                if line.contains(&markers.code) {
                    Ok(State::InRegionBody {
                        open,
                        data_ref,
                        template_ref,
                        body: String::new(),
                    })
                } else {
                    Ok(State::AwaitingCode {
                        open,
                        data_ref,
                        template_ref,
                    })
                }
            }

            State::InRegionBody {
                open,
                data_ref,
                template_ref,
                mut body,
            } => {
                self.reject_nested(&open, line)?;
                if line.contains(&markers.code) {
                    return Err(line.unexpected(&markers.code));
                }
                if !line.contains(&markers.end) {
                    body.push_str(line.text);
                    body.push('\n');
                    return Ok(State::InRegionBody {
                        open,
                        data_ref,
                        template_ref,
                        body,
                    });
                }

                debug!(
                    "region at line {}: data {}, template {}",
                    open.line,
                    data_ref.display(),
                    template_ref
                );
                self.flush();
                self.segments.push(Segment::Region(Region {
                    indent: line.indent().to_string(),
                    line_ending: line.ending(),
                    data_ref,
                    template_ref,
                    previous_body: body,
                    line: open.line,
                }));
                self.copy(line);
                Ok(State::Copying)
            }
        }
    }
}

/// Split a host document into literal text and regions.
///
/// Declared data and template files must exist under the roots of `ctx`.
pub fn scan(source: &str, ctx: &ScanContext<'_>) -> Result<Document, ScanError> {
    let mut scanner = Scanner {
        ctx: *ctx,
        segments: Vec::new(),
        literal: String::new(),
    };
    let mut state = State::Copying;
    let mut offset = 0;
    let last = source.matches('\n').count();

    for (index, text) in source.split('\n').enumerate() {
        // the empty remainder after a final newline is not a declaration line
        let at_end = index == last && text.is_empty();
        if at_end
            && matches!(
                state,
                State::AwaitingData { .. } | State::AwaitingTemplate { .. }
            )
        {
            break;
        }
        let line = Line {
            number: index + 1,
            span: offset..offset + text.len(),
            text,
        };
        offset += text.len() + 1;
        state = scanner.step(state, &line)?;
    }

    match state {
        State::Copying => {
            scanner.flush();
            Ok(Document {
                segments: scanner.segments,
            })
        }
        State::AwaitingData { open }
        | State::AwaitingTemplate { open, .. }
        | State::AwaitingCode { open, .. }
        | State::InRegionBody { open, .. } => Err(ScanError::UnterminatedRegion {
            line: open.line,
            span: open.span,
        }),
    }
}
