//! Conversion and generation over lists of files
//!
//! Files are processed strictly in order and the first error stops the run;
//! outputs of pairs not reached yet are left untouched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::marker::{scan, Expander, ScanContext};
use crate::register::{build_with, read_table};
use crate::template::TemplateStore;
use crate::writer::{WriteOutcome, Writer};

/// An input file and the file its result is written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePair {
    pub input: PathBuf,
    pub output: PathBuf,
}

impl FilePair {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Pair a file with itself (in-place regeneration)
    pub fn in_place(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            input: path.clone(),
            output: path,
        }
    }

    /// Pair inputs with outputs by position; without outputs every input is
    /// rewritten in place
    pub fn zip(inputs: Vec<PathBuf>, outputs: Option<Vec<PathBuf>>) -> Result<Vec<Self>, Error> {
        match outputs {
            None => Ok(inputs.into_iter().map(Self::in_place).collect()),
            Some(outputs) if outputs.len() == inputs.len() => Ok(inputs
                .into_iter()
                .zip(outputs)
                .map(|(input, output)| Self::new(input, output))
                .collect()),
            Some(outputs) => Err(Error::PairMismatch {
                inputs: inputs.len(),
                outputs: outputs.len(),
            }),
        }
    }
}

/// Counts of outputs per outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub changed: usize,
    pub unchanged: usize,
}

impl Summary {
    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Changed => self.changed += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.changed + self.unchanged
    }

    /// True when no output needed (or would need) rewriting
    pub fn is_clean(&self) -> bool {
        self.changed == 0
    }
}

fn read_input(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Regenerates the marker regions of host files
#[derive(Debug)]
pub struct Generator {
    config: Config,
    writer: Writer,
    stores: HashMap<PathBuf, TemplateStore>,
}

impl Generator {
    pub fn new(config: Config) -> Self {
        let writer = Writer::new().with_dry_run(config.dry_run);
        Self {
            config,
            writer,
            stores: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Produce the regenerated content of `input` without writing anything
    pub fn render_file(&mut self, input: &Path) -> Result<String, Error> {
        let text = read_input(input)?;
        let data_root = self.config.data_root_for(input);
        let template_root = self.config.template_root_for(input);

        let ctx = ScanContext::new(&self.config.markers, &data_root, &template_root);
        let document = match scan(&text, &ctx) {
            Ok(document) => document,
            Err(source) => {
                return Err(Error::Scan {
                    path: input.to_path_buf(),
                    text,
                    source,
                })
            }
        };
        debug!(
            "{}: {} region(s)",
            input.display(),
            document.regions().count()
        );

        let strict = self.config.strict_undefined;
        let store = self
            .stores
            .entry(template_root)
            .or_insert_with_key(|root| TemplateStore::new(root.clone()).with_strict_undefined(strict));
        let expander = Expander::new(store, &self.config.markers);

        document.assemble(|region| {
            expander.expand(region).map_err(|source| Error::Expand {
                path: input.to_path_buf(),
                line: region.line,
                source,
            })
        })
    }

    /// Regenerate `input` into `output`
    pub fn generate(&mut self, input: &Path, output: &Path) -> Result<WriteOutcome, Error> {
        debug!("generating {} -> {}", input.display(), output.display());
        let content = self.render_file(input)?;
        Ok(self.writer.write(output, &content)?)
    }

    /// Process every pair in order, stopping at the first error
    pub fn run(&mut self, pairs: &[FilePair]) -> Result<Summary, Error> {
        let mut summary = Summary::default();
        for pair in pairs {
            summary.record(self.generate(&pair.input, &pair.output)?);
        }
        info!(
            "template generation done: {} written, {} unchanged",
            summary.changed, summary.unchanged
        );
        Ok(summary)
    }
}

/// Convert a CSV register table into a JSON data file
pub fn convert(input: &Path, output: &Path, config: &Config) -> Result<WriteOutcome, Error> {
    if input.extension().and_then(|ext| ext.to_str()) != Some("csv") {
        return Err(Error::UnsupportedTable {
            path: input.to_path_buf(),
        });
    }
    debug!("converting {} -> {}", input.display(), output.display());

    let text = read_input(input)?;
    let map = read_table(text.as_bytes())
        .and_then(|rows| build_with(rows, config.duplicates))
        .map_err(|source| Error::Table {
            path: input.to_path_buf(),
            source,
        })?;
    debug!("{}: {} register(s)", input.display(), map.len());

    let json = map.to_json()?;
    let writer = Writer::new().with_dry_run(config.dry_run);
    Ok(writer.write(output, &json)?)
}

/// Convert every pair in order, stopping at the first error
pub fn convert_all(pairs: &[FilePair], config: &Config) -> Result<Summary, Error> {
    let mut summary = Summary::default();
    for pair in pairs {
        summary.record(convert(&pair.input, &pair.output, config)?);
    }
    info!(
        "library conversion done: {} written, {} unchanged",
        summary.changed, summary.unchanged
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_in_place() {
        let pairs = FilePair::zip(vec!["a.c".into(), "b.c".into()], None).expect("zips");
        assert_eq!(pairs, vec![FilePair::in_place("a.c"), FilePair::in_place("b.c")]);
    }

    #[test]
    fn test_zip_with_outputs() {
        let pairs = FilePair::zip(vec!["a.csv".into()], Some(vec!["a.json".into()])).expect("zips");
        assert_eq!(pairs, vec![FilePair::new("a.csv", "a.json")]);
    }

    #[test]
    fn test_zip_mismatch() {
        let result = FilePair::zip(vec!["a.c".into(), "b.c".into()], Some(vec!["x.c".into()]));
        assert!(matches!(
            result,
            Err(Error::PairMismatch {
                inputs: 2,
                outputs: 1
            })
        ));
    }

    #[test]
    fn test_summary_record() {
        let mut summary = Summary::default();
        summary.record(WriteOutcome::Changed);
        summary.record(WriteOutcome::Unchanged);
        summary.record(WriteOutcome::Unchanged);
        assert_eq!(summary.changed, 1);
        assert_eq!(summary.unchanged, 2);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_summary_clean() {
        let mut summary = Summary::default();
        assert!(summary.is_clean());
        summary.record(WriteOutcome::Unchanged);
        assert!(summary.is_clean());
    }

    #[test]
    fn test_convert_rejects_non_csv() {
        let result = convert(Path::new("regs.xlsx"), Path::new("regs.json"), &Config::new());
        assert!(matches!(result, Err(Error::UnsupportedTable { .. })));
    }

    #[test]
    fn test_missing_input() {
        let mut generator = Generator::new(Config::new());
        let result = generator.render_file(Path::new("/nonexistent/main.c"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
