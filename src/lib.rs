//! regmark - register-map driven code generation inside marked regions
//!
//! Register maps are authored once as flat CSV tables and converted into JSON
//! data files. Host files (C drivers, headers, documentation) embed regions
//! delimited by marker lines; each region names a data file and a Jinja
//! template, and regmark rewrites the region body with the rendered template.
//! Files are only written when their content actually changes.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use regmark::{convert, Config, FilePair, Generator};
//!
//! let config = Config::new().with_template_root("templates");
//! convert(Path::new("regs.csv"), Path::new("regs.json"), &config).unwrap();
//!
//! let mut generator = Generator::new(config);
//! let summary = generator.run(&[FilePair::in_place("firmware/main.c")]).unwrap();
//! println!("{} file(s) written", summary.changed);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod marker;
pub mod register;
pub mod template;
pub mod writer;

pub use config::{Config, ConfigError};
pub use engine::{convert, convert_all, FilePair, Generator, Summary};
pub use error::{Error, ScanError};
pub use marker::{scan, Document, ExpandError, Expander, Markers, Region, ScanContext, Segment};
pub use register::{build, build_with, read_table, DuplicatePolicy, RegisterMap, TableError, TableRow};
pub use template::{TemplateError, TemplateStore};
pub use writer::{WriteError, WriteOutcome, Writer};
