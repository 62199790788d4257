//! Template store for region rendering
//!
//! Templates are files under a root directory, referenced from host files by
//! their path relative to that root. They use Jinja syntax and are rendered
//! with [`minijinja`] against the data file of a region.
//!
//! # Example
//!
//! ```text
//! {% for name, reg in registers|items %}
//! #define {{ name }}_ADDR {{ reg.address }}
//! {% endfor %}
//! ```

mod store;

pub use store::{TemplateError, TemplateStore};
