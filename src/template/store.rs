//! Template lookup under a root directory and rendering via minijinja

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    /// No template file for the identifier
    #[error("template file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Error reading template file
    #[error("error reading template file {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// Syntax or evaluation error inside the template
    #[error("failed to render template '{id}': {source:#}")]
    Render {
        id: String,
        source: minijinja::Error,
    },
}

/// Resolves template identifiers against a root directory and renders them.
///
/// Templates may include or extend each other by identifiers relative to the
/// same root. Loaded templates are cached for the lifetime of the store.
pub struct TemplateStore {
    root: PathBuf,
    env: Environment<'static>,
}

impl fmt::Debug for TemplateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl TemplateStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut env = Environment::new();

        let loader_root = root.clone();
        env.set_loader(move |id| load_source(&loader_root, id));
        // generated code is never HTML, whatever the template extension
        env.set_auto_escape_callback(|_| AutoEscape::None);

        Self { root, env }
    }

    /// Fail on undefined variables instead of rendering them empty
    pub fn with_strict_undefined(mut self, strict: bool) -> Self {
        let behavior = if strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        };
        self.env.set_undefined_behavior(behavior);
        self
    }

    /// Root directory identifiers are resolved against
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an identifier to a path
    pub fn resolve_path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    /// Resolve an identifier to its template text
    pub fn resolve(&self, id: &str) -> Result<String, TemplateError> {
        let path = self.resolve_path(id);
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TemplateError::NotFound { path },
            _ => TemplateError::Read {
                path: path.clone(),
                message: e.to_string(),
            },
        })
    }

    /// Render the template `id` against `data`.
    ///
    /// A single trailing newline of the template is dropped, as Jinja does.
    pub fn render<S: Serialize>(&self, id: &str, data: &S) -> Result<String, TemplateError> {
        let template = self.env.get_template(id).map_err(|e| self.lookup_error(id, e))?;
        template.render(data).map_err(|source| TemplateError::Render {
            id: id.to_string(),
            source,
        })
    }

    fn lookup_error(&self, id: &str, err: minijinja::Error) -> TemplateError {
        if err.kind() == ErrorKind::TemplateNotFound {
            TemplateError::NotFound {
                path: self.resolve_path(id),
            }
        } else {
            TemplateError::Render {
                id: id.to_string(),
                source: err,
            }
        }
    }
}

fn load_source(root: &Path, id: &str) -> Result<Option<String>, minijinja::Error> {
    let path = root.join(id);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {}", path.display()),
        )
        .with_source(e)),
    }
}
