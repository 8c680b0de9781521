//! Error types for libpkgquery.
//!
//! Every failure the engine can report lives in [`Error`]. The `Display`
//! output of each variant is the exact diagnostic line printed by the
//! command-line tool; [`Error::diagnostic`] adds the longer explanatory form
//! used when short errors are not requested.

use std::io;
use std::path::PathBuf;

use crate::version::Comparator;

/// Result type alias for libpkgquery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while locating, parsing, or resolving packages.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A metadata file contains a line that is neither a variable nor a field.
    #[error("Malformed metadata in '{path}' line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A mandatory field (`Name` or `Version`) is absent.
    #[error("Package file '{path}' has no {field}: field")]
    MissingField { path: PathBuf, field: &'static str },

    /// A dependency list could not be parsed.
    #[error("Invalid dependency list '{spec}': {message}")]
    InvalidDependency { spec: String, message: String },

    /// A requested or required package is absent from the search path.
    #[error("{}", not_found_message(.name, .required_by))]
    NotFound {
        name: String,
        required_by: Option<String>,
    },

    /// A package was found but its version fails a declared constraint.
    #[error(
        "{}",
        constraint_message(.name, .required_by, .comparator, .required, .found, .url)
    )]
    VersionConstraint {
        required_by: Option<String>,
        name: String,
        comparator: Comparator,
        required: String,
        found: String,
        url: Option<String>,
    },

    /// A resolved package matches a `Conflicts` entry of another resolved package.
    #[error(
        "Version {version} of {name} creates a conflict.\n({conflict} conflicts with {declared_by} {declared_by_version})"
    )]
    Conflict {
        name: String,
        version: String,
        conflict: String,
        declared_by: String,
        declared_by_version: String,
    },

    /// A `${name}` reference names a variable that is not defined.
    #[error("Variable '{variable}' not defined in '{context}'")]
    UndefinedVariable { variable: String, context: String },

    /// A `--define-variable` argument is not of the form `name=value`.
    #[error("--define-variable argument does not have a value for the variable")]
    InvalidDefine { definition: String },

    /// No package names were given for a mode that needs them.
    #[error("Must specify package names on the command line")]
    NoPackagesSpecified,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Render the diagnostic text for this error.
    ///
    /// A package missing at the top level gets the search-path hint unless
    /// `short` is set. Every other error renders as its `Display` form.
    pub fn diagnostic(&self, short: bool) -> String {
        match self {
            Error::NotFound {
                name,
                required_by: None,
            } if !short => format!(
                "Package {name} was not found in the pkg-config search path.\n\
                 Perhaps you should add the directory containing `{name}.pc'\n\
                 to the PKG_CONFIG_PATH environment variable\n\
                 {self}"
            ),
            _ => self.to_string(),
        }
    }

    /// Attach a source description to substitution errors raised while
    /// expanding a field of a specific file.
    pub(crate) fn in_context(self, context: impl Into<String>) -> Self {
        match self {
            Error::UndefinedVariable { variable, .. } => Error::UndefinedVariable {
                variable,
                context: context.into(),
            },
            other => other,
        }
    }
}

fn not_found_message(name: &str, required_by: &Option<String>) -> String {
    match required_by {
        Some(parent) => format!("Package '{name}', required by '{parent}', not found"),
        None => format!("No package '{name}' found"),
    }
}

fn constraint_message(
    name: &str,
    required_by: &Option<String>,
    comparator: &Comparator,
    required: &str,
    found: &str,
    url: &Option<String>,
) -> String {
    let mut message = match required_by {
        Some(parent) => format!(
            "Package '{parent}' requires '{name} {comparator} {required}' but version of {name} is {found}"
        ),
        None => format!("Requested '{name} {comparator} {required}' but version of {name} is {found}"),
    };
    if let Some(url) = url {
        message.push_str(&format!("\nYou may find new versions of {name} at {url}"));
    }
    message
}
