//! Error types for xsd-model
//!
//! Fatal failures are reported through [`Error`]. Problems that only affect a
//! single file, reference or component are collected as [`Issue`] values and
//! returned next to the partially built model.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for xsd-model operations
#[derive(Error, Debug)]
pub enum Error {
    /// A schema file does not exist
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Schema markup could not be turned into a schema document
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The model is structurally inconsistent
    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Selection request error
    #[error("selection error: {0}")]
    Selection(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the markup itself was unusable
    pub fn is_malformed_markup(&self) -> bool {
        matches!(self, Error::Xml(_) | Error::Parse(_))
    }
}

/// Schema parsing error
#[derive(Debug, Clone)]
pub struct ParseError {
    /// Error message
    pub message: String,
    /// Location in the schema file
    pub location: Option<String>,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref loc) = self.location {
            write!(f, "\n\nLocation: {}", loc)?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Structural inconsistency detected while resolving the merged model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A type reaches itself through its base-type chain
    #[error("circular inheritance for '{component}': {}", .cycle.join(" -> "))]
    CircularInheritance {
        /// Type whose chain was being walked
        component: String,
        /// Chain up to and including the repeated type
        cycle: Vec<String>,
    },
}

/// Category of a non-fatal problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Referenced file does not exist
    FileNotFound,
    /// File is not well-formed XML or not a schema document
    MalformedMarkup,
    /// schemaLocation points at a remote URL, which is never fetched
    RemoteLocation,
    /// Reference without a schemaLocation
    MissingLocation,
    /// Declared and actual target namespaces disagree
    NamespaceMismatch,
    /// A configured limit stopped processing
    LimitExceeded,
    /// Component name is not a valid NCName
    InvalidName,
    /// Two components share the same namespace and name
    DuplicateComponent,
    /// Name-only lookup matched components in several namespaces
    AmbiguousName,
    /// Type reference has no matching type in the merged model
    UnresolvedTypeReference,
    /// Attribute, attribute group or model group reference is dangling
    UnresolvedReference,
    /// Base-type chain revisits a type
    CircularInheritance,
    /// Selection names a component the schema does not define
    UnknownComponent,
}

impl IssueKind {
    /// Short label for reports
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::FileNotFound => "file-not-found",
            IssueKind::MalformedMarkup => "malformed-markup",
            IssueKind::RemoteLocation => "remote-location",
            IssueKind::MissingLocation => "missing-location",
            IssueKind::NamespaceMismatch => "namespace-mismatch",
            IssueKind::LimitExceeded => "limit-exceeded",
            IssueKind::InvalidName => "invalid-name",
            IssueKind::DuplicateComponent => "duplicate-component",
            IssueKind::AmbiguousName => "ambiguous-name",
            IssueKind::UnresolvedTypeReference => "unresolved-type-reference",
            IssueKind::UnresolvedReference => "unresolved-reference",
            IssueKind::CircularInheritance => "circular-inheritance",
            IssueKind::UnknownComponent => "unknown-component",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A problem collected during resolution, returned alongside the model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Issue {
    /// Issue category
    pub kind: IssueKind,
    /// Human readable message
    pub message: String,
    /// File the issue was found in
    pub file: Option<PathBuf>,
    /// Component the issue concerns
    pub component: Option<String>,
}

impl Issue {
    /// Create a new issue
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            component: None,
        }
    }

    /// Set the file
    pub fn with_file(mut self, file: impl AsRef<Path>) -> Self {
        self.file = Some(file.as_ref().to_path_buf());
        self
    }

    /// Set the component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)?;

        if let Some(ref component) = self.component {
            write!(f, " (component: {})", component)?;
        }

        if let Some(ref file) = self.file {
            write!(f, " (file: {})", file.display())?;
        }

        Ok(())
    }
}

impl From<&StructuralError> for Issue {
    fn from(err: &StructuralError) -> Self {
        match err {
            StructuralError::CircularInheritance { component, .. } => {
                Issue::new(IssueKind::CircularInheritance, err.to_string())
                    .with_component(component.clone())
            }
        }
    }
}
