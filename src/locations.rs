//! Resource location resolution
//!
//! Classifies `schemaLocation` values and resolves local ones relative to
//! the directory of the file that declares them. Remote locations are
//! recognized but never fetched.

use std::path::{Component, Path, PathBuf};

use url::Url;

/// URL schemes treated as remote resources
const REMOTE_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Resource location - a remote URL or a file system path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path (possibly relative)
    Path(PathBuf),
    /// Remote URL (http, https, ftp)
    Url(Url),
}

impl Location {
    /// Classify a schemaLocation string
    ///
    /// `file:` URLs become paths; single-letter schemes are Windows drive
    /// letters, not URLs.
    pub fn parse(s: &str) -> Self {
        if let Ok(url) = Url::parse(s) {
            let scheme = url.scheme();
            if REMOTE_SCHEMES.contains(&scheme) {
                return Location::Url(url);
            }
            if scheme == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Location::Path(path);
                }
            }
        }
        Location::Path(PathBuf::from(s))
    }

    /// Get the location as a string
    pub fn as_str(&self) -> String {
        match self {
            Location::Path(p) => p.to_string_lossy().to_string(),
            Location::Url(u) => u.to_string(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    /// Check if this is a local file
    pub fn is_file(&self) -> bool {
        matches!(self, Location::Path(_))
    }
}

/// Outcome of resolving a schemaLocation against its referencing file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    /// Existing local file, canonical absolute path
    Local(PathBuf),
    /// Remote URL that will not be fetched
    Remote(Url),
    /// Local path that does not exist (normalized, for reporting)
    NotFound(PathBuf),
}

/// Resolve a schemaLocation declared in `referencing_file`
///
/// Relative locations are joined to the referencing file's directory, not
/// to the directory of the root schema.
pub fn resolve_schema_location(location: &str, referencing_file: &Path) -> ResolvedLocation {
    match Location::parse(location) {
        Location::Url(url) => ResolvedLocation::Remote(url),
        Location::Path(path) => {
            let joined = if path.is_absolute() {
                path
            } else {
                referencing_file
                    .parent()
                    .map(|dir| dir.join(&path))
                    .unwrap_or(path)
            };
            match joined.canonicalize() {
                Ok(canonical) if canonical.is_file() => ResolvedLocation::Local(canonical),
                _ => ResolvedLocation::NotFound(normalize_path(&joined)),
            }
        }
    }
}

/// Lexically normalize a path, folding `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push("..");
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
