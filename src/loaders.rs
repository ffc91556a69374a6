//! Resource loading utilities
//!
//! Reads schema files from the local filesystem. Remote resources are never
//! fetched: this is an offline tool.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;

/// Resource loader for schema files
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Get the limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a local file as a string
    pub fn load_path(&self, path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Resource(format!("Failed to stat file '{}': {}", path.display(), e)),
        })?;

        // Check size limits before reading
        self.limits.check_file_size(metadata.len() as usize)?;

        fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => Error::Resource(format!("Failed to read file '{}': {}", path.display(), e)),
        })
    }

    /// Load a resource as a string
    pub fn load(&self, location: &Location) -> Result<String> {
        match location {
            Location::Path(path) => self.load_path(path),
            Location::Url(url) => Err(Error::Resource(format!(
                "Remote resources are not fetched: {}",
                url
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<root>test</root>").unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new();
        let content = loader.load(&location).unwrap();

        assert!(content.contains("<root>test</root>"));
    }

    #[test]
    fn test_missing_file() {
        let loader = Loader::new();
        let result = loader.load_path(Path::new("/definitely/not/here.xsd"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_remote_is_never_loaded() {
        let loader = Loader::new();
        let location = Location::parse("https://example.com/schema.xsd");
        assert!(matches!(loader.load(&location), Err(Error::Resource(_))));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load_path(file.path());

        // Strict limits (10 MB max) should reject 11MB file
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }
}
