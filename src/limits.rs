//! Limits and constraints for schema set processing
//!
//! These bound the resources a single resolution run may consume: the size
//! of each schema file, the number of files pulled in through
//! import/include/redefine, and how deep anonymous element trees may nest.

use crate::error::{Error, Result};

/// Global limits configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum schema file size in bytes
    pub max_file_size: usize,

    /// Maximum number of schema files loaded in one resolution
    pub max_schema_files: usize,

    /// Maximum nesting depth of anonymous element content
    pub max_nesting_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100 MB
            max_schema_files: 10_000,
            max_nesting_depth: 256,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits (more restrictive)
    pub fn strict() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            max_schema_files: 200,
            max_nesting_depth: 64,
        }
    }

    /// Create permissive limits (less restrictive, use with caution)
    pub fn permissive() -> Self {
        Self {
            max_file_size: 1024 * 1024 * 1024, // 1 GB
            max_schema_files: 1_000_000,
            max_nesting_depth: 4096,
        }
    }

    /// Check if a file size is within limits
    pub fn check_file_size(&self, size: usize) -> Result<()> {
        if size > self.max_file_size {
            Err(Error::LimitExceeded(format!(
                "schema file size {} bytes exceeds maximum {} bytes",
                size, self.max_file_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if loading one more file stays within limits
    pub fn check_schema_files(&self, loaded: usize) -> Result<()> {
        if loaded >= self.max_schema_files {
            Err(Error::LimitExceeded(format!(
                "schema file count would exceed maximum {}",
                self.max_schema_files
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a nesting depth is within limits
    pub fn check_nesting_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_nesting_depth {
            Err(Error::LimitExceeded(format!(
                "element nesting depth {} exceeds maximum {}",
                depth, self.max_nesting_depth
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_file_size(1024).is_ok());
        assert!(limits.check_schema_files(0).is_ok());
        assert!(limits.check_nesting_depth(10).is_ok());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.check_file_size(11 * 1024 * 1024).is_err());
        assert!(limits.check_schema_files(200).is_err());
        assert!(limits.check_schema_files(199).is_ok());
        assert!(limits.check_nesting_depth(65).is_err());
    }

    #[test]
    fn test_permissive_limits() {
        let limits = Limits::permissive();
        assert!(limits.check_file_size(500 * 1024 * 1024).is_ok());
        assert!(limits.check_nesting_depth(1000).is_ok());
    }

    #[test]
    fn test_limit_error_message() {
        let err = Limits::strict().check_file_size(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::LimitExceeded(_)));
        assert!(err.to_string().contains("exceeds maximum"));
    }
}
