//! Run configuration

use std::path::PathBuf;

use crate::limits::Limits;
use crate::resolver::Resolver;

/// Settings for one resolution run
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory relative root paths are resolved against
    pub base_dir: Option<PathBuf>,
    /// Resource limits
    pub limits: Limits,
    /// Extract files on worker threads
    pub parallel: bool,
    /// No-namespace includes adopt the includer's namespace
    pub chameleon_includes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_dir: None,
            limits: Limits::default(),
            parallel: false,
            chameleon_includes: true,
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base directory
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Set resource limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Enable or disable parallel extraction
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable or disable chameleon includes
    pub fn with_chameleon_includes(mut self, enabled: bool) -> Self {
        self.chameleon_includes = enabled;
        self
    }

    /// Reference resolver configured from these settings
    pub fn resolver(&self) -> Resolver {
        let resolver = Resolver::new()
            .with_limits(self.limits.clone())
            .with_chameleon_includes(self.chameleon_includes);
        match self.base_dir {
            Some(ref dir) => resolver.with_base_dir(dir.clone()),
            None => resolver,
        }
    }
}
