//! Full resolution pipeline
//!
//! Resolve references, extract every file, merge in resolution order, then
//! compute dependencies over the merged model.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::dependencies::{Dependencies, DependencyResolver};
use crate::error::{Issue, Result};
use crate::extractor::extract;
use crate::limits::Limits;
use crate::model::{FileModel, Statistics};
use crate::registry::MergedModel;
use crate::resolver::{Resolution, SchemaFile};
use crate::settings::Settings;

/// Per-file overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    /// Resolved path
    pub path: PathBuf,
    /// Effective target namespace
    pub target_namespace: Option<String>,
    /// Whether this is the root file
    pub is_entry: bool,
    /// Named components defined in the file
    pub components: usize,
    /// Counts and nesting depth
    pub statistics: Statistics,
    /// Files this file references directly
    pub dependencies: Vec<PathBuf>,
}

/// A resolved schema set and everything computed from it
#[derive(Debug, Clone)]
pub struct SchemaSet {
    /// Loaded files and references
    pub resolution: Resolution,
    /// Per-file extraction results, in resolution order
    pub file_models: Vec<FileModel>,
    /// Merged and linked model
    pub model: MergedModel,
    /// Dependency edges, map and inheritance chains
    pub dependencies: Dependencies,
}

impl SchemaSet {
    /// Resolve a root schema with default settings
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_settings(path, &Settings::default())
    }

    /// Resolve a root schema
    ///
    /// Fails only when the root file itself cannot be loaded or parsed;
    /// everything else ends up in [`issues`](Self::issues).
    pub fn with_settings(path: impl AsRef<Path>, settings: &Settings) -> Result<Self> {
        let resolution = settings.resolver().resolve(path)?;
        let file_models = extract_all(&resolution, settings);
        let model = MergedModel::from_files(&file_models);

        let mut dependencies = DependencyResolver::new(&model).resolve();
        dependencies.add_file_dependencies(&resolution.file_dependencies);

        let set = Self {
            resolution,
            file_models,
            model,
            dependencies,
        };
        info!(
            path = %set.resolution.root.display(),
            files = set.resolution.file_count(),
            issues = set.issues().len(),
            "schema.resolved"
        );
        Ok(set)
    }

    /// All issues: resolution, extraction, merge, then dependencies
    pub fn issues(&self) -> Vec<Issue> {
        let mut seen = HashSet::new();
        self.resolution
            .issues
            .iter()
            .chain(self.file_models.iter().flat_map(|f| f.issues.iter()))
            .chain(self.model.issues.iter())
            .chain(self.dependencies.issues.iter())
            .filter(|issue| seen.insert(*issue))
            .cloned()
            .collect()
    }

    /// Statistics of the merged model
    pub fn statistics(&self) -> Statistics {
        self.model.statistics()
    }

    /// Model of one file
    pub fn file_model(&self, path: &Path) -> Option<&FileModel> {
        self.file_models.iter().find(|f| f.path == path)
    }

    /// Overview of every loaded file
    pub fn file_summary(&self) -> Vec<FileSummary> {
        self.file_models
            .iter()
            .map(|file| FileSummary {
                path: file.path.clone(),
                target_namespace: file.target_namespace.clone(),
                is_entry: file.path == self.resolution.root,
                components: file.component_count(),
                statistics: file.statistics(),
                dependencies: self
                    .resolution
                    .file_dependencies
                    .get(&file.path)
                    .cloned()
                    .unwrap_or_default(),
            })
            .collect()
    }
}

fn extract_all(resolution: &Resolution, settings: &Settings) -> Vec<FileModel> {
    let files: Vec<&SchemaFile> = resolution.files.values().collect();
    let limits = &settings.limits;

    if !settings.parallel || files.len() < 2 {
        return files.into_iter().map(|f| extract(f, limits)).collect();
    }

    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(files.len());
    let batch_size = (files.len() + workers - 1) / workers;
    debug!(files = files.len(), workers, "extract.parallel");

    std::thread::scope(|scope| {
        let handles: Vec<_> = files
            .chunks(batch_size)
            .map(|batch| scope.spawn(move || extract_batch(batch, limits)))
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect()
    })
}

fn extract_batch(batch: &[&SchemaFile], limits: &Limits) -> Vec<FileModel> {
    batch.iter().map(|file| extract(file, limits)).collect()
}
