//! JSON export
//!
//! Serializes a resolved [`SchemaSet`] or a [`SelectionResult`] into the
//! structure consumed by report generators: metadata with statistics, root
//! and global elements, types, attributes, groups, the dependency map and
//! multi-file bookkeeping.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::dependencies::DependencyEdge;
use crate::error::{Issue, Result};
use crate::model::{
    AttributeDecl, AttributeGroup, ComplexType, ComponentKind, ElementDecl, ModelGroup, SimpleType,
    Statistics,
};
use crate::namespaces::QName;
use crate::pipeline::{FileSummary, SchemaSet};
use crate::registry::MergedModel;
use crate::resolver::SchemaReference;
use crate::selective::{SelectedComponent, SelectionResult, SelectionSummary};

/// Configuration for JSON export
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Indent the output
    pub pretty: bool,
    /// Include the individual dependency edges
    pub include_edges: bool,
    /// Include collected issues
    pub include_issues: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            include_edges: false,
            include_issues: true,
        }
    }
}

impl ExportConfig {
    /// Create a new export configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether to indent the output
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Set whether to include dependency edges
    pub fn with_edges(mut self, include: bool) -> Self {
        self.include_edges = include;
        self
    }

    /// Set whether to include issues
    pub fn with_issues(mut self, include: bool) -> Self {
        self.include_issues = include;
        self
    }
}

/// File-level metadata
#[derive(Debug, Serialize)]
pub struct Metadata<'a> {
    /// Root schema path
    pub file_path: &'a Path,
    /// Target namespace of the root schema
    pub target_namespace: Option<&'a str>,
    /// Prefix → URI declarations across all files
    pub namespaces: &'a IndexMap<String, String>,
    /// Merged statistics
    pub statistics: Statistics,
}

/// Multi-file bookkeeping
#[derive(Debug, Serialize)]
pub struct MultiFileInfo<'a> {
    /// Number of loaded files
    pub total_files: usize,
    /// Loaded files in discovery order
    pub processed_files: Vec<&'a Path>,
    /// Every import, include and redefine
    pub schema_references: &'a [SchemaReference],
    /// File → files it references
    pub file_dependencies: &'a IndexMap<PathBuf, Vec<PathBuf>>,
    /// Namespace → importing file
    pub imported_namespaces: &'a IndexMap<String, PathBuf>,
    /// Per-file overview
    pub files: Vec<FileSummary>,
}

/// Exported view of a schema set
#[derive(Debug, Serialize)]
pub struct SchemaExport<'a> {
    /// File metadata
    pub metadata: Metadata<'a>,
    /// Document-root candidates in declaration order
    pub root_elements: &'a [ElementDecl],
    /// Global elements by name
    pub global_elements: IndexMap<String, &'a ElementDecl>,
    /// Complex types by name
    pub complex_types: IndexMap<String, &'a ComplexType>,
    /// Simple types by name
    pub simple_types: IndexMap<String, &'a SimpleType>,
    /// Global attributes by name
    pub attributes: IndexMap<String, &'a AttributeDecl>,
    /// Attribute groups by name
    pub attribute_groups: IndexMap<String, &'a AttributeGroup>,
    /// Named model groups by name
    pub groups: IndexMap<String, &'a ModelGroup>,
    /// Component name → referenced type names
    pub dependencies: &'a IndexMap<String, BTreeSet<String>>,
    /// Type name → base-type chain
    pub inheritance: IndexMap<String, Vec<&'a str>>,
    /// Dependency edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edges: Option<&'a [DependencyEdge]>,
    /// Multi-file bookkeeping
    pub multi_file_info: MultiFileInfo<'a>,
    /// Collected issues
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

/// Map key for a component: its local name, or `{ns}local` when the local
/// name is shared across namespaces
fn component_key(model: &MergedModel, kind: ComponentKind, name: &QName) -> String {
    if model.index().candidates(kind, &name.local_name).len() > 1 {
        name.to_string()
    } else {
        name.local_name.clone()
    }
}

fn keyed<'a, T>(
    model: &MergedModel,
    kind: ComponentKind,
    table: &'a IndexMap<QName, T>,
) -> IndexMap<String, &'a T> {
    table
        .iter()
        .map(|(name, value)| (component_key(model, kind, name), value))
        .collect()
}

impl<'a> SchemaExport<'a> {
    /// Build the export view of a schema set
    pub fn new(set: &'a SchemaSet, config: &ExportConfig) -> Self {
        let model = &set.model;
        let resolution = &set.resolution;

        let inheritance = set
            .dependencies
            .chains
            .iter()
            .map(|(id, chain)| (component_key(model, id.kind, &id.name), chain.names()))
            .collect();

        Self {
            metadata: Metadata {
                file_path: &resolution.root,
                target_namespace: model.target_namespace.as_deref(),
                namespaces: &model.namespaces,
                statistics: model.statistics(),
            },
            root_elements: &model.root_elements,
            global_elements: keyed(model, ComponentKind::Element, &model.elements),
            complex_types: keyed(model, ComponentKind::ComplexType, &model.complex_types),
            simple_types: keyed(model, ComponentKind::SimpleType, &model.simple_types),
            attributes: keyed(model, ComponentKind::Attribute, &model.attributes),
            attribute_groups: keyed(model, ComponentKind::AttributeGroup, &model.attribute_groups),
            groups: keyed(model, ComponentKind::ModelGroup, &model.model_groups),
            dependencies: &set.dependencies.dependency_map,
            inheritance,
            edges: config.include_edges.then_some(set.dependencies.edges.as_slice()),
            multi_file_info: MultiFileInfo {
                total_files: resolution.file_count(),
                processed_files: resolution.files.keys().map(PathBuf::as_path).collect(),
                schema_references: &resolution.references,
                file_dependencies: &resolution.file_dependencies,
                imported_namespaces: &resolution.imported_namespaces,
                files: set.file_summary(),
            },
            issues: if config.include_issues {
                set.issues()
            } else {
                Vec::new()
            },
        }
    }
}

/// Selection metadata
#[derive(Debug, Serialize)]
pub struct SelectionMetadata {
    /// Distinct selection files
    pub total_files: usize,
    /// Always `selective`
    pub selection_type: &'static str,
    /// Number of picked components
    pub selected_components: usize,
    /// Statistics over the picked components
    pub statistics: Statistics,
}

/// Exported view of a selection result
#[derive(Debug, Serialize)]
pub struct SelectionExport<'a> {
    /// Selection metadata
    pub metadata: SelectionMetadata,
    /// Picked elements by name
    pub global_elements: IndexMap<&'a str, &'a SelectedComponent>,
    /// Picked complex types by name
    pub complex_types: IndexMap<&'a str, &'a SelectedComponent>,
    /// Picked simple types by name
    pub simple_types: IndexMap<&'a str, &'a SelectedComponent>,
    /// Distinct selection files
    pub source_files: Vec<PathBuf>,
    /// Distinct namespaces
    pub namespaces: Vec<String>,
    /// Per-file overview
    pub selection_summary: IndexMap<PathBuf, SelectionSummary>,
    /// Picked name → referenced type names
    pub dependencies: IndexMap<&'a str, &'a BTreeSet<String>>,
    /// Collected issues
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl<'a> SelectionExport<'a> {
    /// Build the export view of a selection result
    pub fn new(result: &'a SelectionResult, config: &ExportConfig) -> Self {
        // result keys are "<kind>:<name>", possibly namespace-qualified
        let name_of = |key: &'a str| key.split_once(':').map_or(key, |(_, name)| name);
        let by_kind = |kind: ComponentKind| -> IndexMap<&'a str, &'a SelectedComponent> {
            result
                .components
                .iter()
                .filter(|(_, c)| c.kind() == kind)
                .map(|(key, c)| (name_of(key.as_str()), c))
                .collect()
        };
        let source_files = result.source_files();

        Self {
            metadata: SelectionMetadata {
                total_files: source_files.len(),
                selection_type: "selective",
                selected_components: result.len(),
                statistics: result.statistics(),
            },
            global_elements: by_kind(ComponentKind::Element),
            complex_types: by_kind(ComponentKind::ComplexType),
            simple_types: by_kind(ComponentKind::SimpleType),
            source_files,
            namespaces: result.namespaces(),
            selection_summary: result.selection_summary(),
            dependencies: result
                .components
                .iter()
                .filter(|(_, c)| !c.dependencies.is_empty())
                .map(|(key, c)| (name_of(key.as_str()), &c.dependencies))
                .collect(),
            issues: if config.include_issues {
                result.issues.clone()
            } else {
                Vec::new()
            },
        }
    }
}

fn render<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Serialize a schema set to JSON
pub fn to_json(set: &SchemaSet, config: &ExportConfig) -> Result<String> {
    render(&SchemaExport::new(set, config), config.pretty)
}

/// Serialize a selection result to JSON
pub fn selection_to_json(result: &SelectionResult, config: &ExportConfig) -> Result<String> {
    render(&SelectionExport::new(result, config), config.pretty)
}

/// Write a schema set as JSON to a file
pub fn write_json(set: &SchemaSet, config: &ExportConfig, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_json(set, config)?)?;
    info!(path = %path.display(), "export.written");
    Ok(())
}
