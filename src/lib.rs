//! # xsd-model
//!
//! Resolve a multi-file XML Schema (XSD) set into a unified structural model.
//!
//! Starting from a root schema the crate follows `xs:import`, `xs:include`
//! and `xs:redefine` references, extracts every file into an immutable
//! per-file model, merges those into one namespace-qualified registry and
//! computes type dependencies and inheritance chains over it.
//!
//! ## Features
//!
//! - Reference resolution relative to the referencing file, with diamond
//!   dedup, chameleon includes and remote locations recorded but never fetched
//! - Structural extraction of elements, complex/simple types, attributes,
//!   attribute groups and model groups, with nesting paths and source files
//! - Registry keyed by `(namespace, local name)` plus a local-name index that
//!   reports ambiguities
//! - Dependency edges tagged cross-schema/cross-file, cycle-safe inheritance
//!   chains
//! - Selective extraction of named components, with transitive dependencies
//! - JSON export
//!
//! Problems that only affect one file, reference or component never abort a
//! run; they are collected as [`Issue`]s next to the model.
//!
//! ## Example
//!
//! ```rust,ignore
//! use xsd_model::SchemaSet;
//!
//! let set = SchemaSet::from_file("schemas/library.xsd")?;
//! println!("{} files", set.resolution.file_count());
//! for issue in set.issues() {
//!     eprintln!("{}", issue);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;
pub mod settings;

// Utilities
pub mod namespaces;
pub mod names;
pub mod locations;

// Resource loading
pub mod loaders;
pub mod documents;

// Model
pub mod model;
pub mod resolver;
pub mod extractor;
pub mod registry;
pub mod dependencies;

// Entry points
pub mod pipeline;
pub mod selective;
pub mod exports;

// Re-exports for convenience
pub use dependencies::{Dependencies, DependencyEdge, EdgeKind, InheritanceChain};
pub use error::{Error, Issue, IssueKind, Result, StructuralError};
pub use model::{ComponentId, ComponentKind, ElementDecl, FileModel, Statistics, TypeRef};
pub use namespaces::QName;
pub use pipeline::SchemaSet;
pub use registry::MergedModel;
pub use resolver::{Resolution, Resolver};
pub use selective::{Selection, SelectionResult, SelectiveExtractor};
pub use settings::Settings;

/// Version of the xsd-model library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// XSD 1.0 namespace
pub const XSD_1_0_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

/// XSD 1.1 namespace
pub const XSD_1_1_NAMESPACE: &str = "http://www.w3.org/2009/XMLSchema";

/// XML namespace
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";
