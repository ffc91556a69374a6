//! Schema reference resolution
//!
//! Starting from a root schema file, every file reachable through
//! `xs:import`, `xs:include` and `xs:redefine` is loaded exactly once,
//! keyed by its canonical path. References are processed breadth first over
//! a growing list until no new file turns up, so chains of any depth are
//! followed while diamonds and cycles are loaded only once.
//!
//! Missing, remote and malformed referenced files never abort resolution;
//! they are recorded as [`Issue`]s next to the loaded set. Only the root file
//! itself is fatal.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::documents::{Document, Element};
use crate::error::{Error, Issue, IssueKind, ParseError, Result};
use crate::limits::Limits;
use crate::loaders::Loader;
use crate::locations::{resolve_schema_location, ResolvedLocation};

/// Whether an element is in one of the XSD namespaces
pub(crate) fn is_xsd_element(element: &Element) -> bool {
    matches!(
        element.namespace(),
        Some(crate::XSD_1_0_NAMESPACE) | Some(crate::XSD_1_1_NAMESPACE)
    )
}

/// Kind of schema-to-schema reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// xs:import, different target namespace
    Import,
    /// xs:include, same or absent target namespace
    Include,
    /// xs:redefine, include with redefinitions
    Redefine,
}

impl ReferenceKind {
    fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "import" => Some(ReferenceKind::Import),
            "include" => Some(ReferenceKind::Include),
            "redefine" => Some(ReferenceKind::Redefine),
            _ => None,
        }
    }

    /// Whether the referenced file joins the referencing file's namespace
    pub fn is_inclusion(&self) -> bool {
        matches!(self, ReferenceKind::Include | ReferenceKind::Redefine)
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferenceKind::Import => "import",
            ReferenceKind::Include => "include",
            ReferenceKind::Redefine => "redefine",
        })
    }
}

/// Outcome of following a reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceStatus {
    /// Target file is loaded
    Resolved,
    /// Location is a remote URL and was not fetched
    Remote,
    /// Location does not exist on disk
    NotFound,
    /// Target exists but could not be loaded (malformed, over limits)
    LoadFailed,
    /// No schemaLocation was given
    NoLocation,
}

impl ReferenceStatus {
    /// Whether the reference points somewhere that could not be loaded
    pub fn is_unresolved(&self) -> bool {
        matches!(
            self,
            ReferenceStatus::Remote | ReferenceStatus::NotFound | ReferenceStatus::LoadFailed
        )
    }
}

/// Edge between two schema files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaReference {
    /// import, include or redefine
    pub kind: ReferenceKind,
    /// Declared namespace (imports only)
    pub namespace: Option<String>,
    /// Declared schemaLocation
    pub location: Option<String>,
    /// File declaring the reference
    pub source: PathBuf,
    /// Resolved local path; absent for remote or missing locations
    pub resolved: Option<PathBuf>,
    /// Resolution outcome
    pub status: ReferenceStatus,
}

/// A loaded schema file
#[derive(Debug, Clone)]
pub struct SchemaFile {
    /// Canonical absolute path
    pub path: PathBuf,
    /// Declared targetNamespace
    pub target_namespace: Option<String>,
    /// Namespace components are placed in; differs from the declared one
    /// for chameleon includes
    pub effective_namespace: Option<String>,
    /// Prefix → URI declarations of the schema root (default under "")
    pub namespaces: IndexMap<String, String>,
    /// Parsed markup root (the xs:schema element)
    pub root: Element,
    /// Whether this is the root file of the resolution
    pub is_entry: bool,
}

impl SchemaFile {
    /// Parse schema markup loaded from `path`
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Result<Self> {
        let path = path.into();
        let root = Document::from_string(text)?.into_root().ok_or_else(|| {
            Error::Parse(ParseError::new("Empty document").with_location(path.display().to_string()))
        })?;

        if !is_xsd_element(&root) || root.local_name() != "schema" {
            return Err(Error::Parse(
                ParseError::new(format!(
                    "Root element '{}' is not an XSD schema",
                    root.qname
                ))
                .with_location(path.display().to_string()),
            ));
        }

        let target_namespace = root
            .get_attribute("targetNamespace")
            .map(str::to_string)
            .filter(|ns| !ns.is_empty());
        let namespaces = root.declared.to_map();

        Ok(Self {
            path,
            effective_namespace: target_namespace.clone(),
            target_namespace,
            namespaces,
            root,
            is_entry: false,
        })
    }

    /// Whether this file adopted the includer's namespace
    pub fn is_chameleon(&self) -> bool {
        self.target_namespace.is_none() && self.effective_namespace.is_some()
    }

    /// File name for display
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Result of resolving a root schema
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Canonical path of the root file
    pub root: PathBuf,
    /// Loaded files in discovery order, keyed by canonical path
    pub files: IndexMap<PathBuf, SchemaFile>,
    /// Every reference found, in discovery order
    pub references: Vec<SchemaReference>,
    /// Namespace → file of the last import declaring it
    pub imported_namespaces: IndexMap<String, PathBuf>,
    /// File → loaded files it references directly
    pub file_dependencies: IndexMap<PathBuf, Vec<PathBuf>>,
    /// Problems found while resolving
    pub issues: Vec<Issue>,
}

impl Resolution {
    /// The root schema file
    pub fn root_file(&self) -> Option<&SchemaFile> {
        self.files.get(&self.root)
    }

    /// References that point at something that could not be loaded
    pub fn unresolved(&self) -> impl Iterator<Item = &SchemaReference> {
        self.references.iter().filter(|r| r.status.is_unresolved())
    }

    /// Number of loaded files
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Every target namespace and imported namespace seen
    pub fn namespaces(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let declared = self
            .files
            .values()
            .filter_map(|f| f.effective_namespace.clone());
        let imported = self.imported_namespaces.keys().cloned();
        for namespace in declared.chain(imported) {
            if !seen.contains(&namespace) {
                seen.push(namespace);
            }
        }
        seen
    }
}

/// Reference resolver
#[derive(Debug, Clone)]
pub struct Resolver {
    loader: Loader,
    base_dir: Option<PathBuf>,
    chameleon_includes: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            loader: Loader::new(),
            base_dir: None,
            chameleon_includes: true,
        }
    }
}

impl Resolver {
    /// Create a resolver with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.loader = self.loader.with_limits(limits);
        self
    }

    /// Set the directory a relative root path is resolved against
    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    /// Whether no-namespace files reached by include adopt the includer's namespace
    pub fn with_chameleon_includes(mut self, enabled: bool) -> Self {
        self.chameleon_includes = enabled;
        self
    }

    /// Resolve `root` and everything it references
    pub fn resolve(&self, root: impl AsRef<Path>) -> Result<Resolution> {
        let root = root.as_ref();
        let root = match (&self.base_dir, root.is_relative()) {
            (Some(base), true) => base.join(root),
            _ => root.to_path_buf(),
        };
        let root = root
            .canonicalize()
            .map_err(|_| Error::FileNotFound(root.clone()))?;

        info!(path = %root.display(), "schema.resolving");

        let text = self.loader.load_path(&root)?;
        let mut root_file = SchemaFile::parse(root.clone(), &text)?;
        root_file.is_entry = true;

        let mut resolution = Resolution {
            root: root.clone(),
            files: IndexMap::new(),
            references: Vec::new(),
            imported_namespaces: IndexMap::new(),
            file_dependencies: IndexMap::new(),
            issues: Vec::new(),
        };

        let refs = self.collect_references(&root_file, &mut resolution.issues);
        resolution.references.extend(refs);
        resolution.files.insert(root.clone(), root_file);

        let mut failed: HashSet<PathBuf> = HashSet::new();
        let mut cursor = 0;

        while cursor < resolution.references.len() {
            let index = cursor;
            cursor += 1;

            let target = match resolution.references[index].resolved {
                Some(ref path) if resolution.references[index].status == ReferenceStatus::Resolved => {
                    path.clone()
                }
                _ => continue,
            };
            if resolution.files.contains_key(&target) {
                continue;
            }
            if failed.contains(&target) {
                resolution.references[index].status = ReferenceStatus::LoadFailed;
                continue;
            }

            let reference = resolution.references[index].clone();
            match self.load_referenced(&reference, &target, &resolution) {
                Ok(file) => {
                    debug!(
                        path = %target.display(),
                        kind = %reference.kind,
                        namespace = ?file.effective_namespace,
                        "schema.loaded"
                    );
                    let refs = self.collect_references(&file, &mut resolution.issues);
                    resolution.references.extend(refs);
                    resolution.files.insert(target, file);
                }
                Err(err) => {
                    let kind = match err {
                        Error::LimitExceeded(_) => IssueKind::LimitExceeded,
                        Error::FileNotFound(_) => IssueKind::FileNotFound,
                        _ => IssueKind::MalformedMarkup,
                    };
                    warn!(path = %target.display(), error = %err, "schema.load_failed");
                    resolution.issues.push(
                        Issue::new(kind, format!("Failed to load schema: {}", err))
                            .with_file(&target),
                    );
                    resolution.references[index].status = ReferenceStatus::LoadFailed;
                    failed.insert(target);
                }
            }
        }

        self.finish(&mut resolution);

        info!(
            files = resolution.files.len(),
            references = resolution.references.len(),
            unresolved = resolution.unresolved().count(),
            "schema.resolved"
        );

        Ok(resolution)
    }

    fn load_referenced(
        &self,
        reference: &SchemaReference,
        target: &Path,
        resolution: &Resolution,
    ) -> Result<SchemaFile> {
        self.loader
            .limits()
            .check_schema_files(resolution.files.len())?;

        let text = self.loader.load_path(target)?;
        let mut file = SchemaFile::parse(target, &text)?;

        if reference.kind.is_inclusion() && self.chameleon_includes && file.target_namespace.is_none() {
            file.effective_namespace = resolution
                .files
                .get(&reference.source)
                .and_then(|includer| includer.effective_namespace.clone());
        }

        Ok(file)
    }

    /// Read the import/include/redefine children of a schema root
    fn collect_references(&self, file: &SchemaFile, issues: &mut Vec<Issue>) -> Vec<SchemaReference> {
        let mut references = Vec::new();

        for child in file.root.children.iter().filter(|c| is_xsd_element(c)) {
            let kind = match ReferenceKind::from_local_name(child.local_name()) {
                Some(kind) => kind,
                None => continue,
            };
            let namespace = match kind {
                ReferenceKind::Import => child.get_attribute("namespace").map(str::to_string),
                _ => None,
            };
            let location = child
                .get_attribute("schemaLocation")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);

            let (resolved, status) = match location {
                None => {
                    if kind.is_inclusion() {
                        issues.push(
                            Issue::new(
                                IssueKind::MissingLocation,
                                format!("{} without schemaLocation", kind),
                            )
                            .with_file(&file.path),
                        );
                    } else {
                        debug!(namespace = ?namespace, "import without schemaLocation");
                    }
                    (None, ReferenceStatus::NoLocation)
                }
                Some(ref location) => match resolve_schema_location(location, &file.path) {
                    ResolvedLocation::Local(path) => (Some(path), ReferenceStatus::Resolved),
                    ResolvedLocation::Remote(url) => {
                        warn!(url = %url, kind = %kind, "skipping remote schema location");
                        issues.push(
                            Issue::new(
                                IssueKind::RemoteLocation,
                                format!("Remote schema location not fetched: {}", url),
                            )
                            .with_file(&file.path)
                            .with_component(location.clone()),
                        );
                        (None, ReferenceStatus::Remote)
                    }
                    ResolvedLocation::NotFound(path) => {
                        warn!(path = %path.display(), kind = %kind, "referenced schema not found");
                        issues.push(
                            Issue::new(
                                IssueKind::FileNotFound,
                                format!("Schema file not found: {}", path.display()),
                            )
                            .with_file(&file.path)
                            .with_component(location.clone()),
                        );
                        (None, ReferenceStatus::NotFound)
                    }
                },
            };

            references.push(SchemaReference {
                kind,
                namespace,
                location,
                source: file.path.clone(),
                resolved,
                status,
            });
        }

        references
    }

    /// Namespace bookkeeping and consistency checks once the file set is final
    fn finish(&self, resolution: &mut Resolution) {
        for path in resolution.files.keys() {
            resolution.file_dependencies.insert(path.clone(), Vec::new());
        }

        for reference in &resolution.references {
            if reference.status != ReferenceStatus::Resolved {
                continue;
            }
            let target_path = match reference.resolved {
                Some(ref path) => path,
                None => continue,
            };
            let (source, target) = match (
                resolution.files.get(&reference.source),
                resolution.files.get(target_path),
            ) {
                (Some(source), Some(target)) => (source, target),
                _ => continue,
            };

            if let Some(deps) = resolution.file_dependencies.get_mut(&reference.source) {
                if !deps.contains(target_path) {
                    deps.push(target_path.clone());
                }
            }

            match reference.kind {
                ReferenceKind::Import => {
                    if let Some(ref namespace) = reference.namespace {
                        if resolution.imported_namespaces.contains_key(namespace) {
                            debug!(namespace = %namespace, path = %target_path.display(), "import namespace remapped");
                        }
                        resolution
                            .imported_namespaces
                            .insert(namespace.clone(), target_path.clone());
                    }
                    if reference.namespace != target.target_namespace {
                        resolution.issues.push(
                            Issue::new(
                                IssueKind::NamespaceMismatch,
                                format!(
                                    "Import declares namespace {:?} but {} declares {:?}",
                                    reference.namespace,
                                    target.file_name(),
                                    target.target_namespace
                                ),
                            )
                            .with_file(&reference.source),
                        );
                    }
                }
                ReferenceKind::Include | ReferenceKind::Redefine => {
                    if target.target_namespace.is_some()
                        && target.target_namespace != source.effective_namespace
                    {
                        resolution.issues.push(
                            Issue::new(
                                IssueKind::NamespaceMismatch,
                                format!(
                                    "{} of {} with namespace {:?} into namespace {:?}",
                                    reference.kind,
                                    target.file_name(),
                                    target.target_namespace,
                                    source.effective_namespace
                                ),
                            )
                            .with_file(&reference.source),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn schema(tns: Option<&str>, body: &str) -> String {
        let tns = tns
            .map(|ns| format!(r#" targetNamespace="{}" xmlns:tns="{}""#, ns, ns))
            .unwrap_or_default();
        format!(
            r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"{}>
{}
</xs:schema>"#,
            tns, body
        )
    }

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_single_file() {
        let dir = TempDir::new().unwrap();
        let root = write(&dir, "main.xsd", &schema(Some("urn:a"), ""));

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 1);
        assert!(resolution.references.is_empty());
        let file = resolution.root_file().unwrap();
        assert!(file.is_entry);
        assert_eq!(file.target_namespace.as_deref(), Some("urn:a"));
        assert_eq!(file.namespaces.get("tns").map(String::as_str), Some("urn:a"));
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = Resolver::new().resolve(dir.path().join("absent.xsd"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_non_schema_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let root = write(&dir, "not-schema.xsd", "<html/>");
        assert!(matches!(
            Resolver::new().resolve(&root),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_relative_to_referencing_file() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(None, r#"<xs:include schemaLocation="types/a.xsd"/>"#),
        );
        write(
            &dir,
            "types/a.xsd",
            &schema(None, r#"<xs:include schemaLocation="b.xsd"/>"#),
        );
        write(&dir, "types/b.xsd", &schema(None, ""));

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 3);
        assert_eq!(resolution.unresolved().count(), 0);
    }

    #[test]
    fn test_cycle_loads_each_file_once() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "a.xsd",
            &schema(None, r#"<xs:include schemaLocation="b.xsd"/>"#),
        );
        write(
            &dir,
            "b.xsd",
            &schema(None, r#"<xs:include schemaLocation="a.xsd"/>"#),
        );

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 2);
        assert_eq!(resolution.references.len(), 2);
        assert!(resolution
            .references
            .iter()
            .all(|r| r.status == ReferenceStatus::Resolved));
    }

    #[test]
    fn test_remote_and_missing_are_issues() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(
                None,
                r#"<xs:import namespace="urn:r" schemaLocation="http://example.com/r.xsd"/>
                   <xs:include schemaLocation="missing.xsd"/>
                   <xs:import namespace="http://www.w3.org/XML/1998/namespace"/>"#,
            ),
        );

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 1);
        let statuses: Vec<_> = resolution.references.iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![
                ReferenceStatus::Remote,
                ReferenceStatus::NotFound,
                ReferenceStatus::NoLocation
            ]
        );
        assert_eq!(resolution.unresolved().count(), 2);
        let kinds: Vec<_> = resolution.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::RemoteLocation));
        assert!(kinds.contains(&IssueKind::FileNotFound));
    }

    #[test]
    fn test_malformed_referenced_file_is_isolated() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(
                None,
                r#"<xs:include schemaLocation="broken.xsd"/>
                   <xs:include schemaLocation="ok.xsd"/>"#,
            ),
        );
        write(&dir, "broken.xsd", "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">");
        write(&dir, "ok.xsd", &schema(None, ""));

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 2);
        assert_eq!(resolution.references[0].status, ReferenceStatus::LoadFailed);
        assert_eq!(resolution.references[1].status, ReferenceStatus::Resolved);
        assert!(resolution
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::MalformedMarkup));
    }

    #[test]
    fn test_imported_namespaces_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(
                None,
                r#"<xs:import namespace="urn:x" schemaLocation="x1.xsd"/>
                   <xs:import namespace="urn:x" schemaLocation="x2.xsd"/>"#,
            ),
        );
        write(&dir, "x1.xsd", &schema(Some("urn:x"), ""));
        let x2 = write(&dir, "x2.xsd", &schema(Some("urn:x"), ""));

        let resolution = Resolver::new().resolve(&root).unwrap();
        assert_eq!(
            resolution.imported_namespaces.get("urn:x"),
            Some(&x2.canonicalize().unwrap())
        );
        assert_eq!(resolution.file_dependencies[&resolution.root].len(), 2);
    }

    #[test]
    fn test_chameleon_and_namespace_mismatch() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(
                Some("urn:main"),
                r#"<xs:include schemaLocation="chameleon.xsd"/>
                   <xs:include schemaLocation="other.xsd"/>
                   <xs:import namespace="urn:declared" schemaLocation="actual.xsd"/>"#,
            ),
        );
        let chameleon = write(&dir, "chameleon.xsd", &schema(None, ""));
        write(&dir, "other.xsd", &schema(Some("urn:other"), ""));
        write(&dir, "actual.xsd", &schema(Some("urn:actual"), ""));

        let resolution = Resolver::new().resolve(&root).unwrap();
        let file = &resolution.files[&chameleon.canonicalize().unwrap()];
        assert!(file.is_chameleon());
        assert_eq!(file.effective_namespace.as_deref(), Some("urn:main"));

        let mismatches = resolution
            .issues
            .iter()
            .filter(|i| i.kind == IssueKind::NamespaceMismatch)
            .count();
        assert_eq!(mismatches, 2);

        let plain = Resolver::new()
            .with_chameleon_includes(false)
            .resolve(&root)
            .unwrap();
        assert!(plain.files[&chameleon.canonicalize().unwrap()]
            .effective_namespace
            .is_none());
    }

    #[test]
    fn test_file_limit() {
        let dir = TempDir::new().unwrap();
        let root = write(
            &dir,
            "main.xsd",
            &schema(None, r#"<xs:include schemaLocation="a.xsd"/>"#),
        );
        write(&dir, "a.xsd", &schema(None, ""));

        let limits = Limits {
            max_schema_files: 1,
            ..Limits::default()
        };
        let resolution = Resolver::new().with_limits(limits).resolve(&root).unwrap();
        assert_eq!(resolution.file_count(), 1);
        assert_eq!(resolution.references[0].status, ReferenceStatus::LoadFailed);
        assert!(resolution
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::LimitExceeded));
    }
}
