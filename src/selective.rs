//! Selective extraction
//!
//! Cherry-pick elements, complex types and simple types from one or more
//! schema files into a single result. Every selection runs the full
//! pipeline on its file; results are keyed `"<kind>:<name>"` so a component
//! picked twice is stored once, and the first selection to pick it wins.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Issue, IssueKind, Result};
use crate::model::{
    AttributeGroup, ComplexType, ComponentId, ComponentKind, ElementDecl, ModelGroup, SimpleType,
    Statistics,
};
use crate::names::is_valid_ncname;
use crate::pipeline::SchemaSet;
use crate::registry::NameLookup;
use crate::settings::Settings;

/// Wildcard namespace selecting every component of a file
pub const ANY_NAMESPACE: &str = "*";

/// What to pick from one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Root schema file, relative to the base directory
    pub file: PathBuf,
    /// Global element names
    pub elements: Vec<String>,
    /// Complex type names
    pub complex_types: Vec<String>,
    /// Simple type names
    pub simple_types: Vec<String>,
    /// Namespaces whose components are all picked; `*` picks everything
    pub namespaces: Vec<String>,
    /// Also pick every type the picked components depend on
    pub include_dependencies: bool,
}

impl Selection {
    /// Empty selection on a file, with dependency inclusion on
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            elements: Vec::new(),
            complex_types: Vec::new(),
            simple_types: Vec::new(),
            namespaces: Vec::new(),
            include_dependencies: true,
        }
    }

    /// Pick global elements by name
    pub fn with_elements<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.elements.extend(names.into_iter().map(Into::into));
        self
    }

    /// Pick complex types by name
    pub fn with_complex_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.complex_types.extend(names.into_iter().map(Into::into));
        self
    }

    /// Pick simple types by name
    pub fn with_simple_types<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.simple_types.extend(names.into_iter().map(Into::into));
        self
    }

    /// Pick all components of these namespaces
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces.extend(namespaces.into_iter().map(Into::into));
        self
    }

    /// Enable or disable dependency inclusion
    pub fn with_dependencies(mut self, include: bool) -> Self {
        self.include_dependencies = include;
        self
    }

    /// Whether nothing is requested
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
            && self.complex_types.is_empty()
            && self.simple_types.is_empty()
            && self.namespaces.is_empty()
    }

    /// Check that something is requested and every name is an NCName
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(Error::Selection(format!(
                "nothing selected from {}",
                self.file.display()
            )));
        }
        let names = self
            .elements
            .iter()
            .chain(&self.complex_types)
            .chain(&self.simple_types);
        for name in names {
            if !is_valid_ncname(name) {
                return Err(Error::Selection(format!("'{}' is not a valid component name", name)));
            }
        }
        Ok(())
    }
}

/// Data of a picked component
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SelectedData {
    /// Global element declaration
    Element(ElementDecl),
    /// Complex type definition
    ComplexType(ComplexType),
    /// Simple type definition
    SimpleType(SimpleType),
}

/// A component picked by a selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedComponent {
    /// Kind and qualified name
    pub id: ComponentId,
    /// Selection file the component was picked from
    pub source_file: PathBuf,
    /// File the component is defined in
    pub defined_in: PathBuf,
    /// Component namespace
    pub namespace: Option<String>,
    /// Component data
    pub data: SelectedData,
    /// Type and element names the component references
    pub dependencies: BTreeSet<String>,
    /// Picked only because another picked component depends on it
    pub via_dependency: bool,
}

impl SelectedComponent {
    /// Local name
    pub fn name(&self) -> &str {
        &self.id.name.local_name
    }

    /// Component kind
    pub fn kind(&self) -> ComponentKind {
        self.id.kind
    }
}

/// Per-file overview of a selection result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionSummary {
    /// Components picked from the file
    pub total_selected: usize,
    /// Element names
    pub elements: Vec<String>,
    /// Complex type names
    pub complex_types: Vec<String>,
    /// Simple type names
    pub simple_types: Vec<String>,
    /// Namespaces of the picked components
    pub namespaces: Vec<String>,
}

/// Combined result of all selections
#[derive(Debug, Clone, Default)]
pub struct SelectionResult {
    /// Picked components keyed `"<kind>:<name>"`, in selection order
    pub components: IndexMap<String, SelectedComponent>,
    /// Missing files, unknown names and issues of the underlying schema sets
    pub issues: Vec<Issue>,
}

impl SelectionResult {
    /// Number of picked components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether nothing was picked
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Component by `"<kind>:<name>"` key
    pub fn get(&self, key: &str) -> Option<&SelectedComponent> {
        self.components.get(key)
    }

    /// Whether a component with this key was picked
    pub fn contains(&self, key: &str) -> bool {
        self.components.contains_key(key)
    }

    /// Picked components of one kind
    pub fn of_kind(&self, kind: ComponentKind) -> impl Iterator<Item = &SelectedComponent> {
        self.components.values().filter(move |c| c.kind() == kind)
    }

    /// Distinct selection files that contributed, in first-seen order
    pub fn source_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = Vec::new();
        for component in self.components.values() {
            if !files.contains(&component.source_file) {
                files.push(component.source_file.clone());
            }
        }
        files
    }

    /// Distinct namespaces of the picked components
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = Vec::new();
        for namespace in self.components.values().filter_map(|c| c.namespace.as_ref()) {
            if !namespaces.contains(namespace) {
                namespaces.push(namespace.clone());
            }
        }
        namespaces
    }

    /// Names per kind and namespaces, per selection file
    pub fn selection_summary(&self) -> IndexMap<PathBuf, SelectionSummary> {
        let mut summary: IndexMap<PathBuf, SelectionSummary> = IndexMap::new();
        for component in self.components.values() {
            let entry = summary.entry(component.source_file.clone()).or_default();
            entry.total_selected += 1;
            let name = component.name().to_string();
            match component.kind() {
                ComponentKind::Element => entry.elements.push(name),
                ComponentKind::ComplexType => entry.complex_types.push(name),
                ComponentKind::SimpleType => entry.simple_types.push(name),
                _ => {}
            }
            if let Some(ref namespace) = component.namespace {
                if !entry.namespaces.contains(namespace) {
                    entry.namespaces.push(namespace.clone());
                }
            }
        }
        summary
    }

    /// Statistics over the picked components
    pub fn statistics(&self) -> Statistics {
        let elements = self.components.values().filter_map(|c| match c.data {
            SelectedData::Element(ref e) => Some(e),
            _ => None,
        });
        let complex_types = self.components.values().filter_map(|c| match c.data {
            SelectedData::ComplexType(ref t) => Some(t),
            _ => None,
        });
        Statistics::compute(
            elements,
            complex_types,
            self.of_kind(ComponentKind::SimpleType).count(),
            0,
            std::iter::empty::<&AttributeGroup>(),
            std::iter::empty::<&ModelGroup>(),
        )
    }
}

/// Runs selections against their schema files
#[derive(Debug, Default)]
pub struct SelectiveExtractor {
    settings: Settings,
    selections: Vec<Selection>,
    sets: IndexMap<PathBuf, SchemaSet>,
}

impl SelectiveExtractor {
    /// Create an extractor with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an extractor with custom settings
    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Queue a selection
    pub fn add_selection(&mut self, selection: Selection) {
        info!(file = %selection.file.display(), "selection.added");
        self.selections.push(selection);
    }

    /// Queue a selection built from name lists
    pub fn add_file_selection(
        &mut self,
        file: impl Into<PathBuf>,
        elements: &[&str],
        complex_types: &[&str],
        simple_types: &[&str],
        namespaces: &[&str],
        include_dependencies: bool,
    ) {
        let selection = Selection::new(file)
            .with_elements(elements.iter().copied())
            .with_complex_types(complex_types.iter().copied())
            .with_simple_types(simple_types.iter().copied())
            .with_namespaces(namespaces.iter().copied())
            .with_dependencies(include_dependencies);
        self.add_selection(selection);
    }

    /// Queued selections
    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Schema sets parsed so far, keyed by canonical root path
    pub fn schema_sets(&self) -> impl Iterator<Item = (&PathBuf, &SchemaSet)> {
        self.sets.iter()
    }

    /// Run every queued selection
    ///
    /// Files that cannot be loaded are reported as issues; the remaining
    /// selections still run.
    pub fn run(&mut self) -> SelectionResult {
        info!(selections = self.selections.len(), "selection.starting");
        let mut result = SelectionResult::default();
        let mut reported: HashSet<PathBuf> = HashSet::new();
        let selections = self.selections.clone();

        for selection in &selections {
            if let Err(err) = selection.validate() {
                warn!(file = %selection.file.display(), error = %err, "selection.invalid");
                result.issues.push(
                    Issue::new(IssueKind::InvalidName, err.to_string()).with_file(&selection.file),
                );
                continue;
            }

            let path = self.resolve_path(&selection.file);
            let set = match self.schema_set(&path) {
                Ok(set) => set,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "selection.file_failed");
                    result.issues.push(load_issue(&err, &path));
                    continue;
                }
            };
            if reported.insert(set.resolution.root.clone()) {
                result.issues.extend(set.issues());
            }
            apply_selection(selection, set, &mut result);
        }

        info!(
            components = result.len(),
            files = result.source_files().len(),
            "selection.complete"
        );
        result
    }

    fn resolve_path(&self, file: &Path) -> PathBuf {
        match self.settings.base_dir {
            Some(ref base) if file.is_relative() => base.join(file),
            _ => file.to_path_buf(),
        }
    }

    fn schema_set(&mut self, path: &Path) -> Result<&SchemaSet> {
        let canonical = path
            .canonicalize()
            .map_err(|_| Error::FileNotFound(path.to_path_buf()))?;
        match self.sets.entry(canonical) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let set = SchemaSet::with_settings(entry.key(), &self.settings)?;
                Ok(entry.insert(set))
            }
        }
    }
}

fn load_issue(err: &Error, path: &Path) -> Issue {
    let kind = match err {
        Error::FileNotFound(_) => IssueKind::FileNotFound,
        Error::LimitExceeded(_) => IssueKind::LimitExceeded,
        _ => IssueKind::MalformedMarkup,
    };
    Issue::new(kind, err.to_string()).with_file(path)
}

fn namespace_matches(pattern: &str, namespace: Option<&str>) -> bool {
    pattern == ANY_NAMESPACE || namespace.unwrap_or("") == pattern
}

fn apply_selection(selection: &Selection, set: &SchemaSet, result: &mut SelectionResult) {
    let model = &set.model;
    let mut picked: Vec<ComponentId> = Vec::new();

    let requested = [
        (ComponentKind::Element, &selection.elements),
        (ComponentKind::ComplexType, &selection.complex_types),
        (ComponentKind::SimpleType, &selection.simple_types),
    ];
    for (kind, names) in requested {
        for name in names {
            match model.lookup(kind, name) {
                NameLookup::Found(qname) => picked.push(ComponentId::new(kind, qname)),
                NameLookup::Ambiguous(candidates) => {
                    result.issues.push(
                        Issue::new(
                            IssueKind::AmbiguousName,
                            format!("{} '{}' matches {} definitions", kind, name, candidates.len()),
                        )
                        .with_file(&selection.file),
                    );
                    picked.extend(candidates.into_iter().take(1).map(|q| ComponentId::new(kind, q)));
                }
                NameLookup::Missing => {
                    warn!(file = %selection.file.display(), kind = %kind, name = %name, "selection.unknown");
                    result.issues.push(
                        Issue::new(IssueKind::UnknownComponent, format!("{} '{}' not found", kind, name))
                            .with_file(&selection.file)
                            .with_component(format!("{}:{}", kind, name)),
                    );
                }
            }
        }
    }

    for pattern in &selection.namespaces {
        let elements = model
            .elements
            .keys()
            .map(|q| ComponentId::new(ComponentKind::Element, q.clone()));
        let complex_types = model
            .complex_types
            .keys()
            .map(|q| ComponentId::new(ComponentKind::ComplexType, q.clone()));
        let simple_types = model
            .simple_types
            .keys()
            .map(|q| ComponentId::new(ComponentKind::SimpleType, q.clone()));
        picked.extend(
            elements
                .chain(complex_types)
                .chain(simple_types)
                .filter(|id| namespace_matches(pattern, id.name.namespace())),
        );
    }

    for id in &picked {
        insert_component(id, selection, set, false, result);
    }

    if selection.include_dependencies {
        let mut visited: HashSet<ComponentId> = picked.iter().cloned().collect();
        let mut queue: VecDeque<ComponentId> = picked.into();

        while let Some(id) = queue.pop_front() {
            for edge in set.dependencies.edges_from(&id) {
                let target = match edge.resolved {
                    Some(ref target) => target,
                    None => continue,
                };
                if !is_selectable(target.kind) || !visited.insert(target.clone()) {
                    continue;
                }
                insert_component(target, selection, set, true, result);
                queue.push_back(target.clone());
            }
        }
    }
}

fn is_selectable(kind: ComponentKind) -> bool {
    matches!(
        kind,
        ComponentKind::Element | ComponentKind::ComplexType | ComponentKind::SimpleType
    )
}

fn insert_component(
    id: &ComponentId,
    selection: &Selection,
    set: &SchemaSet,
    via_dependency: bool,
    result: &mut SelectionResult,
) {
    let mut key = id.key();
    let holder = result.components.get(&key).map(|c| c.id.clone());
    match holder {
        Some(existing) if existing == *id => return,
        Some(existing) => {
            let qualified = id.qualified_key();
            if result.components.contains_key(&qualified) {
                return;
            }
            result.issues.push(
                Issue::new(
                    IssueKind::AmbiguousName,
                    format!(
                        "'{}' already holds {}; {} is kept as '{}'",
                        key, existing, id, qualified
                    ),
                )
                .with_file(&selection.file)
                .with_component(id.to_string()),
            );
            key = qualified;
        }
        None => {}
    }

    let model = &set.model;
    let data = match id.kind {
        ComponentKind::Element => model.elements.get(&id.name).cloned().map(SelectedData::Element),
        ComponentKind::ComplexType => model
            .complex_types
            .get(&id.name)
            .cloned()
            .map(SelectedData::ComplexType),
        ComponentKind::SimpleType => model
            .simple_types
            .get(&id.name)
            .cloned()
            .map(SelectedData::SimpleType),
        _ => None,
    };
    let data = match data {
        Some(data) => data,
        None => return,
    };

    let dependencies = set
        .dependencies
        .edges_from(id)
        .map(|e| e.target.raw.clone())
        .collect();

    debug!(key = %key, via_dependency, "selection.component");
    result.components.insert(
        key,
        SelectedComponent {
            id: id.clone(),
            source_file: selection.file.clone(),
            defined_in: model.source_file(id).map(Path::to_path_buf).unwrap_or_default(),
            namespace: id.name.namespace().map(str::to_string),
            data,
            dependencies,
            via_dependency,
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn bookstore(dir: &TempDir) {
        fs::write(
            dir.path().join("store.xsd"),
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         xmlns:tns="urn:store" targetNamespace="urn:store">
                 <xs:element name="bookstore">
                   <xs:complexType><xs:sequence>
                     <xs:element name="book" type="tns:BookType" maxOccurs="unbounded"/>
                   </xs:sequence></xs:complexType>
                 </xs:element>
                 <xs:element name="catalog" type="xs:string"/>
                 <xs:complexType name="BookType">
                   <xs:sequence>
                     <xs:element name="title" type="xs:string"/>
                     <xs:element name="publisher" type="tns:AddressType"/>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:complexType name="AddressType">
                   <xs:sequence>
                     <xs:element name="country" type="tns:CountryCode"/>
                   </xs:sequence>
                 </xs:complexType>
                 <xs:simpleType name="CountryCode">
                   <xs:restriction base="xs:string"><xs:length value="2"/></xs:restriction>
                 </xs:simpleType>
               </xs:schema>"#,
        )
        .unwrap();
    }

    fn extractor(dir: &TempDir) -> SelectiveExtractor {
        bookstore(dir);
        SelectiveExtractor::with_settings(Settings::new().with_base_dir(dir.path()))
    }

    #[test]
    fn test_dependencies_are_pulled_in() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(
            Selection::new("store.xsd")
                .with_elements(["bookstore"])
                .with_complex_types(["BookType"]),
        );

        let result = extractor.run();
        assert!(result.contains("element:bookstore"));
        assert!(result.contains("complex_type:BookType"));
        assert!(result.contains("complex_type:AddressType"));
        assert!(result.contains("simple_type:CountryCode"));
        assert!(!result.contains("element:catalog"));

        assert!(!result.components["complex_type:BookType"].via_dependency);
        assert!(result.components["complex_type:AddressType"].via_dependency);
        assert!(result.components["complex_type:BookType"]
            .dependencies
            .contains("tns:AddressType"));
    }

    #[test]
    fn test_without_dependencies() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_file_selection("store.xsd", &[], &["BookType"], &[], &[], false);

        let result = extractor.run();
        assert_eq!(result.len(), 1);
        assert!(result.contains("complex_type:BookType"));
    }

    #[test]
    fn test_same_component_selected_twice_is_stored_once() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(Selection::new("store.xsd").with_elements(["bookstore"]));
        extractor.add_selection(
            Selection::new("store.xsd")
                .with_namespaces([ANY_NAMESPACE])
                .with_dependencies(false),
        );

        let result = extractor.run();
        assert_eq!(result.of_kind(ComponentKind::Element).count(), 2);
        assert_eq!(result.len(), 5);
        assert_eq!(extractor.schema_sets().count(), 1);
        assert_eq!(result.source_files(), vec![PathBuf::from("store.xsd")]);
    }

    #[test]
    fn test_namespace_selection() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(Selection::new("store.xsd").with_namespaces(["urn:other"]));
        assert!(extractor.run().is_empty());

        extractor.add_selection(Selection::new("store.xsd").with_namespaces(["urn:store"]));
        let result = extractor.run();
        assert_eq!(result.len(), 5);
        assert_eq!(result.namespaces(), vec!["urn:store".to_string()]);
    }

    #[test]
    fn test_unknown_names_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(Selection::new("store.xsd").with_elements(["magazine"]));
        extractor.add_selection(Selection::new("absent.xsd").with_elements(["x"]));

        let result = extractor.run();
        assert!(result.is_empty());
        let kinds: Vec<_> = result.issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::UnknownComponent));
        assert!(kinds.contains(&IssueKind::FileNotFound));
    }

    #[test]
    fn test_invalid_selection_is_reported() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(Selection::new("store.xsd"));
        extractor.add_selection(Selection::new("store.xsd").with_elements(["tns:bookstore"]));

        let result = extractor.run();
        assert!(result.is_empty());
        assert_eq!(
            result
                .issues
                .iter()
                .filter(|i| i.kind == IssueKind::InvalidName)
                .count(),
            2
        );
        assert_eq!(extractor.schema_sets().count(), 0);
    }

    #[test]
    fn test_summary_and_statistics() {
        let dir = TempDir::new().unwrap();
        let mut extractor = extractor(&dir);
        extractor.add_selection(Selection::new("store.xsd").with_elements(["bookstore"]));

        let result = extractor.run();
        let summary = result.selection_summary();
        let store = &summary[&PathBuf::from("store.xsd")];
        assert_eq!(store.elements, vec!["bookstore".to_string()]);
        assert_eq!(
            store.complex_types,
            vec!["BookType".to_string(), "AddressType".to_string()]
        );
        assert_eq!(store.simple_types, vec!["CountryCode".to_string()]);
        assert_eq!(store.total_selected, 4);

        let stats = result.statistics();
        assert_eq!(stats.complex_types, 2);
        assert_eq!(stats.simple_types, 1);
        assert_eq!(stats.total_elements, 5);
    }
}
