//! Registry merging
//!
//! Combines every [`FileModel`] into one [`MergedModel`]. Tables are keyed
//! by namespace-qualified name, so same-named components from different
//! namespaces coexist; a secondary local-name index serves name-only lookups
//! and reports ambiguity when a name is not unique.
//!
//! Merge policy, applied in file discovery order:
//! - a later definition of the same qualified name replaces the earlier one
//!   and is reported as a duplicate;
//! - a definition from `xs:redefine` always replaces the original and is
//!   never replaced by it;
//! - namespace prefix tables are unioned, last write wins;
//! - root elements come only from the entry file.
//!
//! Cross-file references are linked in a separate pass once the union is
//! complete (see [`MergedModel::link_references`]).

use std::collections::HashSet;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{Issue, IssueKind};
use crate::model::{
    AttributeDecl, AttributeGroup, ComplexType, ComponentId, ComponentKind, ElementDecl,
    ElementPath, FileModel, GroupRef, ModelGroup, SimpleType, Statistics, TypeRef,
};
use crate::namespaces::QName;

/// Outcome of a name lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameLookup {
    /// Unique match
    Found(QName),
    /// Several namespaces define the local name
    Ambiguous(Vec<QName>),
    /// No match
    Missing,
}

/// Local-name index over every registry table
#[derive(Debug, Clone, Default)]
pub struct NameIndex {
    names: IndexMap<(ComponentKind, String), Vec<QName>>,
}

impl NameIndex {
    fn insert(&mut self, kind: ComponentKind, name: &QName) {
        let entry = self
            .names
            .entry((kind, name.local_name.clone()))
            .or_default();
        if !entry.contains(name) {
            entry.push(name.clone());
        }
    }

    /// All qualified names of a kind sharing a local name
    pub fn candidates(&self, kind: ComponentKind, local_name: &str) -> &[QName] {
        self.names
            .get(&(kind, local_name.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a reference
    ///
    /// An exact qualified match always wins. Otherwise the local name
    /// decides: a single candidate is found even when its namespace differs
    /// from the reference (see [`namespace_mismatch`]), several candidates
    /// are ambiguous.
    pub fn lookup(&self, kind: ComponentKind, reference: &TypeRef) -> NameLookup {
        let candidates = self.candidates(kind, reference.local_name());

        if let Some(ref qname) = reference.qname {
            if candidates.contains(qname) {
                return NameLookup::Found(qname.clone());
            }
        }

        match candidates {
            [] => NameLookup::Missing,
            [single] => NameLookup::Found(single.clone()),
            many => NameLookup::Ambiguous(many.to_vec()),
        }
    }

    /// Look up by local name only
    pub fn lookup_local(&self, kind: ComponentKind, local_name: &str) -> NameLookup {
        match self.candidates(kind, local_name) {
            [] => NameLookup::Missing,
            [single] => NameLookup::Found(single.clone()),
            many => NameLookup::Ambiguous(many.to_vec()),
        }
    }
}

/// What a type reference points at
#[derive(Debug, Clone, PartialEq)]
pub enum TypeResolution<'a> {
    /// A complex type in the registry
    Complex(&'a ComplexType),
    /// A simple type in the registry
    Simple(&'a SimpleType),
    /// An XSD built-in datatype
    Builtin,
    /// Several types match the local name
    Ambiguous(Vec<QName>),
    /// Nothing matches; the reference stays an opaque name
    Unresolved,
}

impl TypeResolution<'_> {
    /// Component id of the resolved type, if any
    pub fn component_id(&self) -> Option<ComponentId> {
        match self {
            TypeResolution::Complex(t) => Some(ComponentId::new(ComponentKind::ComplexType, t.name.clone())),
            TypeResolution::Simple(t) => Some(ComponentId::new(ComponentKind::SimpleType, t.name.clone())),
            _ => None,
        }
    }
}

/// The merged, name-keyed schema model
#[derive(Debug, Clone, Default)]
pub struct MergedModel {
    /// Target namespace of the entry file
    pub target_namespace: Option<String>,
    /// Union of all prefix → URI tables
    pub namespaces: IndexMap<String, String>,
    /// Simple types
    pub simple_types: IndexMap<QName, SimpleType>,
    /// Complex types
    pub complex_types: IndexMap<QName, ComplexType>,
    /// Global elements
    pub elements: IndexMap<QName, ElementDecl>,
    /// Global attributes
    pub attributes: IndexMap<QName, AttributeDecl>,
    /// Attribute groups
    pub attribute_groups: IndexMap<QName, AttributeGroup>,
    /// Named model groups
    pub model_groups: IndexMap<QName, ModelGroup>,
    /// Document-root candidates of the entry file, in order
    pub root_elements: Vec<ElementDecl>,
    /// Merge and linking problems
    pub issues: Vec<Issue>,
    index: NameIndex,
}

/// Insert into a table under the merge policy
fn merge_into<T: Clone>(
    table: &mut IndexMap<QName, T>,
    value: &T,
    name: &QName,
    kind: ComponentKind,
    is_redefinition: impl Fn(&T) -> bool,
    source_of: impl Fn(&T) -> &Path,
    issues: &mut Vec<Issue>,
) {
    if let Some(existing) = table.get(name) {
        if is_redefinition(existing) && !is_redefinition(value) {
            debug!(component = %name, kind = %kind, "keeping redefinition");
            return;
        }
        if !is_redefinition(value) {
            warn!(
                component = %name,
                kind = %kind,
                previous = %source_of(existing).display(),
                file = %source_of(value).display(),
                "duplicate component, later definition wins"
            );
            issues.push(
                Issue::new(
                    IssueKind::DuplicateComponent,
                    format!(
                        "{} '{}' from {} replaces the definition in {}",
                        kind,
                        name,
                        source_of(value).display(),
                        source_of(existing).display()
                    ),
                )
                .with_file(source_of(value))
                .with_component(name.to_string()),
            );
        }
    }
    table.insert(name.clone(), value.clone());
}

impl MergedModel {
    /// Union the file models, in order, without linking references
    pub fn merge(files: &[FileModel]) -> Self {
        let mut model = MergedModel {
            target_namespace: files.first().and_then(|f| f.target_namespace.clone()),
            ..Default::default()
        };

        for file in files {
            for (prefix, uri) in &file.namespaces {
                model.namespaces.insert(prefix.clone(), uri.clone());
            }
            for (name, simple_type) in &file.simple_types {
                merge_into(
                    &mut model.simple_types,
                    simple_type,
                    name,
                    ComponentKind::SimpleType,
                    |t| t.redefinition,
                    |t| t.source_file.as_path(),
                    &mut model.issues,
                );
            }
            for (name, attribute) in &file.attributes {
                let source = file.path.clone();
                if model.attributes.contains_key(name) {
                    model.issues.push(
                        Issue::new(
                            IssueKind::DuplicateComponent,
                            format!("attribute '{}' redeclared", name),
                        )
                        .with_file(&source)
                        .with_component(name.to_string()),
                    );
                }
                model.attributes.insert(name.clone(), attribute.clone());
            }
            for (name, group) in &file.attribute_groups {
                merge_into(
                    &mut model.attribute_groups,
                    group,
                    name,
                    ComponentKind::AttributeGroup,
                    |g| g.redefinition,
                    |g| g.source_file.as_path(),
                    &mut model.issues,
                );
            }
            for (name, group) in &file.model_groups {
                merge_into(
                    &mut model.model_groups,
                    group,
                    name,
                    ComponentKind::ModelGroup,
                    |g| g.redefinition,
                    |g| g.source_file.as_path(),
                    &mut model.issues,
                );
            }
            for (name, complex_type) in &file.complex_types {
                merge_into(
                    &mut model.complex_types,
                    complex_type,
                    name,
                    ComponentKind::ComplexType,
                    |t| t.redefinition,
                    |t| t.source_file.as_path(),
                    &mut model.issues,
                );
            }
            for (name, element) in &file.elements {
                merge_into(
                    &mut model.elements,
                    element,
                    name,
                    ComponentKind::Element,
                    |_| false,
                    |e| e.source_file.as_path(),
                    &mut model.issues,
                );
            }
            model.root_elements.extend(file.root_elements.iter().cloned());
        }

        model.rebuild_index();
        model
    }

    /// Merge and link in one step
    pub fn from_files(files: &[FileModel]) -> Self {
        let mut model = Self::merge(files);
        model.link_references();
        model
    }

    fn rebuild_index(&mut self) {
        let mut index = NameIndex::default();
        for name in self.simple_types.keys() {
            index.insert(ComponentKind::SimpleType, name);
        }
        for name in self.complex_types.keys() {
            index.insert(ComponentKind::ComplexType, name);
        }
        for name in self.elements.keys() {
            index.insert(ComponentKind::Element, name);
        }
        for name in self.attributes.keys() {
            index.insert(ComponentKind::Attribute, name);
        }
        for name in self.attribute_groups.keys() {
            index.insert(ComponentKind::AttributeGroup, name);
        }
        for name in self.model_groups.keys() {
            index.insert(ComponentKind::ModelGroup, name);
        }
        self.index = index;
    }

    /// Local-name index
    pub fn index(&self) -> &NameIndex {
        &self.index
    }

    /// Link attribute refs and expand attribute group and model group refs
    /// against the merged tables
    pub fn link_references(&mut self) {
        let mut issues = Vec::new();

        let flat_groups: IndexMap<QName, Vec<AttributeDecl>> = self
            .attribute_groups
            .keys()
            .map(|name| {
                let mut out = Vec::new();
                self.flatten_attribute_group(name, &mut Vec::new(), &mut out, &mut issues);
                (name.clone(), out)
            })
            .collect();

        let mut attribute_groups = std::mem::take(&mut self.attribute_groups);
        let mut complex_types = std::mem::take(&mut self.complex_types);
        let mut elements = std::mem::take(&mut self.elements);
        let mut model_groups = std::mem::take(&mut self.model_groups);

        let group_snapshot = model_groups.clone();
        {
            let linker = Linker {
                index: &self.index,
                attributes: &self.attributes,
                attribute_groups: &flat_groups,
                model_groups: &group_snapshot,
            };

            for group in attribute_groups.values_mut() {
                let owner = group.name.to_string();
                linker.link_attributes(&mut group.attributes, &mut group.group_refs, &owner, &mut issues);
            }
            for complex_type in complex_types.values_mut() {
                let owner = complex_type.name.to_string();
                let path = ElementPath::root(complex_type.name.local_name.clone());
                let mut active = Vec::new();
                linker.link_particles(
                    &mut complex_type.elements,
                    &mut complex_type.group_refs,
                    &path,
                    &owner,
                    &mut active,
                    &mut issues,
                );
                linker.link_attributes(
                    &mut complex_type.attributes,
                    &mut complex_type.attribute_group_refs,
                    &owner,
                    &mut issues,
                );
            }
            for group in model_groups.values_mut() {
                let owner = group.name.to_string();
                let path = ElementPath::root(group.name.local_name.clone());
                let mut active = vec![group.name.clone()];
                linker.link_particles(
                    &mut group.elements,
                    &mut group.group_refs,
                    &path,
                    &owner,
                    &mut active,
                    &mut issues,
                );
            }
            for element in elements.values_mut() {
                linker.link_element(element, &mut Vec::new(), &mut issues);
            }
        }

        self.attribute_groups = attribute_groups;
        self.complex_types = complex_types;
        self.elements = elements;
        self.model_groups = model_groups;

        // Roots are copies of entry-file globals; refresh them from the linked table
        for root in &mut self.root_elements {
            if let Some(linked) = self.elements.get(&root.qname()) {
                *root = linked.clone();
            }
        }

        let mut seen = HashSet::new();
        issues.retain(|issue| seen.insert(issue.clone()));
        debug!(issues = issues.len(), "references.linked");
        self.issues.extend(issues);
    }

    fn flatten_attribute_group(
        &self,
        name: &QName,
        visited: &mut Vec<QName>,
        out: &mut Vec<AttributeDecl>,
        issues: &mut Vec<Issue>,
    ) {
        if visited.contains(name) {
            return;
        }
        visited.push(name.clone());

        let group = match self.attribute_groups.get(name) {
            Some(group) => group,
            None => return,
        };
        out.extend(group.attributes.iter().cloned());

        for group_ref in group.group_refs.iter().filter(|r| !r.expanded) {
            match self.index.lookup(ComponentKind::AttributeGroup, &group_ref.reference) {
                NameLookup::Found(target) => self.flatten_attribute_group(&target, visited, out, issues),
                lookup => issues.push(reference_issue(
                    "attribute group",
                    &group_ref.reference,
                    &name.to_string(),
                    &lookup,
                )),
            }
        }
    }

    /// Resolve a type reference against the merged tables
    pub fn resolve_type(&self, reference: &TypeRef) -> TypeResolution<'_> {
        if reference.is_builtin() {
            return TypeResolution::Builtin;
        }

        let complex = self.index.lookup(ComponentKind::ComplexType, reference);
        let simple = self.index.lookup(ComponentKind::SimpleType, reference);
        let exact = |lookup: &NameLookup| {
            matches!(lookup, NameLookup::Found(name) if reference.qname.as_ref() == Some(name))
        };
        let complex_first = exact(&complex) || !exact(&simple);

        match (complex, simple) {
            (NameLookup::Found(name), _) if complex_first => self
                .complex_types
                .get(&name)
                .map(TypeResolution::Complex)
                .unwrap_or(TypeResolution::Unresolved),
            (_, NameLookup::Found(name)) => self
                .simple_types
                .get(&name)
                .map(TypeResolution::Simple)
                .unwrap_or(TypeResolution::Unresolved),
            (NameLookup::Ambiguous(mut a), NameLookup::Ambiguous(b)) => {
                a.extend(b);
                TypeResolution::Ambiguous(a)
            }
            (NameLookup::Ambiguous(names), _) | (_, NameLookup::Ambiguous(names)) => {
                TypeResolution::Ambiguous(names)
            }
            _ => TypeResolution::Unresolved,
        }
    }

    /// Global element by qualified name
    pub fn element(&self, name: &QName) -> Option<&ElementDecl> {
        self.elements.get(name)
    }

    /// Element by local name: global elements first, then the root element
    /// trees depth first
    pub fn find_element(&self, name: &str) -> Option<&ElementDecl> {
        self.elements
            .values()
            .find(|e| e.name == name)
            .or_else(|| self.root_elements.iter().find_map(|root| root.find(name)))
    }

    /// Path of an element found by [`find_element`](Self::find_element)
    pub fn element_path(&self, name: &str) -> Option<ElementPath> {
        self.find_element(name).map(|e| e.path.clone())
    }

    /// Component by kind and local name, through the name index
    pub fn lookup(&self, kind: ComponentKind, local_name: &str) -> NameLookup {
        self.index.lookup_local(kind, local_name)
    }

    /// Source file of a component
    pub fn source_file(&self, id: &ComponentId) -> Option<&Path> {
        let path = match id.kind {
            ComponentKind::Element => self.elements.get(&id.name).map(|c| &c.source_file),
            ComponentKind::ComplexType => self.complex_types.get(&id.name).map(|c| &c.source_file),
            ComponentKind::SimpleType => self.simple_types.get(&id.name).map(|c| &c.source_file),
            ComponentKind::AttributeGroup => {
                self.attribute_groups.get(&id.name).map(|c| &c.source_file)
            }
            ComponentKind::ModelGroup => self.model_groups.get(&id.name).map(|c| &c.source_file),
            ComponentKind::Attribute => None,
        };
        path.map(|p| p.as_path())
    }

    /// Whether a component exists
    pub fn contains(&self, id: &ComponentId) -> bool {
        match id.kind {
            ComponentKind::Element => self.elements.contains_key(&id.name),
            ComponentKind::ComplexType => self.complex_types.contains_key(&id.name),
            ComponentKind::SimpleType => self.simple_types.contains_key(&id.name),
            ComponentKind::Attribute => self.attributes.contains_key(&id.name),
            ComponentKind::AttributeGroup => self.attribute_groups.contains_key(&id.name),
            ComponentKind::ModelGroup => self.model_groups.contains_key(&id.name),
        }
    }

    /// Component counts and max nesting depth of the merged model
    pub fn statistics(&self) -> Statistics {
        Statistics::compute(
            self.elements.values(),
            self.complex_types.values(),
            self.simple_types.len(),
            self.attributes.len(),
            self.attribute_groups.values(),
            self.model_groups.values(),
        )
    }
}

/// Issue for a namespace-qualified reference that only matched by local name
pub fn namespace_mismatch(reference: &TypeRef, found: &QName) -> Option<Issue> {
    let declared = reference.namespace()?;
    if found.in_namespace(Some(declared)) {
        return None;
    }
    Some(Issue::new(
        IssueKind::NamespaceMismatch,
        format!(
            "reference '{}' names namespace '{}' but only {} is defined",
            reference, declared, found
        ),
    ))
}

fn reference_issue(what: &str, reference: &TypeRef, owner: &str, lookup: &NameLookup) -> Issue {
    match lookup {
        NameLookup::Ambiguous(names) => Issue::new(
            IssueKind::AmbiguousName,
            format!(
                "{} reference '{}' matches {} definitions",
                what,
                reference,
                names.len()
            ),
        ),
        _ => Issue::new(
            IssueKind::UnresolvedReference,
            format!("{} reference '{}' cannot be resolved", what, reference),
        ),
    }
    .with_component(owner)
}

/// Link context borrowed from the merged model
struct Linker<'a> {
    index: &'a NameIndex,
    attributes: &'a IndexMap<QName, AttributeDecl>,
    attribute_groups: &'a IndexMap<QName, Vec<AttributeDecl>>,
    model_groups: &'a IndexMap<QName, ModelGroup>,
}

impl Linker<'_> {
    fn link_attributes(
        &self,
        attributes: &mut Vec<AttributeDecl>,
        group_refs: &mut [GroupRef],
        owner: &str,
        issues: &mut Vec<Issue>,
    ) {
        let mut seen: HashSet<_> = attributes.iter().map(AttributeDecl::dedup_key).collect();

        for group_ref in group_refs.iter_mut().filter(|r| !r.expanded) {
            match self.index.lookup(ComponentKind::AttributeGroup, &group_ref.reference) {
                NameLookup::Found(name) => {
                    for attribute in self.attribute_groups.get(&name).into_iter().flatten() {
                        if seen.insert(attribute.dedup_key()) {
                            attributes.push(attribute.clone());
                        }
                    }
                    group_ref.expanded = true;
                }
                lookup => issues.push(reference_issue(
                    "attribute group",
                    &group_ref.reference,
                    owner,
                    &lookup,
                )),
            }
        }

        for attribute in attributes.iter_mut() {
            let reference = match attribute.reference {
                Some(ref reference) if !attribute.resolved => reference.clone(),
                _ => continue,
            };
            let lookup = match self.index.lookup(ComponentKind::Attribute, &reference) {
                NameLookup::Found(name)
                    if reference.namespace() == Some(crate::XML_NAMESPACE)
                        && !name.in_namespace(Some(crate::XML_NAMESPACE)) =>
                {
                    NameLookup::Missing
                }
                lookup => lookup,
            };
            match lookup {
                NameLookup::Found(name) => {
                    issues.extend(namespace_mismatch(&reference, &name).map(|i| i.with_component(owner)));
                    if let Some(target) = self.attributes.get(&name) {
                        attribute.link_to(target);
                    }
                }
                // xml:lang and friends live in a namespace no schema file defines
                NameLookup::Missing if reference.namespace() == Some(crate::XML_NAMESPACE) => {}
                lookup => issues.push(reference_issue("attribute", &reference, owner, &lookup)),
            }
        }
    }

    fn link_particles(
        &self,
        elements: &mut Vec<ElementDecl>,
        group_refs: &mut [GroupRef],
        parent: &ElementPath,
        owner: &str,
        active: &mut Vec<QName>,
        issues: &mut Vec<Issue>,
    ) {
        for element in elements.iter_mut() {
            self.link_element(element, active, issues);
        }

        for group_ref in group_refs.iter_mut().filter(|r| !r.expanded) {
            match self.index.lookup(ComponentKind::ModelGroup, &group_ref.reference) {
                NameLookup::Found(name) => {
                    // A group reached again through its own content is recursive; leave it pending
                    if active.contains(&name) {
                        continue;
                    }
                    let group = match self.model_groups.get(&name) {
                        Some(group) => group,
                        None => continue,
                    };
                    active.push(name.clone());
                    let mut expanded = group.elements.clone();
                    let mut nested = group.group_refs.clone();
                    for element in &mut expanded {
                        element.reparent(parent);
                    }
                    self.link_particles(&mut expanded, &mut nested, parent, owner, active, issues);
                    active.pop();
                    elements.extend(expanded);
                    group_ref.expanded = true;
                }
                lookup => issues.push(reference_issue("group", &group_ref.reference, owner, &lookup)),
            }
        }
    }

    fn link_element(&self, element: &mut ElementDecl, active: &mut Vec<QName>, issues: &mut Vec<Issue>) {
        let owner = element.path.to_string();

        if let Some(ref reference) = element.reference {
            match self.index.lookup(ComponentKind::Element, reference) {
                NameLookup::Found(name) => {
                    issues.extend(namespace_mismatch(reference, &name).map(|i| i.with_component(&owner)));
                }
                lookup => issues.push(reference_issue("element", reference, &owner, &lookup)),
            }
        }

        let path = element.path.clone();
        self.link_particles(
            &mut element.children,
            &mut element.group_refs,
            &path,
            &owner,
            active,
            issues,
        );
        self.link_attributes(
            &mut element.attributes,
            &mut element.attribute_group_refs,
            &owner,
            issues,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeUse;
    use std::path::PathBuf;

    const A: &str = "urn:a";
    const B: &str = "urn:b";

    fn complex(ns: &str, name: &str, file: &str) -> ComplexType {
        let mut t = ComplexType::new(QName::namespaced(ns, name));
        t.source_file = PathBuf::from(file);
        t
    }

    fn file_with(path: &str, types: Vec<ComplexType>) -> FileModel {
        let mut file = FileModel::new(path, None);
        for t in types {
            file.complex_types.insert(t.name.clone(), t);
        }
        file
    }

    #[test]
    fn test_composite_keys_keep_both_namespaces() {
        let files = vec![
            file_with("a.xsd", vec![complex(A, "Item", "a.xsd")]),
            file_with("b.xsd", vec![complex(B, "Item", "b.xsd")]),
        ];
        let model = MergedModel::from_files(&files);

        assert_eq!(model.complex_types.len(), 2);
        assert!(model.issues.is_empty());

        let unqualified = TypeRef::new("Item", Some(QName::local("Item")));
        match model.resolve_type(&unqualified) {
            TypeResolution::Ambiguous(names) => assert_eq!(names.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }

        let qualified = TypeRef::new("b:Item", Some(QName::namespaced(B, "Item")));
        match model.resolve_type(&qualified) {
            TypeResolution::Complex(t) => assert_eq!(t.source_file, PathBuf::from("b.xsd")),
            other => panic!("expected complex type, got {:?}", other),
        }
    }

    #[test]
    fn test_later_definition_wins_with_issue() {
        let mut second = complex(A, "Item", "second.xsd");
        second.mixed = true;
        let files = vec![
            file_with("first.xsd", vec![complex(A, "Item", "first.xsd")]),
            file_with("second.xsd", vec![second]),
        ];
        let model = MergedModel::merge(&files);

        assert!(model.complex_types[&QName::namespaced(A, "Item")].mixed);
        assert_eq!(model.issues.len(), 1);
        assert_eq!(model.issues[0].kind, IssueKind::DuplicateComponent);
    }

    #[test]
    fn test_redefinition_wins_in_any_order() {
        let mut redefined = complex(A, "Item", "main.xsd");
        redefined.redefinition = true;

        for files in [
            vec![
                file_with("main.xsd", vec![redefined.clone()]),
                file_with("base.xsd", vec![complex(A, "Item", "base.xsd")]),
            ],
            vec![
                file_with("base.xsd", vec![complex(A, "Item", "base.xsd")]),
                file_with("main.xsd", vec![redefined.clone()]),
            ],
        ] {
            let model = MergedModel::merge(&files);
            assert!(model.complex_types[&QName::namespaced(A, "Item")].redefinition);
            assert!(model.issues.is_empty());
        }
    }

    #[test]
    fn test_prefixed_reference_falls_back_to_local_name() {
        let model = MergedModel::from_files(&[file_with("b.xsd", vec![complex(B, "Item", "b.xsd")])]);
        let reference = TypeRef::new("a:Item", Some(QName::namespaced(A, "Item")));

        match model.resolve_type(&reference) {
            TypeResolution::Complex(t) => assert_eq!(t.name, QName::namespaced(B, "Item")),
            other => panic!("expected complex type, got {:?}", other),
        }
        let issue = namespace_mismatch(&reference, &QName::namespaced(B, "Item")).unwrap();
        assert_eq!(issue.kind, IssueKind::NamespaceMismatch);
        assert!(namespace_mismatch(&reference, &QName::namespaced(A, "Item")).is_none());

        let two = MergedModel::from_files(&[
            file_with("b.xsd", vec![complex(B, "Item", "b.xsd")]),
            file_with("c.xsd", vec![complex("urn:c", "Item", "c.xsd")]),
        ]);
        match two.resolve_type(&reference) {
            TypeResolution::Ambiguous(names) => assert_eq!(names.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_and_unresolved() {
        let model = MergedModel::default();
        let string = TypeRef::new(
            "xs:string",
            Some(QName::namespaced(crate::XSD_1_0_NAMESPACE, "string")),
        );
        assert_eq!(model.resolve_type(&string), TypeResolution::Builtin);

        let missing = TypeRef::new("tns:Nope", Some(QName::namespaced(A, "Nope")));
        assert_eq!(model.resolve_type(&missing), TypeResolution::Unresolved);
    }

    #[test]
    fn test_cross_file_attribute_group_and_ref_linking() {
        let mut types_file = FileModel::new("types.xsd", Some(A.to_string()));
        let mut lang = AttributeDecl::new("lang");
        lang.namespace = Some(A.to_string());
        lang.default = Some("en".to_string());
        types_file.attributes.insert(QName::namespaced(A, "lang"), lang);
        types_file.attribute_groups.insert(
            QName::namespaced(A, "Common"),
            AttributeGroup {
                name: QName::namespaced(A, "Common"),
                attributes: vec![AttributeDecl::new("id")],
                group_refs: Vec::new(),
                documentation: None,
                redefinition: false,
                source_file: PathBuf::from("types.xsd"),
            },
        );

        let mut main = complex(A, "Book", "main.xsd");
        let mut lang_ref = AttributeDecl::new("lang");
        lang_ref.reference = Some(TypeRef::new("a:lang", Some(QName::namespaced(A, "lang"))));
        lang_ref.use_ = AttributeUse::Required;
        main.attributes.push(lang_ref);
        main.attribute_group_refs.push(GroupRef::new(TypeRef::new(
            "a:Common",
            Some(QName::namespaced(A, "Common")),
        )));
        main.attribute_group_refs.push(GroupRef::new(TypeRef::new(
            "a:Missing",
            Some(QName::namespaced(A, "Missing")),
        )));

        let model = MergedModel::from_files(&[file_with("main.xsd", vec![main]), types_file]);
        let book = &model.complex_types[&QName::namespaced(A, "Book")];

        assert_eq!(book.attributes.len(), 2);
        assert!(book.attributes[0].resolved);
        assert!(book.attributes[0].is_required());
        assert_eq!(book.attributes[0].default.as_deref(), Some("en"));
        assert!(book.attribute_group_refs[0].expanded);
        assert!(!book.attribute_group_refs[1].expanded);
        assert_eq!(
            model
                .issues
                .iter()
                .filter(|i| i.kind == IssueKind::UnresolvedReference)
                .count(),
            1
        );
    }

    #[test]
    fn test_recursive_model_group_stays_pending() {
        let name = QName::namespaced(A, "Node");
        let group_ref = GroupRef::new(TypeRef::new("a:Node", Some(name.clone())));

        let mut child = ElementDecl::new("child");
        child.reparent(&ElementPath::root("Node"));
        child.has_inline_complex_type = true;
        child.group_refs.push(group_ref.clone());

        let mut file = FileModel::new("tree.xsd", Some(A.to_string()));
        file.model_groups.insert(
            name.clone(),
            ModelGroup {
                name: name.clone(),
                content_model: crate::model::ContentModel::Sequence,
                elements: vec![child],
                group_refs: Vec::new(),
                documentation: None,
                redefinition: false,
                source_file: PathBuf::from("tree.xsd"),
            },
        );
        let mut tree = complex(A, "Tree", "tree.xsd");
        tree.group_refs.push(group_ref);
        file.complex_types.insert(tree.name.clone(), tree);

        let model = MergedModel::from_files(&[file]);
        let tree = &model.complex_types[&QName::namespaced(A, "Tree")];
        assert_eq!(tree.elements.len(), 1);
        assert_eq!(tree.elements[0].path.to_string(), "/Tree/child");
        assert!(!tree.elements[0].group_refs[0].expanded);
    }

    #[test]
    fn test_find_element_and_path() {
        let mut file = FileModel::new("main.xsd", None);
        let mut library = ElementDecl::new("library");
        let mut book = ElementDecl::new("book");
        book.reparent(&library.path);
        library.children.push(book);
        file.elements.insert(QName::local("library"), library.clone());
        file.root_elements.push(library);

        let model = MergedModel::from_files(&[file]);
        assert_eq!(
            model.element_path("book").map(|p| p.to_string()),
            Some("/library/book".to_string())
        );
        assert_eq!(model.find_element("library").unwrap().depth(), 0);
        assert!(model.find_element("missing").is_none());
        assert_eq!(model.statistics().total_elements, 2);
    }
}
