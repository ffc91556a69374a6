//! Dependency and inheritance resolution
//!
//! Runs over the merged model only; nothing here mutates it. Produces
//! typed dependency edges between components, the element → referenced type
//! names map used by reports, and the base-type chain of every derived type.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Issue, IssueKind, StructuralError};
use crate::model::{
    AttributeDecl, ComponentId, ComponentKind, Derivation, ElementDecl, ElementPath, TypeRef,
};
use crate::namespaces::QName;
use crate::registry::{namespace_mismatch, MergedModel, NameLookup, TypeResolution};

/// Kind of dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Element declared with a type
    ElementType,
    /// Type derived from a base type
    BaseType,
    /// Element reference to a global element
    ElementRef,
    /// Attribute declared with a type
    AttributeType,
    /// List item type or union member type
    MemberType,
}

/// A reference from one component to a type or element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// Component the reference belongs to
    pub source: ComponentId,
    /// Nested element that declares the reference, if not the component itself
    pub origin: Option<ElementPath>,
    /// Referenced name as written
    pub target: TypeRef,
    /// Edge kind
    pub kind: EdgeKind,
    /// Target component, when it exists in the merged model
    pub resolved: Option<ComponentId>,
    /// Source and target namespaces differ
    pub cross_schema: bool,
    /// Source and target were defined in different files
    pub cross_file: bool,
}

impl DependencyEdge {
    /// Whether the target is an XSD built-in type
    pub fn is_builtin(&self) -> bool {
        self.target.is_builtin()
    }
}

/// One entry of an inheritance chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainLink {
    /// Type name (local name, or the raw reference when unresolved)
    pub name: String,
    /// Type component, absent for built-in and unresolved bases
    pub component: Option<ComponentId>,
    /// How this link derives from the next one
    pub derivation: Derivation,
    /// Whether this link is an XSD built-in type
    pub builtin: bool,
}

/// Base-type chain of a type, starting with the type itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InheritanceChain {
    /// Type whose chain this is
    pub component: ComponentId,
    /// The type followed by each successive base
    pub links: Vec<ChainLink>,
}

impl InheritanceChain {
    /// Number of entries (derivation steps + 1)
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Link names in order
    pub fn names(&self) -> Vec<&str> {
        self.links.iter().map(|l| l.name.as_str()).collect()
    }
}

/// Everything the dependency resolver computes
#[derive(Debug, Clone, Default)]
pub struct Dependencies {
    /// All edges in discovery order
    pub edges: Vec<DependencyEdge>,
    /// Element or type name → referenced type names; `file:<name>` entries
    /// list the files a file references
    pub dependency_map: IndexMap<String, BTreeSet<String>>,
    /// Inheritance chains of derived types
    pub chains: IndexMap<ComponentId, InheritanceChain>,
    /// Cycles found while walking chains
    pub errors: Vec<StructuralError>,
    /// Unresolved references and cycles
    pub issues: Vec<Issue>,
}

impl Dependencies {
    /// Edges leaving a component
    pub fn edges_from<'a>(&'a self, source: &'a ComponentId) -> impl Iterator<Item = &'a DependencyEdge> {
        self.edges.iter().filter(move |e| &e.source == source)
    }

    /// Edges flagged as crossing a namespace boundary
    pub fn cross_schema_edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().filter(|e| e.cross_schema)
    }

    /// Add `file:<name>` entries for file-level references
    pub fn add_file_dependencies(&mut self, files: &IndexMap<PathBuf, Vec<PathBuf>>) {
        let name = |p: &PathBuf| {
            p.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| p.display().to_string())
        };
        for (file, deps) in files {
            if deps.is_empty() {
                continue;
            }
            let entry = self
                .dependency_map
                .entry(format!("file:{}", name(file)))
                .or_default();
            entry.extend(deps.iter().map(|dep| format!("file:{}", name(dep))));
        }
    }
}

/// Computes dependencies and inheritance chains over a merged model
pub struct DependencyResolver<'a> {
    model: &'a MergedModel,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for a merged model
    pub fn new(model: &'a MergedModel) -> Self {
        Self { model }
    }

    /// Compute edges, the dependency map and inheritance chains
    pub fn resolve(&self) -> Dependencies {
        let mut deps = Dependencies::default();
        let model = self.model;

        for (name, element) in &model.elements {
            let source = ComponentId::new(ComponentKind::Element, name.clone());
            self.element_edges(&source, element, true, &mut deps.edges);
        }
        for (name, complex_type) in &model.complex_types {
            let source = ComponentId::new(ComponentKind::ComplexType, name.clone());
            if let Some(ref base) = complex_type.base_type {
                self.push_edge(&source, None, base, EdgeKind::BaseType, &mut deps.edges);
            }
            for element in &complex_type.elements {
                self.element_edges(&source, element, false, &mut deps.edges);
            }
            self.attribute_edges(&source, None, &complex_type.attributes, &mut deps.edges);
        }
        for (name, simple_type) in &model.simple_types {
            let source = ComponentId::new(ComponentKind::SimpleType, name.clone());
            if let Some(base) = simple_type.base_type() {
                self.push_edge(&source, None, base, EdgeKind::BaseType, &mut deps.edges);
            }
            for member in simple_type
                .referenced_types()
                .into_iter()
                .filter(|r| Some(*r) != simple_type.base_type())
            {
                self.push_edge(&source, None, member, EdgeKind::MemberType, &mut deps.edges);
            }
        }
        for (name, attribute) in &model.attributes {
            let source = ComponentId::new(ComponentKind::Attribute, name.clone());
            if let Some(ref type_ref) = attribute.type_ref {
                self.push_edge(&source, None, type_ref, EdgeKind::AttributeType, &mut deps.edges);
            }
        }
        for (name, group) in &model.attribute_groups {
            let source = ComponentId::new(ComponentKind::AttributeGroup, name.clone());
            self.attribute_edges(&source, None, &group.attributes, &mut deps.edges);
        }
        for (name, group) in &model.model_groups {
            let source = ComponentId::new(ComponentKind::ModelGroup, name.clone());
            for element in &group.elements {
                self.element_edges(&source, element, false, &mut deps.edges);
            }
        }

        self.reference_issues(&mut deps);
        self.build_dependency_map(&mut deps);

        let derived = model
            .complex_types
            .iter()
            .filter(|(_, t)| t.base_type.is_some())
            .map(|(n, _)| ComponentId::new(ComponentKind::ComplexType, n.clone()))
            .chain(
                model
                    .simple_types
                    .iter()
                    .filter(|(_, t)| t.base_type().is_some())
                    .map(|(n, _)| ComponentId::new(ComponentKind::SimpleType, n.clone())),
            );
        for id in derived {
            match self.inheritance_chain(&id) {
                Ok(chain) => {
                    deps.chains.insert(id, chain);
                }
                Err(err) => {
                    warn!(component = %id, error = %err, "circular inheritance");
                    deps.issues.push(Issue::from(&err));
                    deps.errors.push(err);
                }
            }
        }

        debug!(
            edges = deps.edges.len(),
            chains = deps.chains.len(),
            issues = deps.issues.len(),
            "dependencies.resolved"
        );
        deps
    }

    /// Base type and derivation of a type component
    fn base_of(&self, id: &ComponentId) -> Option<(&'a TypeRef, Derivation, bool)> {
        match id.kind {
            ComponentKind::ComplexType => self
                .model
                .complex_types
                .get(&id.name)
                .and_then(|t| t.base_type.as_ref().map(|b| (b, t.derivation, t.redefinition))),
            ComponentKind::SimpleType => self
                .model
                .simple_types
                .get(&id.name)
                .and_then(|t| t.base_type().map(|b| (b, Derivation::Restriction, t.redefinition))),
            _ => None,
        }
    }

    fn derivation_of(&self, id: &ComponentId) -> Derivation {
        self.base_of(id).map(|(_, d, _)| d).unwrap_or_default()
    }

    /// Walk the base-type chain of a type
    ///
    /// A chain of K derivation steps yields K+1 links. Revisiting a type is
    /// a [`StructuralError::CircularInheritance`]. A redefinition whose base
    /// is its own name ends the chain, since the original definition has
    /// been replaced.
    pub fn inheritance_chain(&self, start: &ComponentId) -> Result<InheritanceChain, StructuralError> {
        let mut links = vec![ChainLink {
            name: start.name.local_name.clone(),
            component: Some(start.clone()),
            derivation: self.derivation_of(start),
            builtin: false,
        }];
        let mut visited: HashSet<ComponentId> = HashSet::new();
        visited.insert(start.clone());
        let mut current = start.clone();

        while let Some((base, _, redefinition)) = self.base_of(&current) {
            let resolution = self.model.resolve_type(base);
            let next = match resolution.component_id() {
                Some(next) => next,
                None => {
                    links.push(ChainLink {
                        name: base.raw.clone(),
                        component: None,
                        derivation: Derivation::None,
                        builtin: matches!(resolution, TypeResolution::Builtin),
                    });
                    break;
                }
            };

            if visited.contains(&next) {
                if next == current && redefinition {
                    break;
                }
                let mut cycle: Vec<String> = links.iter().map(|l| l.name.clone()).collect();
                cycle.push(next.name.local_name.clone());
                return Err(StructuralError::CircularInheritance {
                    component: start.name.local_name.clone(),
                    cycle,
                });
            }

            links.push(ChainLink {
                name: next.name.local_name.clone(),
                component: Some(next.clone()),
                derivation: self.derivation_of(&next),
                builtin: false,
            });
            visited.insert(next.clone());
            current = next;
        }

        Ok(InheritanceChain {
            component: start.clone(),
            links,
        })
    }

    /// Chain of a type found by local name
    pub fn inheritance_chain_by_name(&self, name: &str) -> Option<Result<InheritanceChain, StructuralError>> {
        let id = match self.model.lookup(ComponentKind::ComplexType, name) {
            NameLookup::Found(q) => ComponentId::new(ComponentKind::ComplexType, q),
            _ => match self.model.lookup(ComponentKind::SimpleType, name) {
                NameLookup::Found(q) => ComponentId::new(ComponentKind::SimpleType, q),
                _ => return None,
            },
        };
        Some(self.inheritance_chain(&id))
    }

    fn element_edges(
        &self,
        source: &ComponentId,
        element: &ElementDecl,
        is_component: bool,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let origin = if is_component {
            None
        } else {
            Some(element.path.clone())
        };

        if let Some(ref type_ref) = element.type_ref {
            self.push_edge(source, origin.clone(), type_ref, EdgeKind::ElementType, edges);
        }
        if let Some(ref reference) = element.reference {
            self.push_edge(source, origin.clone(), reference, EdgeKind::ElementRef, edges);
        }
        if let Some(ref base) = element.base_type {
            self.push_edge(source, origin.clone(), base, EdgeKind::BaseType, edges);
        }
        if let Some(base) = element.inline_simple_type.as_ref().and_then(|r| r.base.as_ref()) {
            self.push_edge(source, origin.clone(), base, EdgeKind::BaseType, edges);
        }
        self.attribute_edges(source, origin, &element.attributes, edges);

        for child in &element.children {
            self.element_edges(source, child, false, edges);
        }
    }

    fn attribute_edges(
        &self,
        source: &ComponentId,
        origin: Option<ElementPath>,
        attributes: &[AttributeDecl],
        edges: &mut Vec<DependencyEdge>,
    ) {
        for attribute in attributes {
            if let Some(ref type_ref) = attribute.type_ref {
                self.push_edge(source, origin.clone(), type_ref, EdgeKind::AttributeType, edges);
            }
        }
    }

    fn push_edge(
        &self,
        source: &ComponentId,
        origin: Option<ElementPath>,
        target: &TypeRef,
        kind: EdgeKind,
        edges: &mut Vec<DependencyEdge>,
    ) {
        let resolved = match kind {
            EdgeKind::ElementRef => match self.model.index().lookup(ComponentKind::Element, target) {
                NameLookup::Found(name) => Some(ComponentId::new(ComponentKind::Element, name)),
                _ => None,
            },
            _ => self.model.resolve_type(target).component_id(),
        };

        let (cross_schema, cross_file) = match resolved {
            Some(ref target_id) => (
                source.name.namespace != target_id.name.namespace,
                match (self.model.source_file(source), self.model.source_file(target_id)) {
                    (Some(a), Some(b)) => a != b,
                    _ => false,
                },
            ),
            None => (false, false),
        };

        edges.push(DependencyEdge {
            source: source.clone(),
            origin,
            target: target.clone(),
            kind,
            resolved,
            cross_schema,
            cross_file,
        });
    }

    fn reference_issues(&self, deps: &mut Dependencies) {
        let mut reported: HashSet<(ComponentId, String)> = HashSet::new();
        for edge in &deps.edges {
            // element refs are reported by the registry linker
            if edge.is_builtin() || edge.kind == EdgeKind::ElementRef {
                continue;
            }
            if !reported.insert((edge.source.clone(), edge.target.raw.clone())) {
                continue;
            }
            let issue = match (&edge.resolved, self.model.resolve_type(&edge.target)) {
                (Some(target), _) => match namespace_mismatch(&edge.target, &target.name) {
                    Some(issue) => issue,
                    None => continue,
                },
                (None, TypeResolution::Ambiguous(names)) => Issue::new(
                    IssueKind::AmbiguousName,
                    format!("type '{}' matches {} definitions", edge.target, names.len()),
                ),
                (None, _) => Issue::new(
                    IssueKind::UnresolvedTypeReference,
                    format!("unknown type: {}", edge.target),
                ),
            };
            let issue = issue.with_component(edge.source.to_string());
            let issue = match self.model.source_file(&edge.source) {
                Some(file) => issue.with_file(file),
                None => issue,
            };
            deps.issues.push(issue);
        }
    }

    /// Element name → type names referenced by it and its descendants;
    /// complex type name → element, base and attribute types
    fn build_dependency_map(&self, deps: &mut Dependencies) {
        let model = self.model;
        let trees = model.root_elements.iter().chain(model.elements.values());
        let mut seen_trees: HashSet<QName> = HashSet::new();

        for tree in trees {
            if !seen_trees.insert(tree.qname()) {
                continue;
            }
            for element in tree.descendants() {
                let types: BTreeSet<String> = element
                    .descendants()
                    .into_iter()
                    .filter_map(|e| e.type_ref.as_ref().map(|t| t.raw.clone()))
                    .collect();
                if !types.is_empty() {
                    deps.dependency_map
                        .entry(element.name.clone())
                        .or_default()
                        .extend(types);
                }
            }
        }

        for (name, complex_type) in &model.complex_types {
            let mut types: BTreeSet<String> = complex_type
                .all_elements()
                .into_iter()
                .filter_map(|e| e.type_ref.as_ref().map(|t| t.raw.clone()))
                .collect();
            types.extend(complex_type.base_type.iter().map(|b| b.raw.clone()));
            types.extend(
                complex_type
                    .attributes
                    .iter()
                    .filter_map(|a| a.type_ref.as_ref().map(|t| t.raw.clone())),
            );
            if !types.is_empty() {
                deps.dependency_map
                    .entry(name.local_name.clone())
                    .or_default()
                    .extend(types);
            }
        }
    }
}
