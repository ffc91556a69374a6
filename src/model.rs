//! Structural model entities
//!
//! Value types produced by the extractor and consumed by the registry, the
//! dependency resolver and selective extraction. They are built once per
//! run and never mutated after the merge has linked references.

use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Issue;
use crate::names::{is_builtin_type, is_conventional_xsd_prefix, local_part, split_qname};
use crate::namespaces::QName;

/// Kind of a schema component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    /// Element declaration
    Element,
    /// Complex type definition
    ComplexType,
    /// Simple type definition
    SimpleType,
    /// Global attribute declaration
    Attribute,
    /// Attribute group definition
    AttributeGroup,
    /// Named model group definition
    ModelGroup,
}

impl ComponentKind {
    /// Key prefix used for selection results and dependency maps
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Element => "element",
            ComponentKind::ComplexType => "complex_type",
            ComponentKind::SimpleType => "simple_type",
            ComponentKind::Attribute => "attribute",
            ComponentKind::AttributeGroup => "attribute_group",
            ComponentKind::ModelGroup => "group",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a component: its kind plus namespace-qualified name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId {
    /// Component kind
    pub kind: ComponentKind,
    /// Qualified name
    pub name: QName,
}

impl ComponentId {
    /// Create a new component id
    pub fn new(kind: ComponentKind, name: QName) -> Self {
        Self { kind, name }
    }

    /// `"<kind>:<local name>"` key
    pub fn key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.name.local_name)
    }

    /// `"<kind>:{<namespace>}<local name>"` key, unique across namespaces
    pub fn qualified_key(&self) -> String {
        format!(
            "{}:{{{}}}{}",
            self.kind.as_str(),
            self.name.namespace().unwrap_or(""),
            self.name.local_name
        )
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.name)
    }
}

/// A QName-valued reference (`type`, `base`, `ref`, `itemType`, ...)
///
/// The raw attribute text is always kept so unresolved references can still
/// be reported by the name the schema author wrote.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Attribute value as written, e.g. `tns:BookType`
    pub raw: String,
    /// Namespace-resolved name; `None` when the prefix is undeclared
    pub qname: Option<QName>,
}

impl TypeRef {
    /// Create a reference from its raw text and resolved name
    pub fn new(raw: impl Into<String>, qname: Option<QName>) -> Self {
        Self {
            raw: raw.into(),
            qname,
        }
    }

    /// Local part of the referenced name
    pub fn local_name(&self) -> &str {
        match self.qname {
            Some(ref qname) => &qname.local_name,
            None => local_part(&self.raw),
        }
    }

    /// Namespace of the referenced name, if resolved
    pub fn namespace(&self) -> Option<&str> {
        self.qname.as_ref().and_then(|q| q.namespace())
    }

    /// Whether this references one of the XSD built-in datatypes
    ///
    /// An undeclared `xs:`/`xsd:` prefix in front of a built-in name is
    /// accepted as well.
    pub fn is_builtin(&self) -> bool {
        match self.qname {
            Some(ref qname) => {
                matches!(
                    qname.namespace(),
                    Some(crate::XSD_1_0_NAMESPACE) | Some(crate::XSD_1_1_NAMESPACE)
                ) && is_builtin_type(&qname.local_name)
            }
            None => match split_qname(&self.raw) {
                (Some(prefix), local) => {
                    is_conventional_xsd_prefix(prefix) && is_builtin_type(local)
                }
                (None, _) => false,
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Occurrence constraints, kept as the literal strings of the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cardinality {
    /// minOccurs, default "1"
    pub min_occurs: String,
    /// maxOccurs, default "1"; may be the sentinel "unbounded"
    pub max_occurs: String,
}

impl Default for Cardinality {
    fn default() -> Self {
        Self {
            min_occurs: "1".to_string(),
            max_occurs: "1".to_string(),
        }
    }
}

impl Cardinality {
    /// Build from optional attribute values
    pub fn from_attributes(min: Option<&str>, max: Option<&str>) -> Self {
        Self {
            min_occurs: min.unwrap_or("1").trim().to_string(),
            max_occurs: max.unwrap_or("1").trim().to_string(),
        }
    }

    /// Whether maxOccurs is "unbounded"
    pub fn is_unbounded(&self) -> bool {
        self.max_occurs == "unbounded"
    }

    /// Numeric minOccurs, if it parses
    pub fn min_value(&self) -> Option<u64> {
        self.min_occurs.parse().ok()
    }

    /// Numeric maxOccurs; `None` for "unbounded" or unparsable values
    pub fn max_value(&self) -> Option<u64> {
        if self.is_unbounded() {
            None
        } else {
            self.max_occurs.parse().ok()
        }
    }

    /// Whether the element may be absent
    pub fn is_optional(&self) -> bool {
        self.min_value() == Some(0)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.min_occurs, self.max_occurs)
    }
}

/// How a type is derived from its base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Derivation {
    /// No base type
    #[default]
    None,
    /// Adds to the base
    Extension,
    /// Narrows the base
    Restriction,
}

impl Derivation {
    /// Parse the local name of a derivation element
    pub fn from_local_name(name: &str) -> Self {
        match name {
            "extension" => Derivation::Extension,
            "restriction" => Derivation::Restriction,
            _ => Derivation::None,
        }
    }
}

/// Attribute use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeUse {
    /// May be absent (default)
    #[default]
    Optional,
    /// Must be present
    Required,
    /// Must be absent
    Prohibited,
}

impl AttributeUse {
    /// Parse a `use` attribute value, defaulting to optional
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("required") => AttributeUse::Required,
            Some("prohibited") => AttributeUse::Prohibited,
            _ => AttributeUse::Optional,
        }
    }
}

/// Content model compositor of a complex type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentModel {
    /// No element content
    #[default]
    Empty,
    /// xs:sequence
    Sequence,
    /// xs:choice
    Choice,
    /// xs:all
    All,
    /// xs:simpleContent
    Simple,
}

impl ContentModel {
    /// Parse the local name of a compositor element
    pub fn from_local_name(name: &str) -> Option<Self> {
        match name {
            "sequence" => Some(ContentModel::Sequence),
            "choice" => Some(ContentModel::Choice),
            "all" => Some(ContentModel::All),
            _ => None,
        }
    }
}

/// Restriction facets of a simple type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Restriction {
    /// Restriction base
    pub base: Option<TypeRef>,
    /// Enumeration values in declaration order
    pub enumerations: Vec<String>,
    /// Remaining facets keyed by facet name (pattern, minLength, ...)
    pub facets: IndexMap<String, String>,
}

impl Restriction {
    /// Whether no base or facet is recorded
    pub fn is_empty(&self) -> bool {
        self.base.is_none() && self.enumerations.is_empty() && self.facets.is_empty()
    }
}

/// Variety of a simple type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "variety", rename_all = "lowercase")]
pub enum SimpleTypeVariety {
    /// Restriction of an atomic type
    #[default]
    Atomic,
    /// Whitespace-separated list of an item type
    List {
        /// itemType reference (absent for an inline item type)
        item_type: Option<TypeRef>,
    },
    /// Union of member types
    Union {
        /// memberTypes references
        member_types: Vec<TypeRef>,
    },
}

/// Named simple type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleType {
    /// Qualified name
    pub name: QName,
    /// Atomic, list or union
    pub variety: SimpleTypeVariety,
    /// Restriction base, enumerations and facets
    pub restriction: Restriction,
    /// Documentation text
    pub documentation: Option<String>,
    /// Defined inside xs:redefine
    pub redefinition: bool,
    /// File the type was extracted from
    pub source_file: PathBuf,
}

impl SimpleType {
    /// Base type of the restriction, if any
    pub fn base_type(&self) -> Option<&TypeRef> {
        self.restriction.base.as_ref()
    }

    /// Enumeration values in declaration order
    pub fn enumerations(&self) -> &[String] {
        &self.restriction.enumerations
    }

    /// Types this simple type refers to (base, list item, union members)
    pub fn referenced_types(&self) -> Vec<&TypeRef> {
        let mut refs: Vec<&TypeRef> = self.restriction.base.iter().collect();
        match self.variety {
            SimpleTypeVariety::Atomic => {}
            SimpleTypeVariety::List { ref item_type } => refs.extend(item_type.iter()),
            SimpleTypeVariety::Union { ref member_types } => refs.extend(member_types.iter()),
        }
        refs
    }
}

/// Attribute declaration or reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDecl {
    /// Local name (the ref's local part for references)
    pub name: String,
    /// Namespace the attribute belongs to
    pub namespace: Option<String>,
    /// Declared type
    pub type_ref: Option<TypeRef>,
    /// Use, default optional
    pub use_: AttributeUse,
    /// Default literal value
    pub default: Option<String>,
    /// Fixed literal value
    pub fixed: Option<String>,
    /// Documentation text
    pub documentation: Option<String>,
    /// `ref` to a global attribute
    pub reference: Option<TypeRef>,
    /// Whether a `ref` has been linked to its global declaration
    pub resolved: bool,
    /// Anonymous simple type restriction
    pub inline_simple_type: Option<Restriction>,
}

impl AttributeDecl {
    /// Create an attribute with the given local name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            type_ref: None,
            use_: AttributeUse::Optional,
            default: None,
            fixed: None,
            documentation: None,
            reference: None,
            resolved: false,
            inline_simple_type: None,
        }
    }

    /// Key used to drop attributes declared twice under different prefixes
    pub fn dedup_key(&self) -> (String, Option<String>, Option<String>) {
        (
            self.name.clone(),
            self.reference.as_ref().map(|r| r.raw.clone()),
            self.type_ref.as_ref().map(|r| r.raw.clone()),
        )
    }

    /// Whether the attribute is required
    pub fn is_required(&self) -> bool {
        self.use_ == AttributeUse::Required
    }

    /// Copy the target's fields into this reference, keeping the local `use`
    /// and any local default/fixed override
    pub fn link_to(&mut self, target: &AttributeDecl) {
        self.name = target.name.clone();
        self.namespace = target.namespace.clone();
        self.type_ref = target.type_ref.clone();
        if self.default.is_none() {
            self.default = target.default.clone();
        }
        if self.fixed.is_none() {
            self.fixed = target.fixed.clone();
        }
        if self.documentation.is_none() {
            self.documentation = target.documentation.clone();
        }
        if self.inline_simple_type.is_none() {
            self.inline_simple_type = target.inline_simple_type.clone();
        }
        self.resolved = true;
    }
}

/// Reference to an attribute group or model group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    /// The `ref` value
    pub reference: TypeRef,
    /// Whether the group's content has been copied in
    pub expanded: bool,
}

impl GroupRef {
    /// Create a pending group reference
    pub fn new(reference: TypeRef) -> Self {
        Self {
            reference,
            expanded: false,
        }
    }
}

/// Named attribute group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroup {
    /// Qualified name
    pub name: QName,
    /// Attributes declared in the group
    pub attributes: Vec<AttributeDecl>,
    /// Nested attribute group references
    pub group_refs: Vec<GroupRef>,
    /// Documentation text
    pub documentation: Option<String>,
    /// Defined inside xs:redefine
    pub redefinition: bool,
    /// File the group was extracted from
    pub source_file: PathBuf,
}

/// Named model group (`xs:group name=...`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelGroup {
    /// Qualified name
    pub name: QName,
    /// Compositor of the group
    pub content_model: ContentModel,
    /// Particles of the group
    pub elements: Vec<ElementDecl>,
    /// Nested model group references
    pub group_refs: Vec<GroupRef>,
    /// Documentation text
    pub documentation: Option<String>,
    /// Defined inside xs:redefine
    pub redefinition: bool,
    /// File the group was extracted from
    pub source_file: PathBuf,
}

/// Path of an element from the root of its tree
///
/// The parent of an element is the path without its last segment, so no
/// back pointer is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementPath(Vec<String>);

impl ElementPath {
    /// Path of a tree root
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    /// Path of a child of this element
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(name.into());
        Self(segments)
    }

    /// Path of the parent element
    pub fn parent(&self) -> Option<ElementPath> {
        if self.0.len() > 1 {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        } else {
            None
        }
    }

    /// Nesting depth, 0 for a tree root
    pub fn depth(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Path segments
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// Element declaration, global or local
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDecl {
    /// Local name (the ref's local part for references)
    pub name: String,
    /// Namespace the element belongs to
    pub namespace: Option<String>,
    /// Declared type
    pub type_ref: Option<TypeRef>,
    /// `ref` to a global element
    pub reference: Option<TypeRef>,
    /// minOccurs/maxOccurs
    pub cardinality: Cardinality,
    /// Documentation text
    pub documentation: Option<String>,
    /// Attributes of the inline complex type
    pub attributes: Vec<AttributeDecl>,
    /// Child elements of the inline complex type
    pub children: Vec<ElementDecl>,
    /// Whether the element carries an anonymous complex type
    pub has_inline_complex_type: bool,
    /// Anonymous simple type restriction
    pub inline_simple_type: Option<Restriction>,
    /// Base of the inline complex/simple content
    pub base_type: Option<TypeRef>,
    /// Derivation of the inline content
    pub derivation: Derivation,
    /// Attribute groups referenced by the inline type
    pub attribute_group_refs: Vec<GroupRef>,
    /// Model groups referenced by the inline type
    pub group_refs: Vec<GroupRef>,
    /// Path from the tree root
    pub path: ElementPath,
    /// Default literal value
    pub default: Option<String>,
    /// Fixed literal value
    pub fixed: Option<String>,
    /// nillable flag
    pub nillable: bool,
    /// abstract flag
    #[serde(rename = "abstract")]
    pub abstract_: bool,
    /// File the element was extracted from
    pub source_file: PathBuf,
}

impl ElementDecl {
    /// Create an element with the given local name at a tree root
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: ElementPath::root(name.clone()),
            name,
            namespace: None,
            type_ref: None,
            reference: None,
            cardinality: Cardinality::default(),
            documentation: None,
            attributes: Vec::new(),
            children: Vec::new(),
            has_inline_complex_type: false,
            inline_simple_type: None,
            base_type: None,
            derivation: Derivation::None,
            attribute_group_refs: Vec::new(),
            group_refs: Vec::new(),
            default: None,
            fixed: None,
            nillable: false,
            abstract_: false,
            source_file: PathBuf::new(),
        }
    }

    /// Qualified name
    pub fn qname(&self) -> QName {
        QName::new(self.namespace.clone(), self.name.clone())
    }

    /// Nesting depth, 0 for a tree root
    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    /// This element and all descendants, depth first
    pub fn descendants(&self) -> Vec<&ElementDecl> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.descendants());
        }
        out
    }

    /// Find this element or a descendant by local name, depth first
    pub fn find(&self, name: &str) -> Option<&ElementDecl> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Deepest nesting depth in this subtree
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(ElementDecl::max_depth)
            .max()
            .unwrap_or(0)
            .max(self.depth())
    }

    /// Number of attributes in this subtree
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
            + self
                .children
                .iter()
                .map(ElementDecl::attribute_count)
                .sum::<usize>()
    }

    /// Re-root this subtree under `parent`
    pub fn reparent(&mut self, parent: &ElementPath) {
        self.path = parent.child(self.name.clone());
        let path = self.path.clone();
        for child in &mut self.children {
            child.reparent(&path);
        }
    }
}

/// Named complex type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexType {
    /// Qualified name
    pub name: QName,
    /// Element particles of the content model
    pub elements: Vec<ElementDecl>,
    /// Attributes, including those copied from attribute groups
    pub attributes: Vec<AttributeDecl>,
    /// Attribute group references
    pub attribute_group_refs: Vec<GroupRef>,
    /// Model group references
    pub group_refs: Vec<GroupRef>,
    /// complexContent/simpleContent base
    pub base_type: Option<TypeRef>,
    /// Derivation kind
    pub derivation: Derivation,
    /// Compositor kind
    pub content_model: ContentModel,
    /// mixed flag
    pub mixed: bool,
    /// abstract flag
    #[serde(rename = "abstract")]
    pub abstract_: bool,
    /// Documentation text
    pub documentation: Option<String>,
    /// Defined inside xs:redefine
    pub redefinition: bool,
    /// File the type was extracted from
    pub source_file: PathBuf,
}

impl ComplexType {
    /// Create an empty complex type
    pub fn new(name: QName) -> Self {
        Self {
            name,
            elements: Vec::new(),
            attributes: Vec::new(),
            attribute_group_refs: Vec::new(),
            group_refs: Vec::new(),
            base_type: None,
            derivation: Derivation::None,
            content_model: ContentModel::Empty,
            mixed: false,
            abstract_: false,
            documentation: None,
            redefinition: false,
            source_file: PathBuf::new(),
        }
    }

    /// All element declarations of the content model, nested ones included
    pub fn all_elements(&self) -> Vec<&ElementDecl> {
        self.elements.iter().flat_map(|e| e.descendants()).collect()
    }
}

/// Component counts and nesting depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Statistics {
    /// Element declarations, nested ones included
    pub total_elements: usize,
    /// Complex types
    pub complex_types: usize,
    /// Simple types
    pub simple_types: usize,
    /// Attribute declarations, wherever declared
    pub total_attributes: usize,
    /// Attribute groups
    pub attribute_groups: usize,
    /// Deepest element nesting (global elements are depth 0)
    pub max_depth: usize,
}

impl Statistics {
    /// Compute statistics over component tables
    pub fn compute<'a>(
        elements: impl Iterator<Item = &'a ElementDecl>,
        complex_types: impl Iterator<Item = &'a ComplexType>,
        simple_types: usize,
        attributes: usize,
        attribute_groups: impl Iterator<Item = &'a AttributeGroup>,
        model_groups: impl Iterator<Item = &'a ModelGroup>,
    ) -> Self {
        let mut stats = Statistics {
            simple_types,
            total_attributes: attributes,
            ..Default::default()
        };

        let count_tree = |element: &ElementDecl, stats: &mut Statistics| {
            stats.total_elements += element.descendants().len();
            stats.total_attributes += element.attribute_count();
            stats.max_depth = stats.max_depth.max(element.max_depth());
        };

        for element in elements {
            count_tree(element, &mut stats);
        }
        for complex_type in complex_types {
            stats.complex_types += 1;
            stats.total_attributes += complex_type.attributes.len();
            for element in &complex_type.elements {
                count_tree(element, &mut stats);
            }
        }
        for group in model_groups {
            for element in &group.elements {
                count_tree(element, &mut stats);
            }
        }
        for group in attribute_groups {
            stats.attribute_groups += 1;
            stats.total_attributes += group.attributes.len();
        }
        stats
    }
}

/// Everything one schema file contributes to the model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileModel {
    /// Resolved path of the file
    pub path: PathBuf,
    /// Effective target namespace (after chameleon adoption)
    pub target_namespace: Option<String>,
    /// Prefix → URI declarations of the schema root
    pub namespaces: IndexMap<String, String>,
    /// Simple types by name
    pub simple_types: IndexMap<QName, SimpleType>,
    /// Global attributes by name
    pub attributes: IndexMap<QName, AttributeDecl>,
    /// Attribute groups by name
    pub attribute_groups: IndexMap<QName, AttributeGroup>,
    /// Named model groups by name
    pub model_groups: IndexMap<QName, ModelGroup>,
    /// Complex types by name
    pub complex_types: IndexMap<QName, ComplexType>,
    /// Global elements by name
    pub elements: IndexMap<QName, ElementDecl>,
    /// Document-root candidates (entry file only), in declaration order
    pub root_elements: Vec<ElementDecl>,
    /// Problems found while extracting this file
    pub issues: Vec<Issue>,
}

impl FileModel {
    /// Create an empty model for a file
    pub fn new(path: impl Into<PathBuf>, target_namespace: Option<String>) -> Self {
        Self {
            path: path.into(),
            target_namespace,
            ..Default::default()
        }
    }

    /// Component counts and max nesting depth of this file
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

    /// Number of named components in this file
    pub fn component_count(&self) -> usize {
        self.simple_types.len()
            + self.attributes.len()
            + self.attribute_groups.len()
            + self.model_groups.len()
            + self.complex_types.len()
            + self.elements.len()
    }
}
