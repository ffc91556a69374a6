//! Structural extraction
//!
//! Turns one loaded [`SchemaFile`] into a [`FileModel`]. Extraction reads
//! only the file it is given, so files can be extracted independently and
//! merged afterwards. Components are read in dependency order: simple types,
//! global attributes, attribute groups, model groups, complex types, global
//! elements and finally the root elements of the entry file.
//!
//! References that can be satisfied inside the file (attribute `ref`s,
//! attribute group and model group refs) are expanded here; the rest stay
//! pending for the registry's linking pass.

use std::collections::HashSet;

use tracing::debug;

use crate::documents::Element;
use crate::error::{Issue, IssueKind};
use crate::limits::Limits;
use crate::model::{
    AttributeDecl, AttributeGroup, AttributeUse, Cardinality, ComplexType, ContentModel,
    Derivation, ElementDecl, ElementPath, FileModel, GroupRef, ModelGroup, Restriction,
    SimpleType, SimpleTypeVariety, TypeRef,
};
use crate::names::{is_valid_ncname, local_part};
use crate::namespaces::QName;
use crate::resolver::{is_xsd_element, SchemaFile};

/// Facets recorded in a restriction's facet map (enumerations are kept apart)
pub const FACETS: &[&str] = &[
    "length",
    "minLength",
    "maxLength",
    "pattern",
    "minInclusive",
    "maxInclusive",
    "minExclusive",
    "maxExclusive",
    "totalDigits",
    "fractionDigits",
    "whiteSpace",
    "explicitTimezone",
];

/// XSD children of an element
fn xsd_children(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter(|c| is_xsd_element(c))
}

/// First XSD child with the given local name
fn xsd_child<'a>(element: &'a Element, local_name: &str) -> Option<&'a Element> {
    xsd_children(element).find(|c| c.local_name() == local_name)
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(value.map(str::trim), Some("true") | Some("1"))
}

/// Text of the `xs:annotation/xs:documentation` children of a component
pub fn documentation(element: &Element) -> Option<String> {
    let texts: Vec<&str> = xsd_children(element)
        .filter(|c| c.local_name() == "annotation")
        .flat_map(|a| xsd_children(a).filter(|d| d.local_name() == "documentation"))
        .filter_map(|d| d.text.as_deref())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();

    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// Element and attribute content collected from a complex type body
#[derive(Debug, Default)]
struct Content {
    elements: Vec<ElementDecl>,
    attributes: Vec<AttributeDecl>,
    attribute_group_refs: Vec<GroupRef>,
    group_refs: Vec<GroupRef>,
    base_type: Option<TypeRef>,
    derivation: Derivation,
    content_model: ContentModel,
    mixed: bool,
    seen_attributes: HashSet<(String, Option<String>, Option<String>)>,
}

impl Content {
    fn push_attribute(&mut self, attribute: AttributeDecl) {
        if self.seen_attributes.insert(attribute.dedup_key()) {
            self.attributes.push(attribute);
        }
    }
}

/// Extracts the structural model of a single schema file
pub struct Extractor<'a> {
    file: &'a SchemaFile,
    limits: Limits,
    element_qualified: bool,
    attribute_qualified: bool,
    model: FileModel,
    depth_reported: bool,
}

impl<'a> Extractor<'a> {
    /// Create an extractor for a loaded file
    pub fn new(file: &'a SchemaFile) -> Self {
        let form_default = |name: &str| file.root.get_attribute(name) == Some("qualified");
        Self {
            file,
            limits: Limits::default(),
            element_qualified: form_default("elementFormDefault"),
            attribute_qualified: form_default("attributeFormDefault"),
            model: FileModel::new(file.path.clone(), file.effective_namespace.clone()),
            depth_reported: false,
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Run extraction
    pub fn extract(mut self) -> FileModel {
        let file = self.file;
        self.model.namespaces = file.namespaces.clone();

        let mut top_level: Vec<(&'a Element, bool)> = Vec::new();
        for child in xsd_children(&file.root) {
            if child.local_name() == "redefine" {
                top_level.extend(xsd_children(child).map(|c| (c, true)));
            } else {
                top_level.push((child, false));
            }
        }

        for &(element, redefinition) in &top_level {
            if element.local_name() == "simpleType" {
                if let Some(name) = self.component_name(element) {
                    let simple_type = self.extract_simple_type(element, name, redefinition);
                    self.insert_simple_type(simple_type);
                }
            }
        }

        for &(element, _) in &top_level {
            if element.local_name() == "attribute" {
                if let Some(name) = self.component_name(element) {
                    if let Some(mut attribute) = self.extract_attribute(element) {
                        attribute.namespace = name.namespace.clone();
                        if self.model.attributes.insert(name.clone(), attribute).is_some() {
                            self.duplicate("attribute", &name);
                        }
                    }
                }
            }
        }

        for &(element, redefinition) in &top_level {
            if element.local_name() == "attributeGroup" {
                if let Some(name) = self.component_name(element) {
                    let group = self.extract_attribute_group(element, name, redefinition);
                    if let Some(previous) = self.model.attribute_groups.get(&group.name) {
                        if previous.redefinition && !group.redefinition {
                            continue;
                        }
                        self.duplicate("attribute group", &group.name);
                    }
                    self.model.attribute_groups.insert(group.name.clone(), group);
                }
            }
        }

        for &(element, redefinition) in &top_level {
            if element.local_name() == "group" {
                if let Some(name) = self.component_name(element) {
                    let group = self.extract_model_group(element, name, redefinition);
                    if let Some(previous) = self.model.model_groups.get(&group.name) {
                        if previous.redefinition && !group.redefinition {
                            continue;
                        }
                        self.duplicate("group", &group.name);
                    }
                    self.model.model_groups.insert(group.name.clone(), group);
                }
            }
        }

        for &(element, redefinition) in &top_level {
            if element.local_name() == "complexType" {
                if let Some(name) = self.component_name(element) {
                    let complex_type = self.extract_complex_type(element, name, redefinition);
                    if let Some(previous) = self.model.complex_types.get(&complex_type.name) {
                        if previous.redefinition && !complex_type.redefinition {
                            continue;
                        }
                        self.duplicate("complex type", &complex_type.name);
                    }
                    self.model
                        .complex_types
                        .insert(complex_type.name.clone(), complex_type);
                }
            }
        }

        let mut root_names = Vec::new();
        for &(element, redefinition) in &top_level {
            if element.local_name() == "element" && !redefinition {
                if let Some(name) = self.component_name(element) {
                    if let Some(mut decl) = self.extract_element(element, None) {
                        decl.namespace = name.namespace.clone();
                        root_names.push(name.clone());
                        if self.model.elements.insert(name.clone(), decl).is_some() {
                            self.duplicate("element", &name);
                        }
                    }
                }
            }
        }

        if self.file.is_entry {
            let mut seen = HashSet::new();
            for name in root_names {
                if seen.insert(name.clone()) {
                    if let Some(decl) = self.model.elements.get(&name) {
                        self.model.root_elements.push(decl.clone());
                    }
                }
            }
        }

        debug!(
            path = %self.file.path.display(),
            simple_types = self.model.simple_types.len(),
            complex_types = self.model.complex_types.len(),
            elements = self.model.elements.len(),
            issues = self.model.issues.len(),
            "schema.extracted"
        );

        self.model
    }

    /// Qualified name of a named top-level component, or `None` with an issue
    fn component_name(&mut self, element: &Element) -> Option<QName> {
        let name = element.get_attribute("name")?.trim();
        if !is_valid_ncname(name) {
            self.issue(
                Issue::new(
                    IssueKind::InvalidName,
                    format!("Invalid {} name '{}'", element.local_name(), name),
                )
                .with_component(name),
            );
            return None;
        }
        Some(QName::new(self.file.effective_namespace.clone(), name))
    }

    fn issue(&mut self, issue: Issue) {
        self.model.issues.push(issue.with_file(&self.file.path));
    }

    fn duplicate(&mut self, kind: &str, name: &QName) {
        self.issue(
            Issue::new(
                IssueKind::DuplicateComponent,
                format!("Duplicate {} '{}' in one file", kind, name),
            )
            .with_component(name.to_string()),
        );
    }

    fn insert_simple_type(&mut self, simple_type: SimpleType) {
        if let Some(previous) = self.model.simple_types.get(&simple_type.name) {
            if previous.redefinition && !simple_type.redefinition {
                return;
            }
            self.duplicate("simple type", &simple_type.name);
        }
        self.model
            .simple_types
            .insert(simple_type.name.clone(), simple_type);
    }

    /// Resolve a QName-valued attribute in the scope of `element`
    ///
    /// Unprefixed names in a chameleon file land in the adopted namespace.
    fn type_ref(&self, element: &Element, raw: &str) -> TypeRef {
        let raw = raw.trim();
        let qname = element.namespaces.resolve(raw).ok().map(|mut qname| {
            if qname.namespace.is_none() && self.file.is_chameleon() {
                qname.namespace = self.file.effective_namespace.clone();
            }
            qname
        });
        TypeRef::new(raw, qname)
    }

    fn attribute_ref(&self, element: &Element, name: &str) -> Option<TypeRef> {
        element
            .get_attribute(name)
            .filter(|v| !v.trim().is_empty())
            .map(|v| self.type_ref(element, v))
    }

    /// Named simple type: restriction, list or union
    fn extract_simple_type(&self, element: &Element, name: QName, redefinition: bool) -> SimpleType {
        let (variety, restriction) = self.simple_type_body(element);
        SimpleType {
            name,
            variety,
            restriction,
            documentation: documentation(element),
            redefinition,
            source_file: self.file.path.clone(),
        }
    }

    fn simple_type_body(&self, element: &Element) -> (SimpleTypeVariety, Restriction) {
        for child in xsd_children(element) {
            match child.local_name() {
                "restriction" => {
                    return (SimpleTypeVariety::Atomic, self.extract_restriction(child));
                }
                "list" => {
                    let item_type = self.attribute_ref(child, "itemType");
                    return (SimpleTypeVariety::List { item_type }, Restriction::default());
                }
                "union" => {
                    let member_types = child
                        .get_attribute("memberTypes")
                        .map(|members| {
                            members
                                .split_whitespace()
                                .map(|m| self.type_ref(child, m))
                                .collect()
                        })
                        .unwrap_or_default();
                    return (SimpleTypeVariety::Union { member_types }, Restriction::default());
                }
                _ => {}
            }
        }
        (SimpleTypeVariety::Atomic, Restriction::default())
    }

    /// Base, enumerations and facets of an xs:restriction
    fn extract_restriction(&self, restriction: &Element) -> Restriction {
        let mut result = Restriction {
            base: self.attribute_ref(restriction, "base"),
            ..Default::default()
        };

        for facet in xsd_children(restriction) {
            let value = match facet.get_attribute("value") {
                Some(value) => value,
                None => continue,
            };
            let facet_name = facet.local_name();
            if facet_name == "enumeration" {
                result.enumerations.push(value.to_string());
            } else if FACETS.contains(&facet_name) {
                // Multiple patterns are alternatives
                if facet_name == "pattern" {
                    if let Some(existing) = result.facets.get_mut(facet_name) {
                        existing.push('|');
                        existing.push_str(value);
                        continue;
                    }
                }
                result.facets.insert(facet_name.to_string(), value.to_string());
            }
        }

        result
    }

    /// Restriction of an anonymous simple type child, if any
    fn inline_simple_type(&self, element: &Element) -> Option<Restriction> {
        let simple_type = xsd_child(element, "simpleType")?;
        let (_, restriction) = self.simple_type_body(simple_type);
        if restriction.is_empty() {
            None
        } else {
            Some(restriction)
        }
    }

    /// Attribute declaration or reference
    fn extract_attribute(&self, element: &Element) -> Option<AttributeDecl> {
        let reference = self.attribute_ref(element, "ref");
        let mut attribute = match (&reference, element.get_attribute("name")) {
            (Some(reference), _) => {
                let mut attribute = AttributeDecl::new(local_part(&reference.raw));
                attribute.namespace = reference.namespace().map(str::to_string);
                attribute
            }
            (None, Some(name)) => {
                let mut attribute = AttributeDecl::new(name.trim());
                let qualified = match element.get_attribute("form") {
                    Some(form) => form == "qualified",
                    None => self.attribute_qualified,
                };
                if qualified {
                    attribute.namespace = self.file.effective_namespace.clone();
                }
                attribute
            }
            (None, None) => return None,
        };

        attribute.type_ref = self.attribute_ref(element, "type");
        attribute.use_ = AttributeUse::parse(element.get_attribute("use"));
        attribute.default = element.get_attribute("default").map(str::to_string);
        attribute.fixed = element.get_attribute("fixed").map(str::to_string);
        attribute.documentation = documentation(element);
        attribute.inline_simple_type = self.inline_simple_type(element);
        attribute.reference = reference;

        if let Some(target) = attribute
            .reference
            .as_ref()
            .and_then(|r| r.qname.as_ref())
            .and_then(|q| self.model.attributes.get(q))
            .cloned()
        {
            attribute.link_to(&target);
        }

        Some(attribute)
    }

    /// Attributes and attribute group refs among the children of `container`
    fn collect_attributes(&self, container: &Element, content: &mut Content) {
        for child in xsd_children(container) {
            match child.local_name() {
                "attribute" => {
                    if let Some(attribute) = self.extract_attribute(child) {
                        content.push_attribute(attribute);
                    }
                }
                "attributeGroup" => {
                    if let Some(reference) = self.attribute_ref(child, "ref") {
                        self.expand_attribute_group(reference, content);
                    }
                }
                _ => {}
            }
        }
    }

    fn expand_attribute_group(&self, reference: TypeRef, content: &mut Content) {
        let mut group_ref = GroupRef::new(reference);
        let local = group_ref
            .reference
            .qname
            .as_ref()
            .and_then(|q| self.model.attribute_groups.get(q));

        if let Some(group) = local {
            for attribute in &group.attributes {
                content.push_attribute(attribute.clone());
            }
            content
                .attribute_group_refs
                .extend(group.group_refs.iter().filter(|r| !r.expanded).cloned());
            group_ref.expanded = true;
        }
        content.attribute_group_refs.push(group_ref);
    }

    fn extract_attribute_group(&self, element: &Element, name: QName, redefinition: bool) -> AttributeGroup {
        let mut content = Content::default();
        self.collect_attributes(element, &mut content);
        AttributeGroup {
            name,
            attributes: content.attributes,
            group_refs: content.attribute_group_refs,
            documentation: documentation(element),
            redefinition,
            source_file: self.file.path.clone(),
        }
    }

    fn extract_model_group(&mut self, element: &Element, name: QName, redefinition: bool) -> ModelGroup {
        let path = ElementPath::root(name.local_name.clone());
        let mut content = Content::default();
        for child in xsd_children(element) {
            if let Some(model) = ContentModel::from_local_name(child.local_name()) {
                content.content_model = model;
                self.walk_particle(child, &path, &mut content);
            }
        }
        ModelGroup {
            name,
            content_model: content.content_model,
            elements: content.elements,
            group_refs: content.group_refs,
            documentation: documentation(element),
            redefinition,
            source_file: self.file.path.clone(),
        }
    }

    fn extract_complex_type(&mut self, element: &Element, name: QName, redefinition: bool) -> ComplexType {
        let path = ElementPath::root(name.local_name.clone());
        let content = self.extract_content(element, &path);

        let mut complex_type = ComplexType::new(name);
        complex_type.elements = content.elements;
        complex_type.attributes = content.attributes;
        complex_type.attribute_group_refs = content.attribute_group_refs;
        complex_type.group_refs = content.group_refs;
        complex_type.base_type = content.base_type;
        complex_type.derivation = content.derivation;
        complex_type.content_model = content.content_model;
        complex_type.mixed = content.mixed;
        complex_type.abstract_ = parse_bool(element.get_attribute("abstract"));
        complex_type.documentation = documentation(element);
        complex_type.redefinition = redefinition;
        complex_type.source_file = self.file.path.clone();
        complex_type
    }

    /// Body of a named or anonymous xs:complexType
    fn extract_content(&mut self, complex: &Element, path: &ElementPath) -> Content {
        let mut content = Content {
            mixed: parse_bool(complex.get_attribute("mixed")),
            ..Default::default()
        };

        for child in xsd_children(complex) {
            match child.local_name() {
                "complexContent" | "simpleContent" => {
                    if child.local_name() == "simpleContent" {
                        content.content_model = ContentModel::Simple;
                    } else if parse_bool(child.get_attribute("mixed")) {
                        content.mixed = true;
                    }
                    let derivation = xsd_children(child).find(|d| {
                        matches!(d.local_name(), "extension" | "restriction")
                    });
                    if let Some(derivation) = derivation {
                        content.base_type = self.attribute_ref(derivation, "base");
                        content.derivation = Derivation::from_local_name(derivation.local_name());
                        self.extract_particles(derivation, path, &mut content);
                        self.collect_attributes(derivation, &mut content);
                    }
                }
                _ => {}
            }
        }

        self.extract_particles(complex, path, &mut content);
        self.collect_attributes(complex, &mut content);
        content
    }

    /// Top-level compositor or group ref of a content model
    fn extract_particles(&mut self, container: &Element, path: &ElementPath, content: &mut Content) {
        for child in xsd_children(container) {
            let local = child.local_name();
            if let Some(model) = ContentModel::from_local_name(local) {
                if content.content_model == ContentModel::Empty {
                    content.content_model = model;
                }
                self.walk_particle(child, path, content);
            } else if local == "group" {
                if content.content_model == ContentModel::Empty {
                    content.content_model = ContentModel::Sequence;
                }
                self.walk_particle(child, path, content);
            }
        }
    }

    /// Collect element declarations from a particle, walking nested
    /// compositors transitively
    fn walk_particle(&mut self, particle: &Element, path: &ElementPath, content: &mut Content) {
        match particle.local_name() {
            "element" => {
                if let Some(decl) = self.extract_element(particle, Some(path)) {
                    content.elements.push(decl);
                }
            }
            "sequence" | "choice" | "all" => {
                for child in xsd_children(particle) {
                    self.walk_particle(child, path, content);
                }
            }
            "group" => {
                if let Some(reference) = self.attribute_ref(particle, "ref") {
                    let mut group_ref = GroupRef::new(reference);
                    let local = group_ref
                        .reference
                        .qname
                        .as_ref()
                        .and_then(|q| self.model.model_groups.get(q));
                    if let Some(group) = local {
                        for element in &group.elements {
                            let mut element = element.clone();
                            element.reparent(path);
                            content.elements.push(element);
                        }
                        content
                            .group_refs
                            .extend(group.group_refs.iter().filter(|r| !r.expanded).cloned());
                        group_ref.expanded = true;
                    }
                    content.group_refs.push(group_ref);
                }
            }
            _ => {}
        }
    }

    /// Element declaration; `parent` is `None` for global elements
    fn extract_element(&mut self, element: &Element, parent: Option<&ElementPath>) -> Option<ElementDecl> {
        let reference = self.attribute_ref(element, "ref");
        let name = match (&reference, element.get_attribute("name")) {
            (Some(reference), _) => local_part(&reference.raw).to_string(),
            (None, Some(name)) => name.trim().to_string(),
            (None, None) => {
                debug!("skipping element without name or ref");
                return None;
            }
        };

        if !is_valid_ncname(&name) {
            self.issue(
                Issue::new(IssueKind::InvalidName, format!("Invalid element name '{}'", name))
                    .with_component(name),
            );
            return None;
        }

        let path = match parent {
            Some(parent) => parent.child(name.clone()),
            None => ElementPath::root(name.clone()),
        };
        if let Err(err) = self.limits.check_nesting_depth(path.depth()) {
            if !self.depth_reported {
                self.depth_reported = true;
                self.issue(Issue::new(IssueKind::LimitExceeded, err.to_string()).with_component(path.to_string()));
            }
            return None;
        }

        let mut decl = ElementDecl::new(name);
        decl.path = path.clone();
        decl.namespace = match (&reference, parent) {
            (Some(reference), _) => reference.namespace().map(str::to_string),
            (None, None) => self.file.effective_namespace.clone(),
            (None, Some(_)) => {
                let qualified = match element.get_attribute("form") {
                    Some(form) => form == "qualified",
                    None => self.element_qualified,
                };
                if qualified {
                    self.file.effective_namespace.clone()
                } else {
                    None
                }
            }
        };
        decl.reference = reference;
        decl.type_ref = self.attribute_ref(element, "type");
        decl.cardinality = Cardinality::from_attributes(
            element.get_attribute("minOccurs"),
            element.get_attribute("maxOccurs"),
        );
        decl.documentation = documentation(element);
        decl.default = element.get_attribute("default").map(str::to_string);
        decl.fixed = element.get_attribute("fixed").map(str::to_string);
        decl.nillable = parse_bool(element.get_attribute("nillable"));
        decl.abstract_ = parse_bool(element.get_attribute("abstract"));
        decl.source_file = self.file.path.clone();

        if let Some(complex) = xsd_child(element, "complexType") {
            let content = self.extract_content(complex, &path);
            decl.has_inline_complex_type = true;
            decl.children = content.elements;
            decl.attributes = content.attributes;
            decl.attribute_group_refs = content.attribute_group_refs;
            decl.group_refs = content.group_refs;
            decl.base_type = content.base_type;
            decl.derivation = content.derivation;
        } else {
            decl.inline_simple_type = self.inline_simple_type(element);
        }

        Some(decl)
    }
}

/// Extract the model of one file
pub fn extract(file: &SchemaFile, limits: &Limits) -> FileModel {
    Extractor::new(file).with_limits(limits.clone()).extract()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const XS: &str = crate::XSD_1_0_NAMESPACE;
    const TNS: &str = "http://example.com/library";

    fn parse(body: &str) -> FileModel {
        let text = format!(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                         xmlns:tns="{tns}" targetNamespace="{tns}">{body}</xs:schema>"#,
            tns = TNS,
            body = body
        );
        let mut file = SchemaFile::parse("/schemas/library.xsd", &text).unwrap();
        file.is_entry = true;
        extract(&file, &Limits::default())
    }

    fn tns(local: &str) -> QName {
        QName::namespaced(TNS, local)
    }

    #[test]
    fn test_simple_type_enumeration() {
        let model = parse(
            r#"<xs:simpleType name="FormatType">
                 <xs:annotation><xs:documentation>Binding format</xs:documentation></xs:annotation>
                 <xs:restriction base="xs:string">
                   <xs:enumeration value="HARDCOVER"/>
                   <xs:enumeration value="PAPERBACK"/>
                 </xs:restriction>
               </xs:simpleType>"#,
        );

        let simple_type = &model.simple_types[&tns("FormatType")];
        assert_eq!(simple_type.enumerations(), &["HARDCOVER", "PAPERBACK"]);
        let base = simple_type.base_type().unwrap();
        assert_eq!(base.raw, "xs:string");
        assert_eq!(base.qname, Some(QName::namespaced(XS, "string")));
        assert_eq!(simple_type.documentation.as_deref(), Some("Binding format"));
    }

    #[test]
    fn test_simple_type_facets_and_varieties() {
        let model = parse(
            r#"<xs:simpleType name="Isbn">
                 <xs:restriction base="xs:string">
                   <xs:length value="13"/>
                   <xs:pattern value="[0-9]{13}"/>
                   <xs:pattern value="[0-9]{10}"/>
                   <xs:whiteSpace value="collapse"/>
                 </xs:restriction>
               </xs:simpleType>
               <xs:simpleType name="Isbns"><xs:list itemType="tns:Isbn"/></xs:simpleType>
               <xs:simpleType name="Size"><xs:union memberTypes="xs:int tns:Isbn"/></xs:simpleType>"#,
        );

        let isbn = &model.simple_types[&tns("Isbn")];
        assert_eq!(isbn.restriction.facets["length"], "13");
        assert_eq!(isbn.restriction.facets["pattern"], "[0-9]{13}|[0-9]{10}");
        assert_eq!(isbn.restriction.facets["whiteSpace"], "collapse");

        match &model.simple_types[&tns("Isbns")].variety {
            SimpleTypeVariety::List { item_type } => {
                assert_eq!(item_type.as_ref().unwrap().qname, Some(tns("Isbn")))
            }
            other => panic!("expected list, got {:?}", other),
        }
        match &model.simple_types[&tns("Size")].variety {
            SimpleTypeVariety::Union { member_types } => assert_eq!(member_types.len(), 2),
            other => panic!("expected union, got {:?}", other),
        }
    }

    #[test]
    fn test_complex_type_extension_and_content() {
        let model = parse(
            r#"<xs:complexType name="ItemType">
                 <xs:sequence><xs:element name="id" type="xs:string"/></xs:sequence>
               </xs:complexType>
               <xs:complexType name="BookType">
                 <xs:complexContent>
                   <xs:extension base="tns:ItemType">
                     <xs:sequence>
                       <xs:element name="title" type="xs:string"/>
                       <xs:choice>
                         <xs:element name="isbn" type="xs:string"/>
                         <xs:element name="issn" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
                       </xs:choice>
                     </xs:sequence>
                     <xs:attribute name="lang" type="xs:language" use="required"/>
                   </xs:extension>
                 </xs:complexContent>
               </xs:complexType>"#,
        );

        let book = &model.complex_types[&tns("BookType")];
        assert_eq!(book.derivation, Derivation::Extension);
        assert_eq!(book.base_type.as_ref().unwrap().qname, Some(tns("ItemType")));
        assert_eq!(book.content_model, ContentModel::Sequence);

        let names: Vec<_> = book.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["title", "isbn", "issn"]);
        assert!(book.elements[2].cardinality.is_unbounded());
        assert_eq!(book.elements[2].path.to_string(), "/BookType/issn");

        assert_eq!(book.attributes.len(), 1);
        assert!(book.attributes[0].is_required());
        assert_eq!(model.complex_types[&tns("ItemType")].derivation, Derivation::None);
    }

    #[test]
    fn test_simple_content() {
        let model = parse(
            r#"<xs:complexType name="PriceType">
                 <xs:simpleContent>
                   <xs:extension base="xs:decimal">
                     <xs:attribute name="currency" type="xs:string" default="EUR"/>
                   </xs:extension>
                 </xs:simpleContent>
               </xs:complexType>"#,
        );
        let price = &model.complex_types[&tns("PriceType")];
        assert_eq!(price.content_model, ContentModel::Simple);
        assert_eq!(price.derivation, Derivation::Extension);
        assert_eq!(price.attributes[0].default.as_deref(), Some("EUR"));
    }

    #[test]
    fn test_attribute_dedup_across_prefixes() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                                 xmlns:xsd="http://www.w3.org/2001/XMLSchema">
              <xs:complexType name="T">
                <xs:attribute name="id" type="xs:ID"/>
                <xsd:attribute name="id" type="xs:ID"/>
                <xs:attribute name="code" type="xs:string"/>
              </xs:complexType>
            </xs:schema>"#;
        let file = SchemaFile::parse("/schemas/t.xsd", text).unwrap();
        let model = extract(&file, &Limits::default());
        let t = &model.complex_types[&QName::local("T")];
        assert_eq!(t.attributes.len(), 2);
    }

    #[test]
    fn test_attribute_groups_and_refs() {
        let model = parse(
            r#"<xs:attribute name="lang" type="xs:language" default="en"/>
               <xs:attributeGroup name="Common">
                 <xs:attribute name="id" type="xs:ID" use="required"/>
                 <xs:attribute ref="tns:lang"/>
               </xs:attributeGroup>
               <xs:complexType name="T">
                 <xs:attributeGroup ref="tns:Common"/>
                 <xs:attributeGroup ref="tns:Later"/>
               </xs:complexType>"#,
        );

        let common = &model.attribute_groups[&tns("Common")];
        assert!(common.attributes[1].resolved);
        assert_eq!(common.attributes[1].default.as_deref(), Some("en"));

        let t = &model.complex_types[&tns("T")];
        assert_eq!(t.attributes.len(), 2);
        assert_eq!(t.attribute_group_refs.len(), 2);
        assert!(t.attribute_group_refs[0].expanded);
        assert!(!t.attribute_group_refs[1].expanded);
    }

    #[test]
    fn test_model_group_expansion() {
        let model = parse(
            r#"<xs:group name="Names">
                 <xs:sequence>
                   <xs:element name="first" type="xs:string"/>
                   <xs:element name="last" type="xs:string"/>
                 </xs:sequence>
               </xs:group>
               <xs:complexType name="PersonType">
                 <xs:sequence>
                   <xs:group ref="tns:Names"/>
                   <xs:element name="born" type="xs:date"/>
                 </xs:sequence>
               </xs:complexType>"#,
        );

        assert_eq!(model.model_groups[&tns("Names")].elements.len(), 2);
        let person = &model.complex_types[&tns("PersonType")];
        let names: Vec<_> = person.elements.iter().map(|e| e.path.to_string()).collect();
        assert_eq!(names, vec!["/PersonType/first", "/PersonType/last", "/PersonType/born"]);
        assert!(person.group_refs[0].expanded);
    }

    #[test]
    fn test_global_and_root_elements() {
        let model = parse(
            r#"<xs:element name="library">
                 <xs:complexType>
                   <xs:sequence>
                     <xs:element name="book" type="tns:BookType" maxOccurs="unbounded"/>
                     <xs:element ref="tns:magazine" minOccurs="0"/>
                   </xs:sequence>
                   <xs:attribute name="name" type="xs:string"/>
                 </xs:complexType>
               </xs:element>
               <xs:element name="magazine" type="xs:string" nillable="true"/>
               <xs:element name="code">
                 <xs:simpleType><xs:restriction base="xs:string"><xs:maxLength value="8"/></xs:restriction></xs:simpleType>
               </xs:element>"#,
        );

        assert_eq!(model.elements.len(), 3);
        let roots: Vec<_> = model.root_elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(roots, vec!["library", "magazine", "code"]);

        let library = &model.elements[&tns("library")];
        assert!(library.has_inline_complex_type);
        assert_eq!(library.namespace.as_deref(), Some(TNS));
        assert_eq!(library.children.len(), 2);
        assert_eq!(library.attributes.len(), 1);

        let book = &library.children[0];
        assert_eq!(book.path.to_string(), "/library/book");
        assert_eq!(book.type_ref.as_ref().unwrap().qname, Some(tns("BookType")));
        assert_eq!(book.namespace, None);

        let magazine_ref = &library.children[1];
        assert_eq!(magazine_ref.name, "magazine");
        assert_eq!(magazine_ref.reference.as_ref().unwrap().raw, "tns:magazine");
        assert_eq!(magazine_ref.cardinality.min_occurs, "0");

        assert!(model.elements[&tns("magazine")].nillable);
        let code = &model.elements[&tns("code")];
        assert_eq!(code.inline_simple_type.as_ref().unwrap().facets["maxLength"], "8");

        let stats = model.statistics();
        assert_eq!(stats.total_elements, 5);
        assert_eq!(stats.max_depth, 1);
    }

    #[test]
    fn test_non_entry_file_has_no_roots() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                        <xs:element name="a" type="xs:string"/>
                      </xs:schema>"#;
        let file = SchemaFile::parse("/schemas/inc.xsd", text).unwrap();
        let model = extract(&file, &Limits::default());
        assert_eq!(model.elements.len(), 1);
        assert!(model.root_elements.is_empty());
    }

    #[test]
    fn test_redefinition_wins_and_invalid_names() {
        let model = parse(
            r#"<xs:redefine schemaLocation="base.xsd">
                 <xs:complexType name="T">
                   <xs:complexContent><xs:extension base="tns:T"/></xs:complexContent>
                 </xs:complexType>
               </xs:redefine>
               <xs:complexType name="T"/>
               <xs:complexType name="1bad"/>"#,
        );
        let t = &model.complex_types[&tns("T")];
        assert!(t.redefinition);
        assert_eq!(model.complex_types.len(), 1);
        assert!(model
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::InvalidName));
    }

    #[test]
    fn test_nesting_depth_limit() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="a"><xs:complexType><xs:sequence>
              <xs:element name="b"><xs:complexType><xs:sequence>
                <xs:element name="c"/>
              </xs:sequence></xs:complexType></xs:element>
            </xs:sequence></xs:complexType></xs:element>
          </xs:schema>"#;
        let file = SchemaFile::parse("/schemas/deep.xsd", text).unwrap();
        let limits = Limits {
            max_nesting_depth: 1,
            ..Limits::default()
        };
        let model = extract(&file, &limits);
        let a = &model.elements[&QName::local("a")];
        assert_eq!(a.children.len(), 1);
        assert!(a.children[0].children.is_empty());
        assert!(model
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::LimitExceeded));
    }

    #[test]
    fn test_chameleon_type_refs() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                        <xs:complexType name="A"><xs:sequence>
                          <xs:element name="b" type="B"/>
                        </xs:sequence></xs:complexType>
                      </xs:schema>"#;
        let mut file = SchemaFile::parse("/schemas/cham.xsd", text).unwrap();
        file.effective_namespace = Some("urn:host".to_string());
        let model = extract(&file, &Limits::default());

        let a = &model.complex_types[&QName::namespaced("urn:host", "A")];
        assert_eq!(
            a.elements[0].type_ref.as_ref().unwrap().qname,
            Some(QName::namespaced("urn:host", "B"))
        );
    }
}
