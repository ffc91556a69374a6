//! Selective extraction against the library fixture

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use xsd_model::exports::{selection_to_json, ExportConfig};
use xsd_model::model::ComponentKind;
use xsd_model::selective::ANY_NAMESPACE;
use xsd_model::{IssueKind, Selection, SelectiveExtractor, Settings};

fn extractor() -> SelectiveExtractor {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.push("tests");
    dir.push("fixtures");
    dir.push("library");
    SelectiveExtractor::with_settings(Settings::new().with_base_dir(dir))
}

#[test]
fn test_dependencies_cross_files() {
    let mut extractor = extractor();
    extractor.add_selection(
        Selection::new("library.xsd").with_complex_types(["ReferenceBookType"]),
    );

    let result = extractor.run();
    let keys: Vec<&str> = result.components.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "complex_type:ReferenceBookType",
            "complex_type:BookType",
            "complex_type:ItemType",
            "simple_type:ISBNType",
            "simple_type:BindingType",
            "complex_type:PublisherType",
        ]
    );

    let publisher = result.get("complex_type:PublisherType").unwrap();
    assert!(publisher.via_dependency);
    assert!(publisher.defined_in.ends_with("publisher.xsd"));
    assert_eq!(publisher.source_file, PathBuf::from("library.xsd"));
    assert_eq!(
        publisher.namespace.as_deref(),
        Some("http://example.com/publisher")
    );
    assert_eq!(
        result.namespaces(),
        vec![
            "http://example.com/library".to_string(),
            "http://example.com/publisher".to_string()
        ]
    );
}

#[test]
fn test_element_and_wildcard_selection_dedup() {
    let mut extractor = extractor();
    extractor.add_selection(
        Selection::new("library.xsd")
            .with_elements(["library"])
            .with_dependencies(false),
    );
    extractor.add_selection(
        Selection::new("library.xsd")
            .with_namespaces([ANY_NAMESPACE])
            .with_dependencies(false),
    );

    let result = extractor.run();
    assert_eq!(
        result
            .components
            .keys()
            .filter(|k| k.as_str() == "element:library")
            .count(),
        1
    );
    // library and publisher elements, five complex types, two simple types
    assert_eq!(result.of_kind(ComponentKind::Element).count(), 2);
    assert_eq!(result.len(), 9);
    assert!(result.issues.is_empty(), "{:?}", result.issues);
}

#[test]
fn test_selections_across_files() {
    let mut extractor = extractor();
    extractor.add_selection(
        Selection::new("publisher.xsd")
            .with_elements(["publisher"])
            .with_dependencies(false),
    );
    extractor.add_selection(
        Selection::new("common-types.xsd")
            .with_complex_types(["AddressType"])
            .with_simple_types(["BindingType"]),
    );

    let result = extractor.run();
    assert_eq!(result.len(), 3);
    assert_eq!(extractor.schema_sets().count(), 2);
    assert_eq!(
        result.source_files(),
        vec![
            PathBuf::from("publisher.xsd"),
            PathBuf::from("common-types.xsd")
        ]
    );

    let summary = result.selection_summary();
    assert_eq!(summary[&PathBuf::from("publisher.xsd")].elements, vec!["publisher"]);
    assert_eq!(summary[&PathBuf::from("common-types.xsd")].total_selected, 2);
}

#[test]
fn test_unknown_component_is_an_issue() {
    let mut extractor = extractor();
    extractor.add_selection(
        Selection::new("library.xsd")
            .with_elements(["library"])
            .with_simple_types(["ColourType"])
            .with_dependencies(false),
    );

    let result = extractor.run();
    assert_eq!(result.len(), 1);
    let unknown: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::UnknownComponent)
        .collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].component.as_deref(), Some("simple_type:ColourType"));
}

#[test]
fn test_selection_json() {
    let mut extractor = extractor();
    extractor.add_selection(Selection::new("library.xsd").with_elements(["library"]));
    let result = extractor.run();

    let json: serde_json::Value =
        serde_json::from_str(&selection_to_json(&result, &ExportConfig::default()).unwrap())
            .unwrap();
    assert_eq!(json["metadata"]["selected_components"], result.len());
    assert_eq!(json["global_elements"]["library"]["via_dependency"], false);
    assert_eq!(json["complex_types"]["AddressType"]["via_dependency"], true);
}

#[test]
fn test_same_name_in_two_namespaces_is_kept_twice() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("b.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:b">
             <xs:complexType name="Item"><xs:attribute name="sku" type="xs:string"/></xs:complexType>
           </xs:schema>"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("a.xsd"),
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
             <xs:import namespace="urn:b" schemaLocation="b.xsd"/>
             <xs:complexType name="Item"><xs:attribute name="id" type="xs:int"/></xs:complexType>
           </xs:schema>"#,
    )
    .unwrap();

    let mut extractor = SelectiveExtractor::with_settings(Settings::new().with_base_dir(dir.path()));
    extractor.add_selection(
        Selection::new("a.xsd")
            .with_namespaces([ANY_NAMESPACE])
            .with_dependencies(false),
    );
    let result = extractor.run();

    assert_eq!(result.of_kind(ComponentKind::ComplexType).count(), 2);
    assert_eq!(
        result.get("complex_type:Item").unwrap().namespace.as_deref(),
        Some("urn:a")
    );
    assert_eq!(
        result.get("complex_type:{urn:b}Item").unwrap().namespace.as_deref(),
        Some("urn:b")
    );

    let clashes: Vec<_> = result
        .issues
        .iter()
        .filter(|i| i.kind == IssueKind::AmbiguousName)
        .collect();
    assert_eq!(clashes.len(), 1);

    let json: serde_json::Value =
        serde_json::from_str(&selection_to_json(&result, &ExportConfig::default()).unwrap())
            .unwrap();
    assert!(json["complex_types"]["Item"].is_object());
    assert!(json["complex_types"]["{urn:b}Item"].is_object());
}
