use docgraph::errors::DocGraphError;
use docgraph::graph::factory::*;
use docgraph::graph::GraphFactory;
use docgraph::types::*;

fn validation_field<T: std::fmt::Debug>(result: docgraph::errors::Result<T>) -> String {
    match result {
        Err(DocGraphError::Validation { field, .. }) => field,
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_create_paragraph_defaults() {
    let mut factory = GraphFactory::new("doc");
    let node = factory
        .create_paragraph("Some body text.", 1, 0, 15, None)
        .unwrap();
    assert_eq!(node.node_type, NodeType::Paragraph);
    assert_eq!(node.confidence(), PARAGRAPH_CONFIDENCE);
    assert_eq!(node.label, "Some body text.");
    assert!(node.id.starts_with("paragraph:"));
}

#[test]
fn test_sequence_gives_distinct_ids_at_same_position() {
    let mut factory = GraphFactory::new("doc");
    let a = factory.create_paragraph("first", 1, 0, 5, None).unwrap();
    let b = factory.create_paragraph("first", 1, 0, 5, None).unwrap();
    assert_ne!(a.id, b.id);
}

#[test]
fn test_create_section_extracts_number() {
    let mut factory = GraphFactory::new("doc");
    let node = factory
        .create_section("3.2 Methods", 2, 10, 21, None)
        .unwrap();
    assert_eq!(node.property_str("section_number"), Some("3.2"));
    assert_eq!(node.confidence(), SECTION_CONFIDENCE);
    assert!(node.is_heading());
    assert!(!node.is_page_container());
}

#[test]
fn test_create_page_is_flagged_container() {
    let mut factory = GraphFactory::new("doc");
    let node = factory.create_page(4, "").unwrap();
    assert!(node.is_page_container());
    assert!(!node.is_heading());
    assert_eq!(node.label, "Page 4");
    assert_eq!(node.content, "Page 4");
    assert_eq!(node.position.page, 4);
}

#[test]
fn test_create_table_and_image_numbers() {
    let mut factory = GraphFactory::new("doc");
    let table = factory
        .create_table("Results", "a | b", Position::new(1, 0, 5), Some("2"))
        .unwrap();
    let image = factory
        .create_image("", Position::new(1, 10, 20), Some("3a"))
        .unwrap();
    assert_eq!(table.property_str("table_number"), Some("2"));
    assert_eq!(table.confidence(), TABLE_CONFIDENCE);
    assert_eq!(image.property_str("figure_number"), Some("3a"));
    assert_eq!(image.content, "[Image]");
}

#[test]
fn test_create_list_code_and_metadata() {
    let mut factory = GraphFactory::new("doc");
    let list = factory
        .create_list(
            &["one".to_string(), "two".to_string()],
            Position::new(1, 0, 7),
        )
        .unwrap();
    assert_eq!(list.label, "List (2 items)");
    assert_eq!(list.content, "one\ntwo");

    let code = factory
        .create_code("fn main() {}", Some("rust"), Position::new(1, 10, 22))
        .unwrap();
    assert_eq!(code.label, "Code (rust)");
    assert_eq!(code.property_str("language"), Some("rust"));

    let meta = factory.create_metadata("author", "Ada").unwrap();
    assert_eq!(meta.node_type, NodeType::Metadata);
    assert_eq!(meta.property_str("key"), Some("author"));
    assert_eq!(meta.confidence(), METADATA_CONFIDENCE);
}

#[test]
fn test_empty_content_is_rejected() {
    let mut factory = GraphFactory::new("doc");
    let result = factory.create_node(
        NodeType::Table,
        "Table 1",
        "   ",
        Position::new(1, 0, 3),
        0.5,
        Properties::new(),
    );
    assert_eq!(validation_field(result), "content");
    // A blank paragraph has nothing to label.
    assert!(factory.create_paragraph("   ", 1, 0, 3, None).is_err());
}

#[test]
fn test_empty_label_is_rejected() {
    let mut factory = GraphFactory::new("doc");
    let result = factory.create_node(
        NodeType::Code,
        "",
        "x = 1",
        Position::new(1, 0, 5),
        0.5,
        Properties::new(),
    );
    assert_eq!(validation_field(result), "label");
}

#[test]
fn test_invalid_position_is_rejected() {
    let mut factory = GraphFactory::new("doc");
    assert_eq!(
        validation_field(factory.create_paragraph("text", 0, 0, 4, None)),
        "position"
    );
    assert_eq!(
        validation_field(factory.create_paragraph("text", 1, 10, 10, None)),
        "position"
    );
}

#[test]
fn test_out_of_range_confidence_is_rejected() {
    let mut factory = GraphFactory::new("doc");
    assert_eq!(
        validation_field(factory.create_paragraph("text", 1, 0, 4, Some(1.2))),
        "confidence"
    );
    assert_eq!(
        validation_field(factory.create_paragraph("text", 1, 0, 4, Some(-0.1))),
        "confidence"
    );
}

#[test]
fn test_edge_constraints() {
    let factory = GraphFactory::new("doc");
    assert_eq!(
        validation_field(factory.create_contains("", "b", None)),
        "source"
    );
    assert_eq!(
        validation_field(factory.create_contains("a", " ", None)),
        "target"
    );
    assert_eq!(
        validation_field(factory.create_follows("a", "a", None)),
        "target"
    );
    assert_eq!(
        validation_field(factory.create_reference("a", "b", 1.5, Properties::new())),
        "weight"
    );
}

#[test]
fn test_edge_default_weights() {
    let factory = GraphFactory::new("doc");
    assert_eq!(
        factory.create_contains("a", "b", None).unwrap().weight,
        CONTAINS_WEIGHT
    );
    assert_eq!(
        factory.create_follows("a", "b", None).unwrap().weight,
        FOLLOWS_WEIGHT
    );
    assert_eq!(
        factory.create_similar("a", "b", None).unwrap().weight,
        SIMILAR_WEIGHT
    );
    let reference = factory
        .create_reference("a", "b", 0.72, Properties::new())
        .unwrap();
    assert_eq!(reference.edge_type, EdgeType::References);
    assert_eq!(reference.weight, 0.72);
}

#[test]
fn test_truncate_label() {
    assert_eq!(truncate_label("short", 10), "short");
    assert_eq!(truncate_label("a   b\n c", 10), "a b c");
    let long = truncate_label("abcdefghij klmnop", 10);
    assert!(long.ends_with("..."));
    assert!(long.chars().count() <= 10);
}

#[test]
fn test_long_labels_are_truncated() {
    let mut factory = GraphFactory::new("doc").with_max_label_length(20);
    let node = factory
        .create_section(
            "1 An Exceedingly Long Heading That Keeps Going",
            1,
            0,
            46,
            None,
        )
        .unwrap();
    assert!(node.label.chars().count() <= 20);
    assert!(node.label.ends_with("..."));
    assert_eq!(node.content, "1 An Exceedingly Long Heading That Keeps Going");
}

#[test]
fn test_leading_number() {
    assert_eq!(leading_number("3.2 Methods").as_deref(), Some("3.2"));
    assert_eq!(leading_number("Section 4 Results").as_deref(), Some("4"));
    assert_eq!(leading_number("§ 2.1.3 Scope").as_deref(), Some("2.1.3"));
    assert_eq!(leading_number("1. Introduction").as_deref(), Some("1"));
    assert_eq!(leading_number("Introduction"), None);
}
