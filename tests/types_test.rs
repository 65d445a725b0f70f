use docgraph::errors::DocGraphError;
use docgraph::types::*;

#[test]
fn test_node_type_round_trip() {
    for node_type in NodeType::ALL {
        assert_eq!(NodeType::from_str(node_type.as_str()), Some(node_type));
    }
    assert_eq!(NodeType::from_str("chapter"), None);
}

#[test]
fn test_node_type_parse_rejects_unknown_name() {
    assert_eq!(NodeType::parse("table").unwrap(), NodeType::Table);
    match NodeType::parse("widget") {
        Err(DocGraphError::Validation { field, message }) => {
            assert_eq!(field, "type");
            assert!(message.contains("widget"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_edge_type_parse() {
    assert_eq!(EdgeType::parse("references").unwrap(), EdgeType::References);
    assert!(matches!(
        EdgeType::parse("cites"),
        Err(DocGraphError::Validation { .. })
    ));
}

#[test]
fn test_reference_type_strings() {
    assert_eq!(ReferenceType::CrossReference.as_str(), "cross_reference");
    for kind in ReferenceType::ALL {
        assert_eq!(ReferenceType::from_str(kind.as_str()), Some(kind));
    }
}

#[test]
fn test_reference_type_serde_uses_snake_case() {
    let json = serde_json::to_string(&ReferenceType::CrossReference).unwrap();
    assert_eq!(json, "\"cross_reference\"");
}

#[test]
fn test_node_id_is_deterministic() {
    let a = generate_node_id("doc-1", NodeType::Paragraph, 2, 40, 7);
    let b = generate_node_id("doc-1", NodeType::Paragraph, 2, 40, 7);
    let c = generate_node_id("doc-1", NodeType::Paragraph, 2, 40, 8);
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.starts_with("paragraph:"));
    assert_eq!(a.len(), "paragraph:".len() + 32);
}

#[test]
fn test_edge_id_depends_on_direction_and_type() {
    let forward = generate_edge_id("a", "b", EdgeType::Follows);
    assert_eq!(forward, generate_edge_id("a", "b", EdgeType::Follows));
    assert_ne!(forward, generate_edge_id("b", "a", EdgeType::Follows));
    assert_ne!(forward, generate_edge_id("a", "b", EdgeType::Contains));
    assert!(forward.starts_with("follows:"));
}

#[test]
fn test_content_hash_is_hex_sha256() {
    let hash = content_hash("hello");
    assert_eq!(hash.len(), 64);
    assert_eq!(
        hash,
        "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    );
}

#[test]
fn test_position_distance() {
    let a = Position::new(1, 100, 120);
    let b = Position::new(3, 40, 60);
    assert_eq!(a.distance_to(&b), 2 * 1000 + 60);
    assert_eq!(a.distance_to(&b), b.distance_to(&a));
    assert!(a.reading_order() < b.reading_order());
}

#[test]
fn test_graph_status_terminal_states() {
    assert!(!GraphStatus::Building.is_terminal());
    assert!(GraphStatus::Complete.is_terminal());
    assert!(GraphStatus::Error.is_terminal());
    assert_eq!(GraphStatus::default(), GraphStatus::Building);
}

#[test]
fn test_parsed_document_deserializes_with_missing_fields() {
    let json = r#"{
        "pages": [
            { "page_number": 1, "text": "Hello", "paragraphs": [ { "content": "Hello", "start": 0, "end": 5 } ] }
        ],
        "metadata": { "title": "Doc" }
    }"#;
    let doc: ParsedDocument = serde_json::from_str(json).unwrap();
    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.pages[0].paragraphs[0].confidence, None);
    assert!(doc.pages[0].text_elements.is_empty());
    assert_eq!(doc.metadata.title.as_deref(), Some("Doc"));
    assert!(doc.metadata.keywords.is_empty());
}

#[test]
fn test_unresolved_resolution_has_zero_confidence() {
    let reference = DetectedReference {
        text: "see Section 9".to_string(),
        start: 0,
        end: 13,
        reference_type: ReferenceType::Section,
        target: "9".to_string(),
        pattern_id: "see_section".to_string(),
        confidence: 0.9,
        context: "see Section 9".to_string(),
    };
    let resolution = ReferenceResolution::unresolved(reference, "nothing numbered 9");
    assert!(!resolution.is_resolved());
    assert_eq!(resolution.confidence, 0.0);
    assert_eq!(resolution.target_id(), None);
    assert_eq!(resolution.reason, "nothing numbered 9");
}
