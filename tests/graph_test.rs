use docgraph::errors::DocGraphError;
use docgraph::graph::*;
use docgraph::types::*;

/// Builds a small graph: document -> page 1 -> two paragraphs, with a
/// follows edge between the paragraphs. Returns the graph and the ids of
/// (document, page, first paragraph, second paragraph).
fn setup_graph() -> (KnowledgeGraph, [String; 4]) {
    let mut factory = GraphFactory::new("doc-1");
    let mut graph = KnowledgeGraph::new("graph:test", "doc-1");

    let doc = factory
        .create_document("Report", 1, 200, Properties::new())
        .unwrap();
    let page = factory.create_page(1, "Neural retrieval methods").unwrap();
    let p1 = factory
        .create_paragraph("Neural retrieval improves recall.", 1, 0, 33, None)
        .unwrap();
    let p2 = factory
        .create_paragraph("Sparse methods remain strong baselines.", 1, 40, 79, None)
        .unwrap();
    let ids = [doc.id.clone(), page.id.clone(), p1.id.clone(), p2.id.clone()];

    for node in [doc, page, p1, p2] {
        graph.add_node(node).unwrap();
    }
    graph
        .add_edge(factory.create_contains(&ids[0], &ids[1], None).unwrap())
        .unwrap();
    graph
        .add_edge(factory.create_contains(&ids[1], &ids[2], None).unwrap())
        .unwrap();
    graph
        .add_edge(factory.create_contains(&ids[1], &ids[3], None).unwrap())
        .unwrap();
    graph
        .add_edge(factory.create_follows(&ids[2], &ids[3], None).unwrap())
        .unwrap();
    (graph, ids)
}

#[test]
fn test_new_graph_is_building_and_empty() {
    let graph = KnowledgeGraph::new("g", "d");
    assert_eq!(graph.status(), GraphStatus::Building);
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.statistics().node_count, 0);
    assert_eq!(graph.statistics().density, 0.0);
}

#[test]
fn test_counts_and_statistics() {
    let (graph, ids) = setup_graph();
    let stats = graph.statistics();
    assert_eq!(stats.node_count, 4);
    assert_eq!(stats.edge_count, 4);
    assert_eq!(graph.node_count(), graph.nodes().len());
    assert_eq!(graph.edge_count(), graph.edges().len());
    assert_eq!(stats.nodes_by_type.get("paragraph"), Some(&2));
    assert_eq!(stats.nodes_by_type.get("section"), Some(&1));
    assert_eq!(stats.edges_by_type.get("contains"), Some(&3));
    assert_eq!(stats.edges_by_type.get("follows"), Some(&1));
    // page: in 1 + out 2
    assert_eq!(stats.max_degree, 3);
    assert_eq!(graph.get_degree(&ids[1]), 3);
    assert!((stats.average_degree - 2.0).abs() < 1e-9);
    assert!((stats.density - 4.0 / 12.0).abs() < 1e-9);
    assert_eq!(stats.isolated_components, 0);
}

#[test]
fn test_duplicate_node_is_rejected() {
    let (mut graph, ids) = setup_graph();
    let existing = graph.get_node(&ids[2]).unwrap().clone();
    match graph.add_node(existing) {
        Err(DocGraphError::DuplicateId { kind, id }) => {
            assert_eq!(kind, "node");
            assert_eq!(id, ids[2]);
        }
        other => panic!("expected duplicate id error, got {:?}", other),
    }
    assert_eq!(graph.node_count(), 4);
}

#[test]
fn test_add_node_validates() {
    let (mut graph, ids) = setup_graph();
    let mut bad = graph.get_node(&ids[2]).unwrap().clone();
    bad.id = "paragraph:bad".to_string();
    bad.metadata.confidence = 2.0;
    assert!(matches!(
        graph.add_node(bad),
        Err(DocGraphError::Validation { .. })
    ));
}

#[test]
fn test_edge_requires_existing_endpoints() {
    let (mut graph, ids) = setup_graph();
    let factory = GraphFactory::new("doc-1");
    let edge = factory
        .create_follows(&ids[3], "paragraph:missing", None)
        .unwrap();
    assert!(matches!(
        graph.add_edge(edge),
        Err(DocGraphError::Structure { .. })
    ));
    assert_eq!(graph.edge_count(), 4);
}

#[test]
fn test_duplicate_edge_is_rejected() {
    let (mut graph, ids) = setup_graph();
    let factory = GraphFactory::new("doc-1");
    let again = factory.create_follows(&ids[2], &ids[3], None).unwrap();
    assert!(graph.contains_edge(&again.id));
    assert!(matches!(
        graph.add_edge(again),
        Err(DocGraphError::DuplicateId { .. })
    ));
}

#[test]
fn test_remove_node_cascades_incident_edges() {
    let (mut graph, ids) = setup_graph();
    // The second paragraph has two incident edges: contains (from page)
    // and follows (from the first paragraph).
    let removed = graph.remove_node(&ids[3]).unwrap();
    assert_eq!(removed.id, ids[3]);
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.statistics().edge_count, 2);
    assert!(graph.edges().iter().all(|e| !e.touches(&ids[3])));
    assert_eq!(graph.get_degree(&ids[1]), 2);
    assert!(graph.get_nodes_by_type(NodeType::Paragraph).len() == 1);
    assert!(graph.get_nodes_by_keyword("sparse").is_empty());
}

#[test]
fn test_remove_missing_returns_none() {
    let (mut graph, _) = setup_graph();
    assert!(graph.remove_node("paragraph:nope").is_none());
    assert!(graph.remove_edge("follows:nope").is_none());
}

#[test]
fn test_remove_edge_updates_degrees() {
    let (mut graph, ids) = setup_graph();
    let follows = graph.edges_by_type(EdgeType::Follows)[0].id.clone();
    let removed = graph.remove_edge(&follows).unwrap();
    assert_eq!(removed.edge_type, EdgeType::Follows);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.get_degree(&ids[2]), 1);
    assert!(graph.get_neighbors(&ids[2]).is_empty());
}

#[test]
fn test_counts_match_after_mixed_mutations() {
    let (mut graph, ids) = setup_graph();
    let mut factory = GraphFactory::new("doc-1");
    let extra = factory
        .create_paragraph("Late addition.", 1, 90, 104, None)
        .unwrap();
    let extra_id = extra.id.clone();
    graph.add_node(extra).unwrap();
    graph
        .add_edge(factory.create_follows(&ids[3], &extra_id, None).unwrap())
        .unwrap();
    graph.remove_node(&ids[2]);
    graph.remove_node(&extra_id);

    assert_eq!(graph.node_count(), graph.nodes().len());
    assert_eq!(graph.edge_count(), graph.edges().len());
    assert_eq!(graph.statistics().node_count, 3);
    assert_eq!(graph.statistics().edge_count, 2);
    for edge in graph.edges() {
        assert!(graph.contains_node(&edge.source));
        assert!(graph.contains_node(&edge.target));
    }
}

#[test]
fn test_lookups() {
    let (graph, ids) = setup_graph();
    assert_eq!(graph.get_nodes_by_page(1).len(), 4);
    assert!(graph.get_nodes_by_page(2).is_empty());
    assert_eq!(graph.pages(), vec![1]);

    let neural = graph.get_nodes_by_keyword("Neural");
    assert!(neural.iter().any(|n| n.id == ids[2]));
    assert!(neural.iter().any(|n| n.id == ids[1]));

    let neighbors: Vec<&str> = graph
        .get_neighbors(&ids[1])
        .iter()
        .map(|n| n.id.as_str())
        .collect();
    assert_eq!(neighbors, vec![ids[2].as_str(), ids[3].as_str()]);

    let incoming = graph.get_incoming(&ids[3]);
    assert_eq!(incoming.len(), 2);
    assert_eq!(graph.outgoing_edges(&ids[2], &[EdgeType::Follows]).len(), 1);
    assert_eq!(graph.incoming_edges(&ids[3], &[EdgeType::Contains]).len(), 1);
}

#[test]
fn test_lifecycle_transitions() {
    let (mut graph, _) = setup_graph();
    graph.complete().unwrap();
    assert_eq!(graph.status(), GraphStatus::Complete);
    assert!(matches!(
        graph.complete(),
        Err(DocGraphError::State { .. })
    ));
    assert!(matches!(
        graph.mark_error("late failure"),
        Err(DocGraphError::State { .. })
    ));
}

#[test]
fn test_mark_error_records_reason() {
    let mut graph = KnowledgeGraph::new("g", "d");
    graph.mark_error("parser exploded").unwrap();
    assert_eq!(graph.status(), GraphStatus::Error);
    assert_eq!(graph.metadata().error.as_deref(), Some("parser exploded"));
    assert!(graph.complete().is_err());
}

#[test]
fn test_validate_reports_orphans_as_warnings() {
    let (mut graph, _) = setup_graph();
    let mut factory = GraphFactory::new("doc-1");
    graph
        .add_node(factory.create_metadata("language", "en").unwrap())
        .unwrap();

    let report = graph.validate();
    assert!(report.is_valid);
    assert!(report.errors.is_empty());
    assert_eq!(report.orphaned_nodes, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(graph.statistics().isolated_components, 1);
}

#[test]
fn test_serialize_and_rebuild() {
    let (mut graph, ids) = setup_graph();
    graph.set_property("source", serde_json::json!("unit-test"));
    graph.complete().unwrap();

    let json = graph.to_json().unwrap();
    let rebuilt = KnowledgeGraph::from_json(&json).unwrap();
    assert_eq!(rebuilt.id(), graph.id());
    assert_eq!(rebuilt.document_id(), "doc-1");
    assert_eq!(rebuilt.status(), GraphStatus::Complete);
    assert_eq!(rebuilt.node_count(), 4);
    assert_eq!(rebuilt.edge_count(), 4);
    assert_eq!(rebuilt.statistics(), graph.statistics());
    assert_eq!(
        rebuilt.metadata().properties.get("source"),
        Some(&serde_json::json!("unit-test"))
    );
    assert_eq!(rebuilt.get_degree(&ids[1]), 3);
}

#[test]
fn test_from_serialized_rejects_dangling_edges() {
    let (graph, ids) = setup_graph();
    let mut serialized = graph.serialize();
    serialized.nodes.retain(|n| n.id != ids[3]);
    assert!(matches!(
        KnowledgeGraph::from_serialized(serialized),
        Err(DocGraphError::Structure { .. })
    ));
}

#[test]
fn test_traverse_outgoing_with_depth() {
    let (graph, ids) = setup_graph();
    let traverser = GraphTraverser::new(&graph);
    let opts = TraversalOptions {
        max_depth: 1,
        direction: TraversalDirection::Outgoing,
        ..TraversalOptions::default()
    };
    let sub = traverser.traverse_bfs(&ids[0], &opts);
    assert_eq!(sub.roots, vec![ids[0].clone()]);
    assert_eq!(sub.nodes.len(), 2);
    assert_eq!(sub.edges.len(), 1);
}

#[test]
fn test_neighborhood_filters_edge_types() {
    let (graph, ids) = setup_graph();
    let traverser = GraphTraverser::new(&graph);

    let all = traverser.neighborhood(&ids[2], 2, &[]);
    assert_eq!(all.nodes.len(), 4);

    let follows_only = traverser.neighborhood(&ids[2], 2, &[EdgeType::Follows]);
    let found: Vec<&str> = follows_only.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(found, vec![ids[2].as_str(), ids[3].as_str()]);
}

#[test]
fn test_traverse_unknown_start_is_empty() {
    let (graph, _) = setup_graph();
    let sub = GraphTraverser::new(&graph).traverse_bfs("nope", &TraversalOptions::default());
    assert!(sub.nodes.is_empty());
    assert!(sub.edges.is_empty());
}

#[test]
fn test_extract_keywords() {
    let keywords = extract_keywords("The Transformer and the transformer, see 2024 results!");
    assert_eq!(keywords, vec!["transformer".to_string(), "results".to_string()]);
}
