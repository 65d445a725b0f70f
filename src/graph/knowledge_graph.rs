use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{DocGraphError, Result};
use crate::graph::factory::{validate_edge, validate_node};
use crate::graph::keywords::extract_keywords;
use crate::types::*;

/// Plain nested form of a graph, suitable for storage and reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedGraph {
    pub id: String,
    pub document_id: String,
    pub metadata: GraphMetadata,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

/// Outcome of a structural audit. Produced by [`KnowledgeGraph::validate`],
/// which never fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    pub duplicate_node_ids: usize,
    pub duplicate_edge_ids: usize,
    pub dangling_edges: usize,
    pub self_loops: usize,
    pub orphaned_nodes: usize,
}

/// In-memory graph of one document's content nodes and their relations.
///
/// Nodes keep insertion order. Besides the node/edge lists the graph keeps
/// id maps, type/page/keyword indices and an adjacency list (source id ->
/// target ids), all updated eagerly on every mutation together with the
/// derived [`GraphStatistics`].
#[derive(Debug, Clone)]
pub struct KnowledgeGraph {
    id: String,
    document_id: String,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    node_index: HashMap<String, usize>,
    edge_index: HashMap<String, usize>,
    by_type: HashMap<NodeType, Vec<String>>,
    by_page: BTreeMap<u32, Vec<String>>,
    by_keyword: HashMap<String, Vec<String>>,
    adjacency: HashMap<String, Vec<String>>,
    degrees: HashMap<String, usize>,
    metadata: GraphMetadata,
}

// ---------------------------------------------------------------------------
// Construction and accessors
// ---------------------------------------------------------------------------

impl KnowledgeGraph {
    /// Creates an empty graph in the `Building` state.
    pub fn new(id: &str, document_id: &str) -> Self {
        let now = current_timestamp();
        Self {
            id: id.to_string(),
            document_id: document_id.to_string(),
            nodes: Vec::new(),
            edges: Vec::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            by_type: HashMap::new(),
            by_page: BTreeMap::new(),
            by_keyword: HashMap::new(),
            adjacency: HashMap::new(),
            degrees: HashMap::new(),
            metadata: GraphMetadata {
                status: GraphStatus::Building,
                created_at: now,
                updated_at: now,
                ..GraphMetadata::default()
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn status(&self) -> GraphStatus {
        self.metadata.status
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn statistics(&self) -> &GraphStatistics {
        &self.metadata.statistics
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn get_edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edge_index.get(id).map(|&i| &self.edges[i])
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    /// Sets a graph-level metadata property.
    pub fn set_property(&mut self, key: &str, value: serde_json::Value) {
        self.metadata.properties.insert(key.to_string(), value);
        self.metadata.updated_at = current_timestamp();
    }

    pub fn set_build_time(&mut self, build_time_ms: u64) {
        self.metadata.build_time_ms = Some(build_time_ms);
    }
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

impl KnowledgeGraph {
    /// Adds a validated node and indexes it.
    ///
    /// Fails on a duplicate id or on any node invariant violation.
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        validate_node(&node)?;
        if self.node_index.contains_key(&node.id) {
            return Err(DocGraphError::DuplicateId {
                kind: "node".to_string(),
                id: node.id,
            });
        }

        let id = node.id.clone();
        self.by_type.entry(node.node_type).or_default().push(id.clone());
        self.by_page
            .entry(node.position.page)
            .or_default()
            .push(id.clone());
        for keyword in node_keywords(&node) {
            self.by_keyword.entry(keyword).or_default().push(id.clone());
        }
        self.adjacency.entry(id.clone()).or_default();
        self.degrees.insert(id.clone(), 0);
        self.node_index.insert(id.clone(), self.nodes.len());
        debug!(node_id = %id, node_type = node.node_type.as_str(), "added node");
        self.nodes.push(node);

        self.touch();
        Ok(())
    }

    /// Removes a node, every index entry for it, and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let index = self.node_index.remove(id)?;
        let node = self.nodes.remove(index);
        self.reindex_nodes();

        remove_id(self.by_type.get_mut(&node.node_type), id);
        remove_id(self.by_page.get_mut(&node.position.page), id);
        for keyword in node_keywords(&node) {
            remove_id(self.by_keyword.get_mut(&keyword), id);
            if self.by_keyword.get(&keyword).is_some_and(|ids| ids.is_empty()) {
                self.by_keyword.remove(&keyword);
            }
        }

        let incident: Vec<String> = self
            .edges
            .iter()
            .filter(|e| e.touches(id))
            .map(|e| e.id.clone())
            .collect();
        for edge_id in &incident {
            self.detach_edge(edge_id);
        }

        self.adjacency.remove(id);
        self.degrees.remove(id);
        debug!(
            node_id = %id,
            removed_edges = incident.len(),
            "removed node"
        );

        self.touch();
        Some(node)
    }

    /// Adds a validated edge between two existing nodes.
    ///
    /// Fails if either endpoint is missing, the edge is a self-loop, its
    /// weight is out of range, or its id is already present.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<()> {
        validate_edge(&edge)?;
        if !self.node_index.contains_key(&edge.source) {
            return Err(DocGraphError::structure(format!(
                "edge '{}' references missing source node '{}'",
                edge.id, edge.source
            )));
        }
        if !self.node_index.contains_key(&edge.target) {
            return Err(DocGraphError::structure(format!(
                "edge '{}' references missing target node '{}'",
                edge.id, edge.target
            )));
        }
        if self.edge_index.contains_key(&edge.id) {
            return Err(DocGraphError::DuplicateId {
                kind: "edge".to_string(),
                id: edge.id,
            });
        }

        self.adjacency
            .entry(edge.source.clone())
            .or_default()
            .push(edge.target.clone());
        *self.degrees.entry(edge.source.clone()).or_default() += 1;
        *self.degrees.entry(edge.target.clone()).or_default() += 1;
        self.bump_updated_at(&[edge.source.as_str(), edge.target.as_str()]);
        debug!(
            edge_id = %edge.id,
            edge_type = edge.edge_type.as_str(),
            source = %edge.source,
            target = %edge.target,
            "added edge"
        );
        self.edge_index.insert(edge.id.clone(), self.edges.len());
        self.edges.push(edge);

        self.touch();
        Ok(())
    }

    /// Removes an edge and its adjacency entry.
    pub fn remove_edge(&mut self, id: &str) -> Option<GraphEdge> {
        let edge = self.detach_edge(id)?;
        self.touch();
        Some(edge)
    }

    /// Unlinks an edge without recomputing statistics.
    fn detach_edge(&mut self, id: &str) -> Option<GraphEdge> {
        let index = self.edge_index.remove(id)?;
        let edge = self.edges.remove(index);
        self.reindex_edges();

        if let Some(targets) = self.adjacency.get_mut(&edge.source) {
            if let Some(pos) = targets.iter().position(|t| *t == edge.target) {
                targets.remove(pos);
            }
        }
        for endpoint in [&edge.source, &edge.target] {
            if let Some(degree) = self.degrees.get_mut(endpoint) {
                *degree = degree.saturating_sub(1);
            }
        }
        self.bump_updated_at(&[edge.source.as_str(), edge.target.as_str()]);
        Some(edge)
    }

    fn reindex_nodes(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }

    fn reindex_edges(&mut self) {
        self.edge_index = self
            .edges
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
    }

    /// Records a structural edit on the given nodes.
    fn bump_updated_at(&mut self, ids: &[&str]) {
        let now = current_timestamp();
        for id in ids {
            if let Some(&i) = self.node_index.get(*id) {
                self.nodes[i].updated_at = now;
            }
        }
    }

    fn touch(&mut self) {
        self.metadata.updated_at = current_timestamp();
        self.recompute_statistics();
    }

    fn recompute_statistics(&mut self) {
        let node_count = self.nodes.len();
        let edge_count = self.edges.len();

        let mut nodes_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for node in &self.nodes {
            *nodes_by_type
                .entry(node.node_type.as_str().to_string())
                .or_default() += 1;
        }
        let mut edges_by_type: BTreeMap<String, usize> = BTreeMap::new();
        for edge in &self.edges {
            *edges_by_type
                .entry(edge.edge_type.as_str().to_string())
                .or_default() += 1;
        }

        let total_degree: usize = self.degrees.values().sum();
        let max_degree = self.degrees.values().copied().max().unwrap_or(0);
        let isolated_components = self.degrees.values().filter(|&&d| d == 0).count();

        let average_degree = if node_count > 0 {
            total_degree as f64 / node_count as f64
        } else {
            0.0
        };
        let possible_pairs = node_count.saturating_mul(node_count.saturating_sub(1));
        let density = if possible_pairs > 0 {
            edge_count as f64 / possible_pairs as f64
        } else {
            0.0
        };

        self.metadata.statistics = GraphStatistics {
            node_count,
            edge_count,
            nodes_by_type,
            edges_by_type,
            average_degree,
            max_degree,
            density,
            isolated_components,
        };
    }
}

fn remove_id(ids: Option<&mut Vec<String>>, id: &str) {
    if let Some(ids) = ids {
        ids.retain(|x| x != id);
    }
}

fn node_keywords(node: &GraphNode) -> Vec<String> {
    extract_keywords(&format!("{} {}", node.label, node.content))
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl KnowledgeGraph {
    /// Targets of the node's outgoing edges, each listed once.
    pub fn get_neighbors(&self, id: &str) -> Vec<&GraphNode> {
        let mut seen = HashSet::new();
        self.adjacency
            .get(id)
            .into_iter()
            .flatten()
            .filter(|target| seen.insert(target.as_str()))
            .filter_map(|target| self.get_node(target))
            .collect()
    }

    /// Sources of the node's incoming edges, each listed once.
    pub fn get_incoming(&self, id: &str) -> Vec<&GraphNode> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .filter(|e| seen.insert(e.source.as_str()))
            .filter_map(|e| self.get_node(&e.source))
            .collect()
    }

    /// Number of edges touching the node (incoming plus outgoing).
    pub fn get_degree(&self, id: &str) -> usize {
        self.degrees.get(id).copied().unwrap_or(0)
    }

    /// Outgoing edges of a node, optionally restricted to some edge types.
    pub fn outgoing_edges(&self, id: &str, edge_types: &[EdgeType]) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.source == id)
            .filter(|e| edge_types.is_empty() || edge_types.contains(&e.edge_type))
            .collect()
    }

    /// Incoming edges of a node, optionally restricted to some edge types.
    pub fn incoming_edges(&self, id: &str, edge_types: &[EdgeType]) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.target == id)
            .filter(|e| edge_types.is_empty() || edge_types.contains(&e.edge_type))
            .collect()
    }

    pub fn edges_by_type(&self, edge_type: EdgeType) -> Vec<&GraphEdge> {
        self.edges
            .iter()
            .filter(|e| e.edge_type == edge_type)
            .collect()
    }

    pub fn get_nodes_by_type(&self, node_type: NodeType) -> Vec<&GraphNode> {
        self.lookup(self.by_type.get(&node_type))
    }

    pub fn get_nodes_by_page(&self, page: u32) -> Vec<&GraphNode> {
        self.lookup(self.by_page.get(&page))
    }

    /// Nodes whose label or content contains the keyword (case-insensitive).
    pub fn get_nodes_by_keyword(&self, keyword: &str) -> Vec<&GraphNode> {
        self.lookup(self.by_keyword.get(&keyword.trim().to_lowercase()))
    }

    /// Page numbers that have at least one node, ascending.
    pub fn pages(&self) -> Vec<u32> {
        self.by_page
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(page, _)| *page)
            .collect()
    }

    fn lookup(&self, ids: Option<&Vec<String>>) -> Vec<&GraphNode> {
        ids.into_iter()
            .flatten()
            .filter_map(|id| self.get_node(id))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Lifecycle, validation and serialization
// ---------------------------------------------------------------------------

impl KnowledgeGraph {
    /// Moves the graph to `Complete` and audits it.
    ///
    /// Audit failures are logged, not returned. Fails only if the graph has
    /// already reached a terminal state.
    pub fn complete(&mut self) -> Result<()> {
        self.ensure_building("complete")?;
        self.metadata.status = GraphStatus::Complete;
        self.metadata.updated_at = current_timestamp();

        let report = self.validate();
        if !report.is_valid {
            warn!(
                graph_id = %self.id,
                errors = ?report.errors,
                "graph completed with structural errors"
            );
        }
        info!(
            graph_id = %self.id,
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            "graph complete"
        );
        Ok(())
    }

    /// Moves the graph to `Error`, recording the reason.
    pub fn mark_error(&mut self, reason: &str) -> Result<()> {
        self.ensure_building("mark as errored")?;
        self.metadata.status = GraphStatus::Error;
        self.metadata.error = Some(reason.to_string());
        self.metadata.updated_at = current_timestamp();
        warn!(graph_id = %self.id, reason, "graph marked as errored");
        Ok(())
    }

    fn ensure_building(&self, action: &str) -> Result<()> {
        if self.metadata.status.is_terminal() {
            return Err(DocGraphError::State {
                message: format!(
                    "cannot {} graph '{}' in terminal state '{}'",
                    action,
                    self.id,
                    self.metadata.status.as_str()
                ),
            });
        }
        Ok(())
    }

    /// Full structural audit. Never fails; problems are reported as
    /// errors (invalidating) or warnings (informational).
    pub fn validate(&self) -> GraphValidationReport {
        let mut report = GraphValidationReport {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
            ..GraphValidationReport::default()
        };

        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                report.duplicate_node_ids += 1;
                report
                    .errors
                    .push(format!("duplicate node id '{}'", node.id));
            }
        }

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                report.duplicate_edge_ids += 1;
                report
                    .errors
                    .push(format!("duplicate edge id '{}'", edge.id));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    report.dangling_edges += 1;
                    report.errors.push(format!(
                        "edge '{}' references missing node '{}'",
                        edge.id, endpoint
                    ));
                }
            }
            if edge.source == edge.target {
                report.self_loops += 1;
                report
                    .errors
                    .push(format!("edge '{}' is self-referencing", edge.id));
            }
        }

        let connected: HashSet<&str> = self
            .edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        report.orphaned_nodes = self
            .nodes
            .iter()
            .filter(|n| !connected.contains(n.id.as_str()))
            .count();
        if report.orphaned_nodes > 0 {
            report.warnings.push(format!(
                "{} orphaned node(s) with no incident edges",
                report.orphaned_nodes
            ));
        }

        report.is_valid = report.errors.is_empty();
        report
    }

    /// Plain nested copy of the graph's metadata, nodes and edges.
    pub fn serialize(&self) -> SerializedGraph {
        SerializedGraph {
            id: self.id.clone(),
            document_id: self.document_id.clone(),
            metadata: self.metadata.clone(),
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Rebuilds a graph from [`KnowledgeGraph::serialize`] output, re-running
    /// every node and edge check.
    pub fn from_serialized(serialized: SerializedGraph) -> Result<Self> {
        let mut graph = KnowledgeGraph::new(&serialized.id, &serialized.document_id);
        for node in serialized.nodes {
            graph.add_node(node)?;
        }
        for edge in serialized.edges {
            graph.add_edge(edge)?;
        }

        let statistics = graph.metadata.statistics.clone();
        graph.metadata = GraphMetadata {
            statistics,
            ..serialized.metadata
        };
        Ok(graph)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.serialize())?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let serialized: SerializedGraph = serde_json::from_str(json)?;
        Self::from_serialized(serialized)
    }
}
