use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::graph::KnowledgeGraph;
use crate::types::*;

/// Direction for graph traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraversalDirection {
    Outgoing,
    Incoming,
    Both,
}

/// Options controlling graph traversal behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraversalOptions {
    pub max_depth: u32,
    pub edge_types: Option<Vec<EdgeType>>,
    pub node_types: Option<Vec<NodeType>>,
    pub direction: TraversalDirection,
    pub limit: usize,
    pub include_start: bool,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        TraversalOptions {
            max_depth: 2,
            edge_types: None,
            node_types: None,
            direction: TraversalDirection::Both,
            limit: 50,
            include_start: true,
        }
    }
}

/// A subset of a graph's nodes and edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subgraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub roots: Vec<String>,
}

/// Breadth-first neighbourhood extraction, used to gather retrieval context
/// around a node.
pub struct GraphTraverser<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> GraphTraverser<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Performs a breadth-first traversal starting from `start_id`.
    ///
    /// Respects max depth, edge and node type filters, direction, and result
    /// limit. Returns the discovered nodes and the edges used to reach them;
    /// an unknown start id yields an empty subgraph.
    pub fn traverse_bfs(&self, start_id: &str, opts: &TraversalOptions) -> Subgraph {
        let Some(start_node) = self.graph.get_node(start_id) else {
            return Subgraph::default();
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut result_nodes: Vec<GraphNode> = Vec::new();
        let mut result_edges: Vec<GraphEdge> = Vec::new();
        let mut roots: Vec<String> = Vec::new();

        visited.insert(start_id.to_string());
        if opts.include_start && node_matches_filter(start_node, opts) {
            roots.push(start_id.to_string());
            result_nodes.push(start_node.clone());
        }

        // Queue holds (node_id, current_depth).
        let mut queue: VecDeque<(String, u32)> = VecDeque::new();
        queue.push_back((start_id.to_string(), 0));

        let edge_filter = opts.edge_types.as_deref().unwrap_or(&[]);

        'outer: while let Some((current_id, depth)) = queue.pop_front() {
            if depth >= opts.max_depth {
                continue;
            }
            if result_nodes.len() >= opts.limit {
                break;
            }

            for edge in self.edges_for_direction(&current_id, edge_filter, opts.direction) {
                let neighbor_id = neighbor_id(edge, &current_id, opts.direction);
                if !visited.insert(neighbor_id.to_string()) {
                    continue;
                }

                if let Some(neighbor) = self.graph.get_node(neighbor_id) {
                    result_edges.push(edge.clone());
                    if node_matches_filter(neighbor, opts) {
                        result_nodes.push(neighbor.clone());
                        if result_nodes.len() >= opts.limit {
                            break 'outer;
                        }
                    }
                    queue.push_back((neighbor_id.to_string(), depth + 1));
                }
            }
        }

        Subgraph {
            nodes: result_nodes,
            edges: result_edges,
            roots,
        }
    }

    /// Nodes within `depth` hops of `node_id` in either direction, optionally
    /// following only the given edge types.
    pub fn neighborhood(&self, node_id: &str, depth: u32, edge_types: &[EdgeType]) -> Subgraph {
        let opts = TraversalOptions {
            max_depth: depth,
            edge_types: (!edge_types.is_empty()).then(|| edge_types.to_vec()),
            limit: usize::MAX,
            ..TraversalOptions::default()
        };
        self.traverse_bfs(node_id, &opts)
    }

    fn edges_for_direction(
        &self,
        node_id: &str,
        edge_types: &[EdgeType],
        direction: TraversalDirection,
    ) -> Vec<&'a GraphEdge> {
        match direction {
            TraversalDirection::Outgoing => self.graph.outgoing_edges(node_id, edge_types),
            TraversalDirection::Incoming => self.graph.incoming_edges(node_id, edge_types),
            TraversalDirection::Both => {
                let mut edges = self.graph.outgoing_edges(node_id, edge_types);
                edges.extend(self.graph.incoming_edges(node_id, edge_types));
                edges
            }
        }
    }
}

/// Returns the node on the far side of `edge` from `current_id`.
fn neighbor_id<'e>(edge: &'e GraphEdge, current_id: &str, direction: TraversalDirection) -> &'e str {
    match direction {
        TraversalDirection::Outgoing => &edge.target,
        TraversalDirection::Incoming => &edge.source,
        TraversalDirection::Both => {
            if edge.source == current_id {
                &edge.target
            } else {
                &edge.source
            }
        }
    }
}

fn node_matches_filter(node: &GraphNode, opts: &TraversalOptions) -> bool {
    match &opts.node_types {
        Some(types) if !types.is_empty() => types.contains(&node.node_type),
        _ => true,
    }
}
