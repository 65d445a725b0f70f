use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::graph::{GraphFactory, KnowledgeGraph};
use crate::resolution::strategies::{
    default_strategies, ResolutionContext, ResolutionStrategy, SemanticFallbackStrategy,
    SemanticMatcher, StrategyMatch,
};
use crate::types::*;

/// Outcome of resolving a batch of references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub resolutions: Vec<ReferenceResolution>,
    pub total: usize,
    pub resolved_count: usize,
    pub unresolved: Vec<DetectedReference>,
}

/// Resolves detected references to nodes of a [`KnowledgeGraph`].
///
/// Every strategy that supports the reference's type is tried, highest
/// priority first. The highest-confidence candidate wins (ties go to the
/// strategy tried first) and every other candidate is reported as an
/// alternative. Resolution never fails: a strategy error is logged and
/// skipped, and the worst case is a confidence-0 result with a reason.
pub struct ReferenceResolutionService {
    strategies: Vec<Box<dyn ResolutionStrategy>>,
}

impl Default for ReferenceResolutionService {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceResolutionService {
    /// A service with the built-in strategies.
    pub fn new() -> Self {
        Self {
            strategies: default_strategies(),
        }
    }

    /// Replaces the default semantic fallback with one backed by `matcher`.
    pub fn with_semantic_matcher(mut self, matcher: Box<dyn SemanticMatcher>) -> Self {
        let fallback = SemanticFallbackStrategy::new(matcher);
        self.strategies.retain(|s| s.name() != fallback.name());
        self.register_strategy(Box::new(fallback));
        self
    }

    pub fn with_strategy(mut self, strategy: Box<dyn ResolutionStrategy>) -> Self {
        self.register_strategy(strategy);
        self
    }

    /// Adds a strategy, keeping attempts ordered by priority.
    pub fn register_strategy(&mut self, strategy: Box<dyn ResolutionStrategy>) {
        self.strategies.push(strategy);
        self.strategies.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    }

    /// Strategy names in attempt order.
    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve_reference(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> ReferenceResolution {
        let applicable: Vec<&dyn ResolutionStrategy> = self
            .strategies
            .iter()
            .map(|s| s.as_ref())
            .filter(|s| s.supports(reference.reference_type))
            .collect();
        if applicable.is_empty() {
            return ReferenceResolution::unresolved(
                reference.clone(),
                format!(
                    "no resolution strategy supports {} references",
                    reference.reference_type.as_str()
                ),
            );
        }

        let mut best: Option<(StrategyMatch, &str)> = None;
        let mut candidate_ids: Vec<String> = Vec::new();

        for strategy in applicable {
            let found = match strategy.resolve(reference, context, graph) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        reference = %reference.text,
                        error = %e,
                        "resolution strategy failed; skipping"
                    );
                    continue;
                }
            };
            if !graph.contains_node(&found.node_id) {
                warn!(
                    strategy = strategy.name(),
                    node_id = %found.node_id,
                    "strategy returned an unknown node; ignoring"
                );
                continue;
            }
            debug!(
                strategy = strategy.name(),
                target = %found.node_id,
                confidence = found.confidence,
                "candidate found"
            );

            candidate_ids.push(found.node_id.clone());
            candidate_ids.extend(found.alternatives.iter().cloned());
            let better = match &best {
                Some((current, _)) => found.confidence > current.confidence,
                None => true,
            };
            if better {
                best = Some((found, strategy.name()));
            }
        }

        let Some((winner, strategy_name)) = best else {
            return ReferenceResolution::unresolved(
                reference.clone(),
                format!(
                    "no {} target matched '{}'",
                    reference.reference_type.as_str(),
                    reference.target
                ),
            );
        };

        let mut seen = HashSet::new();
        seen.insert(winner.node_id.clone());
        let alternatives = candidate_ids
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .filter_map(|id| graph.get_node(&id).cloned())
            .collect();

        ReferenceResolution {
            reference: reference.clone(),
            target: graph.get_node(&winner.node_id).cloned(),
            confidence: winner.confidence.clamp(0.0, 1.0),
            reason: winner.reason,
            strategy: Some(strategy_name.to_string()),
            alternatives,
        }
    }

    /// Resolves a batch of references found in the same source node.
    pub fn resolve_all(
        &self,
        references: &[DetectedReference],
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> ResolutionSummary {
        let total = references.len();
        let mut resolutions = Vec::with_capacity(total);
        let mut unresolved = Vec::new();

        for reference in references {
            let resolution = self.resolve_reference(reference, context, graph);
            if !resolution.is_resolved() {
                unresolved.push(reference.clone());
            }
            resolutions.push(resolution);
        }

        ResolutionSummary {
            resolved_count: total - unresolved.len(),
            resolutions,
            total,
            unresolved,
        }
    }
}

/// Converts resolutions into `references` edges from `source_id`.
///
/// Skips unresolved results, results below `min_confidence`, self-references
/// and repeats of an edge already produced.
pub fn create_reference_edges(
    resolutions: &[ReferenceResolution],
    source_id: &str,
    min_confidence: f64,
    factory: &GraphFactory,
) -> Vec<GraphEdge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for resolution in resolutions {
        let Some(target_id) = resolution.target_id() else {
            continue;
        };
        if resolution.confidence < min_confidence || target_id == source_id {
            continue;
        }

        let reference = &resolution.reference;
        let mut metadata = Properties::new();
        metadata.insert(
            "reference_type".to_string(),
            json!(reference.reference_type.as_str()),
        );
        metadata.insert("reference_text".to_string(), json!(reference.text));
        metadata.insert("target".to_string(), json!(reference.target));
        metadata.insert("context".to_string(), json!(reference.context));
        metadata.insert("reason".to_string(), json!(resolution.reason));
        if let Some(strategy) = &resolution.strategy {
            metadata.insert("strategy".to_string(), json!(strategy));
        }

        match factory.create_reference(source_id, target_id, resolution.confidence, metadata) {
            Ok(edge) => {
                if seen.insert(edge.id.clone()) {
                    edges.push(edge);
                }
            }
            Err(e) => warn!(source = source_id, target = target_id, error = %e, "skipping reference edge"),
        }
    }

    edges
}
