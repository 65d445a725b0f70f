use std::path::Path;
use std::time::Instant;

use serde_json::json;
use tracing::{debug, info, warn};

use crate::config::{load_config, DocGraphConfig};
use crate::errors::Result;
use crate::graph::{GraphBuilder, GraphFactory, KnowledgeGraph};
use crate::references::ReferenceMatcher;
use crate::resolution::{create_reference_edges, ReferenceResolutionService, ResolutionContext};
use crate::types::*;
use crate::validation::{
    ReferenceValidationService, ValidationReport, REFERENCES_DETECTED_PROPERTY,
    REFERENCES_RESOLVED_PROPERTY,
};

/// Central orchestrator: builds a document graph, links the references
/// found in its text, and scores the result.
pub struct DocGraph {
    config: DocGraphConfig,
    builder: GraphBuilder,
    matcher: ReferenceMatcher,
    resolver: ReferenceResolutionService,
    validator: ReferenceValidationService,
}

/// Result of linking references inside a graph.
#[derive(Debug, Clone, Default)]
pub struct LinkResult {
    /// References detected across all text nodes.
    pub references_detected: usize,
    /// Resolutions confident enough to become edges.
    pub references_resolved: usize,
    /// `references` edges actually added.
    pub edges_added: usize,
    pub resolutions: Vec<ReferenceResolution>,
    /// Time taken in milliseconds.
    pub duration_ms: u64,
}

/// Result of the full pipeline for one document.
pub struct ProcessResult {
    pub graph: KnowledgeGraph,
    pub link: LinkResult,
    pub report: ValidationReport,
}

impl Default for DocGraph {
    fn default() -> Self {
        Self::new(DocGraphConfig::default())
    }
}

impl DocGraph {
    pub fn new(config: DocGraphConfig) -> Self {
        Self {
            builder: GraphBuilder::new(config.builder.clone()),
            matcher: ReferenceMatcher::new(config.matcher.clone()),
            resolver: ReferenceResolutionService::new(),
            validator: ReferenceValidationService::new(config.validation.clone())
                .with_matcher(ReferenceMatcher::new(config.matcher.clone())),
            config,
        }
    }

    /// Loads the configuration from `path` (defaults if it does not exist).
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(load_config(path)?))
    }

    /// Replaces the resolution service, e.g. to register extra strategies.
    pub fn with_resolver(mut self, resolver: ReferenceResolutionService) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &DocGraphConfig {
        &self.config
    }

    pub fn build_graph(&self, document_id: &str, document: &ParsedDocument) -> Result<KnowledgeGraph> {
        self.builder.build(document_id, document)
    }

    /// Detects references in every text node and adds a `references` edge
    /// for each resolution at or above the configured minimum confidence.
    ///
    /// Best-effort: an edge that cannot be added is logged and skipped.
    /// Detected and resolved counts are recorded as graph properties.
    pub fn link_references(&self, graph: &mut KnowledgeGraph) -> LinkResult {
        let start = Instant::now();
        let min_confidence = self.config.resolution.min_edge_confidence;
        let factory = GraphFactory::new(graph.document_id());
        let mut result = LinkResult::default();

        let sources: Vec<GraphNode> = graph
            .nodes()
            .iter()
            .filter(|n| n.is_text_node())
            .cloned()
            .collect();

        for source in &sources {
            let references = self.matcher.find_references(&source.content).references;
            if references.is_empty() {
                continue;
            }
            result.references_detected += references.len();

            let context = ResolutionContext::from_graph(source, graph);
            let summary = self.resolver.resolve_all(&references, &context, graph);
            result.references_resolved += summary
                .resolutions
                .iter()
                .filter(|r| r.is_resolved() && r.confidence >= min_confidence)
                .count();

            let edges =
                create_reference_edges(&summary.resolutions, &source.id, min_confidence, &factory);
            for edge in edges {
                if graph.contains_edge(&edge.id) {
                    continue;
                }
                match graph.add_edge(edge) {
                    Ok(()) => result.edges_added += 1,
                    Err(e) => warn!(source = %source.id, error = %e, "could not add reference edge"),
                }
            }
            debug!(
                source = %source.id,
                detected = summary.total,
                resolved = summary.resolved_count,
                "linked references"
            );
            result.resolutions.extend(summary.resolutions);
        }

        graph.set_property(
            REFERENCES_DETECTED_PROPERTY,
            json!(result.references_detected),
        );
        graph.set_property(
            REFERENCES_RESOLVED_PROPERTY,
            json!(result.references_resolved),
        );
        result.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            graph_id = graph.id(),
            detected = result.references_detected,
            resolved = result.references_resolved,
            edges = result.edges_added,
            "reference linking finished"
        );
        result
    }

    pub fn validate(&self, graph: &KnowledgeGraph) -> ValidationReport {
        self.validator.validate_graph(graph)
    }

    /// Builds, links and validates one document.
    ///
    /// A build failure is returned as an error; a low validation score is
    /// only reported.
    pub fn process_document(
        &self,
        document_id: &str,
        document: &ParsedDocument,
    ) -> Result<ProcessResult> {
        let mut graph = self.build_graph(document_id, document)?;
        let link = self.link_references(&mut graph);
        let report = self.validate(&graph);
        if !report.passed() {
            warn!(
                document_id,
                score = report.overall_score,
                "document graph failed validation"
            );
        }
        Ok(ProcessResult {
            graph,
            link,
            report,
        })
    }
}
