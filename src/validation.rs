//! Quality scoring for built graphs and for raw detection/resolution
//! batches.
//!
//! Nothing here fails: every shortfall becomes a [`ValidationIssue`] and,
//! where a threshold is breached, a recommendation.

use std::collections::{BTreeMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ValidationThresholds;
use crate::graph::KnowledgeGraph;
use crate::references::ReferenceMatcher;
use crate::types::*;

/// Graph property holding the number of references the pipeline detected.
pub const REFERENCES_DETECTED_PROPERTY: &str = "references_detected";
/// Graph property holding the number of references that produced an edge.
pub const REFERENCES_RESOLVED_PROPERTY: &str = "references_resolved";

/// A reference keyword followed by a number: a likely reference site.
static REFERENCE_MENTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sect?\.|section|chapter|figure|fig\.|table|tab\.|page|pp?\.)\s*\d|§\s*\d|\[\d")
        .expect("reference mention regex is valid")
});

static TIME_AFTER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:\d{2}").expect("time regex is valid"));

static VERSION_BEFORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bv|\bversion\s)$").expect("version regex is valid"));

/// Heuristic detection quality, estimated without ground truth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionMetrics {
    pub total_references: usize,
    /// References that look like times, versions, amounts or percentages.
    pub suspicious_references: usize,
    /// Places where a reference keyword appears in the text.
    pub reference_mentions: usize,
    pub estimated_precision: f64,
    pub estimated_recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionMetrics {
    pub total_references: usize,
    pub resolved_references: usize,
    pub resolution_rate: f64,
    pub average_confidence: f64,
    /// Successful resolutions per reference type.
    pub resolved_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphQualityMetrics {
    pub reference_edges: usize,
    pub text_nodes: usize,
    pub average_edge_weight: f64,
    /// Reference edges per text node.
    pub edge_density: f64,
    pub isolated_components: usize,
    /// Fraction of text nodes touched by at least one reference edge.
    pub connectivity_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    Detection,
    Resolution,
    Graph,
    Performance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub severity: IssueSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Weighted quality score in `[0, 1]`.
    pub overall_score: f64,
    pub detection: DetectionMetrics,
    pub resolution: ResolutionMetrics,
    /// Absent for batches validated without a graph.
    pub graph: Option<GraphQualityMetrics>,
    pub issues: Vec<ValidationIssue>,
    pub recommendations: Vec<String>,
}

impl ValidationReport {
    /// `true` when no issue has error severity.
    pub fn passed(&self) -> bool {
        !self
            .issues
            .iter()
            .any(|i| i.severity == IssueSeverity::Error)
    }

    pub fn issues_in(&self, category: IssueCategory) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.category == category)
            .collect()
    }

    fn issue(&mut self, category: IssueCategory, severity: IssueSeverity, message: String) {
        self.issues.push(ValidationIssue {
            category,
            severity,
            message,
        });
    }

    fn recommend(&mut self, recommendation: &str) {
        if !self.recommendations.iter().any(|r| r == recommendation) {
            self.recommendations.push(recommendation.to_string());
        }
    }
}

/// Scores graphs and reference batches against [`ValidationThresholds`].
pub struct ReferenceValidationService {
    thresholds: ValidationThresholds,
    matcher: ReferenceMatcher,
}

impl Default for ReferenceValidationService {
    fn default() -> Self {
        Self::new(ValidationThresholds::default())
    }
}

impl ReferenceValidationService {
    pub fn new(thresholds: ValidationThresholds) -> Self {
        Self {
            thresholds,
            matcher: ReferenceMatcher::default(),
        }
    }

    /// Uses `matcher` to re-detect references when validating graphs.
    pub fn with_matcher(mut self, matcher: ReferenceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn thresholds(&self) -> &ValidationThresholds {
        &self.thresholds
    }

    /// Scores a built graph.
    ///
    /// Detection metrics come from re-scanning every text node; resolution
    /// metrics from the `references` edges and the detected/resolved counts
    /// recorded in graph properties.
    pub fn validate_graph(&self, graph: &KnowledgeGraph) -> ValidationReport {
        let mut detection = DetectionMetrics::default();
        for node in graph.nodes().iter().filter(|n| n.is_text_node()) {
            let found = self.matcher.find_references(&node.content);
            let metrics = self.validate_detection(&node.content, &found.references);
            detection.total_references += metrics.total_references;
            detection.suspicious_references += metrics.suspicious_references;
            detection.reference_mentions += metrics.reference_mentions;
        }
        finish_detection(&mut detection);

        let resolution = graph_resolution_metrics(graph);
        let quality = graph_quality_metrics(graph);

        let mut report = ValidationReport {
            overall_score: self.overall_score(
                detection.f1_score,
                resolution.average_confidence,
                quality.connectivity_score,
                quality.edge_density,
            ),
            detection,
            resolution,
            graph: Some(quality),
            ..ValidationReport::default()
        };

        self.check_detection(&mut report);
        self.check_resolution(&mut report);
        self.check_graph(graph, &mut report);
        self.check_performance(graph, &mut report);

        info!(
            graph_id = graph.id(),
            score = report.overall_score,
            issues = report.issues.len(),
            "graph validated"
        );
        report
    }

    /// Scores references detected in `text` without ground truth.
    pub fn validate_detection(
        &self,
        text: &str,
        references: &[DetectedReference],
    ) -> DetectionMetrics {
        let mut metrics = DetectionMetrics {
            total_references: references.len(),
            suspicious_references: references
                .iter()
                .filter(|r| is_suspicious(text, r))
                .count(),
            reference_mentions: REFERENCE_MENTION_RE.find_iter(text).count(),
            ..DetectionMetrics::default()
        };
        finish_detection(&mut metrics);
        metrics
    }

    pub fn validate_resolutions(&self, resolutions: &[ReferenceResolution]) -> ResolutionMetrics {
        let resolved: Vec<&ReferenceResolution> =
            resolutions.iter().filter(|r| r.is_resolved()).collect();

        let mut resolved_by_type = BTreeMap::new();
        for r in &resolved {
            *resolved_by_type
                .entry(r.reference.reference_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        ResolutionMetrics {
            total_references: resolutions.len(),
            resolved_references: resolved.len(),
            resolution_rate: ratio(resolved.len(), resolutions.len()),
            average_confidence: mean(resolved.iter().map(|r| r.confidence)),
            resolved_by_type,
        }
    }

    /// Scores a detection/resolution batch that has no graph.
    ///
    /// The resolution rate stands in for graph connectivity in the overall
    /// score.
    pub fn validate_batch(&self, text: &str, resolutions: &[ReferenceResolution]) -> ValidationReport {
        let references: Vec<DetectedReference> =
            resolutions.iter().map(|r| r.reference.clone()).collect();
        let detection = self.validate_detection(text, &references);
        let resolution = self.validate_resolutions(resolutions);

        let mut report = ValidationReport {
            overall_score: self.overall_score(
                detection.f1_score,
                resolution.average_confidence,
                resolution.resolution_rate,
                0.0,
            ),
            detection,
            resolution,
            ..ValidationReport::default()
        };
        self.check_detection(&mut report);
        self.check_resolution(&mut report);
        debug!(score = report.overall_score, "batch validated");
        report
    }

    fn overall_score(&self, f1: f64, confidence: f64, connectivity: f64, density: f64) -> f64 {
        let density_factor = if density > self.thresholds.density_penalty_threshold {
            0.8
        } else {
            1.0
        };
        (0.4 * f1 + 0.3 * confidence + 0.2 * connectivity + 0.1 * density_factor).clamp(0.0, 1.0)
    }

    // -----------------------------------------------------------------
    // Issue checks
    // -----------------------------------------------------------------

    fn check_detection(&self, report: &mut ValidationReport) {
        let d = report.detection.clone();
        if d.suspicious_references > 0 {
            report.issue(
                IssueCategory::Detection,
                IssueSeverity::Info,
                format!(
                    "{} detected reference(s) look like times, versions, amounts or percentages",
                    d.suspicious_references
                ),
            );
        }
        if d.estimated_precision < self.thresholds.min_precision {
            report.issue(
                IssueCategory::Detection,
                IssueSeverity::Warning,
                format!(
                    "estimated detection precision {:.2} is below {:.2}",
                    d.estimated_precision, self.thresholds.min_precision
                ),
            );
            report.recommend("Tighten reference patterns to reject times, versions and amounts");
        }
        if d.estimated_recall < self.thresholds.min_recall {
            report.issue(
                IssueCategory::Detection,
                IssueSeverity::Warning,
                format!(
                    "estimated detection recall {:.2} is below {:.2}",
                    d.estimated_recall, self.thresholds.min_recall
                ),
            );
            report.recommend("Add patterns for reference phrasings that are currently missed");
        }
    }

    fn check_resolution(&self, report: &mut ValidationReport) {
        let r = report.resolution.clone();
        if r.total_references == 0 && r.resolved_references == 0 {
            report.issue(
                IssueCategory::Resolution,
                IssueSeverity::Info,
                "no references were resolved".to_string(),
            );
            return;
        }
        if r.resolution_rate < self.thresholds.min_resolution_rate {
            report.issue(
                IssueCategory::Resolution,
                IssueSeverity::Warning,
                format!(
                    "only {:.0}% of references were resolved",
                    r.resolution_rate * 100.0
                ),
            );
            report.recommend("Check that headings, figures and tables carry their numbers");
        }
        if r.resolved_references > 0 && r.average_confidence < self.thresholds.min_average_confidence
        {
            report.issue(
                IssueCategory::Resolution,
                IssueSeverity::Warning,
                format!(
                    "average resolution confidence {:.2} is below {:.2}",
                    r.average_confidence, self.thresholds.min_average_confidence
                ),
            );
            report.recommend("Improve resolution strategies or raise the minimum edge confidence");
        }
    }

    fn check_graph(&self, graph: &KnowledgeGraph, report: &mut ValidationReport) {
        if graph.status() == GraphStatus::Error {
            let reason = graph.metadata().error.clone().unwrap_or_default();
            report.issue(
                IssueCategory::Graph,
                IssueSeverity::Error,
                format!("graph build failed: {}", reason),
            );
        }
        for error in graph.validate().errors {
            report.issue(IssueCategory::Graph, IssueSeverity::Error, error);
        }

        let Some(quality) = report.graph.clone() else {
            return;
        };
        if quality.text_nodes > 0
            && quality.reference_edges > 0
            && quality.connectivity_score < self.thresholds.min_connectivity
        {
            report.issue(
                IssueCategory::Graph,
                IssueSeverity::Warning,
                format!(
                    "only {:.0}% of text nodes take part in a reference",
                    quality.connectivity_score * 100.0
                ),
            );
            report.recommend("Resolve more references to connect isolated text");
        }
        if quality.edge_density > self.thresholds.max_density {
            report.issue(
                IssueCategory::Graph,
                IssueSeverity::Warning,
                format!(
                    "reference edge density {:.2} exceeds {:.2}",
                    quality.edge_density, self.thresholds.max_density
                ),
            );
            report.recommend("Raise min_edge_confidence to prune weak reference edges");
        }
    }

    fn check_performance(&self, graph: &KnowledgeGraph, report: &mut ValidationReport) {
        let Some(build_ms) = graph.metadata().build_time_ms else {
            return;
        };
        if build_ms > self.thresholds.slow_build_ms {
            report.issue(
                IssueCategory::Performance,
                IssueSeverity::Warning,
                format!(
                    "graph build took {} ms (threshold {} ms)",
                    build_ms, self.thresholds.slow_build_ms
                ),
            );
            report.recommend("Cap the text passed to the matcher or split large documents");
        }
    }
}

// ---------------------------------------------------------------------------
// Metric helpers
// ---------------------------------------------------------------------------

/// A match right before `:45`, after `$`, `v` or `version`, or before `%`.
fn is_suspicious(text: &str, reference: &DetectedReference) -> bool {
    let (Some(before), Some(after)) = (text.get(..reference.start), text.get(reference.end..))
    else {
        return false;
    };
    if TIME_AFTER_RE.is_match(after) || after.trim_start().starts_with('%') {
        return true;
    }
    let before = before.trim_end();
    before.ends_with(['$', '€', '£']) || VERSION_BEFORE_RE.is_match(before)
}

fn finish_detection(metrics: &mut DetectionMetrics) {
    let total = metrics.total_references;
    let plausible = total.saturating_sub(metrics.suspicious_references);
    metrics.estimated_precision = if total == 0 {
        1.0
    } else {
        plausible as f64 / total as f64
    };
    metrics.estimated_recall = if metrics.reference_mentions == 0 {
        1.0
    } else {
        (plausible as f64 / metrics.reference_mentions as f64).min(1.0)
    };
    let (p, r) = (metrics.estimated_precision, metrics.estimated_recall);
    metrics.f1_score = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
}

fn graph_resolution_metrics(graph: &KnowledgeGraph) -> ResolutionMetrics {
    let edges = graph.edges_by_type(EdgeType::References);
    let properties = &graph.metadata().properties;
    let count = |key: &str| {
        properties
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    };

    let detected = count(REFERENCES_DETECTED_PROPERTY);
    let resolved = count(REFERENCES_RESOLVED_PROPERTY).unwrap_or(edges.len());
    let resolution_rate = match detected {
        Some(total) if total > 0 => ratio(resolved, total),
        _ if !edges.is_empty() => 1.0,
        _ => 0.0,
    };

    let mut resolved_by_type = BTreeMap::new();
    for edge in &edges {
        let kind = edge.property_str("reference_type").unwrap_or("unknown");
        *resolved_by_type.entry(kind.to_string()).or_insert(0) += 1;
    }

    ResolutionMetrics {
        total_references: detected.unwrap_or(edges.len()),
        resolved_references: resolved,
        resolution_rate,
        average_confidence: mean(edges.iter().map(|e| e.weight)),
        resolved_by_type,
    }
}

fn graph_quality_metrics(graph: &KnowledgeGraph) -> GraphQualityMetrics {
    let edges = graph.edges_by_type(EdgeType::References);
    let text_nodes: Vec<&GraphNode> = graph.nodes().iter().filter(|n| n.is_text_node()).collect();

    let touched: HashSet<&str> = edges
        .iter()
        .flat_map(|e| [e.source.as_str(), e.target.as_str()])
        .collect();
    let connected = text_nodes
        .iter()
        .filter(|n| touched.contains(n.id.as_str()))
        .count();

    GraphQualityMetrics {
        reference_edges: edges.len(),
        text_nodes: text_nodes.len(),
        average_edge_weight: mean(edges.iter().map(|e| e.weight)),
        edge_density: ratio(edges.len(), text_nodes.len()),
        isolated_components: graph.statistics().isolated_components,
        connectivity_score: ratio(connected, text_nodes.len()),
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
