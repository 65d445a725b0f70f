use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::graph::factory::leading_number;
use crate::graph::KnowledgeGraph;
use crate::types::*;

static FIGURE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:figure|fig\.)\s*(\d+(?:\.\d+)*[a-z]?)").expect("figure label regex is valid")
});

static TABLE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:table|tab\.)\s*(\d+(?:\.\d+)*)").expect("table label regex is valid")
});

pub const EXACT_SECTION_CONFIDENCE: f64 = 0.95;
pub const FUZZY_SECTION_MAX_CONFIDENCE: f64 = 0.8;
pub const FUZZY_SECTION_MIN_CONFIDENCE: f64 = 0.6;
pub const FIGURE_CONFIDENCE: f64 = 0.9;
pub const TABLE_CONFIDENCE: f64 = 0.9;
pub const SINGLE_TABLE_CONFIDENCE: f64 = 0.7;
pub const PAGE_CONFIDENCE: f64 = 0.7;
pub const SPATIAL_MAX_CONFIDENCE: f64 = 0.8;
pub const SPATIAL_MIN_CONFIDENCE: f64 = 0.5;
pub const SEMANTIC_CONFIDENCE: f64 = 0.3;

/// Alternatives reported by strategies that rank several candidates.
const MAX_ALTERNATIVES: usize = 3;

/// Coarse summary of the document, used by strategies that need bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub total_pages: u32,
    pub section_count: usize,
    pub figure_count: usize,
    pub table_count: usize,
}

impl DocumentStructure {
    pub fn from_graph(graph: &KnowledgeGraph) -> Self {
        DocumentStructure {
            total_pages: graph.pages().into_iter().max().unwrap_or(0),
            section_count: graph
                .get_nodes_by_type(NodeType::Section)
                .iter()
                .filter(|n| n.is_heading())
                .count(),
            figure_count: graph.get_nodes_by_type(NodeType::Image).len(),
            table_count: graph.get_nodes_by_type(NodeType::Table).len(),
        }
    }
}

/// Where a reference was found, plus optional hints.
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// The node whose content contains the reference.
    pub source_node: GraphNode,
    /// Ids of nodes structurally close to the source.
    pub nearby_node_ids: Vec<String>,
    pub document_structure: Option<DocumentStructure>,
}

impl ResolutionContext {
    pub fn new(source_node: GraphNode) -> Self {
        ResolutionContext {
            source_node,
            nearby_node_ids: Vec::new(),
            document_structure: None,
        }
    }

    pub fn with_nearby(mut self, nearby_node_ids: Vec<String>) -> Self {
        self.nearby_node_ids = nearby_node_ids;
        self
    }

    pub fn with_structure(mut self, structure: DocumentStructure) -> Self {
        self.document_structure = Some(structure);
        self
    }

    /// Builds a context with graph neighbours as nearby nodes and a
    /// structure summary of `graph`.
    pub fn from_graph(source_node: &GraphNode, graph: &KnowledgeGraph) -> Self {
        let mut nearby: Vec<String> = graph
            .get_neighbors(&source_node.id)
            .into_iter()
            .chain(graph.get_incoming(&source_node.id))
            .map(|n| n.id.clone())
            .collect();
        let mut seen = HashSet::new();
        nearby.retain(|id| seen.insert(id.clone()));
        ResolutionContext::new(source_node.clone())
            .with_nearby(nearby)
            .with_structure(DocumentStructure::from_graph(graph))
    }

    fn total_pages(&self, graph: &KnowledgeGraph) -> u32 {
        self.document_structure
            .as_ref()
            .map(|s| s.total_pages)
            .filter(|p| *p > 0)
            .unwrap_or_else(|| graph.pages().into_iter().max().unwrap_or(0))
    }
}

/// A candidate produced by one strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyMatch {
    pub node_id: String,
    pub confidence: f64,
    pub reason: String,
    /// Other plausible node ids, best first.
    pub alternatives: Vec<String>,
}

impl StrategyMatch {
    pub fn new(node_id: &str, confidence: f64, reason: impl Into<String>) -> Self {
        StrategyMatch {
            node_id: node_id.to_string(),
            confidence,
            reason: reason.into(),
            alternatives: Vec::new(),
        }
    }

    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }
}

/// One way of mapping a detected reference onto a graph node.
///
/// `priority` orders attempts; it does not gate applicability. Returning
/// `Ok(None)` means "no candidate"; an `Err` is logged by the service and
/// the strategy is skipped.
pub trait ResolutionStrategy: Send + Sync {
    fn name(&self) -> &str;
    fn priority(&self) -> u8;
    fn supported_types(&self) -> &[ReferenceType];

    fn supports(&self, reference_type: ReferenceType) -> bool {
        self.supported_types().contains(&reference_type)
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>>;
}

/// Similarity lookup used by [`SemanticFallbackStrategy`].
pub trait SemanticMatcher: Send + Sync {
    /// Best node for `reference` and a score in `[0, 1]`.
    fn best_match(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Option<(String, f64)>;
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Section number of a heading: its stored property, else a leading number
/// in the label.
pub fn section_number(node: &GraphNode) -> Option<String> {
    node.property_str("section_number")
        .map(str::to_string)
        .or_else(|| leading_number(&node.label))
}

fn figure_number(node: &GraphNode) -> Option<String> {
    node.property_str("figure_number")
        .map(str::to_string)
        .or_else(|| label_number(&FIGURE_LABEL_RE, &node.label))
}

fn table_number(node: &GraphNode) -> Option<String> {
    node.property_str("table_number")
        .map(str::to_string)
        .or_else(|| label_number(&TABLE_LABEL_RE, &node.label))
}

fn label_number(re: &Regex, label: &str) -> Option<String> {
    re.captures(label)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn numbers_equal(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn headings(graph: &KnowledgeGraph) -> Vec<&GraphNode> {
    graph
        .get_nodes_by_type(NodeType::Section)
        .into_iter()
        .filter(|n| n.is_heading())
        .collect()
}

fn components(number: &str) -> Option<Vec<u32>> {
    number
        .split('.')
        .map(|part| part.parse::<u32>().ok())
        .collect()
}

/// First match wins; the rest become alternatives.
fn first_with_alternatives(
    matches: Vec<&GraphNode>,
    confidence: f64,
    reason: String,
) -> Option<StrategyMatch> {
    let (first, rest) = matches.split_first()?;
    Some(
        StrategyMatch::new(&first.id, confidence, reason)
            .with_alternatives(rest.iter().map(|n| n.id.clone()).collect()),
    )
}

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

pub struct ExactSectionStrategy;

impl ResolutionStrategy for ExactSectionStrategy {
    fn name(&self) -> &str {
        "exact_section"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::Section]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        _context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let matches: Vec<&GraphNode> = headings(graph)
            .into_iter()
            .filter(|n| section_number(n).is_some_and(|num| numbers_equal(&num, &reference.target)))
            .collect();
        Ok(first_with_alternatives(
            matches,
            EXACT_SECTION_CONFIDENCE,
            format!("section number {} matched exactly", reference.target),
        ))
    }
}

/// Matches when one section number is a prefix of the other, e.g. `3.2`
/// against a heading numbered `3.2.1`.
pub struct FuzzySectionStrategy;

impl ResolutionStrategy for FuzzySectionStrategy {
    fn name(&self) -> &str {
        "fuzzy_section"
    }

    fn priority(&self) -> u8 {
        8
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::Section]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        _context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let Some(wanted) = components(reference.target.trim()) else {
            return Ok(None);
        };

        let mut scored: Vec<(f64, &GraphNode)> = Vec::new();
        for node in headings(graph) {
            let Some(have) = section_number(node).as_deref().and_then(components) else {
                continue;
            };
            if have == wanted {
                continue;
            }
            let (shorter, longer) = if have.len() <= wanted.len() {
                (&have, &wanted)
            } else {
                (&wanted, &have)
            };
            if !longer.starts_with(shorter) {
                continue;
            }
            let ratio = shorter.len() as f64 / longer.len() as f64;
            let confidence = FUZZY_SECTION_MAX_CONFIDENCE * (0.5 + 0.5 * ratio);
            // A one-level prefix lands on the threshold up to rounding.
            if confidence - FUZZY_SECTION_MIN_CONFIDENCE > 1e-9 {
                scored.push((confidence, node));
            }
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        let Some((confidence, best)) = scored.first().copied() else {
            return Ok(None);
        };
        Ok(Some(
            StrategyMatch::new(
                &best.id,
                confidence,
                format!(
                    "section number {} partially matches {}",
                    reference.target,
                    section_number(best).unwrap_or_default()
                ),
            )
            .with_alternatives(scored.iter().skip(1).map(|(_, n)| n.id.clone()).collect()),
        ))
    }
}

pub struct FigureStrategy;

impl ResolutionStrategy for FigureStrategy {
    fn name(&self) -> &str {
        "figure_number"
    }

    fn priority(&self) -> u8 {
        9
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::Figure]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        _context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let matches: Vec<&GraphNode> = graph
            .get_nodes_by_type(NodeType::Image)
            .into_iter()
            .filter(|n| figure_number(n).is_some_and(|num| numbers_equal(&num, &reference.target)))
            .collect();
        Ok(first_with_alternatives(
            matches,
            FIGURE_CONFIDENCE,
            format!("figure {} matched by number", reference.target),
        ))
    }
}

/// Exact table number, or the only table in the document for "Table 1".
pub struct TableStrategy;

impl ResolutionStrategy for TableStrategy {
    fn name(&self) -> &str {
        "table_number"
    }

    fn priority(&self) -> u8 {
        9
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::Table]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        _context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let tables = graph.get_nodes_by_type(NodeType::Table);
        let matches: Vec<&GraphNode> = tables
            .iter()
            .copied()
            .filter(|n| table_number(n).is_some_and(|num| numbers_equal(&num, &reference.target)))
            .collect();
        if let Some(found) = first_with_alternatives(
            matches,
            TABLE_CONFIDENCE,
            format!("table {} matched by number", reference.target),
        ) {
            return Ok(Some(found));
        }

        if tables.len() == 1 && reference.target.trim() == "1" {
            return Ok(Some(StrategyMatch::new(
                &tables[0].id,
                SINGLE_TABLE_CONFIDENCE,
                "single table in document",
            )));
        }
        Ok(None)
    }
}

pub struct PageStrategy;

impl ResolutionStrategy for PageStrategy {
    fn name(&self) -> &str {
        "page"
    }

    fn priority(&self) -> u8 {
        7
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::Page]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let Ok(page) = reference.target.trim().parse::<u32>() else {
            return Ok(None);
        };
        if page == 0 || page > context.total_pages(graph) {
            return Ok(None);
        }

        let on_page: Vec<&GraphNode> = graph
            .get_nodes_by_page(page)
            .into_iter()
            .filter(|n| matches!(n.node_type, NodeType::Section | NodeType::Paragraph))
            .collect();
        Ok(first_with_alternatives(
            on_page,
            PAGE_CONFIDENCE,
            format!("first node on page {}", page),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpatialDirection {
    Backward,
    Forward,
}

fn spatial_direction(phrase: &str) -> Option<SpatialDirection> {
    const BACKWARD: [&str; 5] = ["above", "previous", "preceding", "earlier", "before"];
    const FORWARD: [&str; 4] = ["below", "next", "following", "later"];
    let lower = phrase.to_lowercase();
    if BACKWARD.iter().any(|w| lower.contains(w)) {
        Some(SpatialDirection::Backward)
    } else if FORWARD.iter().any(|w| lower.contains(w)) {
        Some(SpatialDirection::Forward)
    } else {
        None
    }
}

fn is_image(node: &GraphNode) -> bool {
    node.node_type == NodeType::Image
}

fn is_table(node: &GraphNode) -> bool {
    node.node_type == NodeType::Table
}

fn is_paragraph(node: &GraphNode) -> bool {
    node.node_type == NodeType::Paragraph
}

/// Restricts the candidate pool when the phrase names an element kind,
/// e.g. "the next table".
fn named_kind(phrase: &str) -> Option<fn(&GraphNode) -> bool> {
    let lower = phrase.to_lowercase();
    let filter: fn(&GraphNode) -> bool = if lower.contains("section") || lower.contains("chapter") {
        GraphNode::is_heading
    } else if lower.contains("figure") {
        is_image
    } else if lower.contains("table") {
        is_table
    } else if lower.contains("paragraph") {
        is_paragraph
    } else if lower.contains("page") {
        GraphNode::is_page_container
    } else {
        return None;
    };
    Some(filter)
}

fn is_content_node(node: &GraphNode) -> bool {
    !matches!(node.node_type, NodeType::Document | NodeType::Metadata) && !node.is_page_container()
}

/// Nearest prior node for "above"/"previous" phrasings, nearest later node
/// for "below"/"next"/"following".
pub struct SpatialStrategy;

impl ResolutionStrategy for SpatialStrategy {
    fn name(&self) -> &str {
        "spatial"
    }

    fn priority(&self) -> u8 {
        5
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::CrossReference]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let Some(direction) = spatial_direction(&reference.text) else {
            return Ok(None);
        };
        let source = &context.source_node;
        let origin = source.position.reading_order();
        let pool_filter = named_kind(&reference.text).unwrap_or(is_content_node);

        let mut candidates: Vec<&GraphNode> = graph
            .nodes()
            .iter()
            .filter(|n| n.id != source.id && pool_filter(n))
            .filter(|n| match direction {
                SpatialDirection::Backward => n.position.reading_order() < origin,
                SpatialDirection::Forward => n.position.reading_order() > origin,
            })
            .collect();
        candidates.sort_by_key(|n| source.position.distance_to(&n.position));

        let Some((nearest, rest)) = candidates.split_first() else {
            return Ok(None);
        };
        let distance = source.position.distance_to(&nearest.position);
        let confidence =
            (SPATIAL_MAX_CONFIDENCE - distance as f64 / 10_000.0).max(SPATIAL_MIN_CONFIDENCE);
        let where_ = match direction {
            SpatialDirection::Backward => "preceding",
            SpatialDirection::Forward => "following",
        };
        Ok(Some(
            StrategyMatch::new(
                &nearest.id,
                confidence,
                format!("nearest {} {} node", where_, nearest.node_type.as_str()),
            )
            .with_alternatives(
                rest.iter()
                    .take(MAX_ALTERNATIVES)
                    .map(|n| n.id.clone())
                    .collect(),
            ),
        ))
    }
}

/// Default [`SemanticMatcher`]: the nearest node of the source's type,
/// preferring structurally nearby nodes. A stand-in for embedding
/// similarity.
#[derive(Debug, Default, Clone, Copy)]
pub struct PositionalMatcher;

impl SemanticMatcher for PositionalMatcher {
    fn best_match(
        &self,
        _reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Option<(String, f64)> {
        let source = &context.source_node;
        let same_type = |n: &&GraphNode| {
            n.id != source.id && n.node_type == source.node_type && is_content_node(n)
        };

        let nearby = context
            .nearby_node_ids
            .iter()
            .filter_map(|id| graph.get_node(id))
            .filter(same_type)
            .min_by_key(|n| source.position.distance_to(&n.position));
        let best = nearby.or_else(|| {
            graph
                .nodes()
                .iter()
                .filter(same_type)
                .min_by_key(|n| source.position.distance_to(&n.position))
        })?;
        Some((best.id.clone(), SEMANTIC_CONFIDENCE))
    }
}

/// Last resort for vague cross-references. Never used for explicit
/// numeric targets.
pub struct SemanticFallbackStrategy {
    matcher: Box<dyn SemanticMatcher>,
}

impl Default for SemanticFallbackStrategy {
    fn default() -> Self {
        Self::new(Box::new(PositionalMatcher))
    }
}

impl SemanticFallbackStrategy {
    pub fn new(matcher: Box<dyn SemanticMatcher>) -> Self {
        Self { matcher }
    }
}

impl ResolutionStrategy for SemanticFallbackStrategy {
    fn name(&self) -> &str {
        "semantic_fallback"
    }

    fn priority(&self) -> u8 {
        1
    }

    fn supported_types(&self) -> &[ReferenceType] {
        &[ReferenceType::CrossReference]
    }

    fn resolve(
        &self,
        reference: &DetectedReference,
        context: &ResolutionContext,
        graph: &KnowledgeGraph,
    ) -> Result<Option<StrategyMatch>> {
        let target = reference.target.trim();
        if !target.is_empty() && target.chars().all(|c| c.is_ascii_digit() || c == '.') {
            return Ok(None);
        }
        Ok(self
            .matcher
            .best_match(reference, context, graph)
            .map(|(node_id, score)| {
                StrategyMatch::new(&node_id, score.clamp(0.0, 1.0), "closest similar node")
            }))
    }
}

/// The built-in strategies, highest priority first.
pub fn default_strategies() -> Vec<Box<dyn ResolutionStrategy>> {
    let mut strategies: Vec<Box<dyn ResolutionStrategy>> = vec![
        Box::new(ExactSectionStrategy),
        Box::new(FuzzySectionStrategy),
        Box::new(FigureStrategy),
        Box::new(TableStrategy),
        Box::new(PageStrategy),
        Box::new(SpatialStrategy),
        Box::new(SemanticFallbackStrategy::default()),
    ];
    strategies.sort_by_key(|s| std::cmp::Reverse(s.priority()));
    strategies
}
