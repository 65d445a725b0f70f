use std::collections::HashSet;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::config::BuilderConfig;
use crate::errors::{DocGraphError, Result};
use crate::graph::factory::GraphFactory;
use crate::graph::KnowledgeGraph;
use crate::types::*;

/// Confidence of headings found by the layout heuristics.
pub const HEADING_CONFIDENCE: f64 = 0.7;
/// Confidence of a paragraph synthesized from raw page text.
pub const FALLBACK_PARAGRAPH_CONFIDENCE: f64 = 0.5;
/// Confidence of the placeholder paragraph for a page without text.
pub const EMPTY_PAGE_CONFIDENCE: f64 = 0.1;
pub const EMPTY_PAGE_PLACEHOLDER: &str = "[Empty page]";

static NUMBERED_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:Section|Chapter)\s+)?(?:\d+(?:\.\d+)*\.?|[IVX]+\.)\s+\p{Lu}")
        .expect("numbered heading pattern is valid")
});

/// A heading candidate located on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedHeading {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Converts one parsed document into a complete [`KnowledgeGraph`].
///
/// Pipeline:
/// 1. Document root node (plus author/keywords/language metadata nodes)
/// 2. Per page: container node, paragraphs (or a synthesized fallback) and
///    headings detected from positioned text
/// 3. `follows` edges between consecutive paragraphs at most one page apart
/// 4. `contains` edges from each heading to the paragraphs that follow it
pub struct GraphBuilder {
    config: BuilderConfig,
}

impl GraphBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// Builds a new graph for `document_id`.
    ///
    /// On failure the partially built graph is marked as errored and dropped;
    /// use [`GraphBuilder::build_into`] to keep it.
    pub fn build(&self, document_id: &str, document: &ParsedDocument) -> Result<KnowledgeGraph> {
        let graph_id = format!("graph:{}", &content_hash(document_id)[..16]);
        let mut graph = KnowledgeGraph::new(&graph_id, document_id);
        self.build_into(&mut graph, document)?;
        Ok(graph)
    }

    /// Populates `graph` (which must still be building) and completes it.
    ///
    /// Any failure marks the graph as errored with the failure message and is
    /// then returned as [`DocGraphError::Build`].
    pub fn build_into(&self, graph: &mut KnowledgeGraph, document: &ParsedDocument) -> Result<()> {
        let start = Instant::now();
        let document_id = graph.document_id().to_string();
        let mut factory =
            GraphFactory::new(&document_id).with_max_label_length(self.config.max_label_length);

        let outcome = self
            .populate(graph, &mut factory, document)
            .and_then(|()| {
                graph.set_build_time(start.elapsed().as_millis() as u64);
                graph.complete()
            });

        match outcome {
            Ok(()) => {
                info!(
                    document_id = %document_id,
                    nodes = graph.node_count(),
                    edges = graph.edge_count(),
                    build_ms = start.elapsed().as_millis() as u64,
                    "built document graph"
                );
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                error!(document_id = %document_id, error = %message, "graph build failed");
                if let Err(state_err) = graph.mark_error(&message) {
                    warn!(error = %state_err, "could not mark graph as errored");
                }
                Err(DocGraphError::Build {
                    document_id,
                    message,
                })
            }
        }
    }

    fn populate(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &mut GraphFactory,
        document: &ParsedDocument,
    ) -> Result<()> {
        let document_node_id = self.add_document_node(graph, factory, document)?;
        self.add_metadata_nodes(graph, factory, &document.metadata, &document_node_id)?;

        let mut paragraphs: Vec<(String, Position)> = Vec::new();
        let mut headings: Vec<(String, Position)> = Vec::new();

        for (i, page) in document.pages.iter().enumerate() {
            let page_number = if page.page_number >= 1 {
                page.page_number
            } else {
                i as u32 + 1
            };

            let page_node = factory.create_page(page_number, &page.text)?;
            let page_node_id = page_node.id.clone();
            graph.add_node(page_node)?;
            graph.add_edge(factory.create_contains(&document_node_id, &page_node_id, None)?)?;

            let page_paragraphs = self.add_paragraphs(graph, factory, page, page_number)?;
            for (id, position) in &page_paragraphs {
                graph.add_edge(factory.create_contains(&page_node_id, id, None)?)?;
                paragraphs.push((id.clone(), *position));
            }

            for heading in self.detect_headings(page) {
                let node = factory.create_section(
                    &heading.text,
                    page_number,
                    heading.start,
                    heading.end,
                    Some(HEADING_CONFIDENCE),
                )?;
                let (id, position) = (node.id.clone(), node.position);
                graph.add_node(node)?;
                graph.add_edge(factory.create_contains(&page_node_id, &id, None)?)?;
                headings.push((id, position));
            }
        }

        self.link_sequential(graph, factory, &paragraphs)?;
        self.link_hierarchy(graph, factory, &headings, &paragraphs)?;
        Ok(())
    }

    fn add_document_node(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &mut GraphFactory,
        document: &ParsedDocument,
    ) -> Result<String> {
        let meta = &document.metadata;
        let page_count = meta.page_count.unwrap_or(document.pages.len() as u32);
        let size = meta
            .file_size
            .map(|s| s as usize)
            .unwrap_or_else(|| document.pages.iter().map(|p| p.text.len()).sum());
        let title = meta
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("Untitled Document");

        let mut properties = Properties::new();
        for (key, value) in [
            ("title", &meta.title),
            ("author", &meta.author),
            ("subject", &meta.subject),
            ("language", &meta.language),
        ] {
            if let Some(value) = value {
                properties.insert(key.to_string(), json!(value));
            }
        }
        if !meta.keywords.is_empty() {
            properties.insert("keywords".to_string(), json!(meta.keywords));
        }

        let node = factory.create_document(title, page_count, size, properties)?;
        let id = node.id.clone();
        graph.add_node(node)?;
        Ok(id)
    }

    fn add_metadata_nodes(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &mut GraphFactory,
        meta: &DocumentMetadata,
        document_node_id: &str,
    ) -> Result<()> {
        let keywords = meta.keywords.join(", ");
        let entries = [
            ("author", meta.author.as_deref()),
            ("keywords", Some(keywords.as_str())),
            ("language", meta.language.as_deref()),
        ];

        for (key, value) in entries {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let node = factory.create_metadata(key, value)?;
            let id = node.id.clone();
            graph.add_node(node)?;
            graph.add_edge(factory.create_contains(document_node_id, &id, None)?)?;
        }
        Ok(())
    }

    /// Adds the page's paragraphs, or one synthesized paragraph when none of
    /// the parsed ones has content. Returns the ids and positions of what was
    /// added.
    fn add_paragraphs(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &mut GraphFactory,
        page: &ParsedPage,
        page_number: u32,
    ) -> Result<Vec<(String, Position)>> {
        let mut added = Vec::new();

        for paragraph in &page.paragraphs {
            if paragraph.content.trim().is_empty() {
                debug!(page = page_number, "skipping blank paragraph");
                continue;
            }
            let page_no = if paragraph.page_number >= 1 {
                paragraph.page_number
            } else {
                page_number
            };
            // Offsets left unset by the parser span the content.
            let end = if paragraph.start == 0 && paragraph.end == 0 {
                paragraph.content.len()
            } else {
                paragraph.end
            };
            let node = factory.create_paragraph(
                &paragraph.content,
                page_no,
                paragraph.start,
                end,
                paragraph.confidence,
            )?;
            added.push((node.id.clone(), node.position));
            graph.add_node(node)?;
        }

        if added.is_empty() {
            let joined = page
                .text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let node = if joined.is_empty() {
                factory.create_paragraph(
                    EMPTY_PAGE_PLACEHOLDER,
                    page_number,
                    0,
                    EMPTY_PAGE_PLACEHOLDER.len(),
                    Some(EMPTY_PAGE_CONFIDENCE),
                )?
            } else {
                factory.create_paragraph(
                    &joined,
                    page_number,
                    0,
                    joined.len(),
                    Some(FALLBACK_PARAGRAPH_CONFIDENCE),
                )?
            };
            debug!(page = page_number, "synthesized fallback paragraph");
            added.push((node.id.clone(), node.position));
            graph.add_node(node)?;
        }

        Ok(added)
    }

    /// Finds heading candidates among the page's positioned text elements.
    ///
    /// A short element is a heading if it is taller than the heading
    /// threshold, written in capitals, or a numbered title starting on a line
    /// boundary.
    pub fn detect_headings(&self, page: &ParsedPage) -> Vec<DetectedHeading> {
        let cfg = &self.config;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut cursor = 0;
        let mut headings = Vec::new();

        for element in &page.text_elements {
            let text = element.text.trim();
            let length = text.chars().count();
            if length == 0 || length > cfg.max_heading_length {
                continue;
            }

            let is_large = element.height > cfg.heading_height_threshold;
            let at_line_start = cfg.line_height > 0.0
                && element.height >= cfg.body_text_height
                && element.y.rem_euclid(cfg.line_height) < cfg.line_start_tolerance;
            let numbered = NUMBERED_HEADING_RE.is_match(text);

            if !(is_large || is_all_caps(text) || (at_line_start && numbered)) {
                continue;
            }
            if !seen.insert(text) {
                continue;
            }

            let start = match page.text[cursor..].find(text) {
                Some(offset) => cursor + offset,
                None => page.text.find(text).unwrap_or(0),
            };
            let end = start + text.len();
            if page.text.get(start..end) == Some(text) {
                cursor = end;
            }
            headings.push(DetectedHeading {
                text: text.to_string(),
                start,
                end,
            });
        }

        headings
    }

    /// Links paragraphs in reading order, never across a gap of more than one page.
    fn link_sequential(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &GraphFactory,
        paragraphs: &[(String, Position)],
    ) -> Result<()> {
        let mut ordered: Vec<&(String, Position)> = paragraphs.iter().collect();
        ordered.sort_by_key(|(_, pos)| pos.reading_order());

        for pair in ordered.windows(2) {
            let (prev_id, prev_pos) = pair[0];
            let (next_id, next_pos) = pair[1];
            if next_pos.page.abs_diff(prev_pos.page) > 1 {
                continue;
            }
            let edge =
                factory.create_follows(prev_id, next_id, Some(self.config.follows_weight))?;
            if !graph.contains_edge(&edge.id) {
                graph.add_edge(edge)?;
            }
        }
        Ok(())
    }

    /// Links each heading to the first few paragraphs after it on its page.
    fn link_hierarchy(
        &self,
        graph: &mut KnowledgeGraph,
        factory: &GraphFactory,
        headings: &[(String, Position)],
        paragraphs: &[(String, Position)],
    ) -> Result<()> {
        for (heading_id, heading_pos) in headings {
            let mut children: Vec<&(String, Position)> = paragraphs
                .iter()
                .filter(|(_, pos)| pos.page == heading_pos.page && pos.start > heading_pos.start)
                .collect();
            children.sort_by_key(|(_, pos)| pos.start);

            for (paragraph_id, _) in children.into_iter().take(self.config.max_section_children) {
                let edge = factory.create_contains(
                    heading_id,
                    paragraph_id,
                    Some(self.config.hierarchy_weight),
                )?;
                if !graph.contains_edge(&edge.id) {
                    graph.add_edge(edge)?;
                }
            }
        }
        Ok(())
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(BuilderConfig::default())
    }
}

/// At least three letters, none of them lowercase.
fn is_all_caps(text: &str) -> bool {
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| !c.is_lowercase())
}
