use serde_json::json;

use crate::errors::{DocGraphError, Result};
use crate::types::*;

/// Default confidence for each node kind created through the helpers.
pub const DOCUMENT_CONFIDENCE: f64 = 1.0;
pub const SECTION_CONFIDENCE: f64 = 0.9;
pub const PARAGRAPH_CONFIDENCE: f64 = 0.8;
pub const TABLE_CONFIDENCE: f64 = 0.7;
pub const IMAGE_CONFIDENCE: f64 = 0.6;
pub const LIST_CONFIDENCE: f64 = 0.75;
pub const CODE_CONFIDENCE: f64 = 0.85;
pub const METADATA_CONFIDENCE: f64 = 1.0;

/// Default weight for each edge kind created through the helpers.
pub const CONTAINS_WEIGHT: f64 = 1.0;
pub const FOLLOWS_WEIGHT: f64 = 0.8;
pub const SIMILAR_WEIGHT: f64 = 0.5;

/// Default maximum label length in characters, ellipsis included.
pub const DEFAULT_MAX_LABEL_LENGTH: usize = 100;

/// Paragraph labels are a short preview of their content.
const PARAGRAPH_LABEL_LENGTH: usize = 50;

/// Produces validated nodes and edges for one document.
///
/// Every constructor runs the full set of checks in [`validate_node`] /
/// [`validate_edge`]; an invalid value is never returned.
pub struct GraphFactory {
    document_id: String,
    sequence: u64,
    max_label_length: usize,
}

impl GraphFactory {
    pub fn new(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            sequence: 0,
            max_label_length: DEFAULT_MAX_LABEL_LENGTH,
        }
    }

    /// Overrides the label truncation length (minimum 4 so the ellipsis fits).
    pub fn with_max_label_length(mut self, max_label_length: usize) -> Self {
        self.max_label_length = max_label_length.max(4);
        self
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Creates a node of any type after validating every field.
    pub fn create_node(
        &mut self,
        node_type: NodeType,
        label: &str,
        content: &str,
        position: Position,
        confidence: f64,
        properties: Properties,
    ) -> Result<GraphNode> {
        self.sequence += 1;
        let now = current_timestamp();
        let node = GraphNode {
            id: generate_node_id(
                &self.document_id,
                node_type,
                position.page,
                position.start,
                self.sequence,
            ),
            node_type,
            label: truncate_label(label, self.max_label_length),
            content: content.to_string(),
            position,
            metadata: NodeMetadata {
                confidence,
                properties,
            },
            created_at: now,
            updated_at: now,
        };
        validate_node(&node)?;
        Ok(node)
    }

    /// Creates the root node for a document of `page_count` pages and `size` bytes.
    pub fn create_document(
        &mut self,
        title: &str,
        page_count: u32,
        size: usize,
        mut properties: Properties,
    ) -> Result<GraphNode> {
        properties.insert("page_count".to_string(), json!(page_count));
        properties.insert("size".to_string(), json!(size));
        let content = format!("Document with {} page(s)", page_count);
        self.create_node(
            NodeType::Document,
            title,
            &content,
            Position::new(1, 0, size.max(1)),
            DOCUMENT_CONFIDENCE,
            properties,
        )
    }

    /// Creates the container node for one page.
    pub fn create_page(&mut self, page_number: u32, text: &str) -> Result<GraphNode> {
        let label = format!("Page {}", page_number);
        let content = if text.trim().is_empty() {
            label.clone()
        } else {
            text.to_string()
        };
        let mut properties = Properties::new();
        properties.insert(ROLE_PROPERTY.to_string(), json!(PAGE_ROLE));
        properties.insert("page_number".to_string(), json!(page_number));
        self.create_node(
            NodeType::Section,
            &label,
            &content,
            Position::new(page_number, 0, content.len().max(1)),
            DOCUMENT_CONFIDENCE,
            properties,
        )
    }

    /// Creates a heading node. A leading section number (e.g. `"3.2"`) is
    /// stored in the `section_number` property.
    pub fn create_section(
        &mut self,
        title: &str,
        page: u32,
        start: usize,
        end: usize,
        confidence: Option<f64>,
    ) -> Result<GraphNode> {
        let mut properties = Properties::new();
        if let Some(number) = leading_number(title) {
            properties.insert("section_number".to_string(), json!(number));
        }
        self.create_node(
            NodeType::Section,
            title,
            title,
            Position::new(page, start, end),
            confidence.unwrap_or(SECTION_CONFIDENCE),
            properties,
        )
    }

    pub fn create_paragraph(
        &mut self,
        content: &str,
        page: u32,
        start: usize,
        end: usize,
        confidence: Option<f64>,
    ) -> Result<GraphNode> {
        self.create_node(
            NodeType::Paragraph,
            &truncate_label(content, PARAGRAPH_LABEL_LENGTH),
            content,
            Position::new(page, start, end),
            confidence.unwrap_or(PARAGRAPH_CONFIDENCE),
            Properties::new(),
        )
    }

    /// Creates a table node; `table_number` is what "Table N" references match.
    pub fn create_table(
        &mut self,
        caption: &str,
        content: &str,
        position: Position,
        table_number: Option<&str>,
    ) -> Result<GraphNode> {
        let mut properties = Properties::new();
        if let Some(number) = table_number {
            properties.insert("table_number".to_string(), json!(number));
        }
        self.create_node(
            NodeType::Table,
            caption,
            content,
            position,
            TABLE_CONFIDENCE,
            properties,
        )
    }

    /// Creates an image node; `figure_number` is what "Figure N" references match.
    pub fn create_image(
        &mut self,
        caption: &str,
        position: Position,
        figure_number: Option<&str>,
    ) -> Result<GraphNode> {
        let mut properties = Properties::new();
        if let Some(number) = figure_number {
            properties.insert("figure_number".to_string(), json!(number));
        }
        let content = if caption.trim().is_empty() {
            "[Image]"
        } else {
            caption
        };
        self.create_node(
            NodeType::Image,
            content,
            content,
            position,
            IMAGE_CONFIDENCE,
            properties,
        )
    }

    pub fn create_list(&mut self, items: &[String], position: Position) -> Result<GraphNode> {
        let content = items.join("\n");
        let label = format!("List ({} items)", items.len());
        let mut properties = Properties::new();
        properties.insert("item_count".to_string(), json!(items.len()));
        self.create_node(
            NodeType::List,
            &label,
            &content,
            position,
            LIST_CONFIDENCE,
            properties,
        )
    }

    pub fn create_code(
        &mut self,
        content: &str,
        language: Option<&str>,
        position: Position,
    ) -> Result<GraphNode> {
        let mut properties = Properties::new();
        let label = match language {
            Some(lang) => {
                properties.insert("language".to_string(), json!(lang));
                format!("Code ({})", lang)
            }
            None => "Code".to_string(),
        };
        self.create_node(
            NodeType::Code,
            &label,
            content,
            position,
            CODE_CONFIDENCE,
            properties,
        )
    }

    /// Creates a key/value metadata node anchored at the start of the document.
    pub fn create_metadata(&mut self, key: &str, value: &str) -> Result<GraphNode> {
        let mut properties = Properties::new();
        properties.insert("key".to_string(), json!(key));
        self.create_node(
            NodeType::Metadata,
            key,
            value,
            Position::new(1, 0, value.len().max(1)),
            METADATA_CONFIDENCE,
            properties,
        )
    }

    /// Creates an edge of any type after validating every field.
    pub fn create_edge(
        &self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
        weight: f64,
        metadata: Properties,
    ) -> Result<GraphEdge> {
        let edge = GraphEdge {
            id: generate_edge_id(source, target, edge_type),
            source: source.to_string(),
            target: target.to_string(),
            edge_type,
            weight,
            metadata,
            created_at: current_timestamp(),
        };
        validate_edge(&edge)?;
        Ok(edge)
    }

    pub fn create_contains(
        &self,
        source: &str,
        target: &str,
        weight: Option<f64>,
    ) -> Result<GraphEdge> {
        self.create_edge(
            source,
            target,
            EdgeType::Contains,
            weight.unwrap_or(CONTAINS_WEIGHT),
            Properties::new(),
        )
    }

    pub fn create_follows(
        &self,
        source: &str,
        target: &str,
        weight: Option<f64>,
    ) -> Result<GraphEdge> {
        self.create_edge(
            source,
            target,
            EdgeType::Follows,
            weight.unwrap_or(FOLLOWS_WEIGHT),
            Properties::new(),
        )
    }

    /// Creates a `references` edge whose weight is the resolution confidence.
    pub fn create_reference(
        &self,
        source: &str,
        target: &str,
        confidence: f64,
        metadata: Properties,
    ) -> Result<GraphEdge> {
        self.create_edge(source, target, EdgeType::References, confidence, metadata)
    }

    pub fn create_similar(
        &self,
        source: &str,
        target: &str,
        similarity: Option<f64>,
    ) -> Result<GraphEdge> {
        self.create_edge(
            source,
            target,
            EdgeType::Similar,
            similarity.unwrap_or(SIMILAR_WEIGHT),
            Properties::new(),
        )
    }
}

fn check_unit_range(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(DocGraphError::validation(
            field,
            format!("{} must be within [0, 1], got {}", field, value),
        ));
    }
    Ok(())
}

/// Checks every node invariant, failing on the first violated constraint.
pub fn validate_node(node: &GraphNode) -> Result<()> {
    if node.id.trim().is_empty() {
        return Err(DocGraphError::validation("id", "node id must not be empty"));
    }
    if node.label.trim().is_empty() {
        return Err(DocGraphError::validation(
            "label",
            format!("{} node label must not be empty", node.node_type.as_str()),
        ));
    }
    if node.content.trim().is_empty() {
        return Err(DocGraphError::validation(
            "content",
            format!("{} node content must not be empty", node.node_type.as_str()),
        ));
    }
    let pos = &node.position;
    if pos.page < 1 {
        return Err(DocGraphError::validation(
            "position",
            format!("page must be >= 1, got {}", pos.page),
        ));
    }
    if pos.end <= pos.start {
        return Err(DocGraphError::validation(
            "position",
            format!(
                "end must be greater than start, got start={} end={}",
                pos.start, pos.end
            ),
        ));
    }
    check_unit_range("confidence", node.metadata.confidence)
}

/// Checks every edge invariant, failing on the first violated constraint.
pub fn validate_edge(edge: &GraphEdge) -> Result<()> {
    if edge.source.trim().is_empty() {
        return Err(DocGraphError::validation(
            "source",
            "edge source must not be empty",
        ));
    }
    if edge.target.trim().is_empty() {
        return Err(DocGraphError::validation(
            "target",
            "edge target must not be empty",
        ));
    }
    if edge.source == edge.target {
        return Err(DocGraphError::validation(
            "target",
            format!("self-referencing {} edge on '{}'", edge.edge_type.as_str(), edge.source),
        ));
    }
    check_unit_range("weight", edge.weight)
}

/// Collapses whitespace and truncates to `max_chars`, ending in `...` when cut.
pub fn truncate_label(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let keep = max_chars.saturating_sub(3);
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.truncate(truncated.trim_end().len());
    truncated.push_str("...");
    truncated
}

/// Extracts a leading dotted number such as `3` or `3.2.1` from a heading.
///
/// Accepts an optional `Section`/`Chapter`/`§` prefix.
pub fn leading_number(text: &str) -> Option<String> {
    let mut rest = text.trim_start();
    for prefix in ["Section", "SECTION", "Chapter", "CHAPTER", "§"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped.trim_start();
            break;
        }
    }

    let number: String = rest
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let number = number.trim_end_matches('.');
    if number.is_empty() || number.starts_with('.') || number.contains("..") {
        return None;
    }
    Some(number.to_string())
}
