use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::errors::{DocGraphError, Result};

/// Free-form node and edge properties.
pub type Properties = BTreeMap<String, serde_json::Value>;

/// Property key marking a `section` node as a page container.
pub const ROLE_PROPERTY: &str = "role";
/// Value of [`ROLE_PROPERTY`] for page containers.
pub const PAGE_ROLE: &str = "page";

/// Kinds of nodes in the document graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Document,
    Section,
    Paragraph,
    Table,
    Image,
    List,
    Code,
    Metadata,
}

#[allow(clippy::should_implement_trait)]
impl NodeType {
    /// Every node type, in declaration order.
    pub const ALL: [NodeType; 8] = [
        NodeType::Document,
        NodeType::Section,
        NodeType::Paragraph,
        NodeType::Table,
        NodeType::Image,
        NodeType::List,
        NodeType::Code,
        NodeType::Metadata,
    ];

    /// Returns the string representation of this node type.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Document => "document",
            NodeType::Section => "section",
            NodeType::Paragraph => "paragraph",
            NodeType::Table => "table",
            NodeType::Image => "image",
            NodeType::List => "list",
            NodeType::Code => "code",
            NodeType::Metadata => "metadata",
        }
    }

    /// Parses a string into a `NodeType`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<NodeType> {
        match s {
            "document" => Some(NodeType::Document),
            "section" => Some(NodeType::Section),
            "paragraph" => Some(NodeType::Paragraph),
            "table" => Some(NodeType::Table),
            "image" => Some(NodeType::Image),
            "list" => Some(NodeType::List),
            "code" => Some(NodeType::Code),
            "metadata" => Some(NodeType::Metadata),
            _ => None,
        }
    }

    /// Like [`NodeType::from_str`] but reports an unknown name as a validation error.
    pub fn parse(s: &str) -> Result<NodeType> {
        NodeType::from_str(s).ok_or_else(|| {
            DocGraphError::validation(
                "type",
                format!(
                    "invalid node type '{}'; expected one of: {}",
                    s,
                    NodeType::ALL.map(|t| t.as_str()).join(", ")
                ),
            )
        })
    }
}

/// Kinds of directed relations between nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Contains,
    Follows,
    References,
    Similar,
}

#[allow(clippy::should_implement_trait)]
impl EdgeType {
    pub const ALL: [EdgeType; 4] = [
        EdgeType::Contains,
        EdgeType::Follows,
        EdgeType::References,
        EdgeType::Similar,
    ];

    /// Returns the string representation of this edge type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Contains => "contains",
            EdgeType::Follows => "follows",
            EdgeType::References => "references",
            EdgeType::Similar => "similar",
        }
    }

    /// Parses a string into an `EdgeType`, returning `None` for unrecognized values.
    pub fn from_str(s: &str) -> Option<EdgeType> {
        match s {
            "contains" => Some(EdgeType::Contains),
            "follows" => Some(EdgeType::Follows),
            "references" => Some(EdgeType::References),
            "similar" => Some(EdgeType::Similar),
            _ => None,
        }
    }

    /// Like [`EdgeType::from_str`] but reports an unknown name as a validation error.
    pub fn parse(s: &str) -> Result<EdgeType> {
        EdgeType::from_str(s).ok_or_else(|| {
            DocGraphError::validation(
                "type",
                format!(
                    "invalid edge type '{}'; expected one of: {}",
                    s,
                    EdgeType::ALL.map(|t| t.as_str()).join(", ")
                ),
            )
        })
    }
}

/// Categories of textual cross-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Section,
    Figure,
    Table,
    Page,
    Citation,
    CrossReference,
}

#[allow(clippy::should_implement_trait)]
impl ReferenceType {
    pub const ALL: [ReferenceType; 6] = [
        ReferenceType::Section,
        ReferenceType::Figure,
        ReferenceType::Table,
        ReferenceType::Page,
        ReferenceType::Citation,
        ReferenceType::CrossReference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Section => "section",
            ReferenceType::Figure => "figure",
            ReferenceType::Table => "table",
            ReferenceType::Page => "page",
            ReferenceType::Citation => "citation",
            ReferenceType::CrossReference => "cross_reference",
        }
    }

    pub fn from_str(s: &str) -> Option<ReferenceType> {
        match s {
            "section" => Some(ReferenceType::Section),
            "figure" => Some(ReferenceType::Figure),
            "table" => Some(ReferenceType::Table),
            "page" => Some(ReferenceType::Page),
            "citation" => Some(ReferenceType::Citation),
            "cross_reference" => Some(ReferenceType::CrossReference),
            _ => None,
        }
    }
}

/// Location of a node's content in the source document.
///
/// `page` is 1-based; `start..end` is a non-empty character range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub page: u32,
    pub start: usize,
    pub end: usize,
}

impl Position {
    pub fn new(page: u32, start: usize, end: usize) -> Self {
        Position { page, start, end }
    }

    /// Ordering key used for reading-order comparisons.
    pub fn reading_order(&self) -> (u32, usize) {
        (self.page, self.start)
    }

    /// Distance used by the spatial heuristics: one page counts as 1000 characters.
    pub fn distance_to(&self, other: &Position) -> u64 {
        let page_delta = u64::from(self.page.abs_diff(other.page));
        let char_delta = self.start.abs_diff(other.start) as u64;
        page_delta * 1000 + char_delta
    }
}

/// Confidence plus arbitrary properties attached to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub confidence: f64,
    #[serde(default)]
    pub properties: Properties,
}

/// A typed unit of document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    pub content: String,
    pub position: Position,
    pub metadata: NodeMetadata,
    pub created_at: u64,
    pub updated_at: u64,
}

impl GraphNode {
    pub fn confidence(&self) -> f64 {
        self.metadata.confidence
    }

    /// Returns a string property, if present.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.metadata.properties.get(key).and_then(|v| v.as_str())
    }

    /// `true` for the synthetic per-page container sections created by the builder.
    pub fn is_page_container(&self) -> bool {
        self.node_type == NodeType::Section && self.property_str(ROLE_PROPERTY) == Some(PAGE_ROLE)
    }

    /// `true` for section nodes that represent real headings.
    pub fn is_heading(&self) -> bool {
        self.node_type == NodeType::Section && !self.is_page_container()
    }

    /// Paragraphs and headings: the nodes whose content is scanned for references.
    pub fn is_text_node(&self) -> bool {
        self.node_type == NodeType::Paragraph || self.is_heading()
    }
}

/// A directed, typed, weighted relation between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub weight: f64,
    #[serde(default)]
    pub metadata: Properties,
    pub created_at: u64,
}

impl GraphEdge {
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// `true` if the edge touches `node_id` at either end.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Lifecycle of a graph: `Building` moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphStatus {
    #[default]
    Building,
    Complete,
    Error,
}

impl GraphStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphStatus::Building => "building",
            GraphStatus::Complete => "complete",
            GraphStatus::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, GraphStatus::Building)
    }
}

/// Derived statistics, recomputed after every graph mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<String, usize>,
    pub average_degree: f64,
    pub max_degree: usize,
    /// Edges divided by the number of possible directed pairs.
    pub density: f64,
    /// Approximation: the number of degree-0 nodes.
    pub isolated_components: usize,
}

/// Graph-level metadata carried through serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub status: GraphStatus,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub build_time_ms: Option<u64>,
    #[serde(default)]
    pub statistics: GraphStatistics,
    #[serde(default)]
    pub properties: Properties,
}

/// A textual cross-reference found by the matcher, before resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedReference {
    /// The matched phrase, e.g. `"see Section 3.2"`.
    pub text: String,
    /// Byte offset of the match in the scanned text.
    pub start: usize,
    pub end: usize,
    pub reference_type: ReferenceType,
    /// Extracted target, e.g. `"3.2"`.
    pub target: String,
    pub pattern_id: String,
    pub confidence: f64,
    /// Surrounding text window.
    pub context: String,
}

/// Outcome of resolving one reference against a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceResolution {
    pub reference: DetectedReference,
    pub target: Option<GraphNode>,
    pub confidence: f64,
    pub reason: String,
    /// Name of the strategy that produced `target`.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub alternatives: Vec<GraphNode>,
}

impl ReferenceResolution {
    /// A confidence-0 result explaining why nothing was found.
    pub fn unresolved(reference: DetectedReference, reason: impl Into<String>) -> Self {
        ReferenceResolution {
            reference,
            target: None,
            confidence: 0.0,
            reason: reason.into(),
            strategy: None,
            alternatives: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.target.is_some() && self.confidence > 0.0
    }

    pub fn target_id(&self) -> Option<&str> {
        self.target.as_ref().map(|n| n.id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parser input
// ---------------------------------------------------------------------------

/// Document structure handed over by the PDF extraction stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedDocument {
    pub pages: Vec<ParsedPage>,
    pub metadata: DocumentMetadata,
}

/// One page of extracted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedPage {
    pub page_number: u32,
    pub text: String,
    pub paragraphs: Vec<ParsedParagraph>,
    pub text_elements: Vec<TextElement>,
}

/// A paragraph segmented by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsedParagraph {
    pub content: String,
    pub page_number: u32,
    pub start: usize,
    pub end: usize,
    pub line_count: usize,
    pub confidence: Option<f64>,
}

/// A positioned run of text on a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextElement {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Document-level metadata reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Vec<String>,
    pub language: Option<String>,
    pub page_count: Option<u32>,
    pub file_size: Option<u64>,
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hex_str = hex::encode(hasher.finalize());
    hex_str[..32].to_string()
}

/// Generates a deterministic node ID.
///
/// The ID format is `"type:32hexchars"` where the hex portion is the first 32
/// characters of the SHA-256 hash of the input components.
pub fn generate_node_id(
    document_id: &str,
    node_type: NodeType,
    page: u32,
    start: usize,
    sequence: u64,
) -> String {
    let input = format!(
        "{}:{}:{}:{}:{}",
        document_id,
        node_type.as_str(),
        page,
        start,
        sequence
    );
    format!("{}:{}", node_type.as_str(), short_hash(&input))
}

/// Generates a deterministic edge ID from its endpoints and type.
pub fn generate_edge_id(source: &str, target: &str, edge_type: EdgeType) -> String {
    let input = format!("{}->{}:{}", source, target, edge_type.as_str());
    format!("{}:{}", edge_type.as_str(), short_hash(&input))
}

/// Hex SHA-256 of the given text.
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns the current UNIX timestamp in milliseconds.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
