//! Static catalogue of cross-reference phrasings.
//!
//! Each entry captures the reference target in group 1. The compiled table
//! is sorted by priority (highest first) once, on first use, so the matcher
//! always tries the most specific phrasing first.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::ReferenceType;

/// Highest priority in the table; confidence scales against it.
pub const MAX_PRIORITY: u8 = 20;

/// One recognizable reference phrasing.
#[derive(Debug, Clone, Copy)]
pub struct ReferencePattern {
    pub id: &'static str,
    pub pattern: &'static str,
    pub reference_type: ReferenceType,
    pub priority: u8,
    pub examples: &'static [&'static str],
}

/// A [`ReferencePattern`] with its compiled regex.
#[derive(Debug)]
pub struct CompiledPattern {
    pub definition: &'static ReferencePattern,
    pub regex: Regex,
}

impl CompiledPattern {
    pub fn id(&self) -> &'static str {
        self.definition.id
    }

    pub fn reference_type(&self) -> ReferenceType {
        self.definition.reference_type
    }

    pub fn priority(&self) -> u8 {
        self.definition.priority
    }
}

const PATTERN_TABLE: &[ReferencePattern] = &[
    // Explicit "see ..." phrasings are the most reliable.
    ReferencePattern {
        id: "see_section",
        pattern: r"\b[Ss]ee\s+(?:[Ss]ection|[Ss]ect?\.|§)\s*(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Section,
        priority: 20,
        examples: &["see Section 3.2", "See section 4", "see § 2.1"],
    },
    ReferencePattern {
        id: "see_figure",
        pattern: r"\b[Ss]ee\s+(?:[Ff]igure|[Ff]ig\.)\s*(\d+(?:\.\d+)*[a-z]?)",
        reference_type: ReferenceType::Figure,
        priority: 19,
        examples: &["see Figure 2", "See fig. 3b"],
    },
    ReferencePattern {
        id: "see_table",
        pattern: r"\b[Ss]ee\s+(?:[Tt]able|[Tt]ab\.)\s*(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Table,
        priority: 19,
        examples: &["see Table 1", "See tab. 4"],
    },
    ReferencePattern {
        id: "section_capitalized",
        pattern: r"\bSection\s+(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Section,
        priority: 18,
        examples: &["Section 3.2", "Section 1"],
    },
    ReferencePattern {
        id: "figure_capitalized",
        pattern: r"\bFigure\s+(\d+(?:\.\d+)*[a-z]?)",
        reference_type: ReferenceType::Figure,
        priority: 17,
        examples: &["Figure 1", "Figure 2a"],
    },
    ReferencePattern {
        id: "table_capitalized",
        pattern: r"\bTable\s+(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Table,
        priority: 17,
        examples: &["Table 2", "Table 3.1"],
    },
    ReferencePattern {
        id: "section_symbol",
        pattern: r"§\s*(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Section,
        priority: 16,
        examples: &["§ 4.2", "§3"],
    },
    ReferencePattern {
        id: "see_page",
        pattern: r"\b[Ss]ee\s+(?:[Pp]age|p\.)\s*(\d+)",
        reference_type: ReferenceType::Page,
        priority: 16,
        examples: &["see page 12", "See p. 4"],
    },
    ReferencePattern {
        id: "section_lowercase",
        pattern: r"\bsection\s+(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Section,
        priority: 15,
        examples: &["section 3.2", "in section 5"],
    },
    ReferencePattern {
        id: "figure_abbrev",
        pattern: r"\b[Ff]ig\.\s*(\d+(?:\.\d+)*[a-z]?)",
        reference_type: ReferenceType::Figure,
        priority: 15,
        examples: &["Fig. 3", "fig. 2b"],
    },
    ReferencePattern {
        id: "chapter",
        pattern: r"\b[Cc]hapter\s+(\d+)",
        reference_type: ReferenceType::Section,
        priority: 14,
        examples: &["Chapter 2", "chapter 7"],
    },
    ReferencePattern {
        id: "figure_lowercase",
        pattern: r"\bfigure\s+(\d+(?:\.\d+)*[a-z]?)",
        reference_type: ReferenceType::Figure,
        priority: 13,
        examples: &["figure 4"],
    },
    ReferencePattern {
        id: "table_lowercase",
        pattern: r"\btable\s+(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Table,
        priority: 13,
        examples: &["table 2"],
    },
    ReferencePattern {
        id: "section_abbrev",
        pattern: r"\b[Ss]ect?\.\s*(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Section,
        priority: 12,
        examples: &["Sec. 4", "sect. 3.2"],
    },
    ReferencePattern {
        id: "table_abbrev",
        pattern: r"\b[Tt]ab\.\s*(\d+(?:\.\d+)*)",
        reference_type: ReferenceType::Table,
        priority: 12,
        examples: &["Tab. 2"],
    },
    ReferencePattern {
        id: "page_word",
        pattern: r"\b[Pp]age\s+(\d+)",
        reference_type: ReferenceType::Page,
        priority: 12,
        examples: &["page 7", "Page 12"],
    },
    ReferencePattern {
        id: "page_abbrev",
        pattern: r"\bpp?\.\s*(\d+)",
        reference_type: ReferenceType::Page,
        priority: 10,
        examples: &["p. 5", "pp. 10"],
    },
    // Citations rank below every named element.
    ReferencePattern {
        id: "citation_numeric",
        pattern: r"\[(\d+(?:\s*[,–-]\s*\d+)*)\]",
        reference_type: ReferenceType::Citation,
        priority: 8,
        examples: &["[12]", "[3, 4]", "[5-7]"],
    },
    ReferencePattern {
        id: "citation_author_year",
        pattern: r"\(([A-Z][A-Za-z'-]+(?:\s+et\s+al\.)?(?:\s+(?:and|&)\s+[A-Z][A-Za-z'-]+)?,\s*\d{4}[a-z]?)\)",
        reference_type: ReferenceType::Citation,
        priority: 7,
        examples: &["(Smith, 2020)", "(Lee et al., 2019)", "(Kim and Park, 2021a)"],
    },
    // Vague positional phrasings rank lowest.
    ReferencePattern {
        id: "see_above_below",
        pattern: r"\b[Ss]ee\s+(above|below)\b",
        reference_type: ReferenceType::CrossReference,
        priority: 4,
        examples: &["see above", "See below"],
    },
    ReferencePattern {
        id: "as_mentioned",
        pattern: r"\b[Aa]s\s+(?:mentioned|discussed|described|shown|noted|stated)\s+(above|below|earlier|previously|later)\b",
        reference_type: ReferenceType::CrossReference,
        priority: 3,
        examples: &["as mentioned above", "As discussed earlier"],
    },
    ReferencePattern {
        id: "relative_element",
        pattern: r"\b(?:the\s+)?((?:previous|preceding|next|following)\s+(?:section|chapter|figure|table|page|paragraph))\b",
        reference_type: ReferenceType::CrossReference,
        priority: 2,
        examples: &["the next section", "the previous figure"],
    },
    ReferencePattern {
        id: "in_the_above",
        pattern: r"\b(?:in|from)\s+the\s+(above|below)\b",
        reference_type: ReferenceType::CrossReference,
        priority: 1,
        examples: &["in the above", "from the below"],
    },
];

static COMPILED_PATTERNS: Lazy<Vec<CompiledPattern>> = Lazy::new(|| {
    let mut compiled: Vec<CompiledPattern> = PATTERN_TABLE
        .iter()
        .map(|definition| CompiledPattern {
            definition,
            regex: Regex::new(definition.pattern).expect("reference pattern table is valid"),
        })
        .collect();
    // Stable: equal priorities keep table order.
    compiled.sort_by(|a, b| b.priority().cmp(&a.priority()));
    compiled
});

/// All patterns, highest priority first.
pub fn patterns() -> &'static [CompiledPattern] {
    &COMPILED_PATTERNS
}

/// Patterns of one reference type, highest priority first.
pub fn patterns_for_type(reference_type: ReferenceType) -> Vec<&'static CompiledPattern> {
    patterns()
        .iter()
        .filter(|p| p.reference_type() == reference_type)
        .collect()
}

/// Looks up a pattern by id.
pub fn pattern_by_id(id: &str) -> Option<&'static CompiledPattern> {
    patterns().iter().find(|p| p.id() == id)
}
