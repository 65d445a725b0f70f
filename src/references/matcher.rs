use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::MatcherConfig;
use crate::references::patterns::{patterns, CompiledPattern, MAX_PRIORITY};
use crate::types::{DetectedReference, ReferenceType};

static DOTTED_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d+").expect("dotted number regex is valid"));

/// References found in a text, plus the text with those references removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Non-overlapping matches, sorted by start offset.
    pub references: Vec<DetectedReference>,
    pub cleaned_text: String,
}

/// Scans text for cross-reference phrasings.
pub struct ReferenceMatcher {
    config: MatcherConfig,
}

impl Default for ReferenceMatcher {
    fn default() -> Self {
        Self::new(MatcherConfig::default())
    }
}

struct Candidate {
    reference: DetectedReference,
    priority: u8,
}

impl ReferenceMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Finds every reference in `text` and produces the cleaned text.
    ///
    /// When two matches overlap, the one from the higher-priority pattern
    /// wins; among equal priorities the earlier match wins. Empty input
    /// yields an empty result.
    pub fn find_references(&self, text: &str) -> MatchResult {
        let text = self.bounded(text);
        if text.trim().is_empty() {
            return MatchResult {
                references: Vec::new(),
                cleaned_text: String::new(),
            };
        }

        let references = self.detect(text, patterns().iter());
        let cleaned_text = clean_text(text, &references);
        debug!(count = references.len(), "references detected");

        MatchResult {
            references,
            cleaned_text,
        }
    }

    /// Like [`find_references`](Self::find_references) but only applies the
    /// patterns of one reference type.
    pub fn find_references_by_type(
        &self,
        text: &str,
        reference_type: ReferenceType,
    ) -> Vec<DetectedReference> {
        let text = self.bounded(text);
        self.detect(
            text,
            patterns()
                .iter()
                .filter(|p| p.reference_type() == reference_type),
        )
    }

    fn bounded<'t>(&self, text: &'t str) -> &'t str {
        let max = self.config.max_text_bytes;
        if text.len() <= max {
            return text;
        }
        let mut cut = max;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        warn!(
            length = text.len(),
            limit = max,
            "input text exceeds the matcher limit; truncating"
        );
        &text[..cut]
    }

    fn detect<'p>(
        &self,
        text: &str,
        patterns: impl Iterator<Item = &'p CompiledPattern>,
    ) -> Vec<DetectedReference> {
        let mut candidates = Vec::new();
        for pattern in patterns {
            for caps in pattern.regex.captures_iter(text) {
                let Some(whole) = caps.get(0) else { continue };
                let target = caps
                    .get(1)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                if target.is_empty() {
                    continue;
                }
                let matched = whole.as_str().to_string();
                let confidence = score(&matched, &target, pattern);
                candidates.push(Candidate {
                    reference: DetectedReference {
                        context: context_window(
                            text,
                            whole.start(),
                            whole.end(),
                            self.config.context_window,
                        ),
                        text: matched,
                        start: whole.start(),
                        end: whole.end(),
                        reference_type: pattern.reference_type(),
                        target,
                        pattern_id: pattern.id().to_string(),
                        confidence,
                    },
                    priority: pattern.priority(),
                });
            }
        }
        select_non_overlapping(candidates)
    }
}

/// Confidence of one match: pattern priority plus small textual bonuses.
fn score(matched: &str, target: &str, pattern: &CompiledPattern) -> f64 {
    let mut confidence =
        0.5 + 0.3 * f64::from(pattern.priority()) / f64::from(MAX_PRIORITY);
    if DOTTED_NUMBER_RE.is_match(target) {
        confidence += 0.1;
    }
    if matched.to_lowercase().contains("see") {
        confidence += 0.1;
    }
    if matched.chars().next().is_some_and(|c| c.is_uppercase()) {
        confidence += 0.05;
    }
    if pattern.reference_type() == ReferenceType::Citation && matched.starts_with('[') {
        confidence += 0.2;
    }
    confidence.min(1.0)
}

fn select_non_overlapping(mut candidates: Vec<Candidate>) -> Vec<DetectedReference> {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.reference.start.cmp(&b.reference.start))
    });

    let mut kept: Vec<DetectedReference> = Vec::new();
    for candidate in candidates {
        let r = candidate.reference;
        let overlaps = kept.iter().any(|k| r.start < k.end && k.start < r.end);
        if !overlaps {
            kept.push(r);
        }
    }
    kept.sort_by_key(|r| r.start);
    kept
}

/// Up to `window` characters on each side of `start..end`, trimmed.
fn context_window(text: &str, start: usize, end: usize, window: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map(|(i, _)| i)
        .unwrap_or(start);
    let to = text[end..]
        .char_indices()
        .nth(window)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());
    text[from..to].trim().to_string()
}

/// Removes the matched spans and tidies the remaining whitespace and
/// punctuation. The result is never longer than `text`.
pub fn clean_text(text: &str, references: &[DetectedReference]) -> String {
    let mut spans: Vec<(usize, usize)> = references.iter().map(|r| (r.start, r.end)).collect();
    spans.sort_unstable();

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (start, end) in spans {
        if start < last || end > text.len() {
            continue;
        }
        out.push_str(&text[last..start]);
        let mid_sentence = text[..start]
            .trim_end()
            .chars()
            .last()
            .is_some_and(|c| !matches!(c, '.' | '!' | '?'));
        if mid_sentence {
            out.push(' ');
        }
        last = end;
    }
    out.push_str(&text[last..]);

    let mut cleaned = out.split_whitespace().collect::<Vec<_>>().join(" ");
    for punct in [".", ",", ";", ":", "!", "?", ")"] {
        cleaned = cleaned.replace(&format!(" {}", punct), punct);
    }
    cleaned = cleaned.replace("( ", "(").replace("()", "");
    let mut cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let started_upper = text
        .trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_uppercase());
    if started_upper {
        if let Some(first) = cleaned.chars().next().filter(|c| c.is_ascii_lowercase()) {
            cleaned.replace_range(..1, &first.to_ascii_uppercase().to_string());
        }
    }
    cleaned
}
