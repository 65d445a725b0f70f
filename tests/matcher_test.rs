use docgraph::config::MatcherConfig;
use docgraph::references::matcher::clean_text;
use docgraph::references::patterns::{pattern_by_id, patterns, patterns_for_type};
use docgraph::references::ReferenceMatcher;
use docgraph::types::*;

fn assert_no_overlaps(references: &[DetectedReference]) {
    for (i, a) in references.iter().enumerate() {
        for b in &references[i + 1..] {
            assert!(
                a.end <= b.start || b.end <= a.start,
                "'{}' overlaps '{}'",
                a.text,
                b.text
            );
        }
    }
}

#[test]
fn test_section_and_figure_in_one_sentence() {
    let text = "For details see section 3.2 and Figure 1.";
    let result = ReferenceMatcher::default().find_references(text);

    assert_eq!(result.references.len(), 2);
    let section = &result.references[0];
    assert_eq!(section.reference_type, ReferenceType::Section);
    assert_eq!(section.target, "3.2");
    assert_eq!(section.pattern_id, "see_section");
    assert_eq!(section.text, "see section 3.2");
    assert_eq!((section.start, section.end), (12, 27));
    assert_eq!(section.confidence, 1.0);

    let figure = &result.references[1];
    assert_eq!(figure.reference_type, ReferenceType::Figure);
    assert_eq!(figure.target, "1");
    assert_eq!(figure.pattern_id, "figure_capitalized");
    assert!((figure.confidence - 0.805).abs() < 1e-9);

    assert_no_overlaps(&result.references);
    assert_eq!(result.cleaned_text, "For details and.");
}

#[test]
fn test_higher_priority_pattern_wins_overlap() {
    let result = ReferenceMatcher::default().find_references("Please see Section 4.1 now.");
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].pattern_id, "see_section");
    assert_eq!(result.references[0].target, "4.1");
}

#[test]
fn test_no_overlaps_and_shorter_cleaned_text() {
    let matcher = ReferenceMatcher::default();
    let texts = [
        "See Table 2 and table 2, then Tab. 2 again.",
        "Chapter 3 builds on § 2.1 and sect. 2.2 [4, 5].",
        "As discussed earlier (Lee et al., 2019), see below for the next section.",
        "Figure 3a, fig. 3b and figure 3c appear on page 4 (p. 4).",
        "",
        "Nothing to see here.",
    ];
    for text in texts {
        let result = matcher.find_references(text);
        assert_no_overlaps(&result.references);
        assert!(result.cleaned_text.len() <= text.len(), "{}", text);
        for pair in result.references.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }
}

#[test]
fn test_empty_text_yields_nothing() {
    let result = ReferenceMatcher::default().find_references("   ");
    assert!(result.references.is_empty());
    assert_eq!(result.cleaned_text, "");
}

#[test]
fn test_citations() {
    let result = ReferenceMatcher::default()
        .find_references("Prior work [3, 4] and (Smith, 2020) agree.");
    assert_eq!(result.references.len(), 2);

    let numeric = &result.references[0];
    assert_eq!(numeric.reference_type, ReferenceType::Citation);
    assert_eq!(numeric.target, "3, 4");
    assert!((numeric.confidence - 0.82).abs() < 1e-9);

    let author = &result.references[1];
    assert_eq!(author.pattern_id, "citation_author_year");
    assert_eq!(author.target, "Smith, 2020");
    assert!((author.confidence - 0.605).abs() < 1e-9);
    assert_eq!(result.cleaned_text, "Prior work and agree.");
}

#[test]
fn test_cross_references() {
    let result = ReferenceMatcher::default()
        .find_references("As discussed earlier, the method converges. See below.");
    let targets: Vec<(&str, ReferenceType)> = result
        .references
        .iter()
        .map(|r| (r.target.as_str(), r.reference_type))
        .collect();
    assert_eq!(
        targets,
        vec![
            ("earlier", ReferenceType::CrossReference),
            ("below", ReferenceType::CrossReference),
        ]
    );
}

#[test]
fn test_find_references_by_type() {
    let matcher = ReferenceMatcher::default();
    let text = "For details see section 3.2 and Figure 1.";
    let figures = matcher.find_references_by_type(text, ReferenceType::Figure);
    assert_eq!(figures.len(), 1);
    assert_eq!(figures[0].target, "1");
    assert!(matcher
        .find_references_by_type(text, ReferenceType::Table)
        .is_empty());
}

#[test]
fn test_context_window() {
    let matcher = ReferenceMatcher::new(MatcherConfig {
        context_window: 5,
        ..MatcherConfig::default()
    });
    let result = matcher.find_references("aaaaaaaaaa see Table 2 bbbbbbbbbb");
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].context, "aaaa see Table 2 bbbb");
}

#[test]
fn test_oversized_input_is_truncated() {
    let matcher = ReferenceMatcher::new(MatcherConfig {
        max_text_bytes: 20,
        ..MatcherConfig::default()
    });
    let result = matcher.find_references("Table 1 is here. Figure 9 is far away.");
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].reference_type, ReferenceType::Table);
}

#[test]
fn test_truncation_respects_char_boundaries() {
    let matcher = ReferenceMatcher::new(MatcherConfig {
        max_text_bytes: 10,
        ..MatcherConfig::default()
    });
    // "§" is two bytes, so byte 10 falls inside the second one.
    let result = matcher.find_references("§ 1 and § 2");
    assert_eq!(result.references.len(), 1);
    assert_eq!(result.references[0].target, "1");
}

#[test]
fn test_clean_text_restores_leading_capital() {
    let matcher = ReferenceMatcher::default();
    let text = "Section 2 explains the method.";
    let result = matcher.find_references(text);
    assert_eq!(result.cleaned_text, "Explains the method.");
    assert_eq!(clean_text(text, &[]), text);
}

#[test]
fn test_clean_text_drops_empty_parentheses() {
    let result = ReferenceMatcher::default().find_references("The loss drops (see Figure 4) quickly.");
    assert_eq!(result.cleaned_text, "The loss drops quickly.");
}

#[test]
fn test_pattern_table_is_sorted_and_self_consistent() {
    let all = patterns();
    assert!(all.len() >= 20);
    for pair in all.windows(2) {
        assert!(pair[0].priority() >= pair[1].priority());
    }
    assert_eq!(all[0].id(), "see_section");
    for pattern in all {
        for example in pattern.definition.examples {
            assert!(
                pattern.regex.is_match(example),
                "{} does not match its example '{}'",
                pattern.id(),
                example
            );
        }
    }
}

#[test]
fn test_pattern_lookups() {
    assert_eq!(pattern_by_id("chapter").unwrap().priority(), 14);
    assert!(pattern_by_id("nonexistent").is_none());
    let citations = patterns_for_type(ReferenceType::Citation);
    assert_eq!(citations.len(), 2);
    assert!(citations
        .iter()
        .all(|p| p.reference_type() == ReferenceType::Citation));
}
