//! Span-based redaction
//!
//! Replaces allow-listed entity spans with `[CATEGORY]` placeholders.

use crate::config::{OverlapPolicy, RedactionConfig};
use crate::deidentification::models::{EntityCategory, EntitySpan, RedactionResult};
use crate::domain::RedactionError;
use std::collections::BTreeSet;

/// Redactor - substitutes allow-listed spans with category placeholders
///
/// Output depends only on `(text, spans)`: span order in the input does not
/// matter, and the same span set always produces the same text.
#[derive(Debug, Clone)]
pub struct Redactor {
    allowed: BTreeSet<EntityCategory>,
    overlap_policy: OverlapPolicy,
}

impl Redactor {
    /// Create a redactor for the given categories
    pub fn new(
        allowed: impl IntoIterator<Item = EntityCategory>,
        overlap_policy: OverlapPolicy,
    ) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            overlap_policy,
        }
    }

    /// Create a redactor from configuration
    pub fn from_config(config: &RedactionConfig) -> Self {
        Self::new(config.allowed_categories.iter().copied(), config.overlap_policy)
    }

    /// Whether spans of `category` are substituted
    pub fn allows(&self, category: EntityCategory) -> bool {
        self.allowed.contains(&category)
    }

    /// Configured overlap policy
    pub fn overlap_policy(&self) -> OverlapPolicy {
        self.overlap_policy
    }

    /// Redact `text`
    ///
    /// # Errors
    ///
    /// - [`RedactionError::InvalidSpan`] if any span is empty or inverted
    /// - [`RedactionError::SpanOutOfBounds`] if any span ends past the text
    /// - [`RedactionError::OffsetConflict`] if allow-listed spans overlap under
    ///   [`OverlapPolicy::Reject`]
    pub fn redact(
        &self,
        text: &str,
        spans: &[EntitySpan],
    ) -> Result<RedactionResult, RedactionError> {
        if let Some(span) = spans.iter().find(|s| s.is_empty()) {
            return Err(RedactionError::InvalidSpan {
                start: span.start_offset,
                end: span.end_offset,
            });
        }

        let text_len = text.chars().count();
        if let Some(span) = spans.iter().find(|s| s.end_offset > text_len) {
            return Err(RedactionError::SpanOutOfBounds {
                start: span.start_offset,
                end: span.end_offset,
                text_len,
            });
        }

        let mut candidates: Vec<EntitySpan> = spans
            .iter()
            .filter(|s| self.allows(s.category))
            .copied()
            .collect();
        candidates.sort_by_key(|s| s.sort_key());
        candidates.dedup();

        let applied = self.resolve_overlaps(candidates)?;

        // Byte offset of every char boundary, including the end of the text
        let boundaries: Vec<usize> = text
            .char_indices()
            .map(|(byte, _)| byte)
            .chain(std::iter::once(text.len()))
            .collect();

        let mut redacted_text = text.to_string();
        for span in applied.iter().rev() {
            let range = boundaries[span.start_offset]..boundaries[span.end_offset];
            redacted_text.replace_range(range, &span.category.placeholder());
        }

        Ok(RedactionResult {
            redacted_text,
            applied_spans: applied,
        })
    }

    /// Collapse or reject overlaps in spans sorted by `sort_key`
    fn resolve_overlaps(
        &self,
        sorted: Vec<EntitySpan>,
    ) -> Result<Vec<EntitySpan>, RedactionError> {
        let mut resolved: Vec<EntitySpan> = Vec::with_capacity(sorted.len());

        for span in sorted {
            let Some(last) = resolved.last_mut() else {
                resolved.push(span);
                continue;
            };

            if !last.overlaps(&span) {
                resolved.push(span);
                continue;
            }

            match self.overlap_policy {
                OverlapPolicy::Merge => {
                    // `last` started first (or is longer), so its category wins
                    last.end_offset = last.end_offset.max(span.end_offset);
                }
                OverlapPolicy::Reject => {
                    return Err(RedactionError::OffsetConflict {
                        first_start: last.start_offset,
                        first_end: last.end_offset,
                        second_start: span.start_offset,
                        second_end: span.end_offset,
                    });
                }
            }
        }

        Ok(resolved)
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(EntityCategory::default_allow_list(), OverlapPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: &str = "Patient John Smith was admitted on October 8, 2025.";

    fn span(category: EntityCategory, start: usize, end: usize) -> EntitySpan {
        EntitySpan::new(category, start, end).unwrap()
    }

    #[test]
    fn test_scenario_redaction() {
        let redactor = Redactor::default();
        let spans = [
            span(EntityCategory::Person, 8, 18),
            span(EntityCategory::Date, 35, 50),
        ];

        let result = redactor.redact(SCENARIO, &spans).unwrap();
        assert_eq!(
            result.redacted_text,
            "Patient [PERSON] was admitted on [DATE]."
        );
        assert_eq!(result.applied_spans, spans.to_vec());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let redactor = Redactor::default();
        let forward = [
            span(EntityCategory::Person, 8, 18),
            span(EntityCategory::Date, 35, 50),
        ];
        let backward = [forward[1], forward[0]];

        assert_eq!(
            redactor.redact(SCENARIO, &forward).unwrap(),
            redactor.redact(SCENARIO, &backward).unwrap()
        );
    }

    #[test]
    fn test_no_spans_leaves_text_unchanged() {
        let result = Redactor::default().redact(SCENARIO, &[]).unwrap();
        assert_eq!(result.redacted_text, SCENARIO);
        assert!(!result.has_redactions());
    }

    #[test]
    fn test_non_allow_listed_category_kept() {
        let text = "Mail jane@example.com today";
        let spans = [span(EntityCategory::Email, 5, 21)];

        let result = Redactor::default().redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, text);
        assert!(result.applied_spans.is_empty());

        let redactor = Redactor::new([EntityCategory::Email], OverlapPolicy::Merge);
        let result = redactor.redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, "Mail [EMAIL] today");
    }

    #[test]
    fn test_overlap_merged_into_union() {
        let text = "Seen at Mercy General Hospital yesterday";
        // ORGANIZATION [8,30) and LOCATION [14,21) overlap
        let spans = [
            span(EntityCategory::Location, 14, 21),
            span(EntityCategory::Organization, 8, 30),
        ];

        let result = Redactor::default().redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, "Seen at [ORGANIZATION] yesterday");
        assert_eq!(
            result.applied_spans,
            vec![span(EntityCategory::Organization, 8, 30)]
        );
    }

    #[test]
    fn test_partial_overlap_extends_union() {
        let text = "abcdefghij";
        let spans = [
            span(EntityCategory::Person, 0, 4),
            span(EntityCategory::Date, 2, 7),
        ];

        let result = Redactor::default().redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, "[PERSON]hij");
        assert_eq!(result.applied_spans, vec![span(EntityCategory::Person, 0, 7)]);
    }

    #[test]
    fn test_same_range_tie_breaks_on_category_order() {
        let text = "Jordan";
        let spans = [
            span(EntityCategory::Location, 0, 6),
            span(EntityCategory::Person, 0, 6),
        ];

        let result = Redactor::default().redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, "[PERSON]");
    }

    #[test]
    fn test_adjacent_spans_both_applied() {
        let text = "JohnSmith";
        let spans = [
            span(EntityCategory::Person, 0, 4),
            span(EntityCategory::Person, 4, 9),
        ];

        let result = Redactor::new(EntityCategory::ALL, OverlapPolicy::Reject)
            .redact(text, &spans)
            .unwrap();
        assert_eq!(result.redacted_text, "[PERSON][PERSON]");
        assert_eq!(result.applied_spans.len(), 2);
    }

    #[test]
    fn test_reject_policy_fails_on_overlap() {
        let redactor = Redactor::new(EntityCategory::ALL, OverlapPolicy::Reject);
        let spans = [
            span(EntityCategory::Person, 8, 18),
            span(EntityCategory::Date, 15, 20),
        ];

        let err = redactor.redact(SCENARIO, &spans).unwrap_err();
        assert!(matches!(
            err,
            RedactionError::OffsetConflict {
                first_start: 8,
                first_end: 18,
                second_start: 15,
                second_end: 20,
            }
        ));
    }

    #[test]
    fn test_reject_policy_collapses_exact_duplicates() {
        let redactor = Redactor::new(EntityCategory::ALL, OverlapPolicy::Reject);
        let spans = [
            span(EntityCategory::Person, 8, 18),
            span(EntityCategory::Person, 8, 18),
        ];

        let result = redactor.redact(SCENARIO, &spans).unwrap();
        assert_eq!(result.applied_spans.len(), 1);
    }

    #[test]
    fn test_overlap_with_filtered_category_ignored() {
        // EMAIL is not allow-listed, so it cannot conflict
        let redactor = Redactor::new(EntityCategory::default_allow_list(), OverlapPolicy::Reject);
        let spans = [
            span(EntityCategory::Person, 8, 18),
            span(EntityCategory::Email, 10, 20),
        ];
        assert!(redactor.redact(SCENARIO, &spans).is_ok());
    }

    #[test]
    fn test_span_out_of_bounds() {
        let err = Redactor::default()
            .redact("short", &[span(EntityCategory::Person, 2, 9)])
            .unwrap_err();
        assert!(matches!(
            err,
            RedactionError::SpanOutOfBounds {
                start: 2,
                end: 9,
                text_len: 5
            }
        ));
    }

    #[test]
    fn test_inverted_span_is_an_error() {
        let inverted = EntitySpan {
            category: EntityCategory::Person,
            start_offset: 5,
            end_offset: 2,
        };
        let err = Redactor::default().redact("hello world", &[inverted]).unwrap_err();
        assert!(matches!(err, RedactionError::InvalidSpan { start: 5, end: 2 }));
    }

    #[test]
    fn test_multibyte_text_uses_char_offsets() {
        let text = "Patient José Müller seen 2025-01-02 in Zürich";
        let spans = [
            span(EntityCategory::Person, 8, 19),
            span(EntityCategory::Date, 25, 35),
        ];

        let result = Redactor::default().redact(text, &spans).unwrap();
        assert_eq!(result.redacted_text, "Patient [PERSON] seen [DATE] in Zürich");
    }

    #[test]
    fn test_span_ending_at_text_end() {
        let text = "Ward: Zürich";
        let result = Redactor::default()
            .redact(text, &[span(EntityCategory::Location, 6, 12)])
            .unwrap();
        assert_eq!(result.redacted_text, "Ward: [LOCATION]");
    }
}
