//! Regex-based entity detector

use super::{patterns::PatternRegistry, EntitySpanDetector};
use crate::deidentification::models::entity::char_offset;
use crate::deidentification::models::EntitySpan;
use crate::domain::DetectionError;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use super::patterns::ENTITY_GROUP;

/// Default minimum pattern confidence
const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Regex-based entity detector
///
/// Runs every pattern in the registry whose confidence meets the threshold.
/// When a pattern defines an `entity` group only that group is reported, so
/// `Patient John Smith` yields a span over `John Smith`.
pub struct RegexDetector {
    pattern_registry: Arc<PatternRegistry>,
    confidence_threshold: f32,
}

impl RegexDetector {
    /// Create a new regex detector with the built-in patterns
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self::with_registry(registry))
    }

    /// Create a new regex detector with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            pattern_registry: Arc::new(registry),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// Set the confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Current confidence threshold
    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Scan `text` synchronously
    pub fn detect_spans(&self, text: &str) -> Vec<EntitySpan> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();

        for pattern in self.pattern_registry.all_patterns() {
            if pattern.confidence < self.confidence_threshold {
                continue;
            }

            for capture in pattern.regex.captures_iter(text) {
                let matched = if pattern.has_entity_group {
                    capture.name(ENTITY_GROUP)
                } else {
                    capture.get(0)
                };

                let Some(matched) = matched else {
                    continue;
                };
                if matched.start() == matched.end() {
                    continue;
                }

                let start = char_offset(text, matched.start());
                let end = start + matched.as_str().chars().count();
                if let Ok(span) = EntitySpan::new(pattern.category, start, end) {
                    spans.push(span);
                }
            }
        }

        spans.sort_by_key(|span| span.sort_key());
        spans.dedup();

        tracing::trace!(
            spans = spans.len(),
            patterns = self.pattern_registry.len(),
            "Regex detection completed"
        );
        spans
    }
}

#[async_trait]
impl EntitySpanDetector for RegexDetector {
    async fn detect(&self, text: &str) -> std::result::Result<Vec<EntitySpan>, DetectionError> {
        Ok(self.detect_spans(text))
    }

    fn name(&self) -> &'static str {
        "regex"
    }
}
