//! Entity span detection
//!
//! Provides the trait-based detection interface and implementations for
//! locating direct identifiers in free-text clinical notes.

pub mod ner;
pub mod patterns;
pub mod regex;

use crate::config::{DetectorBackend, DetectorConfig};
use crate::deidentification::models::EntitySpan;
use crate::domain::{DeidError, DetectionError, Result};
use async_trait::async_trait;
use std::sync::Arc;

pub use self::ner::HttpNerDetector;
pub use self::regex::RegexDetector;

/// Trait for entity span detectors
///
/// Implementations must return an empty sequence for empty input and must fail
/// with [`DetectionError::ModelUnavailable`] rather than return "no entities"
/// when the underlying model cannot run.
#[async_trait]
pub trait EntitySpanDetector: Send + Sync {
    /// Detect entity spans in `text`
    async fn detect(&self, text: &str) -> std::result::Result<Vec<EntitySpan>, DetectionError>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Build the detector selected in configuration
pub fn create_detector(config: &DetectorConfig) -> Result<Arc<dyn EntitySpanDetector>> {
    let detector: Arc<dyn EntitySpanDetector> = match config.backend {
        DetectorBackend::Regex => {
            let detector = match config.pattern_library {
                Some(ref path) => {
                    let registry = patterns::PatternRegistry::from_file(path)
                        .map_err(|e| DeidError::Configuration(format!("{e:#}")))?;
                    RegexDetector::with_registry(registry)
                }
                None => RegexDetector::new()
                    .map_err(|e| DeidError::Configuration(format!("{e:#}")))?,
            };
            Arc::new(detector.with_confidence_threshold(config.confidence_threshold))
        }
        DetectorBackend::NerHttp => Arc::new(HttpNerDetector::new(config)?),
    };

    tracing::info!(detector = detector.name(), "Entity detector initialized");
    Ok(detector)
}
