//! HTTP client for an external named-entity recognition service
//!
//! The service receives `{"text": ...}` and answers with
//! `{"entities": [{"label": "PERSON", "start": 8, "end": 18}, ...]}`, where
//! offsets are character positions (the convention of spaCy `Doc.ents`).

use super::EntitySpanDetector;
use crate::config::{DetectorConfig, SecretString};
use crate::deidentification::models::{EntityCategory, EntitySpan};
use crate::domain::{DeidError, DetectionError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct NerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct NerResponse {
    entities: Vec<NerEntity>,
}

#[derive(Debug, Deserialize)]
struct NerEntity {
    label: String,
    start: usize,
    end: usize,
}

/// Entity detector backed by a remote NER model
///
/// Any failure to obtain a well-formed answer is reported as
/// [`DetectionError::ModelUnavailable`]; it is never treated as "no entities".
pub struct HttpNerDetector {
    endpoint: String,
    client: Client,
    api_key: Option<SecretString>,
}

impl HttpNerDetector {
    /// Create a detector from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoint is set or the HTTP
    /// client cannot be built.
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            DeidError::Configuration("detector.endpoint is required for the NER detector".into())
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DeidError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            client,
            api_key: config.api_key.clone(),
        })
    }

    /// Service URL
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn to_spans(
        entities: Vec<NerEntity>,
        text_len: usize,
    ) -> std::result::Result<Vec<EntitySpan>, DetectionError> {
        let mut spans = Vec::with_capacity(entities.len());

        for entity in entities {
            if entity.end <= entity.start || entity.end > text_len {
                return Err(DetectionError::InvalidSpan(format!(
                    "{} at [{}, {}) for text of length {}",
                    entity.label, entity.start, entity.end, text_len
                )));
            }

            let Some(category) = EntityCategory::from_model_label(&entity.label) else {
                tracing::trace!(label = %entity.label, "Dropping unmapped NER label");
                continue;
            };

            let span = EntitySpan::new(category, entity.start, entity.end)
                .map_err(DetectionError::InvalidSpan)?;
            spans.push(span);
        }

        spans.sort_by_key(|span| span.sort_key());
        spans.dedup();
        Ok(spans)
    }
}

#[async_trait]
impl EntitySpanDetector for HttpNerDetector {
    async fn detect(&self, text: &str) -> std::result::Result<Vec<EntitySpan>, DetectionError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.client.post(&self.endpoint).json(&NerRequest { text });
        if let Some(ref key) = self.api_key {
            request =
                request.header(reqwest::header::AUTHORIZATION, key.expose_secret().bearer());
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(endpoint = %self.endpoint, error = %e, "NER service request failed");
            DetectionError::ModelUnavailable(format!("NER service unreachable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                endpoint = %self.endpoint,
                status = %status,
                "NER service returned an error"
            );
            return Err(DetectionError::ModelUnavailable(format!(
                "NER service returned status {status}"
            )));
        }

        let body: NerResponse = response.json().await.map_err(|e| {
            DetectionError::ModelUnavailable(format!("Undecodable NER response: {e}"))
        })?;

        let spans = Self::to_spans(body.entities, text.chars().count())?;
        tracing::debug!(spans = spans.len(), "NER detection completed");
        Ok(spans)
    }

    fn name(&self) -> &'static str {
        "ner_http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(label: &str, start: usize, end: usize) -> NerEntity {
        NerEntity {
            label: label.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn test_new_requires_endpoint() {
        let config = DetectorConfig::default();
        assert!(matches!(
            HttpNerDetector::new(&config),
            Err(DeidError::Configuration(_))
        ));
    }

    #[test]
    fn test_to_spans_maps_and_drops_labels() {
        let spans = HttpNerDetector::to_spans(
            vec![
                entity("DATE", 35, 50),
                entity("PERSON", 8, 18),
                entity("CARDINAL", 43, 44),
                entity("GPE", 0, 3),
            ],
            51,
        )
        .unwrap();

        assert_eq!(
            spans,
            vec![
                EntitySpan::new(EntityCategory::Location, 0, 3).unwrap(),
                EntitySpan::new(EntityCategory::Person, 8, 18).unwrap(),
                EntitySpan::new(EntityCategory::Date, 35, 50).unwrap(),
            ]
        );
    }

    #[test]
    fn test_to_spans_rejects_inverted_span() {
        let result = HttpNerDetector::to_spans(vec![entity("PERSON", 10, 4)], 20);
        assert!(matches!(result, Err(DetectionError::InvalidSpan(_))));
    }

    #[test]
    fn test_to_spans_rejects_span_past_end() {
        let result = HttpNerDetector::to_spans(vec![entity("PERSON", 10, 40)], 20);
        assert!(matches!(result, Err(DetectionError::InvalidSpan(_))));
    }
}
