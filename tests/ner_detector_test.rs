//! Integration tests for the remote NER detector against a mock service

use deid_ledger::adapters::ledger::{AuditLedgerClient, MemoryLedger};
use deid_ledger::config::{secret_string, DetectorBackend, DetectorConfig, OverlapPolicy};
use deid_ledger::deidentification::{
    create_detector, DeidentificationPipeline, EntityCategory, EntitySpan, EntitySpanDetector,
    HttpNerDetector, Redactor,
};
use deid_ledger::domain::{DeidError, DetectionError, Identity};
use mockito::{Matcher, Server};
use std::sync::Arc;
use std::time::Duration;

const NOTE: &str = "Patient John Smith was admitted on October 8, 2025.";

fn config(endpoint: String) -> DetectorConfig {
    DetectorConfig {
        backend: DetectorBackend::NerHttp,
        endpoint: Some(format!("{endpoint}/v1/entities")),
        api_key: Some(secret_string("ner-token".to_string())),
        timeout_seconds: 5,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_entities_become_spans() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/entities")
        .match_header("authorization", "Bearer ner-token")
        .match_body(Matcher::Json(serde_json::json!({ "text": NOTE })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"entities": [
                {"label": "DATE", "start": 35, "end": 50},
                {"label": "PERSON", "start": 8, "end": 18},
                {"label": "CARDINAL", "start": 47, "end": 50}
            ]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let detector = HttpNerDetector::new(&config(server.url())).unwrap();
    let spans = detector.detect(NOTE).await.unwrap();

    assert_eq!(
        spans,
        vec![
            EntitySpan::new(EntityCategory::Person, 8, 18).unwrap(),
            EntitySpan::new(EntityCategory::Date, 35, 50).unwrap(),
        ]
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_empty_text_skips_the_service() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/entities")
        .expect(0)
        .create_async()
        .await;

    let detector = create_detector(&config(server.url())).unwrap();
    assert_eq!(detector.name(), "ner_http");
    assert!(detector.detect("").await.unwrap().is_empty());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_service_error_is_model_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/entities")
        .with_status(500)
        .create_async()
        .await;

    let detector = HttpNerDetector::new(&config(server.url())).unwrap();
    let err = detector.detect(NOTE).await.unwrap_err();
    assert!(matches!(err, DetectionError::ModelUnavailable(_)));
}

#[tokio::test]
async fn test_garbled_response_is_model_unavailable() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/entities")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let detector = HttpNerDetector::new(&config(server.url())).unwrap();
    let err = detector.detect(NOTE).await.unwrap_err();
    assert!(matches!(err, DetectionError::ModelUnavailable(_)));
}

#[tokio::test]
async fn test_pipeline_refuses_when_model_is_down() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/v1/entities")
        .with_status(503)
        .create_async()
        .await;

    let memory = Arc::new(MemoryLedger::new());
    let pipeline = DeidentificationPipeline::new(
        create_detector(&config(server.url())).unwrap(),
        Redactor::new(EntityCategory::default_allow_list(), OverlapPolicy::Merge),
        Arc::new(AuditLedgerClient::new(memory.clone(), Duration::from_secs(5))),
    );
    let identity = Identity::parse("dr_strange", "medical_professional").unwrap();

    let err = pipeline.process(NOTE, "", &identity).await.unwrap_err();

    assert!(matches!(
        err,
        DeidError::Detection(DetectionError::ModelUnavailable(_))
    ));
    assert!(memory.records().is_empty());
}
