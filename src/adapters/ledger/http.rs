//! REST ledger gateway adapter
//!
//! Talks to a gateway that fronts the append-only ledger:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | submit | `POST /v1/records` |
//! | confirmation | `GET /v1/transactions/{tx_reference}` |
//! | read | `GET /v1/records/{sequence_id}` |
//! | count | `GET /v1/records/count` |
//!
//! Reads are retried with exponential backoff. Submissions are sent exactly
//! once: a retried submission could append the same event twice.

use super::{AuditLedger, LedgerResult, PendingTransaction};
use crate::config::{LedgerConfig, RetryConfig, SecretString};
use crate::domain::{
    AuditEntry, AuditRecord, CommitReceipt, ContentFingerprint, DeidError, LedgerError, Principal,
    Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    operator: &'a str,
    action: &'a str,
    purpose: &'a str,
    original_fingerprint: &'a str,
    new_fingerprint: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    tx_reference: String,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum TransactionState {
    Pending,
    Confirmed,
    Reverted,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    status: TransactionState,
    #[serde(default)]
    sequence_id: Option<u64>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordResponse {
    sequence_id: u64,
    timestamp: DateTime<Utc>,
    operator: String,
    action: String,
    purpose: String,
    original_fingerprint: ContentFingerprint,
    new_fingerprint: ContentFingerprint,
}

impl From<RecordResponse> for AuditRecord {
    fn from(r: RecordResponse) -> Self {
        AuditRecord {
            sequence_id: r.sequence_id,
            timestamp: r.timestamp,
            operator_identity: r.operator,
            action: r.action,
            purpose: r.purpose,
            original_fingerprint: r.original_fingerprint,
            new_fingerprint: r.new_fingerprint,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// Ledger gateway client
pub struct HttpLedger {
    base_url: String,
    client: Client,
    api_key: Option<SecretString>,
    poll_interval: Duration,
    retry: RetryConfig,
}

impl HttpLedger {
    /// Create a new gateway client
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no endpoint is set or the HTTP
    /// client cannot be built.
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            DeidError::Configuration("ledger.endpoint is required for the http ledger".into())
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .connect_timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| DeidError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            client,
            api_key: config.api_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            retry: config.retry.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_key {
            Some(ref key) => {
                request.header(reqwest::header::AUTHORIZATION, key.expose_secret().bearer())
            }
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> LedgerResult<Response> {
        self.authorized(request)
            .send()
            .await
            .map_err(|e| LedgerError::Connectivity(e.to_string()))
    }

    /// Map a non-success read response to a ledger error
    async fn read_error(response: Response) -> LedgerError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            LedgerError::Connectivity(format!("gateway returned {status}: {body}"))
        } else {
            LedgerError::InvalidResponse(format!("gateway returned {status}: {body}"))
        }
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> LedgerResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    /// Retry a read with exponential backoff
    async fn retry_read<F, T, Fut>(&self, operation: F) -> LedgerResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LedgerResult<T>>,
    {
        let max_retries = self.retry.max_retries;
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries {
                        return Err(e);
                    }

                    let delay_ms = (self.retry.initial_delay_ms as f64
                        * self.retry.backoff_multiplier.powi(attempt as i32 - 1))
                        as u64;
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    crate::log_retry_attempt!(attempt, max_retries, e.to_string());
                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn transaction_status(&self, tx_reference: &str) -> LedgerResult<TransactionResponse> {
        let url = self.url(&format!("/v1/transactions/{tx_reference}"));
        self.retry_read(|| async {
            let response = self.send(self.client.get(&url)).await?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(TransactionResponse {
                    // Not indexed yet
                    status: TransactionState::Pending,
                    sequence_id: None,
                    timestamp: None,
                    reason: None,
                }),
                s if s.is_success() => Self::decode(response).await,
                _ => Err(Self::read_error(response).await),
            }
        })
        .await
    }
}

#[async_trait]
impl AuditLedger for HttpLedger {
    async fn submit(
        &self,
        operator: &Principal,
        entry: &AuditEntry,
    ) -> LedgerResult<PendingTransaction> {
        let body = SubmitRequest {
            operator: operator.as_str(),
            action: &entry.action,
            purpose: &entry.purpose,
            original_fingerprint: entry.original_fingerprint.as_str(),
            new_fingerprint: entry.new_fingerprint.as_str(),
        };

        let response = self
            .send(self.client.post(self.url("/v1/records")).json(&body))
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let reason = response.text().await.unwrap_or_default();
            return Err(LedgerError::SubmissionRejected(format!("{status}: {reason}")));
        }
        if !status.is_success() {
            let reason = response.text().await.unwrap_or_default();
            return Err(LedgerError::Connectivity(format!(
                "gateway returned {status}: {reason}"
            )));
        }

        let accepted: SubmitResponse = Self::decode(response).await?;
        tracing::debug!(
            tx_reference = %accepted.tx_reference,
            operator = %operator,
            "Ledger submission accepted"
        );

        Ok(PendingTransaction {
            tx_reference: accepted.tx_reference,
            operator: operator.clone(),
            submitted_at: Utc::now(),
        })
    }

    async fn wait_for_confirmation(
        &self,
        pending: &PendingTransaction,
    ) -> LedgerResult<CommitReceipt> {
        loop {
            let tx = self.transaction_status(&pending.tx_reference).await?;
            match tx.status {
                TransactionState::Pending => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                TransactionState::Reverted => {
                    return Err(LedgerError::SubmissionRejected(format!(
                        "transaction {} reverted: {}",
                        pending.tx_reference,
                        tx.reason.unwrap_or_else(|| "no reason given".to_string())
                    )));
                }
                TransactionState::Confirmed => {
                    let (Some(sequence_id), Some(confirmed_at)) = (tx.sequence_id, tx.timestamp)
                    else {
                        return Err(LedgerError::InvalidResponse(format!(
                            "confirmed transaction {} is missing sequence_id or timestamp",
                            pending.tx_reference
                        )));
                    };
                    return Ok(CommitReceipt {
                        tx_reference: pending.tx_reference.clone(),
                        sequence_id,
                        confirmed_at,
                    });
                }
            }
        }
    }

    async fn read_record(&self, sequence_id: u64) -> LedgerResult<AuditRecord> {
        let url = self.url(&format!("/v1/records/{sequence_id}"));
        self.retry_read(|| async {
            let response = self.send(self.client.get(&url)).await?;
            match response.status() {
                StatusCode::NOT_FOUND => Err(LedgerError::NotFound(sequence_id)),
                s if s.is_success() => Self::decode::<RecordResponse>(response)
                    .await
                    .map(AuditRecord::from),
                _ => Err(Self::read_error(response).await),
            }
        })
        .await
    }

    async fn record_count(&self) -> LedgerResult<u64> {
        let url = self.url("/v1/records/count");
        self.retry_read(|| async {
            let response = self.send(self.client.get(&url)).await?;
            if !response.status().is_success() {
                return Err(Self::read_error(response).await);
            }
            Self::decode::<CountResponse>(response).await.map(|c| c.count)
        })
        .await
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
