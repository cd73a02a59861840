//! Free-text de-identification
//!
//! This module turns raw clinical notes into redacted text and anchors every
//! redaction in the audit ledger.
//!
//! # Components
//!
//! - [`detector`] - Entity span detection (regex patterns or a remote NER model)
//! - [`redactor`] - Placeholder substitution with overlap resolution
//! - [`pipeline`] - Request orchestration and the response contract
//! - [`journal`] - Optional local JSON-lines journal of every run
//!
//! # Example
//!
//! ```rust,no_run
//! use deid_ledger::config::AppConfig;
//! use deid_ledger::deidentification::DeidentificationPipeline;
//! use deid_ledger::domain::Identity;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let pipeline = DeidentificationPipeline::from_config(&config)?;
//! let identity = Identity::parse("dr_strange", "medical_professional")?;
//!
//! let result = pipeline
//!     .process("Patient John Smith was admitted on October 8, 2025.", "", &identity)
//!     .await?;
//! println!("{}", result.redacted_text);
//! # Ok(())
//! # }
//! ```

pub mod detector;
pub mod journal;
pub mod models;
pub mod pipeline;
pub mod redactor;

pub use detector::{create_detector, EntitySpanDetector, HttpNerDetector, RegexDetector};
pub use journal::{AuditJournal, JournalEntry};
pub use models::{EntityCategory, EntitySpan, RedactionResult};
pub use pipeline::{
    AuditFailureKind, AuditStatus, DeidentificationPipeline, DocumentRequest, PipelineResult,
    ProcessingStatus,
};
pub use redactor::Redactor;
