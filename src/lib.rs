// deid-ledger - Clinical note de-identification with a ledger-anchored audit trail
// Copyright (c) 2025 deid-ledger Contributors
// Licensed under the MIT License

//! # deid-ledger
//!
//! De-identifies free-text clinical notes and records every de-identification
//! event in an append-only audit ledger.
//!
//! ## Overview
//!
//! A request flows through four stages:
//!
//! 1. **Authorize** - only allowed roles may de-identify
//! 2. **Detect** - an [`EntitySpanDetector`](deidentification::EntitySpanDetector)
//!    finds sensitive spans (regex patterns or a remote NER model)
//! 3. **Redact** - allow-listed spans become `[CATEGORY]` placeholders
//! 4. **Commit** - SHA-256 fingerprints of the raw and redacted text are
//!    committed to the ledger under the operator's identity
//!
//! Fingerprints in the ledger let anyone later prove that a document is the
//! one that was de-identified, via [`core::verification`].
//!
//! ## Modules
//!
//! - [`adapters`] - Audit ledger backends
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration loading and validation
//! - [`core`] - Fingerprinting and integrity verification
//! - [`deidentification`] - Detection, redaction and the request pipeline
//! - [`domain`] - Identities, audit records and error types
//! - [`logging`] - Structured logging

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod deidentification;
pub mod domain;
pub mod logging;
