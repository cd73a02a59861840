//! De-identification data models

pub mod entity;

pub use entity::{EntityCategory, EntitySpan, RedactionResult};
