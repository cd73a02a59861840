//! Entity span data models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Category of a detected direct identifier
///
/// Declaration order is the tie-break order used when two overlapping spans
/// start and end at the same offsets.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityCategory {
    /// Person names
    Person,
    /// Calendar dates
    Date,
    /// Geographic locations and addresses
    Location,
    /// Organizations and facilities
    Organization,
    /// Email addresses
    Email,
    /// Telephone and fax numbers
    Phone,
    /// Social Security Numbers
    Ssn,
    /// Medical Record Numbers
    #[serde(alias = "MRN")]
    MedicalRecordNumber,
    /// Web URLs
    Url,
    /// IP addresses
    IpAddress,
}

impl EntityCategory {
    /// Every known category, in tie-break order
    pub const ALL: [EntityCategory; 10] = [
        Self::Person,
        Self::Date,
        Self::Location,
        Self::Organization,
        Self::Email,
        Self::Phone,
        Self::Ssn,
        Self::MedicalRecordNumber,
        Self::Url,
        Self::IpAddress,
    ];

    /// Label used inside placeholders and logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Person => "PERSON",
            Self::Date => "DATE",
            Self::Location => "LOCATION",
            Self::Organization => "ORGANIZATION",
            Self::Email => "EMAIL",
            Self::Phone => "PHONE",
            Self::Ssn => "SSN",
            Self::MedicalRecordNumber => "MRN",
            Self::Url => "URL",
            Self::IpAddress => "IP_ADDRESS",
        }
    }

    /// Replacement token, e.g. `[PERSON]`
    pub fn placeholder(&self) -> String {
        format!("[{}]", self.label())
    }

    /// Categories redacted when no allow-list is configured
    pub fn default_allow_list() -> Vec<EntityCategory> {
        vec![
            Self::Person,
            Self::Date,
            Self::Location,
            Self::Organization,
        ]
    }

    /// Map an NER model label onto a category
    ///
    /// Labels with no direct-identifier meaning (`CARDINAL`, `NORP`, ...)
    /// return `None` and are dropped.
    pub fn from_model_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "PERSON" | "PER" => Some(Self::Person),
            "DATE" => Some(Self::Date),
            "GPE" | "LOC" | "LOCATION" | "FAC" => Some(Self::Location),
            "ORG" | "ORGANIZATION" => Some(Self::Organization),
            "EMAIL" => Some(Self::Email),
            "PHONE" => Some(Self::Phone),
            _ => None,
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for EntityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PERSON" | "NAME" => Ok(Self::Person),
            "DATE" => Ok(Self::Date),
            "LOCATION" => Ok(Self::Location),
            "ORGANIZATION" => Ok(Self::Organization),
            "EMAIL" => Ok(Self::Email),
            "PHONE" => Ok(Self::Phone),
            "SSN" => Ok(Self::Ssn),
            "MRN" | "MEDICAL_RECORD_NUMBER" => Ok(Self::MedicalRecordNumber),
            "URL" => Ok(Self::Url),
            "IP_ADDRESS" => Ok(Self::IpAddress),
            other => Err(format!("Unknown entity category: {other}")),
        }
    }
}

/// A detected entity as a half-open character range `[start_offset, end_offset)`
///
/// Offsets count Unicode scalar values, not bytes. Deserialization goes
/// through [`EntitySpan::new`], so an empty or inverted range is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntitySpan")]
pub struct EntitySpan {
    /// Entity category
    pub category: EntityCategory,
    /// First character of the span
    pub start_offset: usize,
    /// One past the last character of the span
    pub end_offset: usize,
}

#[derive(Deserialize)]
struct RawEntitySpan {
    category: EntityCategory,
    start_offset: usize,
    end_offset: usize,
}

impl TryFrom<RawEntitySpan> for EntitySpan {
    type Error = String;

    fn try_from(raw: RawEntitySpan) -> Result<Self, Self::Error> {
        Self::new(raw.category, raw.start_offset, raw.end_offset)
    }
}

impl EntitySpan {
    /// Create a new span, rejecting empty or inverted ranges
    pub fn new(
        category: EntityCategory,
        start_offset: usize,
        end_offset: usize,
    ) -> Result<Self, String> {
        if end_offset <= start_offset {
            return Err(format!(
                "Span end ({end_offset}) must be greater than start ({start_offset})"
            ));
        }
        Ok(Self {
            category,
            start_offset,
            end_offset,
        })
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    /// Whether the range covers no characters (only reachable by building the struct directly)
    pub fn is_empty(&self) -> bool {
        self.end_offset <= self.start_offset
    }

    /// Whether two spans share at least one character
    pub fn overlaps(&self, other: &EntitySpan) -> bool {
        self.start_offset < other.end_offset && other.start_offset < self.end_offset
    }

    /// Deterministic ordering: start ascending, longer first, then category
    pub(crate) fn sort_key(&self) -> (usize, std::cmp::Reverse<usize>, EntityCategory) {
        (
            self.start_offset,
            std::cmp::Reverse(self.end_offset),
            self.category,
        )
    }
}

/// Output of the redactor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionResult {
    /// Text with every applied span replaced by its placeholder
    pub redacted_text: String,
    /// Spans actually substituted, ascending by start offset, offsets into the source text
    pub applied_spans: Vec<EntitySpan>,
}

impl RedactionResult {
    /// Count of applied spans per category
    pub fn counts_by_category(&self) -> BTreeMap<EntityCategory, usize> {
        let mut counts = BTreeMap::new();
        for span in &self.applied_spans {
            *counts.entry(span.category).or_insert(0) += 1;
        }
        counts
    }

    /// Whether anything was redacted
    pub fn has_redactions(&self) -> bool {
        !self.applied_spans.is_empty()
    }
}

/// Convert a byte offset into a character offset
///
/// `byte_offset` must lie on a char boundary of `text`.
pub(crate) fn char_offset(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}
