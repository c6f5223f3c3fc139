//! Tender domain model.
//!
//! Every leaf field extracted from a tender document is wrapped in
//! [`TrackedValue`] so the UI can always show where a value came from.
//! Phase 1 (`AvisMetadata`) and phase 2 (`UniversalMetadata`) arrive
//! independently from the backend and are never mutated client-side.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a tender record. Transitions are server-driven;
/// the client only observes them via re-fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TenderStatus {
    /// Discovered by the scraper, phase 1 not yet complete
    Pending,
    /// Phase 1 metadata extracted, eligible for deep analysis
    Listed,
    /// Phase 2 deep analysis complete
    Analyzed,
    /// A server-side pipeline stage failed
    Error,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Listed => "LISTED",
            Self::Analyzed => "ANALYZED",
            Self::Error => "ERROR",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "LISTED" => Some(Self::Listed),
            "ANALYZED" => Some(Self::Analyzed),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }

    /// Check if this is a terminal state of the pipeline.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Analyzed | Self::Error)
    }
}

/// Document the value of a field was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldSource {
    /// Public notice, phase-1 base
    Avis,
    /// Consultation regulations
    Rc,
    /// Technical specifications
    Cps,
    /// Appendix documents
    Annexe,
    /// Unclassified document
    Unknown,
    /// Scraped from the tender portal page itself
    Website,
}

impl FieldSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avis => "AVIS",
            Self::Rc => "RC",
            Self::Cps => "CPS",
            Self::Annexe => "ANNEXE",
            Self::Unknown => "UNKNOWN",
            Self::Website => "WEBSITE",
        }
    }
}

/// A provenance-tracked extracted value.
///
/// An absent `value` means "not yet extracted" — it is never an error
/// sentinel. The wire shape matches the backend JSONB blobs:
/// `{value, source_document, source_date}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedValue<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,

    #[serde(
        default,
        rename = "source_document",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<FieldSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_date: Option<NaiveDate>,
}

impl<T> Default for TrackedValue<T> {
    fn default() -> Self {
        Self {
            value: None,
            source: None,
            source_date: None,
        }
    }
}

impl<T> TrackedValue<T> {
    /// A field that has not been extracted yet.
    pub fn absent() -> Self {
        Self::default()
    }

    /// A field extracted from the given document type.
    pub fn extracted(value: T, source: FieldSource) -> Self {
        Self {
            value: Some(value),
            source: Some(source),
            source_date: None,
        }
    }

    pub fn is_extracted(&self) -> bool {
        self.value.is_some()
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

/// Monetary amount with its (possibly absent) currency code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Money {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Submission deadline as the backend reports it: a date plus an
/// optional wall-clock time string ("10:00").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Deadline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

/// Per-lot execution delay ("6 mois", "120 jours").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExecutionDelay {
    pub value: f64,
    pub unit: String,
}

/// A sub-division of a tender, evaluated independently.
///
/// `lot_number` is the natural key used to correlate deep data; lots
/// without a number cannot be correlated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Lot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub subject: TrackedValue<String>,
    #[serde(default)]
    pub estimated_value: TrackedValue<Money>,
    #[serde(default)]
    pub provisional_guarantee: TrackedValue<Money>,
}

/// Extended metadata captured from the tender portal page, kept apart
/// from document-sourced fields so provenance stays honest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WebsiteExtended {
    #[serde(default)]
    pub contact_administratif: TrackedValue<String>,
    #[serde(default)]
    pub published_date: TrackedValue<NaiveDate>,
}

/// Phase-1 metadata: the authoritative base record for a tender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AvisMetadata {
    #[serde(default)]
    pub reference_tender: TrackedValue<String>,
    #[serde(default)]
    pub tender_type: TrackedValue<String>,
    #[serde(default)]
    pub issuing_institution: TrackedValue<String>,
    #[serde(default)]
    pub folder_opening_location: TrackedValue<String>,
    #[serde(default)]
    pub subject: TrackedValue<String>,
    #[serde(default)]
    pub total_estimated_value: TrackedValue<Money>,
    #[serde(default)]
    pub submission_deadline: TrackedValue<Deadline>,

    /// Language code to keyword list ("fr" -> [...], "ar" -> [...]).
    #[serde(default)]
    pub keywords: HashMap<String, Vec<String>>,

    /// Lots in document order. Order is significant for display and
    /// for the deep-data merge.
    #[serde(default)]
    pub lots: Vec<Lot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_extended: Option<WebsiteExtended>,
}

/// One line item within a lot's technical description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Deep (phase-2) data for a single lot, keyed by `lot_number`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LotDeepData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,
    #[serde(default)]
    pub guarantee_percentage: TrackedValue<f64>,
    #[serde(default)]
    pub estimated_value: TrackedValue<Money>,
    #[serde(default)]
    pub execution_delay: TrackedValue<ExecutionDelay>,
    #[serde(default)]
    pub items: Vec<Item>,
}

/// Cross-lot conditions mined from RC/CPS documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdditionalConditions {
    #[serde(default)]
    pub qualification_criteria: TrackedValue<String>,
    #[serde(default)]
    pub required_documents: TrackedValue<Vec<String>>,
    #[serde(default)]
    pub warranty_period: TrackedValue<String>,
    #[serde(default)]
    pub payment_terms: TrackedValue<String>,
}

/// AI-structured administrative contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContactRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Phase-2 metadata. Strictly complementary to [`AvisMetadata`]:
/// it never repeats phase-1 fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UniversalMetadata {
    #[serde(default)]
    pub institution_address: TrackedValue<String>,
    #[serde(default)]
    pub lots: Vec<LotDeepData>,
    #[serde(default)]
    pub additional_conditions: AdditionalConditions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactRecord>,
}

/// Classification of a tender document within the downloaded bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Avis,
    Rc,
    Cps,
    Annexe,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Avis => "AVIS",
            Self::Rc => "RC",
            Self::Cps => "CPS",
            Self::Annexe => "ANNEXE",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// How document text was obtained server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtractionMethod {
    /// Text layer read directly from the PDF
    Digital,
    /// Optical character recognition fallback
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digital => "DIGITAL",
            Self::Ocr => "OCR",
        }
    }
}

/// A document extracted from a tender bundle. Read-only for the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tender_id: Option<Uuid>,
    #[serde(default)]
    pub document_type: DocumentType,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_method: Option<ExtractionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_at: Option<DateTime<Utc>>,
}

/// A tender record as served by `GET /api/tenders/{id}`.
///
/// List responses carry the same shape without `documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tender {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    pub source_url: String,
    pub status: TenderStatus,

    /// Date the record was scraped for, `YYYY-MM-DD`. Drives the list
    /// date-range filters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avis_metadata: Option<AvisMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universal_metadata: Option<UniversalMetadata>,
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Populated by the server when `status == ERROR`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Tender {
    /// Display label: extracted reference, external reference, or id.
    pub fn label(&self) -> String {
        self.avis_metadata
            .as_ref()
            .and_then(|m| m.reference_tender.value.clone())
            .or_else(|| self.external_reference.clone())
            .unwrap_or_else(|| self.id.to_string())
    }
}
