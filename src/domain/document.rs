use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Draft,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Completed => "completed",
            DocumentStatus::Draft => "draft",
        }
    }
}

/// The original uploaded order record. Created on upload, mutated on status
/// change, never deleted by this subsystem.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct BaseDocument {
    pub id: u64,
    pub user_id: u64,
    pub filename: String,
    pub pages: u32,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total_cost: Option<Decimal>,
    pub status: DocumentStatus,
    #[serde(default = "default_document_type")]
    pub document_type: String,
    #[serde(default)]
    pub is_bank_statement: bool,
    pub created_at: DateTime<Utc>,
    /// Internal-use uploads are excluded from every financial aggregate.
    #[serde(default)]
    pub is_internal_use: bool,
    // Manual-override authentication metadata, recorded outside the pipeline.
    #[serde(default)]
    pub authenticated_by_name: Option<String>,
    #[serde(default)]
    pub authenticated_by_email: Option<String>,
    #[serde(default)]
    pub authentication_date: Option<DateTime<Utc>>,
}

fn default_document_type() -> String {
    "general".to_string()
}

/// A document inside the authentication/translation pipeline, derived from a
/// [`BaseDocument`]. Linkage back to the base record is by
/// `original_document_id` when present, by filename match otherwise.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct VerificationRecord {
    pub id: u64,
    pub user_id: u64,
    pub filename: String,
    #[serde(default)]
    pub original_document_id: Option<u64>,
    /// Free-form pipeline status string, not the base-document enum.
    pub status: String,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total_cost: Option<Decimal>,
    pub source_language: String,
    pub target_language: String,
    #[serde(default)]
    pub translated_file_url: Option<String>,
    #[serde(default)]
    pub authenticated_by_name: Option<String>,
    #[serde(default)]
    pub authenticated_by_email: Option<String>,
    #[serde(default)]
    pub authentication_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The finished, deliverable artifact. `original_document_id` references the
/// [`VerificationRecord`], not the base document. Immutable once created
/// except for authentication metadata.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TranslatedRecord {
    pub id: u64,
    pub original_document_id: u64,
    pub filename: String,
    pub translated_file_url: String,
    pub is_authenticated: bool,
    #[serde(default)]
    pub authenticated_by_name: Option<String>,
    #[serde(default)]
    pub authenticated_by_email: Option<String>,
    #[serde(default)]
    pub authentication_date: Option<DateTime<Utc>>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub total_cost: Option<Decimal>,
    pub status: String,
    #[serde(default)]
    pub pages: Option<u32>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_status_roundtrip() {
        let json = serde_json::to_string(&DocumentStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
        let back: DocumentStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, DocumentStatus::Processing);
    }

    #[test]
    fn test_base_document_optional_fields_default() {
        let json = r#"{
            "id": 1,
            "user_id": 7,
            "filename": "invoice.pdf",
            "pages": 3,
            "total_cost": "40.00",
            "status": "pending",
            "created_at": "2026-01-10T12:00:00Z"
        }"#;
        let doc: BaseDocument = serde_json::from_str(json).unwrap();
        assert!(!doc.is_internal_use);
        assert_eq!(doc.document_type, "general");
        assert!(!doc.is_bank_statement);
        assert!(doc.authenticated_by_name.is_none());
        assert!(doc.authentication_date.is_none());
    }
}
