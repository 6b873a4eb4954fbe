use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    PendingVerification,
    PendingManualReview,
    Completed,
    Failed,
    Refunded,
    Cancelled,
}

impl PaymentStatus {
    /// Completed and failed are terminal for the verification state machine.
    /// Refunded and cancelled arrive from the automated card path and act as
    /// veto values in the resolver, not as transition targets here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Completed | PaymentStatus::Failed)
    }

    /// Statuses that override a resolved document's own status.
    pub fn is_veto(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::Cancelled)
    }

    /// Both pending buckets are equivalent for transition purposes.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            PaymentStatus::PendingVerification | PaymentStatus::PendingManualReview
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::PendingVerification => "pending_verification",
            PaymentStatus::PendingManualReview => "pending_manual_review",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending_verification" => Ok(PaymentStatus::PendingVerification),
            "pending_manual_review" => Ok(PaymentStatus::PendingManualReview),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            "cancelled" => Ok(PaymentStatus::Cancelled),
            other => Err(OrderError::Validation(format!(
                "Unknown payment status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Zelle,
    Card,
    BankTransfer,
    Other,
}

/// A monetary transaction tied to an order.
///
/// `document_id` references the base document id for self-service orders. For
/// pipeline-submitted orders it holds the ORIGINAL base document id (the one
/// the verification record points back to), never the verification record's
/// own id. `amount` is the net figure; `base_amount` is gross when known.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Payment {
    pub id: u64,
    #[serde(default)]
    pub document_id: Option<u64>,
    pub user_id: u64,
    /// Money fields travel as strings so CSV and JSON round-trips keep the
    /// exact scale instead of passing through a float.
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub base_amount: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub fee_amount: Option<Decimal>,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub zelle_confirmation_code: Option<String>,
    #[serde(default)]
    pub zelle_verified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub zelle_verified_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn has_confirmation_code(&self) -> bool {
        self.zelle_confirmation_code
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

/// Operator-supplied grounds for rejecting a manual payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    IncorrectAmount,
    InvalidPaymentMethod,
    DuplicatePayment,
    SuspiciousActivity,
    IncompleteInformation,
    DocumentQualityIssues,
    Custom(String),
}

impl RejectionReason {
    /// Builds a reason from operator input. An empty reason, an unknown
    /// reason, or `custom` without accompanying text is a validation error.
    pub fn from_input(reason: &str, custom_text: Option<&str>) -> Result<Self> {
        match reason.trim() {
            "" => Err(OrderError::Validation(
                "A rejection reason is required".to_string(),
            )),
            "incorrect amount" => Ok(RejectionReason::IncorrectAmount),
            "invalid payment method" => Ok(RejectionReason::InvalidPaymentMethod),
            "duplicate payment" => Ok(RejectionReason::DuplicatePayment),
            "suspicious activity" => Ok(RejectionReason::SuspiciousActivity),
            "incomplete information" => Ok(RejectionReason::IncompleteInformation),
            "document quality issues" => Ok(RejectionReason::DocumentQualityIssues),
            "custom" => match custom_text.map(str::trim) {
                Some(text) if !text.is_empty() => Ok(RejectionReason::Custom(text.to_string())),
                _ => Err(OrderError::Validation(
                    "A custom rejection reason requires explanatory text".to_string(),
                )),
            },
            other => Err(OrderError::Validation(format!(
                "Unknown rejection reason: {other}"
            ))),
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            RejectionReason::IncorrectAmount => "incorrect amount",
            RejectionReason::InvalidPaymentMethod => "invalid payment method",
            RejectionReason::DuplicatePayment => "duplicate payment",
            RejectionReason::SuspiciousActivity => "suspicious activity",
            RejectionReason::IncompleteInformation => "incomplete information",
            RejectionReason::DocumentQualityIssues => "document quality issues",
            RejectionReason::Custom(text) => text,
        }
    }
}
