use super::document::{BaseDocument, TranslatedRecord, VerificationRecord};
use super::payment::Payment;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedSource {
    Base,
    Verified,
    Translated,
}

/// One order, resolved to the furthest record set it has reached. The three
/// record kinds share no common base type, so the merge result is a tagged
/// union projected through [`ResolvedDocument::view`] rather than duck-typed
/// field probing.
#[derive(Debug, PartialEq, Clone)]
pub enum ResolvedDocument {
    Base(BaseDocument),
    Verified(VerificationRecord),
    Translated(TranslatedRecord, VerificationRecord),
}

/// Uniform read-only projection of a resolved order, the shape callers see.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct DocumentView {
    pub id: u64,
    pub user_id: u64,
    pub filename: String,
    /// The filename as uploaded, when the displayed record is the translated
    /// artifact and may carry a renamed deliverable.
    pub original_filename: Option<String>,
    pub status: String,
    pub pages: Option<u32>,
    pub total_cost: Option<Decimal>,
    pub translated_file_url: Option<String>,
    pub source: ResolvedSource,
    pub created_at: DateTime<Utc>,
    pub is_authenticated: bool,
    pub authenticated_by_name: Option<String>,
    pub authenticated_by_email: Option<String>,
    pub authentication_date: Option<DateTime<Utc>>,
    /// Base document id the payment overlay keys on. The resolver fills this
    /// with the matched base document id when one exists, else the
    /// verification record's back-reference.
    pub payment_lookup_id: Option<u64>,
}

impl ResolvedDocument {
    pub fn source(&self) -> ResolvedSource {
        match self {
            ResolvedDocument::Base(_) => ResolvedSource::Base,
            ResolvedDocument::Verified(_) => ResolvedSource::Verified,
            ResolvedDocument::Translated(..) => ResolvedSource::Translated,
        }
    }

    pub fn view(&self) -> DocumentView {
        match self {
            ResolvedDocument::Base(d) => DocumentView {
                id: d.id,
                user_id: d.user_id,
                filename: d.filename.clone(),
                original_filename: None,
                status: d.status.as_str().to_string(),
                pages: Some(d.pages),
                total_cost: d.total_cost,
                translated_file_url: None,
                source: ResolvedSource::Base,
                created_at: d.created_at,
                is_authenticated: d.authentication_date.is_some(),
                authenticated_by_name: d.authenticated_by_name.clone(),
                authenticated_by_email: d.authenticated_by_email.clone(),
                authentication_date: d.authentication_date,
                payment_lookup_id: Some(d.id),
            },
            ResolvedDocument::Verified(v) => DocumentView {
                id: v.id,
                user_id: v.user_id,
                filename: v.filename.clone(),
                original_filename: None,
                status: v.status.clone(),
                pages: None,
                total_cost: v.total_cost,
                translated_file_url: v.translated_file_url.clone(),
                source: ResolvedSource::Verified,
                created_at: v.created_at,
                is_authenticated: v.authentication_date.is_some(),
                authenticated_by_name: v.authenticated_by_name.clone(),
                authenticated_by_email: v.authenticated_by_email.clone(),
                authentication_date: v.authentication_date,
                payment_lookup_id: v.original_document_id,
            },
            ResolvedDocument::Translated(t, v) => DocumentView {
                id: t.id,
                user_id: v.user_id,
                filename: t.filename.clone(),
                original_filename: Some(v.filename.clone()),
                status: t.status.clone(),
                pages: t.pages,
                total_cost: t.total_cost.or(v.total_cost),
                translated_file_url: Some(t.translated_file_url.clone()),
                source: ResolvedSource::Translated,
                created_at: t.created_at,
                is_authenticated: t.is_authenticated,
                authenticated_by_name: t.authenticated_by_name.clone(),
                authenticated_by_email: t.authenticated_by_email.clone(),
                authentication_date: t.authentication_date,
                payment_lookup_id: v.original_document_id,
            },
        }
    }
}

/// Payment-status veto, applied after the merge as its own pass.
///
/// A `refunded` or `cancelled` payment overrides whatever status the
/// underlying record reports. Payments are matched by the view's
/// `payment_lookup_id`; views without one are left untouched.
pub fn apply_payment_overlay(views: &mut [DocumentView], payments: &[Payment]) {
    for view in views.iter_mut() {
        let Some(lookup_id) = view.payment_lookup_id else {
            continue;
        };
        let veto = payments
            .iter()
            .find(|p| p.document_id == Some(lookup_id) && p.status.is_veto());
        if let Some(payment) = veto {
            view.status = payment.status.as_str().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::DocumentStatus;
    use crate::domain::payment::{PaymentMethod, PaymentStatus};
    use rust_decimal_macros::dec;

    fn base_doc(id: u64) -> BaseDocument {
        BaseDocument {
            id,
            user_id: 1,
            filename: "contract.pdf".to_string(),
            pages: 4,
            total_cost: Some(dec!(55.00)),
            status: DocumentStatus::Pending,
            document_type: "general".to_string(),
            is_bank_statement: false,
            created_at: Utc::now(),
            is_internal_use: false,
            authenticated_by_name: None,
            authenticated_by_email: None,
            authentication_date: None,
        }
    }

    fn payment(id: u64, document_id: u64, status: PaymentStatus) -> Payment {
        Payment {
            id,
            document_id: Some(document_id),
            user_id: 1,
            amount: dec!(55.00),
            base_amount: None,
            fee_amount: None,
            currency: "USD".to_string(),
            status,
            payment_method: PaymentMethod::Card,
            zelle_confirmation_code: None,
            zelle_verified_at: None,
            zelle_verified_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_base_view_projection() {
        let view = ResolvedDocument::Base(base_doc(10)).view();
        assert_eq!(view.source, ResolvedSource::Base);
        assert_eq!(view.status, "pending");
        assert_eq!(view.pages, Some(4));
        assert_eq!(view.payment_lookup_id, Some(10));
        assert!(view.translated_file_url.is_none());
    }

    #[test]
    fn test_refunded_payment_overrides_status() {
        let mut views = vec![ResolvedDocument::Base(base_doc(10)).view()];
        apply_payment_overlay(&mut views, &[payment(1, 10, PaymentStatus::Refunded)]);
        assert_eq!(views[0].status, "refunded");
    }

    #[test]
    fn test_cancelled_payment_overrides_status() {
        let mut views = vec![ResolvedDocument::Base(base_doc(10)).view()];
        apply_payment_overlay(&mut views, &[payment(1, 10, PaymentStatus::Cancelled)]);
        assert_eq!(views[0].status, "cancelled");
    }

    #[test]
    fn test_completed_payment_does_not_override() {
        let mut views = vec![ResolvedDocument::Base(base_doc(10)).view()];
        apply_payment_overlay(&mut views, &[payment(1, 10, PaymentStatus::Completed)]);
        assert_eq!(views[0].status, "pending");
    }

    #[test]
    fn test_overlay_ignores_other_documents() {
        let mut views = vec![ResolvedDocument::Base(base_doc(10)).view()];
        apply_payment_overlay(&mut views, &[payment(1, 99, PaymentStatus::Refunded)]);
        assert_eq!(views[0].status, "pending");
    }
}
