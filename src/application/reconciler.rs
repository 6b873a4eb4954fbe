use crate::domain::document::{BaseDocument, DocumentStatus, VerificationRecord};
use crate::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::domain::ports::{
    DocumentStoreBox, PaymentStoreBox, TranslatedStoreBox, VerificationStoreBox,
};
use crate::error::{OrderError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Caller-supplied report scope. Date range and status apply to the payment;
/// `user_id` narrows the whole reconciliation to one user's orders.
#[derive(Debug, Default, Clone)]
pub struct ReportFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub user_id: Option<u64>,
}

/// One financial report row per order: gross, fee and net figures plus the
/// authentication identity resolved through the metadata fallback chain.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct ReportRow {
    pub document_id: u64,
    pub filename: String,
    pub user_id: u64,
    /// Gross figure.
    pub amount: Decimal,
    /// Fee figure (gross minus net).
    pub tax: Decimal,
    pub net_value: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub document_status: String,
    pub authenticated_by_name: Option<String>,
    pub authenticated_by_email: Option<String>,
    pub authentication_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
struct AuthenticationMeta {
    name: Option<String>,
    email: Option<String>,
    date: Option<DateTime<Utc>>,
}

impl AuthenticationMeta {
    fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.date.is_none()
    }
}

/// Joins the payment ledger to documents across users for financial
/// reporting.
///
/// The linkage convention is the crux: for pipeline-submitted orders the
/// payment's `document_id` holds the ORIGINAL base document id (the one the
/// verification record points back to), so the back-reference is resolved
/// first. Self-service orders link directly by base document id. An order
/// whose payment cannot be found by its document id is a data-integrity
/// error, not an occasion to guess by user id.
pub struct Reconciler {
    documents: DocumentStoreBox,
    verifications: VerificationStoreBox,
    translations: TranslatedStoreBox,
    payments: PaymentStoreBox,
}

impl Reconciler {
    pub fn new(
        documents: DocumentStoreBox,
        verifications: VerificationStoreBox,
        translations: TranslatedStoreBox,
        payments: PaymentStoreBox,
    ) -> Self {
        Self {
            documents,
            verifications,
            translations,
            payments,
        }
    }

    pub async fn reconcile(&self, filter: &ReportFilter) -> Result<Vec<ReportRow>> {
        let mut documents = self.documents.list_all().await?;
        let mut verifications = self.verifications.list_all().await?;
        let payments = self.payments.list_all().await?;

        if let Some(user_id) = filter.user_id {
            documents.retain(|d| d.user_id == user_id);
            verifications.retain(|v| v.user_id == user_id);
        }

        let docs_by_id: HashMap<u64, &BaseDocument> =
            documents.iter().map(|d| (d.id, d)).collect();
        // A document can carry several payment attempts (a failed try and a
        // later retry). The latest one is authoritative; ties break on id so
        // the pick is deterministic.
        let mut payments_by_document: HashMap<u64, &Payment> = HashMap::new();
        for payment in &payments {
            let Some(doc_id) = payment.document_id else {
                continue;
            };
            if let Some(current) = payments_by_document.get(&doc_id) {
                warn!(
                    document_id = doc_id,
                    "multiple payments linked to one document; keeping the latest"
                );
                if (payment.created_at, payment.id) <= (current.created_at, current.id) {
                    continue;
                }
            }
            payments_by_document.insert(doc_id, payment);
        }

        let mut rows: Vec<ReportRow> = Vec::new();
        let mut pipeline_document_ids: HashSet<u64> = HashSet::new();

        // Pipeline-submitted orders, one row per verification record.
        for v in &verifications {
            let Some(original_id) = v.original_document_id else {
                warn!(
                    verification_id = v.id,
                    "verification record has no back-reference; order not reconcilable"
                );
                continue;
            };
            let original = docs_by_id.get(&original_id).copied();
            // Internal-use uploads never enter any aggregate.
            if original.is_some_and(|d| d.is_internal_use) {
                continue;
            }
            pipeline_document_ids.insert(original_id);

            let payment =
                payments_by_document
                    .get(&original_id)
                    .copied()
                    .ok_or(OrderError::MissingPaymentLinkage {
                        document_id: original_id,
                    })?;
            if !Self::matches(filter, payment) {
                continue;
            }

            let auth = self.authentication_meta(Some(v), original).await?;
            let gross_source = original.and_then(|d| d.total_cost).or(v.total_cost);
            let (amount, tax) = Self::money(gross_source, payment.amount);

            rows.push(ReportRow {
                document_id: original_id,
                filename: v.filename.clone(),
                user_id: payment.user_id,
                amount,
                tax,
                net_value: payment.amount,
                currency: payment.currency.clone(),
                payment_method: payment.payment_method,
                payment_status: payment.status,
                document_status: v.status.clone(),
                authenticated_by_name: auth.name,
                authenticated_by_email: auth.email,
                authentication_date: auth.date,
                created_at: payment.created_at,
            });
        }

        // Self-service orders: base documents not consumed by the pipeline.
        for doc in &documents {
            if pipeline_document_ids.contains(&doc.id) || doc.is_internal_use {
                continue;
            }
            if doc.status == DocumentStatus::Draft {
                // Pre-checkout uploads have no payment yet by design.
                debug!(document_id = doc.id, "draft document excluded from reconciliation");
                continue;
            }

            let payment = payments_by_document.get(&doc.id).copied().ok_or(
                OrderError::MissingPaymentLinkage {
                    document_id: doc.id,
                },
            )?;
            if !Self::matches(filter, payment) {
                continue;
            }

            let auth = self.authentication_meta(None, Some(doc)).await?;
            let (amount, tax) = Self::money(doc.total_cost, payment.amount);

            rows.push(ReportRow {
                document_id: doc.id,
                filename: doc.filename.clone(),
                user_id: payment.user_id,
                amount,
                tax,
                net_value: payment.amount,
                currency: payment.currency.clone(),
                payment_method: payment.payment_method,
                payment_status: payment.status,
                document_status: doc.status.as_str().to_string(),
                authenticated_by_name: auth.name,
                authenticated_by_email: auth.email,
                authentication_date: auth.date,
                created_at: payment.created_at,
            });
        }

        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn matches(filter: &ReportFilter, payment: &Payment) -> bool {
        if let Some(status) = filter.payment_status {
            if payment.status != status {
                return false;
            }
        }
        if let Some(from) = filter.from {
            if payment.created_at < from {
                return false;
            }
        }
        if let Some(to) = filter.to {
            if payment.created_at > to {
                return false;
            }
        }
        true
    }

    /// `gross = total_cost` when known, else clamped to net so the fee reads
    /// as zero rather than negative or undefined.
    fn money(gross: Option<Decimal>, net: Decimal) -> (Decimal, Decimal) {
        match gross {
            Some(gross) => (gross, gross - net),
            None => (net, Decimal::ZERO),
        }
    }

    /// Three-tier fallback: translated-record metadata, then the base
    /// document's own manual-override fields, then empty.
    async fn authentication_meta(
        &self,
        verification: Option<&VerificationRecord>,
        document: Option<&BaseDocument>,
    ) -> Result<AuthenticationMeta> {
        if let Some(v) = verification {
            if let Some(t) = self.translations.find_by_verification(v.id).await? {
                let meta = AuthenticationMeta {
                    name: t.authenticated_by_name.clone(),
                    email: t.authenticated_by_email.clone(),
                    date: t.authentication_date,
                };
                if !meta.is_empty() {
                    return Ok(meta);
                }
            }
        }
        if let Some(d) = document {
            let meta = AuthenticationMeta {
                name: d.authenticated_by_name.clone(),
                email: d.authenticated_by_email.clone(),
                date: d.authentication_date,
            };
            if !meta.is_empty() {
                return Ok(meta);
            }
        }
        Ok(AuthenticationMeta::default())
    }
}
