use super::outbox::SideEffectWorker;
use crate::domain::document::{BaseDocument, VerificationRecord};
use crate::domain::payment::{Payment, PaymentStatus, RejectionReason};
use crate::domain::ports::{
    AuditContext, AuditLogBox, DocumentStoreBox, FileStorageBox, NotificationPayload,
    NotificationType, PaymentStoreBox, Recipient, SideEffect, StoredFile, SubmissionPayload,
    Transition, UserDirectoryBox, UserProfile, VerificationStoreBox,
};
use crate::error::{OrderError, Result};
use chrono::Utc;
use serde_json::json;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

#[derive(Debug, PartialEq, Clone)]
pub enum ApproveOutcome {
    /// The payment transitioned to `completed` in this call.
    Approved(Payment),
    /// The payment was already terminal; nothing changed, nothing was sent.
    AlreadyTerminal(Payment),
}

#[derive(Debug, PartialEq, Clone)]
pub enum RejectOutcome {
    Rejected(Payment),
    AlreadyTerminal(Payment),
}

/// Per-item accounting for bulk operations. A failure on one item never
/// stops the remaining items.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct BulkOutcome {
    pub processed: Vec<u64>,
    pub skipped: Vec<u64>,
    pub failed: Vec<(u64, String)>,
}

/// The manual payment verification state machine.
///
/// Both pending statuses approve or reject into their terminal value through
/// one conditional store operation; the committed transition then drives the
/// best-effort side effects via the outbox worker. Auxiliary reads used only
/// to enrich payloads are bounded by a short timeout and degrade silently.
pub struct VerificationService {
    payments: PaymentStoreBox,
    documents: DocumentStoreBox,
    verifications: VerificationStoreBox,
    directory: UserDirectoryBox,
    storage: FileStorageBox,
    audit: AuditLogBox,
    worker: SideEffectWorker,
    lookup_timeout: Duration,
}

impl VerificationService {
    const LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        payments: PaymentStoreBox,
        documents: DocumentStoreBox,
        verifications: VerificationStoreBox,
        directory: UserDirectoryBox,
        storage: FileStorageBox,
        audit: AuditLogBox,
        worker: SideEffectWorker,
    ) -> Self {
        Self {
            payments,
            documents,
            verifications,
            directory,
            storage,
            audit,
            worker,
            lookup_timeout: Self::LOOKUP_TIMEOUT,
        }
    }

    /// The bare idempotent verification operation, keyed only by the payment
    /// id. Returns whether the payment holds `completed` after the call.
    pub async fn verify_payment(&self, payment_id: u64) -> Result<bool> {
        match self
            .payments
            .complete_verification(payment_id, "system", vec![])
            .await?
        {
            Transition::Applied(_) => Ok(true),
            Transition::AlreadyTerminal(p) => Ok(p.status == PaymentStatus::Completed),
        }
    }

    /// Approves a manual payment, optionally recording the operator-entered
    /// confirmation code first.
    ///
    /// A payment without a confirmation code is never transitioned; the
    /// caller gets [`OrderError::ConfirmationCodeRequired`] and must collect
    /// the code. An already-terminal payment is a no-op success.
    pub async fn approve(
        &self,
        payment_id: u64,
        code: Option<&str>,
        verified_by: &str,
    ) -> Result<ApproveOutcome> {
        let mut payment = self.payments.get(payment_id).await?.ok_or(OrderError::NotFound {
            entity: "payment",
            id: payment_id,
        })?;
        if !payment.status.is_pending() {
            return Ok(ApproveOutcome::AlreadyTerminal(payment));
        }

        let code = code.map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = code {
            if !payment.has_confirmation_code() {
                payment = self.payments.set_confirmation_code(payment_id, code).await?;
            }
        }
        if !payment.has_confirmation_code() {
            return Err(OrderError::ConfirmationCodeRequired(payment_id));
        }

        let previous_status = payment.status;
        let (effects, document) = self.approval_effects(&payment).await;

        match self
            .payments
            .complete_verification(payment_id, verified_by, effects)
            .await?
        {
            Transition::Applied(updated) => {
                let filename = document.map(|d| d.filename).unwrap_or_default();
                let metadata = json!({
                    "amount": updated.amount,
                    "document_id": updated.document_id,
                    "filename": filename,
                    "previous_status": previous_status.as_str(),
                    "new_status": updated.status.as_str(),
                });
                self.audit
                    .record(
                        "payment_code_confirmed",
                        "Confirmation code recorded and payment approved",
                        self.audit_context(&updated, metadata.clone()),
                    )
                    .await;
                self.audit
                    .record(
                        "payment_verified",
                        "Payment verified",
                        self.audit_context(&updated, metadata),
                    )
                    .await;

                self.worker.drain_for_payment(payment_id).await;
                Ok(ApproveOutcome::Approved(updated))
            }
            Transition::AlreadyTerminal(p) => Ok(ApproveOutcome::AlreadyTerminal(p)),
        }
    }

    /// Rejects a manual payment with a validated reason. Sends a rejection
    /// notification; never touches the translation pipeline.
    pub async fn reject(
        &self,
        payment_id: u64,
        reason: &str,
        custom_text: Option<&str>,
        performed_by: &str,
    ) -> Result<RejectOutcome> {
        let reason = RejectionReason::from_input(reason, custom_text)?;
        let payment = self.payments.get(payment_id).await?.ok_or(OrderError::NotFound {
            entity: "payment",
            id: payment_id,
        })?;
        if !payment.status.is_pending() {
            return Ok(RejectOutcome::AlreadyTerminal(payment));
        }

        let previous_status = payment.status;
        let document = self.lookup_document(&payment).await;
        let profile = self.lookup_profile(payment.user_id).await;
        let document_name = document.map(|d| d.filename).unwrap_or_default();
        let effects = vec![SideEffect::Notify {
            recipient: Recipient::User(payment.user_id),
            payload: NotificationPayload {
                user_email: profile.email,
                message: format!(
                    "Your payment of {} {} was rejected: {}",
                    payment.amount,
                    payment.currency,
                    reason.as_text()
                ),
                notification_type: NotificationType::PaymentRejected,
                user_name: profile.name,
                document_name: document_name.clone(),
                amount: payment.amount,
                timestamp: Utc::now(),
            },
        }];

        match self.payments.fail_verification(payment_id, effects).await? {
            Transition::Applied(updated) => {
                self.audit
                    .record(
                        "payment_rejected",
                        "Payment rejected",
                        self.audit_context(
                            &updated,
                            json!({
                                "amount": updated.amount,
                                "document_id": updated.document_id,
                                "filename": document_name,
                                "reason": reason.as_text(),
                                "performed_by": performed_by,
                                "previous_status": previous_status.as_str(),
                                "new_status": updated.status.as_str(),
                            }),
                        ),
                    )
                    .await;
                self.worker.drain_for_payment(payment_id).await;
                Ok(RejectOutcome::Rejected(updated))
            }
            Transition::AlreadyTerminal(p) => Ok(RejectOutcome::AlreadyTerminal(p)),
        }
    }

    /// Sequentially approves a batch. Payments without a confirmation code
    /// are skipped silently rather than blocking the batch; every eligible
    /// payment gets the full approval path, side effects included.
    pub async fn bulk_approve(&self, payment_ids: &[u64], verified_by: &str) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in payment_ids {
            match self.approve(id, None, verified_by).await {
                Ok(ApproveOutcome::Approved(_)) => outcome.processed.push(id),
                Ok(ApproveOutcome::AlreadyTerminal(_)) => outcome.skipped.push(id),
                Err(OrderError::ConfirmationCodeRequired(_)) => outcome.skipped.push(id),
                Err(err) => outcome.failed.push((id, err.to_string())),
            }
        }
        outcome
    }

    /// Sequentially fails a batch. No per-item notifications are sent; the
    /// audit trail is the only record. Known limitation.
    pub async fn bulk_reject(
        &self,
        payment_ids: &[u64],
        reason: &RejectionReason,
        performed_by: &str,
    ) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for &id in payment_ids {
            match self.payments.fail_verification(id, vec![]).await {
                Ok(Transition::Applied(updated)) => {
                    self.audit
                        .record(
                            "payment_rejected",
                            "Payment rejected in bulk",
                            self.audit_context(
                                &updated,
                                json!({
                                    "amount": updated.amount,
                                    "document_id": updated.document_id,
                                    "reason": reason.as_text(),
                                    "performed_by": performed_by,
                                    "new_status": updated.status.as_str(),
                                }),
                            ),
                        )
                        .await;
                    outcome.processed.push(id);
                }
                Ok(Transition::AlreadyTerminal(_)) => outcome.skipped.push(id),
                Err(err) => outcome.failed.push((id, err.to_string())),
            }
        }
        outcome
    }

    fn audit_context(&self, payment: &Payment, metadata: serde_json::Value) -> AuditContext {
        AuditContext {
            entity_type: "payment".to_string(),
            entity_id: payment.id,
            affected_user_id: Some(payment.user_id),
            performer_type: "admin".to_string(),
            metadata,
        }
    }

    /// Assembles the post-approval side effects: pipeline submission, user
    /// notification, staff notification, in that order. Every lookup here is
    /// payload enrichment only; a miss degrades the payload, never the
    /// approval.
    async fn approval_effects(
        &self,
        payment: &Payment,
    ) -> (Vec<SideEffect>, Option<BaseDocument>) {
        let mut effects = Vec::new();
        let profile = self.lookup_profile(payment.user_id).await;
        let document = self.lookup_document(payment).await;

        if let Some(doc) = &document {
            match self.lookup_stored_file(doc).await {
                Some(stored) => {
                    let languages = self.lookup_languages(doc).await;
                    effects.push(SideEffect::SubmitTranslation(SubmissionPayload {
                        filename: doc.filename.clone(),
                        url: stored.url,
                        mimetype: stored.mimetype,
                        size: stored.size,
                        user_id: doc.user_id,
                        pages: doc.pages,
                        document_type: doc.document_type.clone(),
                        total_cost: doc.total_cost.unwrap_or(payment.amount),
                        source_language: languages
                            .as_ref()
                            .map(|v| v.source_language.clone())
                            .unwrap_or_default(),
                        target_language: languages
                            .as_ref()
                            .map(|v| v.target_language.clone())
                            .unwrap_or_default(),
                        document_id: doc.id,
                        client_name: profile.name.clone(),
                        is_bank_statement: doc.is_bank_statement,
                        source_currency: payment.currency.clone(),
                        target_currency: payment.currency.clone(),
                    }));
                }
                None => {
                    warn!(
                        payment_id = payment.id,
                        document_id = doc.id,
                        "no stored file available; translation submission skipped"
                    );
                }
            }
        } else {
            warn!(
                payment_id = payment.id,
                "payment has no resolvable document; translation submission skipped"
            );
        }

        let document_name = document
            .as_ref()
            .map(|d| d.filename.clone())
            .unwrap_or_default();
        effects.push(SideEffect::Notify {
            recipient: Recipient::User(payment.user_id),
            payload: NotificationPayload {
                user_email: profile.email.clone(),
                message: format!(
                    "Your payment of {} {} has been approved",
                    payment.amount, payment.currency
                ),
                notification_type: NotificationType::PaymentApproved,
                user_name: profile.name.clone(),
                document_name: document_name.clone(),
                amount: payment.amount,
                timestamp: Utc::now(),
            },
        });
        effects.push(SideEffect::Notify {
            recipient: Recipient::AuthenticatorStaff,
            payload: NotificationPayload {
                user_email: String::new(),
                message: "A new document is awaiting authentication".to_string(),
                notification_type: NotificationType::AuthenticationPending,
                user_name: profile.name,
                document_name,
                amount: payment.amount,
                timestamp: Utc::now(),
            },
        });

        (effects, document)
    }

    async fn lookup_profile(&self, user_id: u64) -> UserProfile {
        match timeout(self.lookup_timeout, self.directory.lookup(user_id)).await {
            Ok(Ok(Some(profile))) => profile,
            Ok(Ok(None)) => {
                warn!(user_id, "user not found in directory; notification identity blank");
                Self::blank_profile(user_id)
            }
            Ok(Err(err)) => {
                warn!(user_id, error = %err, "user directory lookup failed");
                Self::blank_profile(user_id)
            }
            Err(_) => {
                warn!(user_id, "user directory lookup timed out");
                Self::blank_profile(user_id)
            }
        }
    }

    fn blank_profile(user_id: u64) -> UserProfile {
        UserProfile {
            id: user_id,
            name: String::new(),
            email: String::new(),
        }
    }

    async fn lookup_document(&self, payment: &Payment) -> Option<BaseDocument> {
        let document_id = payment.document_id?;
        match timeout(self.lookup_timeout, self.documents.get(document_id)).await {
            Ok(Ok(doc)) => doc,
            Ok(Err(err)) => {
                warn!(document_id, error = %err, "document lookup failed");
                None
            }
            Err(_) => {
                warn!(document_id, "document lookup timed out");
                None
            }
        }
    }

    async fn lookup_stored_file(&self, doc: &BaseDocument) -> Option<StoredFile> {
        match timeout(
            self.lookup_timeout,
            self.storage.signed_url(doc.id, &doc.filename),
        )
        .await
        {
            Ok(Ok(stored)) => Some(stored),
            Ok(Err(err)) => {
                warn!(document_id = doc.id, error = %err, "signed URL issuance failed");
                None
            }
            Err(_) => {
                warn!(document_id = doc.id, "signed URL issuance timed out");
                None
            }
        }
    }

    /// Finds the verification record carrying the language pair, by explicit
    /// back-reference first, filename second.
    async fn lookup_languages(&self, doc: &BaseDocument) -> Option<VerificationRecord> {
        let records = match timeout(
            self.lookup_timeout,
            self.verifications.list_for_user(doc.user_id),
        )
        .await
        {
            Ok(Ok(records)) => records,
            Ok(Err(err)) => {
                warn!(document_id = doc.id, error = %err, "verification lookup failed");
                return None;
            }
            Err(_) => {
                warn!(document_id = doc.id, "verification lookup timed out");
                return None;
            }
        };
        records
            .iter()
            .find(|v| v.original_document_id == Some(doc.id))
            .or_else(|| records.iter().find(|v| v.filename == doc.filename))
            .cloned()
    }
}
