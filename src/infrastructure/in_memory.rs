use crate::domain::document::{BaseDocument, TranslatedRecord, VerificationRecord};
use crate::domain::payment::{Payment, PaymentStatus};
use crate::domain::ports::{
    DocumentStore, FileStorage, OutboxEntry, OutboxStatus, OutboxStore, PaymentStore, SideEffect,
    StoredFile, TranslatedStore, Transition, UserDirectory, UserProfile, VerificationStore,
};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Thread-safe in-memory store for base documents.
#[derive(Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<u64, BaseDocument>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, doc: BaseDocument) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.insert(doc.id, doc);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<BaseDocument>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: u64) -> Result<Vec<BaseDocument>> {
        let documents = self.documents.read().await;
        Ok(documents
            .values()
            .filter(|d| d.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<BaseDocument>> {
        let documents = self.documents.read().await;
        Ok(documents.values().cloned().collect())
    }
}

/// Thread-safe in-memory store for verification records.
#[derive(Default, Clone)]
pub struct InMemoryVerificationStore {
    records: Arc<RwLock<HashMap<u64, VerificationRecord>>>,
}

impl InMemoryVerificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VerificationStore for InMemoryVerificationStore {
    async fn insert(&self, record: VerificationRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn list_for_user(&self, user_id: u64) -> Result<Vec<VerificationRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<VerificationRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }
}

/// Thread-safe in-memory store for translated records.
#[derive(Default, Clone)]
pub struct InMemoryTranslatedStore {
    records: Arc<RwLock<HashMap<u64, TranslatedRecord>>>,
}

impl InMemoryTranslatedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranslatedStore for InMemoryTranslatedStore {
    async fn insert(&self, record: TranslatedRecord) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert(record.id, record);
        Ok(())
    }

    async fn find_by_verification(
        &self,
        verification_id: u64,
    ) -> Result<Option<TranslatedRecord>> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|t| t.original_document_id == verification_id)
            .cloned())
    }
}

struct LedgerInner {
    payments: HashMap<u64, Payment>,
    outbox: Vec<OutboxEntry>,
    next_outbox_id: u64,
}

/// Payments and their side-effect outbox, held under a single lock so a
/// status transition and its enqueued effects commit together. Implements
/// both [`PaymentStore`] and [`OutboxStore`].
#[derive(Clone)]
pub struct InMemoryPaymentLedger {
    inner: Arc<RwLock<LedgerInner>>,
}

impl Default for InMemoryPaymentLedger {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(LedgerInner {
                payments: HashMap::new(),
                outbox: Vec::new(),
                next_outbox_id: 1,
            })),
        }
    }
}

impl InMemoryPaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn enqueue(inner: &mut LedgerInner, payment_id: u64, effects: Vec<SideEffect>) {
        for effect in effects {
            let entry = OutboxEntry {
                id: inner.next_outbox_id,
                payment_id,
                effect,
                status: OutboxStatus::Pending,
                last_error: None,
                created_at: Utc::now(),
            };
            inner.next_outbox_id += 1;
            inner.outbox.push(entry);
        }
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentLedger {
    async fn insert(&self, payment: Payment) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.payments.insert(payment.id, payment);
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: u64) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Payment>> {
        let inner = self.inner.read().await;
        Ok(inner.payments.values().cloned().collect())
    }

    async fn set_confirmation_code(&self, id: u64, code: &str) -> Result<Payment> {
        let mut inner = self.inner.write().await;
        let payment = inner
            .payments
            .get_mut(&id)
            .ok_or(OrderError::NotFound {
                entity: "payment",
                id,
            })?;
        payment.zelle_confirmation_code = Some(code.to_string());
        Ok(payment.clone())
    }

    async fn complete_verification(
        &self,
        id: u64,
        verified_by: &str,
        effects: Vec<SideEffect>,
    ) -> Result<Transition> {
        let mut inner = self.inner.write().await;
        let payment = inner
            .payments
            .get_mut(&id)
            .ok_or(OrderError::NotFound {
                entity: "payment",
                id,
            })?;
        // Refunded/cancelled payments are just as untouchable as terminal ones.
        if !payment.status.is_pending() {
            return Ok(Transition::AlreadyTerminal(payment.clone()));
        }
        payment.status = PaymentStatus::Completed;
        payment.zelle_verified_at = Some(Utc::now());
        payment.zelle_verified_by = Some(verified_by.to_string());
        let updated = payment.clone();
        Self::enqueue(&mut inner, id, effects);
        Ok(Transition::Applied(updated))
    }

    async fn fail_verification(&self, id: u64, effects: Vec<SideEffect>) -> Result<Transition> {
        let mut inner = self.inner.write().await;
        let payment = inner
            .payments
            .get_mut(&id)
            .ok_or(OrderError::NotFound {
                entity: "payment",
                id,
            })?;
        if !payment.status.is_pending() {
            return Ok(Transition::AlreadyTerminal(payment.clone()));
        }
        payment.status = PaymentStatus::Failed;
        let updated = payment.clone();
        Self::enqueue(&mut inner, id, effects);
        Ok(Transition::Applied(updated))
    }
}

#[async_trait]
impl OutboxStore for InMemoryPaymentLedger {
    async fn pending_for_payment(&self, payment_id: u64) -> Result<Vec<OutboxEntry>> {
        let inner = self.inner.read().await;
        Ok(inner
            .outbox
            .iter()
            .filter(|e| e.payment_id == payment_id && e.status == OutboxStatus::Pending)
            .cloned()
            .collect())
    }

    async fn mark_done(&self, entry_id: u64) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .outbox
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(OrderError::NotFound {
                entity: "outbox entry",
                id: entry_id,
            })?;
        entry.status = OutboxStatus::Done;
        Ok(())
    }

    async fn mark_failed(&self, entry_id: u64, error: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let entry = inner
            .outbox
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or(OrderError::NotFound {
                entity: "outbox entry",
                id: entry_id,
            })?;
        entry.status = OutboxStatus::Failed;
        entry.last_error = Some(error.to_string());
        Ok(())
    }

    async fn all_entries(&self) -> Result<Vec<OutboxEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.outbox.clone())
    }
}

/// Thread-safe in-memory user directory.
#[derive(Default, Clone)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<u64, UserProfile>>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: UserProfile) {
        let mut users = self.users.write().await;
        users.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, user_id: u64) -> Result<Option<UserProfile>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).cloned())
    }
}

/// File storage stand-in that derives a deterministic URL from a base prefix.
/// The production signed-URL issuer sits behind the same port.
#[derive(Clone)]
pub struct StaticFileStorage {
    base_url: String,
}

impl StaticFileStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl FileStorage for StaticFileStorage {
    async fn signed_url(&self, document_id: u64, filename: &str) -> Result<StoredFile> {
        let mimetype = match filename.rsplit('.').next() {
            Some("pdf") => "application/pdf",
            Some("png") => "image/png",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "application/octet-stream",
        };
        Ok(StoredFile {
            url: format!("{}/documents/{document_id}/{filename}", self.base_url),
            mimetype: mimetype.to_string(),
            size: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentMethod;
    use rust_decimal_macros::dec;

    fn pending_payment(id: u64) -> Payment {
        Payment {
            id,
            document_id: Some(1),
            user_id: 1,
            amount: dec!(10.00),
            base_amount: None,
            fee_amount: None,
            currency: "USD".to_string(),
            status: PaymentStatus::PendingVerification,
            payment_method: PaymentMethod::Zelle,
            zelle_confirmation_code: Some("ZC1".to_string()),
            zelle_verified_at: None,
            zelle_verified_by: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_complete_verification_is_conditional() {
        let ledger = InMemoryPaymentLedger::new();
        ledger.insert(pending_payment(1)).await.unwrap();

        let first = ledger
            .complete_verification(1, "admin@example.com", vec![])
            .await
            .unwrap();
        assert!(matches!(first, Transition::Applied(_)));

        let second = ledger
            .complete_verification(1, "admin@example.com", vec![])
            .await
            .unwrap();
        let Transition::AlreadyTerminal(payment) = second else {
            panic!("second call must be a no-op");
        };
        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.zelle_verified_by.as_deref(), Some("admin@example.com"));
    }

    #[tokio::test]
    async fn test_effects_enqueued_only_on_first_transition() {
        let ledger = InMemoryPaymentLedger::new();
        ledger.insert(pending_payment(1)).await.unwrap();

        let payload = crate::domain::ports::NotificationPayload {
            user_email: "u@example.com".to_string(),
            message: "approved".to_string(),
            notification_type: crate::domain::ports::NotificationType::PaymentApproved,
            user_name: "U".to_string(),
            document_name: "a.pdf".to_string(),
            amount: dec!(10.00),
            timestamp: Utc::now(),
        };
        let effect = SideEffect::Notify {
            recipient: crate::domain::ports::Recipient::User(1),
            payload,
        };

        ledger
            .complete_verification(1, "admin", vec![effect.clone()])
            .await
            .unwrap();
        ledger
            .complete_verification(1, "admin", vec![effect])
            .await
            .unwrap();

        assert_eq!(ledger.pending_for_payment(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fail_verification_terminal_noop() {
        let ledger = InMemoryPaymentLedger::new();
        ledger.insert(pending_payment(2)).await.unwrap();

        ledger.fail_verification(2, vec![]).await.unwrap();
        let again = ledger.fail_verification(2, vec![]).await.unwrap();
        assert!(matches!(again, Transition::AlreadyTerminal(_)));
        let payment = ledger.get(2).await.unwrap().unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn test_set_confirmation_code_missing_payment() {
        let ledger = InMemoryPaymentLedger::new();
        assert!(matches!(
            ledger.set_confirmation_code(99, "X").await,
            Err(OrderError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_outbox_mark_failed_records_error() {
        let ledger = InMemoryPaymentLedger::new();
        ledger.insert(pending_payment(1)).await.unwrap();
        ledger
            .complete_verification(
                1,
                "admin",
                vec![SideEffect::SubmitTranslation(
                    crate::domain::ports::SubmissionPayload {
                        filename: "a.pdf".to_string(),
                        url: "https://files/a.pdf".to_string(),
                        mimetype: "application/pdf".to_string(),
                        size: 1024,
                        user_id: 1,
                        pages: 1,
                        document_type: "general".to_string(),
                        total_cost: dec!(10.00),
                        source_language: "es".to_string(),
                        target_language: "en".to_string(),
                        document_id: 1,
                        client_name: "U".to_string(),
                        is_bank_statement: false,
                        source_currency: "USD".to_string(),
                        target_currency: "USD".to_string(),
                    },
                )],
            )
            .await
            .unwrap();

        let entry_id = ledger.pending_for_payment(1).await.unwrap()[0].id;
        ledger.mark_failed(entry_id, "timeout").await.unwrap();

        assert!(ledger.pending_for_payment(1).await.unwrap().is_empty());
        let all = ledger.all_entries().await.unwrap();
        assert_eq!(all[0].status, OutboxStatus::Failed);
        assert_eq!(all[0].last_error.as_deref(), Some("timeout"));
    }
}
