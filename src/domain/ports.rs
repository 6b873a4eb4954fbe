use super::document::{BaseDocument, TranslatedRecord, VerificationRecord};
use super::payment::Payment;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outbound payload for submitting a document to the translation pipeline.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct SubmissionPayload {
    pub filename: String,
    pub url: String,
    pub mimetype: String,
    pub size: u64,
    pub user_id: u64,
    pub pages: u32,
    pub document_type: String,
    pub total_cost: Decimal,
    pub source_language: String,
    pub target_language: String,
    pub document_id: u64,
    pub client_name: String,
    pub is_bank_statement: bool,
    pub source_currency: String,
    pub target_currency: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    PaymentApproved,
    PaymentRejected,
    AuthenticationPending,
}

/// Outbound payload for a user-facing or staff-facing notification.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct NotificationPayload {
    pub user_email: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub user_name: String,
    pub document_name: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    User(u64),
    /// Broadcast to the pending-authenticator staff group.
    AuthenticatorStaff,
}

/// Context attached to an audit-log entry.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct AuditContext {
    pub entity_type: String,
    pub entity_id: u64,
    pub affected_user_id: Option<u64>,
    pub performer_type: String,
    pub metadata: serde_json::Value,
}

/// A downstream action owed after a committed payment transition. Durably
/// recorded alongside the transition, then drained best-effort.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub enum SideEffect {
    SubmitTranslation(SubmissionPayload),
    Notify {
        recipient: Recipient,
        payload: NotificationPayload,
    },
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum OutboxStatus {
    Pending,
    Done,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OutboxEntry {
    pub id: u64,
    pub payment_id: u64,
    pub effect: SideEffect,
    pub status: OutboxStatus,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Result of a conditional payment transition.
#[derive(Debug, PartialEq, Clone)]
pub enum Transition {
    /// The status moved to its terminal value in this call.
    Applied(Payment),
    /// The payment was already terminal; nothing changed.
    AlreadyTerminal(Payment),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(&self, doc: BaseDocument) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<BaseDocument>>;
    async fn list_for_user(&self, user_id: u64) -> Result<Vec<BaseDocument>>;
    async fn list_all(&self) -> Result<Vec<BaseDocument>>;
}

#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn insert(&self, record: VerificationRecord) -> Result<()>;
    async fn list_for_user(&self, user_id: u64) -> Result<Vec<VerificationRecord>>;
    async fn list_all(&self) -> Result<Vec<VerificationRecord>>;
}

#[async_trait]
pub trait TranslatedStore: Send + Sync {
    async fn insert(&self, record: TranslatedRecord) -> Result<()>;
    /// Looks up the finished artifact for a verification record, if any.
    async fn find_by_verification(&self, verification_id: u64)
    -> Result<Option<TranslatedRecord>>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: Payment) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<Payment>>;
    async fn list_for_user(&self, user_id: u64) -> Result<Vec<Payment>>;
    async fn list_all(&self) -> Result<Vec<Payment>>;
    /// Persists an operator-entered confirmation code without changing status.
    async fn set_confirmation_code(&self, id: u64, code: &str) -> Result<Payment>;
    /// Conditionally moves the payment to `completed`, stamping
    /// `zelle_verified_at`/`zelle_verified_by`, and enqueues `effects` in the
    /// same operation. Keyed only by `id`; safe under concurrent invocation,
    /// since any non-pending payment yields [`Transition::AlreadyTerminal`]
    /// and enqueues nothing.
    async fn complete_verification(
        &self,
        id: u64,
        verified_by: &str,
        effects: Vec<SideEffect>,
    ) -> Result<Transition>;
    /// Conditionally moves the payment to `failed`, same contract as
    /// [`PaymentStore::complete_verification`].
    async fn fail_verification(&self, id: u64, effects: Vec<SideEffect>) -> Result<Transition>;
}

#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Pending entries for one payment, oldest first.
    async fn pending_for_payment(&self, payment_id: u64) -> Result<Vec<OutboxEntry>>;
    async fn mark_done(&self, entry_id: u64) -> Result<()>;
    async fn mark_failed(&self, entry_id: u64, error: &str) -> Result<()>;
    async fn all_entries(&self) -> Result<Vec<OutboxEntry>>;
}

/// Minimal identity view of a user, for addressing notifications.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct UserProfile {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Read-only lookup into the user base. Failures degrade the notification
/// payload, never the payment operation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, user_id: u64) -> Result<Option<UserProfile>>;
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct StoredFile {
    pub url: String,
    pub mimetype: String,
    pub size: u64,
}

/// Signed-URL issuance for an uploaded document. External collaborator;
/// specified only at this boundary.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn signed_url(&self, document_id: u64, filename: &str) -> Result<StoredFile>;
}

/// Best-effort webhook dispatcher. Implementations bound the call with a
/// timeout; a returned error is logged by the caller, never re-raised to the
/// operation that triggered the notification.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, recipient: Recipient, payload: NotificationPayload) -> Result<()>;
}

/// Hands a paid document over to the downstream translation pipeline.
#[async_trait]
pub trait PipelineSubmitter: Send + Sync {
    async fn submit(&self, payload: SubmissionPayload) -> Result<()>;
}

/// Append-only action log. Write-only; implementations swallow and log their
/// own failures so a missing audit row never fails the calling operation.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, action_type: &str, description: &str, context: AuditContext);
}

pub type DocumentStoreBox = Box<dyn DocumentStore>;
pub type UserDirectoryBox = Box<dyn UserDirectory>;
pub type FileStorageBox = Box<dyn FileStorage>;
pub type VerificationStoreBox = Box<dyn VerificationStore>;
pub type TranslatedStoreBox = Box<dyn TranslatedStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type OutboxStoreBox = Box<dyn OutboxStore>;
pub type NotificationDispatcherBox = Box<dyn NotificationDispatcher>;
pub type PipelineSubmitterBox = Box<dyn PipelineSubmitter>;
pub type AuditLogBox = Box<dyn AuditLog>;
