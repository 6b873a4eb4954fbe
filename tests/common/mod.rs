#![allow(dead_code)]

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use veridoc::application::outbox::SideEffectWorker;
use veridoc::application::reconciler::Reconciler;
use veridoc::application::resolver::Resolver;
use veridoc::application::verification::VerificationService;
use veridoc::domain::document::{BaseDocument, DocumentStatus, VerificationRecord};
use veridoc::domain::payment::{Payment, PaymentMethod, PaymentStatus};
use veridoc::domain::ports::UserProfile;
use veridoc::infrastructure::audit::InMemoryAuditLog;
use veridoc::infrastructure::dispatcher::{RecordingDispatcher, RecordingPipeline};
use veridoc::infrastructure::in_memory::{
    InMemoryDocumentStore, InMemoryPaymentLedger, InMemoryTranslatedStore,
    InMemoryUserDirectory, InMemoryVerificationStore, StaticFileStorage,
};

/// All the in-memory adapters a test needs, with recording doubles for the
/// outbound collaborators.
pub struct Harness {
    pub documents: InMemoryDocumentStore,
    pub verifications: InMemoryVerificationStore,
    pub translations: InMemoryTranslatedStore,
    pub ledger: InMemoryPaymentLedger,
    pub directory: InMemoryUserDirectory,
    pub audit: InMemoryAuditLog,
    pub dispatcher: RecordingDispatcher,
    pub pipeline: RecordingPipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            documents: InMemoryDocumentStore::new(),
            verifications: InMemoryVerificationStore::new(),
            translations: InMemoryTranslatedStore::new(),
            ledger: InMemoryPaymentLedger::new(),
            directory: InMemoryUserDirectory::new(),
            audit: InMemoryAuditLog::new(),
            dispatcher: RecordingDispatcher::new(),
            pipeline: RecordingPipeline::new(),
        }
    }

    pub fn verification_service(&self) -> VerificationService {
        let worker = SideEffectWorker::new(
            Box::new(self.ledger.clone()),
            Box::new(self.dispatcher.clone()),
            Box::new(self.pipeline.clone()),
        );
        VerificationService::new(
            Box::new(self.ledger.clone()),
            Box::new(self.documents.clone()),
            Box::new(self.verifications.clone()),
            Box::new(self.directory.clone()),
            Box::new(StaticFileStorage::new("https://storage.local")),
            Box::new(self.audit.clone()),
            worker,
        )
    }

    pub fn resolver(&self) -> Resolver {
        Resolver::new(
            Box::new(self.documents.clone()),
            Box::new(self.verifications.clone()),
            Box::new(self.translations.clone()),
            Box::new(self.ledger.clone()),
        )
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(
            Box::new(self.documents.clone()),
            Box::new(self.verifications.clone()),
            Box::new(self.translations.clone()),
            Box::new(self.ledger.clone()),
        )
    }
}

pub fn base_document(id: u64, user_id: u64, filename: &str) -> BaseDocument {
    BaseDocument {
        id,
        user_id,
        filename: filename.to_string(),
        pages: 3,
        total_cost: Some(dec!(40.00)),
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

pub fn verification_record(id: u64, user_id: u64, original: Option<u64>, filename: &str) -> VerificationRecord {
    VerificationRecord {
        id,
        user_id,
        filename: filename.to_string(),
        original_document_id: original,
        status: "in translation".to_string(),
        total_cost: Some(dec!(40.00)),
        source_language: "es".to_string(),
        target_language: "en".to_string(),
        translated_file_url: None,
        authenticated_by_name: None,
        authenticated_by_email: None,
        authentication_date: None,
        created_at: Utc::now(),
    }
}

pub fn zelle_payment(id: u64, user_id: u64, document_id: u64, amount: Decimal) -> Payment {
    Payment {
        id,
        document_id: Some(document_id),
        user_id,
        amount,
        base_amount: None,
        fee_amount: None,
        currency: "USD".to_string(),
        status: PaymentStatus::PendingVerification,
        payment_method: PaymentMethod::Zelle,
        zelle_confirmation_code: None,
        zelle_verified_at: None,
        zelle_verified_by: None,
        created_at: Utc::now(),
    }
}

pub fn profile(id: u64, name: &str, email: &str) -> UserProfile {
    UserProfile {
        id,
        name: name.to_string(),
        email: email.to_string(),
    }
}
