mod common;

use common::{Harness, base_document, profile, verification_record, zelle_payment};
use rust_decimal_macros::dec;
use veridoc::application::verification::{ApproveOutcome, RejectOutcome};
use veridoc::domain::payment::PaymentStatus;
use veridoc::domain::ports::{
    DocumentStore, NotificationType, OutboxStatus, OutboxStore, PaymentStore, Recipient,
    SideEffect, VerificationStore,
};
use veridoc::error::OrderError;

async fn seeded_harness() -> Harness {
    let harness = Harness::new();
    harness
        .documents
        .insert(base_document(1, 7, "invoice.pdf"))
        .await
        .unwrap();
    harness
        .verifications
        .insert(verification_record(20, 7, Some(1), "invoice.pdf"))
        .await
        .unwrap();
    harness
        .ledger
        .insert(zelle_payment(100, 7, 1, dec!(40.00)))
        .await
        .unwrap();
    harness
        .directory
        .insert(profile(7, "Maria Lopez", "maria@example.com"))
        .await;
    harness
}

#[tokio::test]
async fn approve_without_code_is_a_validation_failure() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    let err = service.approve(100, None, "admin@example.com").await.unwrap_err();
    assert!(matches!(err, OrderError::ConfirmationCodeRequired(100)));

    let payment = harness.ledger.get(100).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::PendingVerification);
    assert!(harness.pipeline.submissions().await.is_empty());
    assert!(harness.audit.entries().await.is_empty());
}

#[tokio::test]
async fn approve_with_code_runs_the_full_path() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    let outcome = service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();
    let ApproveOutcome::Approved(payment) = outcome else {
        panic!("expected a fresh approval");
    };

    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.zelle_confirmation_code.as_deref(), Some("ABC123"));
    assert!(payment.zelle_verified_at.is_some());
    assert_eq!(payment.zelle_verified_by.as_deref(), Some("admin@example.com"));

    // Exactly one pipeline submission, keyed by the base document.
    let submissions = harness.pipeline.submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].document_id, 1);
    assert_eq!(submissions[0].filename, "invoice.pdf");
    assert_eq!(submissions[0].source_language, "es");
    assert_eq!(submissions[0].target_language, "en");
    assert_eq!(submissions[0].client_name, "Maria Lopez");

    // One approval notification to the user, one staff broadcast.
    let calls = harness.dispatcher.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, Recipient::User(7));
    assert_eq!(calls[0].1.notification_type, NotificationType::PaymentApproved);
    assert_eq!(calls[0].1.user_email, "maria@example.com");
    assert_eq!(calls[1].0, Recipient::AuthenticatorStaff);
    assert_eq!(
        calls[1].1.notification_type,
        NotificationType::AuthenticationPending
    );

    // Two audit entries for the transition.
    let entries = harness.audit.entries().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].action_type, "payment_code_confirmed");
    assert_eq!(entries[1].action_type, "payment_verified");
    assert_eq!(entries[1].context.entity_id, 100);
    assert_eq!(entries[1].context.metadata["previous_status"], "pending_verification");
    assert_eq!(entries[1].context.metadata["new_status"], "completed");
}

#[tokio::test]
async fn approve_twice_is_idempotent() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();
    let second = service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();

    let ApproveOutcome::AlreadyTerminal(payment) = second else {
        panic!("second call must be a no-op");
    };
    assert_eq!(payment.status, PaymentStatus::Completed);

    // No second submission, no second pair of audit entries.
    assert_eq!(harness.pipeline.submissions().await.len(), 1);
    assert_eq!(harness.audit.entries().await.len(), 2);
    assert_eq!(harness.dispatcher.calls().await.len(), 2);
}

#[tokio::test]
async fn verify_payment_is_idempotent() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    assert!(service.verify_payment(100).await.unwrap());
    assert!(service.verify_payment(100).await.unwrap());

    let payment = harness.ledger.get(100).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn approve_pending_manual_review_transitions() {
    let harness = Harness::new();
    let mut payment = zelle_payment(101, 7, 1, dec!(25.00));
    payment.status = PaymentStatus::PendingManualReview;
    payment.zelle_confirmation_code = Some("ZC9".to_string());
    harness.ledger.insert(payment).await.unwrap();

    let service = harness.verification_service();
    let outcome = service.approve(101, None, "admin@example.com").await.unwrap();
    assert!(matches!(outcome, ApproveOutcome::Approved(_)));
}

#[tokio::test]
async fn approve_missing_payment_is_not_found() {
    let harness = Harness::new();
    let service = harness.verification_service();
    assert!(matches!(
        service.approve(999, Some("X"), "admin").await,
        Err(OrderError::NotFound { .. })
    ));
}

#[tokio::test]
async fn reject_requires_a_reason() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    assert!(matches!(
        service.reject(100, "", None, "admin").await,
        Err(OrderError::Validation(_))
    ));
    assert!(matches!(
        service.reject(100, "custom", Some(""), "admin").await,
        Err(OrderError::Validation(_))
    ));

    let payment = harness.ledger.get(100).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::PendingVerification);
}

#[tokio::test]
async fn reject_transitions_and_notifies() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    let outcome = service
        .reject(100, "duplicate payment", None, "admin@example.com")
        .await
        .unwrap();
    let RejectOutcome::Rejected(payment) = outcome else {
        panic!("expected a rejection");
    };
    assert_eq!(payment.status, PaymentStatus::Failed);

    let calls = harness.dispatcher.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, Recipient::User(7));
    assert_eq!(calls[0].1.notification_type, NotificationType::PaymentRejected);
    assert!(calls[0].1.message.contains("duplicate payment"));

    // The pipeline is never touched on rejection.
    assert!(harness.pipeline.submissions().await.is_empty());

    let entries = harness.audit.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action_type, "payment_rejected");
}

#[tokio::test]
async fn reject_after_approve_is_a_noop() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();
    let outcome = service
        .reject(100, "suspicious activity", None, "admin@example.com")
        .await
        .unwrap();

    let RejectOutcome::AlreadyTerminal(payment) = outcome else {
        panic!("terminal payment must not be re-transitioned");
    };
    // Completed stays completed; it is never shown as failed afterwards.
    assert_eq!(payment.status, PaymentStatus::Completed);
}

#[tokio::test]
async fn refunded_payment_cannot_be_approved() {
    let harness = Harness::new();
    let mut payment = zelle_payment(102, 7, 1, dec!(25.00));
    payment.status = PaymentStatus::Refunded;
    payment.zelle_confirmation_code = Some("ZC".to_string());
    harness.ledger.insert(payment).await.unwrap();

    let service = harness.verification_service();
    let outcome = service.approve(102, None, "admin").await.unwrap();
    let ApproveOutcome::AlreadyTerminal(payment) = outcome else {
        panic!("refunded payment must not transition");
    };
    assert_eq!(payment.status, PaymentStatus::Refunded);
}

#[tokio::test]
async fn resolver_reflects_the_approved_order() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();

    let views = harness.resolver().resolve_user_documents(7).await.unwrap();
    assert_eq!(views.len(), 1);
    // No translated record exists yet, so the chain stops at verified.
    assert_eq!(views[0].status, "in translation");
}

#[tokio::test]
async fn outbox_entries_settle_after_approve() {
    let harness = seeded_harness().await;
    let service = harness.verification_service();

    service
        .approve(100, Some("ABC123"), "admin@example.com")
        .await
        .unwrap();

    let entries = harness.ledger.all_entries().await.unwrap();
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.status == OutboxStatus::Done));
    assert!(entries.iter().any(|e| matches!(e.effect, SideEffect::SubmitTranslation(_))));
}
