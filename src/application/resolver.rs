use crate::domain::ports::{
    DocumentStoreBox, PaymentStoreBox, TranslatedStoreBox, VerificationStoreBox,
};
use crate::domain::resolved::{DocumentView, ResolvedDocument, apply_payment_overlay};
use crate::error::Result;
use std::collections::HashSet;
use tracing::warn;

/// Merges the three document record sets for one user into a single ordered
/// projection, then overlays the payment-status veto.
///
/// The three document tables are critical base data: a failed read there
/// fails the call. The payment overlay is non-critical: a failed payment read
/// degrades to "no override applied" and is only logged.
pub struct Resolver {
    documents: DocumentStoreBox,
    verifications: VerificationStoreBox,
    translations: TranslatedStoreBox,
    payments: PaymentStoreBox,
}

impl Resolver {
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

    /// Full recompute on every call; the resolver keeps no cache.
    pub async fn resolve_user_documents(&self, user_id: u64) -> Result<Vec<DocumentView>> {
        let documents = self.documents.list_for_user(user_id).await?;
        let verifications = self.verifications.list_for_user(user_id).await?;

        let mut views: Vec<DocumentView> = Vec::new();
        let mut matched: HashSet<u64> = HashSet::new();

        for doc in &documents {
            let mut candidates: Vec<_> = verifications
                .iter()
                .filter(|v| v.filename == doc.filename)
                .collect();
            if candidates.len() > 1 {
                // Duplicate filenames make the match ambiguous; the latest
                // record wins but the linkage is a data-integrity risk.
                warn!(
                    user_id,
                    filename = %doc.filename,
                    candidates = candidates.len(),
                    "ambiguous filename match between document and verification records"
                );
            }
            candidates.sort_by_key(|v| v.created_at);

            match candidates.last() {
                Some(v) => {
                    matched.insert(v.id);
                    let resolved = match self.translations.find_by_verification(v.id).await? {
                        Some(t) => ResolvedDocument::Translated(t, (*v).clone()),
                        None => ResolvedDocument::Verified((*v).clone()),
                    };
                    let mut view = resolved.view();
                    // The matched base document id is the preferred payment key.
                    view.payment_lookup_id = Some(doc.id);
                    views.push(view);
                }
                None => views.push(ResolvedDocument::Base(doc.clone()).view()),
            }
        }

        // Orphaned verification records (no base document matched) still get
        // resolved through the translated-record chain. Degraded-data
        // recovery, not the common path.
        for v in &verifications {
            if matched.contains(&v.id) {
                continue;
            }
            let resolved = match self.translations.find_by_verification(v.id).await? {
                Some(t) => ResolvedDocument::Translated(t, v.clone()),
                None => ResolvedDocument::Verified(v.clone()),
            };
            views.push(resolved.view());
        }

        match self.payments.list_for_user(user_id).await {
            Ok(payments) => apply_payment_overlay(&mut views, &payments),
            Err(err) => {
                warn!(user_id, error = %err, "payment overlay skipped; statuses shown unvetoed");
            }
        }

        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(views)
    }
}
