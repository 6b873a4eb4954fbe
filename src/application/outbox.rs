use crate::domain::ports::{
    NotificationDispatcherBox, OutboxEntry, OutboxStoreBox, PipelineSubmitterBox, SideEffect,
};
use crate::error::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Drains the side-effect outbox for a payment, sequentially and
/// best-effort.
///
/// Each effect carries its own bounded timeout; a failure or timeout marks
/// the entry failed and moves on, and nothing here can roll back the payment
/// transition that enqueued the entry.
pub struct SideEffectWorker {
    outbox: OutboxStoreBox,
    dispatcher: NotificationDispatcherBox,
    pipeline: PipelineSubmitterBox,
    effect_timeout: Duration,
}

impl SideEffectWorker {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    pub fn new(
        outbox: OutboxStoreBox,
        dispatcher: NotificationDispatcherBox,
        pipeline: PipelineSubmitterBox,
    ) -> Self {
        Self::with_timeout(outbox, dispatcher, pipeline, Self::DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        outbox: OutboxStoreBox,
        dispatcher: NotificationDispatcherBox,
        pipeline: PipelineSubmitterBox,
        effect_timeout: Duration,
    ) -> Self {
        Self {
            outbox,
            dispatcher,
            pipeline,
            effect_timeout,
        }
    }

    /// Attempts every pending entry for `payment_id`, oldest first. Returns
    /// the number of entries that completed.
    pub async fn drain_for_payment(&self, payment_id: u64) -> usize {
        let entries = match self.outbox.pending_for_payment(payment_id).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(payment_id, error = %err, "could not read side-effect outbox");
                return 0;
            }
        };

        let mut completed = 0;
        for entry in entries {
            match timeout(self.effect_timeout, self.perform(&entry)).await {
                Ok(Ok(())) => {
                    if let Err(err) = self.outbox.mark_done(entry.id).await {
                        warn!(entry_id = entry.id, error = %err, "failed to mark outbox entry done");
                    }
                    completed += 1;
                }
                Ok(Err(err)) => {
                    warn!(
                        payment_id,
                        entry_id = entry.id,
                        error = %err,
                        "side effect failed; payment transition stands"
                    );
                    if let Err(err) = self.outbox.mark_failed(entry.id, &err.to_string()).await {
                        warn!(entry_id = entry.id, error = %err, "failed to mark outbox entry failed");
                    }
                }
                Err(_) => {
                    warn!(
                        payment_id,
                        entry_id = entry.id,
                        "side effect timed out; payment transition stands"
                    );
                    if let Err(err) = self.outbox.mark_failed(entry.id, "timed out").await {
                        warn!(entry_id = entry.id, error = %err, "failed to mark outbox entry failed");
                    }
                }
            }
        }
        completed
    }

    async fn perform(&self, entry: &OutboxEntry) -> Result<()> {
        match &entry.effect {
            SideEffect::SubmitTranslation(payload) => self.pipeline.submit(payload.clone()).await,
            SideEffect::Notify { recipient, payload } => {
                self.dispatcher.notify(*recipient, payload.clone()).await
            }
        }
    }
}
