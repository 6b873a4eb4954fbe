use crate::domain::ports::{
    NotificationDispatcher, NotificationPayload, PipelineSubmitter, Recipient, SubmissionPayload,
};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Dispatcher that logs the outbound payload instead of calling a webhook.
/// Used by the offline CLI, where delivery endpoints are out of reach.
#[derive(Default, Clone)]
pub struct LoggingDispatcher;

impl LoggingDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationDispatcher for LoggingDispatcher {
    async fn notify(&self, recipient: Recipient, payload: NotificationPayload) -> Result<()> {
        info!(
            recipient = ?recipient,
            notification_type = ?payload.notification_type,
            document = %payload.document_name,
            "notification dispatched"
        );
        Ok(())
    }
}

/// Pipeline submitter that logs the submission payload instead of posting it.
#[derive(Default, Clone)]
pub struct LoggingPipeline;

impl LoggingPipeline {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PipelineSubmitter for LoggingPipeline {
    async fn submit(&self, payload: SubmissionPayload) -> Result<()> {
        info!(
            document_id = payload.document_id,
            filename = %payload.filename,
            target_language = %payload.target_language,
            "translation submission dispatched"
        );
        Ok(())
    }
}

/// Records every notification for later assertion. Test double.
#[derive(Default, Clone)]
pub struct RecordingDispatcher {
    calls: Arc<RwLock<Vec<(Recipient, NotificationPayload)>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn calls(&self) -> Vec<(Recipient, NotificationPayload)> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn notify(&self, recipient: Recipient, payload: NotificationPayload) -> Result<()> {
        let mut calls = self.calls.write().await;
        calls.push((recipient, payload));
        Ok(())
    }
}

/// Records every pipeline submission for later assertion. Test double.
#[derive(Default, Clone)]
pub struct RecordingPipeline {
    submissions: Arc<RwLock<Vec<SubmissionPayload>>>,
}

impl RecordingPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions.read().await.clone()
    }
}

#[async_trait]
impl PipelineSubmitter for RecordingPipeline {
    async fn submit(&self, payload: SubmissionPayload) -> Result<()> {
        let mut submissions = self.submissions.write().await;
        submissions.push(payload);
        Ok(())
    }
}
