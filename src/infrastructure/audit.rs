use crate::domain::ports::{AuditContext, AuditLog};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Audit adapter that emits entries as structured log events. Stands in for
/// the production append-only action log; by contract it never fails the
/// caller.
#[derive(Default, Clone)]
pub struct TracingAuditLog;

impl TracingAuditLog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, action_type: &str, description: &str, context: AuditContext) {
        info!(
            action_type,
            description,
            entity_type = %context.entity_type,
            entity_id = context.entity_id,
            affected_user_id = ?context.affected_user_id,
            performer_type = %context.performer_type,
            metadata = %context.metadata,
            "audit"
        );
    }
}

#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct AuditEntry {
    pub action_type: String,
    pub description: String,
    pub context: AuditContext,
}

/// Audit adapter that keeps entries in memory, for assertions in tests.
#[derive(Default, Clone)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, action_type: &str, description: &str, context: AuditContext) {
        let mut entries = self.entries.write().await;
        entries.push(AuditEntry {
            action_type: action_type.to_string(),
            description: description.to_string(),
            context,
        });
    }
}
