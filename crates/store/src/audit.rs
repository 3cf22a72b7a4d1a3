//! Append-only audit log.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use orca_core::{AuditLogEntry, AuditRecord, AuditRecorder, Error};
use tokio::sync::RwLock;

/// In-process audit recorder. Entries are never mutated, deleted, or
/// reordered; insertion order is the compliance record.
pub struct MemoryAuditLog {
    next_id: AtomicU64,
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: RwLock::new(Vec::new()),
        }
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRecorder for MemoryAuditLog {
    async fn record(&self, record: AuditRecord) -> Result<AuditLogEntry, Error> {
        let entry = AuditLogEntry {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            event_type: record.event_type,
            details: record.details,
            trade_id: record.trade_id,
            actor: record.actor,
            status: record.status,
            timestamp: Utc::now(),
        };
        self.entries.write().await.push(entry.clone());
        tracing::debug!(
            event = %entry.event_type,
            status = ?entry.status,
            trade_id = ?entry.trade_id,
            "Audit entry recorded"
        );
        Ok(entry)
    }

    async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    async fn entries_for_trade(&self, trade_id: &str) -> Vec<AuditLogEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.trade_id.as_deref() == Some(trade_id))
            .cloned()
            .collect()
    }
}
