use crate::core::errors::Result;
use crate::core::models::audit_entry::{AuditEntry, AuditQuery, NewAuditEntry};

/// Port for the append-only audit trail.
///
/// The sink owns the clock: `append` stamps `occurred_at` at write time,
/// so entries order by the store's view of time rather than the caller's
/// (a client with a skewed or tampered clock cannot reorder the trail).
pub trait AuditSink: Send + Sync {
    /// Append one entry, returning it with its assigned timestamp.
    fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry>;

    /// Read entries matching the query, newest first.
    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>>;
}
