//! Audit domain — the append-only event log (C10).

mod audit_log_entry;

pub use audit_log_entry::{AuditLogEntry, EntityType};
