use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;

use crate::core::errors::Result;
use crate::core::models::audit_entry::{
    action_severity, categorize_action, Actor, AuditEntry, AuditQuery, NewAuditEntry,
};
use crate::core::traits::audit::AuditSink;
use crate::core::traits::client_info::ClientInfo;

/// Fixed column set of the CSV export.
const CSV_HEADER: &str = "Timestamp,Admin Email,Action,Category,Severity,Details,IP Address,Success";

/// Records and reads the security audit trail.
///
/// `record` is deliberately infallible: audit instrumentation must never
/// take down a login or logout, so sink failures are swallowed and
/// reported on the diagnostic side channel only.
pub struct AuditService<A: AuditSink, C: ClientInfo> {
    sink: A,
    client: C,
    enabled: bool,
}

impl<A: AuditSink, C: ClientInfo> AuditService<A, C> {
    pub fn new(sink: A, client: C) -> Self {
        Self {
            sink,
            client,
            enabled: true,
        }
    }

    /// Like `new`, but auditing can be switched off from configuration;
    /// a disabled service drops entries silently.
    pub fn with_enabled(sink: A, client: C, enabled: bool) -> Self {
        Self {
            sink,
            client,
            enabled,
        }
    }

    /// Append one entry, deriving category and severity from the action
    /// tag. `details.success == false` marks the entry as a failure;
    /// anything else (including no `success` key) counts as success.
    ///
    /// Details must never carry a full secret or token; redact before
    /// calling.
    pub fn record(&self, actor: &Actor, action: &str, details: Value) {
        if !self.enabled {
            return;
        }

        let success = details.get("success") != Some(&Value::Bool(false));

        let entry = NewAuditEntry {
            actor_id: actor.id.clone(),
            actor_email: actor.email.clone(),
            actor_name: actor.display_name.clone(),
            action: action.to_string(),
            category: categorize_action(action),
            severity: action_severity(action),
            details,
            client_ip: self.client.public_ip(),
            user_agent: self.client.identity_string(),
            success,
        };

        if let Err(err) = self.sink.append(entry) {
            tracing::warn!(action, %err, "could not write audit entry");
        }
    }

    /// Read entries matching the query, newest first.
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        self.sink.query(query)
    }

    /// Render entries as delimited text with the fixed column set.
    /// Commas inside the serialized details are substituted with
    /// semicolons so the row structure stays intact.
    pub fn to_csv(entries: &[AuditEntry]) -> String {
        let mut rows = Vec::with_capacity(entries.len() + 1);
        rows.push(CSV_HEADER.to_string());

        for entry in entries {
            let details = serde_json::to_string(&entry.details)
                .unwrap_or_else(|_| "{}".to_string())
                .replace(',', ";");
            rows.push(
                [
                    entry.occurred_at.to_rfc3339(),
                    entry.actor_email.clone(),
                    entry.action.clone(),
                    entry.category.as_str().to_string(),
                    entry.severity.as_str().to_string(),
                    details,
                    entry.client_ip.clone(),
                    if entry.success { "Yes" } else { "No" }.to_string(),
                ]
                .join(","),
            );
        }

        rows.join("\n")
    }

    /// Write the CSV export next to `dir`, named
    /// `audit-trail-<ISO8601>.csv`, and return the full path.
    pub fn export_to_dir(entries: &[AuditEntry], dir: &Path) -> Result<PathBuf> {
        let stamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
        let path = dir.join(format!("audit-trail-{stamp}.csv"));
        std::fs::write(&path, Self::to_csv(entries))?;
        Ok(path)
    }
}
