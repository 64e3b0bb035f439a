use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::core::errors::{GuardError, Result};
use crate::core::models::audit_entry::{
    AuditEntry, AuditQuery, NewAuditEntry, DEFAULT_QUERY_LIMIT,
};
use crate::core::traits::audit::AuditSink;

/// Audit sink that appends entries as JSON lines to a file.
///
/// Each line is one self-contained `AuditEntry` object, so appends are
/// cheap and reads stream line by line. The store assigns `occurred_at`
/// at append time: callers never control where an entry sorts in the
/// trail. Nothing here ever rewrites or deletes a line.
pub struct JsonAuditLog {
    log_path: PathBuf,
}

impl JsonAuditLog {
    /// Create a sink that writes to `{data_dir}/{log_file}`.
    pub fn new(data_dir: &Path, log_file: &str) -> Self {
        Self {
            log_path: data_dir.join(log_file),
        }
    }

    /// Create a sink from an `AppConfig` audit section, falling back to
    /// the default filename if the section is missing.
    pub fn from_config(
        data_dir: &Path,
        audit_section: Option<&crate::config::app_config::AuditSection>,
    ) -> Self {
        let log_file = audit_section
            .map(|a| a.log_file.as_str())
            .unwrap_or("audit.log");
        Self::new(data_dir, log_file)
    }

    /// Whether auditing is enabled in the configuration. Absent section
    /// means enabled.
    pub fn is_enabled(audit_section: Option<&crate::config::app_config::AuditSection>) -> bool {
        audit_section.map(|a| a.enabled).unwrap_or(true)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    fn read_all(&self) -> Result<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.log_path).map_err(|e| GuardError::AuditError {
            detail: format!("Cannot read audit log: {e}"),
        })?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| GuardError::AuditError {
                detail: format!("Error reading audit log line {}: {e}", line_num + 1),
            })?;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            let entry: AuditEntry =
                serde_json::from_str(trimmed).map_err(|e| GuardError::AuditError {
                    detail: format!("Malformed audit entry at line {}: {e}", line_num + 1),
                })?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

impl AuditSink for JsonAuditLog {
    fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry> {
        let stamped = entry.stamped(Utc::now());

        let line = serde_json::to_string(&stamped).map_err(|e| GuardError::AuditError {
            detail: format!("Failed to serialize audit entry: {e}"),
        })?;

        if let Some(parent) = self.log_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| GuardError::AuditError {
                detail: format!("Cannot open audit log at {}: {e}", self.log_path.display()),
            })?;

        writeln!(file, "{line}").map_err(|e| GuardError::AuditError {
            detail: format!("Failed to write audit entry: {e}"),
        })?;

        Ok(stamped)
    }

    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
        let mut entries = self.read_all()?;

        if let Some(actor_id) = &query.actor_id {
            entries.retain(|e| &e.actor_id == actor_id);
        }
        if let Some(category) = query.category {
            entries.retain(|e| e.category == category);
        }
        if let Some(severity) = query.severity {
            entries.retain(|e| e.severity == severity);
        }

        // Newest first; occurred_at is the authoritative ordering key.
        entries.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        entries.truncate(query.limit.unwrap_or(DEFAULT_QUERY_LIMIT));

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::audit_entry::{
        action_severity, categorize_action, ActionCategory, Severity,
    };
    use tempfile::TempDir;

    fn draft(actor_id: &str, action: &str) -> NewAuditEntry {
        NewAuditEntry {
            actor_id: actor_id.to_string(),
            actor_email: format!("{actor_id}@test.com"),
            actor_name: actor_id.to_string(),
            action: action.to_string(),
            category: categorize_action(action),
            severity: action_severity(action),
            details: serde_json::json!({}),
            client_ip: "unknown".into(),
            user_agent: "roamguard/test".into(),
            success: true,
        }
    }

    #[test]
    fn append_stamps_and_round_trips() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");

        let before = Utc::now();
        let entry = log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();
        assert!(entry.occurred_at >= before);

        let results = log.query(&AuditQuery::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].actor_id, "alice");
        assert_eq!(results[0].category, ActionCategory::Authentication);
    }

    #[test]
    fn entries_come_back_newest_first() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");

        log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();
        log.append(draft("bob", "USER_LOGOUT")).unwrap();
        log.append(draft("carol", "ROLE_UPDATED")).unwrap();

        let results = log.query(&AuditQuery::default()).unwrap();
        assert_eq!(results.len(), 3);
        for pair in results.windows(2) {
            assert!(pair[0].occurred_at >= pair[1].occurred_at);
        }
        assert_eq!(results[0].actor_id, "carol");
    }

    #[test]
    fn filter_by_actor_id() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");

        log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();
        log.append(draft("bob", "USER_LOGIN_SUCCESS")).unwrap();
        log.append(draft("alice", "USER_LOGOUT")).unwrap();

        let results = log
            .query(&AuditQuery {
                actor_id: Some("alice".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|e| e.actor_id == "alice"));
    }

    #[test]
    fn filter_by_category_and_severity() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");

        log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();
        log.append(draft("alice", "ROLE_UPDATED")).unwrap();
        log.append(draft("alice", "USER_PROFILE_UPDATED")).unwrap();

        let role_entries = log
            .query(&AuditQuery {
                category: Some(ActionCategory::RoleManagement),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(role_entries.len(), 1);
        assert_eq!(role_entries[0].action, "ROLE_UPDATED");

        let high = log
            .query(&AuditQuery {
                severity: Some(Severity::High),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(high.len(), 1);

        let medium = log
            .query(&AuditQuery {
                severity: Some(Severity::Medium),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(medium[0].action, "USER_PROFILE_UPDATED");
    }

    #[test]
    fn limit_caps_the_result_and_defaults_to_100() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");

        for i in 0..105 {
            log.append(draft(&format!("u{i}"), "USER_LOGIN_SUCCESS"))
                .unwrap();
        }

        assert_eq!(log.query(&AuditQuery::default()).unwrap().len(), 100);
        let limited = log
            .query(&AuditQuery {
                limit: Some(5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 5);
    }

    #[test]
    fn query_is_restartable() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");
        log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();

        let q = AuditQuery::default();
        assert_eq!(log.query(&q).unwrap().len(), 1);

        // Same query re-reads current state.
        log.append(draft("bob", "USER_LOGOUT")).unwrap();
        assert_eq!(log.query(&q).unwrap().len(), 2);
    }

    #[test]
    fn missing_log_file_queries_empty() {
        let log = JsonAuditLog::new(Path::new("/nonexistent"), "audit.log");
        assert!(log.query(&AuditQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn blank_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let log = JsonAuditLog::new(tmp.path(), "audit.log");
        log.append(draft("alice", "USER_LOGIN_SUCCESS")).unwrap();

        let mut content = std::fs::read_to_string(log.path()).unwrap();
        content.push_str("\n\n");
        std::fs::write(log.path(), content).unwrap();

        assert_eq!(log.query(&AuditQuery::default()).unwrap().len(), 1);
    }

    #[test]
    fn is_enabled_defaults_to_true() {
        assert!(JsonAuditLog::is_enabled(None));
    }

    #[test]
    fn is_enabled_respects_config() {
        use crate::config::app_config::AuditSection;

        let enabled = AuditSection {
            enabled: true,
            log_file: "audit.log".to_string(),
        };
        let disabled = AuditSection {
            enabled: false,
            log_file: "audit.log".to_string(),
        };

        assert!(JsonAuditLog::is_enabled(Some(&enabled)));
        assert!(!JsonAuditLog::is_enabled(Some(&disabled)));
    }
}
