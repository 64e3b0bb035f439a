use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Coarse grouping of audit actions for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    UserManagement,
    Authentication,
    Deletion,
    RoleManagement,
    AccessControl,
    Settings,
    General,
}

impl ActionCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionCategory::UserManagement => "user_management",
            ActionCategory::Authentication => "authentication",
            ActionCategory::Deletion => "deletion",
            ActionCategory::RoleManagement => "role_management",
            ActionCategory::AccessControl => "access_control",
            ActionCategory::Settings => "settings",
            ActionCategory::General => "general",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user_management" => Some(ActionCategory::UserManagement),
            "authentication" => Some(ActionCategory::Authentication),
            "deletion" => Some(ActionCategory::Deletion),
            "role_management" => Some(ActionCategory::RoleManagement),
            "access_control" => Some(ActionCategory::AccessControl),
            "settings" => Some(ActionCategory::Settings),
            "general" => Some(ActionCategory::General),
            _ => None,
        }
    }
}

/// How much attention an entry deserves in the admin viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }
}

/// Ordered category rules: first pattern that prefixes or appears inside
/// the action tag wins. Order is part of the contract: USER_LOGIN must
/// match before the bare LOGIN_ rule, USER_DELETE before DELETE_.
const CATEGORY_RULES: &[(&str, ActionCategory)] = &[
    ("USER_REGISTRATION", ActionCategory::UserManagement),
    ("USER_LOGIN", ActionCategory::Authentication),
    ("USER_LOGOUT", ActionCategory::Authentication),
    ("USER_ACCOUNT_DELETE", ActionCategory::Deletion),
    ("USER_PROFILE", ActionCategory::UserManagement),
    ("USER_DELETE", ActionCategory::Deletion),
    ("ROLE_", ActionCategory::RoleManagement),
    ("DELETE_", ActionCategory::Deletion),
    ("LOGIN_", ActionCategory::Authentication),
    ("ADMIN_LOGIN", ActionCategory::Authentication),
    ("PASSWORD_RESET", ActionCategory::Authentication),
    ("EMAIL_VERIF", ActionCategory::Authentication),
    ("ACCESS_", ActionCategory::AccessControl),
    ("SETTINGS_", ActionCategory::Settings),
];

/// Keywords that force high severity, checked before the medium set.
const HIGH_SEVERITY_KEYWORDS: &[&str] = &["DELETE", "ROLE_UPDATED", "PERMISSION", "ADMIN_LOGIN"];

const MEDIUM_SEVERITY_KEYWORDS: &[&str] =
    &["UPDATE", "CREATE", "MODIFY", "PASSWORD_RESET", "ROLE_UPDATE"];

/// Derive the category of an action tag from the fixed rule table.
pub fn categorize_action(action: &str) -> ActionCategory {
    for (pattern, category) in CATEGORY_RULES {
        if action.starts_with(pattern) || action.contains(pattern) {
            return *category;
        }
    }
    ActionCategory::General
}

/// Derive the severity of an action tag; high overrides medium overrides low.
pub fn action_severity(action: &str) -> Severity {
    if HIGH_SEVERITY_KEYWORDS.iter().any(|k| action.contains(k)) {
        return Severity::High;
    }
    if MEDIUM_SEVERITY_KEYWORDS.iter().any(|k| action.contains(k)) {
        return Severity::Medium;
    }
    Severity::Low
}

/// Who performed an audited action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub email: String,
    pub display_name: String,
}

impl Actor {
    pub fn new(id: &str, email: &str, display_name: &str) -> Self {
        Self {
            id: id.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
        }
    }

    /// Stand-in actor for workflows that fail before any identity exists,
    /// e.g. a rejected registration. Keeps the one-entry-per-call rule.
    pub fn unidentified(email: &str) -> Self {
        Self {
            id: "unknown".to_string(),
            email: email.to_string(),
            display_name: "Unknown".to_string(),
        }
    }
}

/// A security event about to be appended. The sink assigns `occurred_at`
/// with its own clock, so drafts carry everything except the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub actor_id: String,
    pub actor_email: String,
    pub actor_name: String,
    pub action: String,
    pub category: ActionCategory,
    pub severity: Severity,
    pub details: Value,
    pub client_ip: String,
    pub user_agent: String,
    pub success: bool,
}

/// One immutable line of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor_id: String,
    pub actor_email: String,
    pub actor_name: String,
    pub action: String,
    pub category: ActionCategory,
    pub severity: Severity,
    pub details: Value,
    /// Assigned by the audit store at append time; authoritative ordering key.
    pub occurred_at: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
    pub success: bool,
}

impl NewAuditEntry {
    pub fn stamped(self, occurred_at: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            actor_id: self.actor_id,
            actor_email: self.actor_email,
            actor_name: self.actor_name,
            action: self.action,
            category: self.category,
            severity: self.severity,
            details: self.details,
            occurred_at,
            client_ip: self.client_ip,
            user_agent: self.user_agent,
            success: self.success,
        }
    }
}

/// Filters for reading the trail. Re-issuing the same query re-reads
/// current state; this is not a live subscription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditQuery {
    pub actor_id: Option<String>,
    pub category: Option<ActionCategory>,
    pub severity: Option<Severity>,
    pub limit: Option<usize>,
}

/// Default page size when no limit is given.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_actions_are_authentication() {
        assert_eq!(
            categorize_action("USER_LOGIN_SUCCESS"),
            ActionCategory::Authentication
        );
        assert_eq!(
            categorize_action("USER_LOGIN_FAILED"),
            ActionCategory::Authentication
        );
        assert_eq!(
            categorize_action("ADMIN_LOGIN_SUCCESS"),
            ActionCategory::Authentication
        );
        assert_eq!(categorize_action("USER_LOGOUT"), ActionCategory::Authentication);
    }

    #[test]
    fn registration_and_profile_are_user_management() {
        assert_eq!(
            categorize_action("USER_REGISTRATION_SUCCESS"),
            ActionCategory::UserManagement
        );
        assert_eq!(
            categorize_action("USER_PROFILE_UPDATED"),
            ActionCategory::UserManagement
        );
    }

    #[test]
    fn delete_flavored_actions_are_deletion() {
        assert_eq!(categorize_action("USER_DELETED"), ActionCategory::Deletion);
        assert_eq!(
            categorize_action("USER_ACCOUNT_DELETE"),
            ActionCategory::Deletion
        );
        assert_eq!(categorize_action("DELETE_PLAN"), ActionCategory::Deletion);
    }

    #[test]
    fn role_access_settings_prefixes() {
        assert_eq!(categorize_action("ROLE_UPDATED"), ActionCategory::RoleManagement);
        assert_eq!(categorize_action("ACCESS_DENIED"), ActionCategory::AccessControl);
        assert_eq!(categorize_action("SETTINGS_INIT"), ActionCategory::Settings);
    }

    #[test]
    fn reset_and_verification_are_authentication() {
        assert_eq!(
            categorize_action("PASSWORD_RESET_REQUESTED"),
            ActionCategory::Authentication
        );
        assert_eq!(
            categorize_action("EMAIL_VERIFICATION_COMPLETED"),
            ActionCategory::Authentication
        );
    }

    #[test]
    fn unmatched_actions_fall_back_to_general() {
        assert_eq!(categorize_action("SOMETHING_ELSE"), ActionCategory::General);
        assert_eq!(categorize_action(""), ActionCategory::General);
    }

    #[test]
    fn rule_order_puts_user_login_before_bare_login() {
        // Would be Authentication either way, but via the USER_LOGIN rule,
        // which matters for USER_DELETE vs DELETE_ below.
        assert_eq!(
            categorize_action("USER_DELETE_REQUESTED"),
            ActionCategory::Deletion
        );
    }

    #[test]
    fn severity_high_keywords_win() {
        assert_eq!(action_severity("ROLE_UPDATED"), Severity::High);
        assert_eq!(action_severity("USER_DELETED"), Severity::High);
        assert_eq!(action_severity("ADMIN_LOGIN_SUCCESS"), Severity::High);
        assert_eq!(action_severity("PERMISSION_CHANGED"), Severity::High);
    }

    #[test]
    fn severity_medium_keywords() {
        assert_eq!(action_severity("USER_PROFILE_UPDATED"), Severity::Medium);
        assert_eq!(action_severity("PASSWORD_RESET_REQUESTED"), Severity::Medium);
        assert_eq!(action_severity("PLAN_CREATED"), Severity::Medium);
    }

    #[test]
    fn severity_defaults_to_low() {
        assert_eq!(action_severity("USER_LOGIN_SUCCESS"), Severity::Low);
        assert_eq!(action_severity("USER_LOGOUT"), Severity::Low);
        assert_eq!(action_severity("USER_REGISTRATION_SUCCESS"), Severity::Low);
    }

    #[test]
    fn classification_pairs_for_common_actions() {
        assert_eq!(categorize_action("ROLE_UPDATED"), ActionCategory::RoleManagement);
        assert_eq!(action_severity("ROLE_UPDATED"), Severity::High);
        assert_eq!(
            categorize_action("USER_LOGIN_SUCCESS"),
            ActionCategory::Authentication
        );
        assert_eq!(action_severity("USER_LOGIN_SUCCESS"), Severity::Low);
        assert_eq!(
            categorize_action("USER_PROFILE_UPDATED"),
            ActionCategory::UserManagement
        );
        assert_eq!(action_severity("USER_PROFILE_UPDATED"), Severity::Medium);
    }

    #[test]
    fn category_round_trips_through_strings() {
        for c in [
            ActionCategory::UserManagement,
            ActionCategory::Authentication,
            ActionCategory::Deletion,
            ActionCategory::RoleManagement,
            ActionCategory::AccessControl,
            ActionCategory::Settings,
            ActionCategory::General,
        ] {
            assert_eq!(ActionCategory::parse(c.as_str()), Some(c));
        }
        assert_eq!(ActionCategory::parse("nope"), None);
    }

    #[test]
    fn severity_round_trips_through_strings() {
        for s in [Severity::High, Severity::Medium, Severity::Low] {
            assert_eq!(Severity::parse(s.as_str()), Some(s));
        }
        assert_eq!(Severity::parse("critical"), None);
    }

    #[test]
    fn stamping_preserves_draft_fields() {
        let draft = NewAuditEntry {
            actor_id: "u1".into(),
            actor_email: "a@x.com".into(),
            actor_name: "alice".into(),
            action: "USER_LOGIN_SUCCESS".into(),
            category: categorize_action("USER_LOGIN_SUCCESS"),
            severity: action_severity("USER_LOGIN_SUCCESS"),
            details: serde_json::json!({"method": "password"}),
            client_ip: "unknown".into(),
            user_agent: "test".into(),
            success: true,
        };
        let at = Utc::now();
        let entry = draft.clone().stamped(at);
        assert_eq!(entry.occurred_at, at);
        assert_eq!(entry.action, draft.action);
        assert_eq!(entry.details, draft.details);
    }
}
