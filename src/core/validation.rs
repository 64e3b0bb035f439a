use std::sync::OnceLock;

use regex::Regex;

use crate::core::errors::{GuardError, Result};

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
    })
}

/// Check the basic shape of an email address before any provider call.
pub fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() || !email_re().is_match(email) {
        return Err(GuardError::InvalidEmail {
            email: email.to_string(),
        });
    }
    Ok(())
}

/// List the password rules a candidate fails to meet, in display order.
/// Empty means the password is acceptable.
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();

    if password.len() < 6 {
        issues.push("At least 6 characters");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("At least 1 uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("At least 1 lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("At least 1 number");
    }
    if !password.chars().any(|c| r#"!@#$%^&*(),.?":{}|<>"#.contains(c)) {
        issues.push("At least 1 special character (!@#$%^&*...)");
    }

    issues
}

/// Reject a password that fails any rule, with all failures listed.
pub fn validate_password(password: &str) -> Result<()> {
    let issues = password_issues(password);
    if issues.is_empty() {
        return Ok(());
    }
    let requirements = issues
        .iter()
        .map(|i| format!("    → {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    Err(GuardError::WeakPassword { requirements })
}

/// A username must be non-empty after trimming.
pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(GuardError::UsernameRequired);
    }
    Ok(())
}
