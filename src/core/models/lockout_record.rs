use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Failed-attempt counter for one account identifier.
///
/// Stored as JSON under the key `lockout_<accountId>`. The record exists
/// only between the first failed attempt and the next successful login
/// (or observed lock expiry); absence means a clean slate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockoutRecord {
    pub account_id: String,
    pub attempts: u32,
    pub first_attempt_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
    /// Present iff the account reached the attempt limit. A value in the
    /// past is treated as unlocked and cleaned up lazily on the next read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
}

/// Answer to "may this account attempt to authenticate right now?".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockStatus {
    pub locked: bool,
    /// Whole seconds until the lock lifts, rounded up. Only while locked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_at: Option<DateTime<Utc>>,
}

impl LockStatus {
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            remaining_seconds: None,
            unlock_at: None,
        }
    }
}

/// Result of recording one failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptOutcome {
    pub locked: bool,
    /// Seconds of lockout just imposed. Only when `locked`.
    pub remaining_seconds: Option<i64>,
    /// Attempts left before lockout. Only when not `locked`.
    pub remaining_attempts: Option<u32>,
}

/// Admin-facing snapshot of an account's lockout state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockoutInfo {
    pub attempts: u32,
    pub is_locked: bool,
    pub remaining_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_until: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_attempt_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
}
