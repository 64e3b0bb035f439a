use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The single live session for this working directory.
///
/// Stored as JSON under the key `session_data`. At most one record exists
/// at a time; it is created on successful login and destroyed on logout,
/// on timeout detection, or on a device-fingerprint mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub session_id: String,
    pub session_start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Identity string of the client that opened the session. Compared
    /// verbatim on every validation to detect session reuse elsewhere.
    pub device_fingerprint: String,
}

impl SessionRecord {
    /// Fresh record with both clocks set to now and a new unique id.
    pub fn new(user_id: &str, device_fingerprint: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            session_id: format!("session_{}", uuid::Uuid::new_v4()),
            session_start: now,
            last_activity: now,
            device_fingerprint: device_fingerprint.to_string(),
        }
    }
}

/// Why a session failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    NoSession,
    AbsoluteTimeout,
    InactivityTimeout,
    FingerprintMismatch,
}

impl InvalidReason {
    /// Stable tag used in audit details and user-facing messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::NoSession => "NO_SESSION",
            InvalidReason::AbsoluteTimeout => "ABSOLUTE_TIMEOUT",
            InvalidReason::InactivityTimeout => "INACTIVITY_TIMEOUT",
            InvalidReason::FingerprintMismatch => "FINGERPRINT_MISMATCH",
        }
    }
}

/// Outcome of a session validity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionValidity {
    Valid,
    Invalid(InvalidReason),
}

impl SessionValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionValidity::Valid)
    }
}

/// Time left on both session clocks, for countdown display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRemaining {
    pub absolute_remaining_ms: i64,
    pub inactivity_remaining_ms: i64,
}
