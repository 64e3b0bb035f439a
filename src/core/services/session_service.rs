use chrono::{Duration, Utc};

use crate::core::errors::Result;
use crate::core::models::session_record::{
    InvalidReason, SessionRecord, SessionRemaining, SessionValidity,
};
use crate::core::traits::kv_store::KeyValueStore;

/// Key under which the single live session record is stored.
const SESSION_KEY: &str = "session_data";

/// Session lifetime rules. Defaults: 5 hour absolute cap, 15 minute
/// inactivity window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionPolicy {
    pub absolute_timeout: Duration,
    pub inactivity_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            absolute_timeout: Duration::hours(5),
            inactivity_timeout: Duration::minutes(15),
        }
    }
}

/// Validates the live session against both timeouts and the device
/// fingerprint captured at login.
///
/// State machine: NoSession → Active via `initialize`; Active → Active
/// via `touch` (resets the inactivity clock); Active → gone via
/// `terminate` or any failed `validate` (fail-closed: the record is
/// destroyed before the reason is returned). The caller is expected to
/// poll `validate` on an interval (60 s recommended) and to run the full
/// logout workflow when it fails.
pub struct SessionGuard<K: KeyValueStore> {
    store: K,
    policy: SessionPolicy,
}

impl<K: KeyValueStore> SessionGuard<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            policy: SessionPolicy::default(),
        }
    }

    pub fn with_policy(store: K, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    fn load(&self) -> Result<Option<SessionRecord>> {
        let Some(raw) = self.store.get(SESSION_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                tracing::warn!(%err, "discarding unparseable session record");
                self.store.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<()> {
        let raw = serde_json::to_string(record).expect("session record serializes");
        self.store.set(SESSION_KEY, &raw)
    }

    /// Open a fresh session for `user_id`, replacing any previous one.
    pub fn initialize(&self, user_id: &str, device_fingerprint: &str) -> Result<SessionRecord> {
        let record = SessionRecord::new(user_id, device_fingerprint);
        self.save(&record)?;
        Ok(record)
    }

    /// Reset the inactivity clock. No-op when no session exists; must
    /// stay cheap, it runs on every qualifying user interaction.
    pub fn touch(&self) -> Result<()> {
        if let Some(mut record) = self.load()? {
            record.last_activity = Utc::now();
            self.save(&record)?;
        }
        Ok(())
    }

    /// Check the session against the absolute window, the inactivity
    /// window and the current device fingerprint, in that order. Any
    /// failure destroys the record before the reason is returned.
    pub fn validate(&self, current_fingerprint: &str) -> Result<SessionValidity> {
        let Some(record) = self.load()? else {
            return Ok(SessionValidity::Invalid(InvalidReason::NoSession));
        };

        let now = Utc::now();

        if now - record.session_start > self.policy.absolute_timeout {
            self.terminate()?;
            return Ok(SessionValidity::Invalid(InvalidReason::AbsoluteTimeout));
        }

        if now - record.last_activity > self.policy.inactivity_timeout {
            self.terminate()?;
            return Ok(SessionValidity::Invalid(InvalidReason::InactivityTimeout));
        }

        if record.device_fingerprint != current_fingerprint {
            self.terminate()?;
            return Ok(SessionValidity::Invalid(InvalidReason::FingerprintMismatch));
        }

        // A passing check also counts as activity.
        let mut record = record;
        record.last_activity = now;
        self.save(&record)?;

        Ok(SessionValidity::Valid)
    }

    /// Time left on both clocks, or `None` when no session exists.
    pub fn remaining_time(&self) -> Result<Option<SessionRemaining>> {
        let Some(record) = self.load()? else {
            return Ok(None);
        };
        let now = Utc::now();
        Ok(Some(SessionRemaining {
            absolute_remaining_ms: (self.policy.absolute_timeout - (now - record.session_start))
                .num_milliseconds(),
            inactivity_remaining_ms: (self.policy.inactivity_timeout
                - (now - record.last_activity))
                .num_milliseconds(),
        }))
    }

    /// Read the live record without side effects.
    pub fn current(&self) -> Result<Option<SessionRecord>> {
        self.load()
    }

    /// Destroy the session unconditionally.
    pub fn terminate(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)
    }
}
