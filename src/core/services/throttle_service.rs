use chrono::{Duration, Utc};

use crate::core::errors::Result;
use crate::core::models::lockout_record::{
    AttemptOutcome, LockStatus, LockoutInfo, LockoutRecord,
};
use crate::core::traits::kv_store::KeyValueStore;

/// Attempt limit and lock length. The defaults (3 attempts, 2 minutes)
/// are the product's normative values; config may override them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockoutPolicy {
    pub max_attempts: u32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            lockout_duration: Duration::seconds(120),
        }
    }
}

/// Decides whether an authentication attempt may proceed and keeps the
/// per-account failure counters, persisted through a `KeyValueStore`.
///
/// Throttling is keyed purely by the submitted account identifier and
/// lives in client-local storage. That is a deliberate trade-off: the
/// user can wipe the store to reset the counter, and two machines count
/// independently. The identity provider still verifies every credential;
/// this layer only slows down online guessing from this client.
pub struct LoginThrottle<K: KeyValueStore> {
    store: K,
    policy: LockoutPolicy,
}

impl<K: KeyValueStore> LoginThrottle<K> {
    pub fn new(store: K) -> Self {
        Self {
            store,
            policy: LockoutPolicy::default(),
        }
    }

    pub fn with_policy(store: K, policy: LockoutPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    fn key(account_id: &str) -> String {
        format!("lockout_{account_id}")
    }

    fn load(&self, account_id: &str) -> Result<Option<LockoutRecord>> {
        let Some(raw) = self.store.get(&Self::key(account_id))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                // Unreadable counter data fails open: treat as no record.
                tracing::warn!(account_id, %err, "discarding unparseable lockout record");
                Ok(None)
            }
        }
    }

    fn save(&self, record: &LockoutRecord) -> Result<()> {
        let raw = serde_json::to_string(record).expect("lockout record serializes");
        self.store.set(&Self::key(&record.account_id), &raw)
    }

    fn clear(&self, account_id: &str) -> Result<()> {
        self.store.remove(&Self::key(account_id))
    }

    /// May this account attempt to authenticate right now?
    ///
    /// A lock whose expiry has passed is removed as a side effect of the
    /// read (lazy expiry); a record that only carries an attempt count is
    /// left untouched so the counter survives.
    pub fn is_locked(&self, account_id: &str) -> Result<LockStatus> {
        let Some(record) = self.load(account_id)? else {
            return Ok(LockStatus::unlocked());
        };

        let now = Utc::now();
        match record.locked_until {
            Some(until) if now < until => {
                let remaining_ms = (until - now).num_milliseconds();
                Ok(LockStatus {
                    locked: true,
                    remaining_seconds: Some((remaining_ms + 999) / 1000),
                    unlock_at: Some(until),
                })
            }
            Some(_) => {
                // Lock has expired: clean up and report unlocked.
                self.clear(account_id)?;
                Ok(LockStatus::unlocked())
            }
            None => Ok(LockStatus::unlocked()),
        }
    }

    /// Record one confirmed credential failure for a registered account.
    ///
    /// Callers must have already verified that the account exists; unknown
    /// identifiers must never reach this method, or probing would reveal
    /// lockout state for registered emails.
    pub fn record_failure(&self, account_id: &str) -> Result<AttemptOutcome> {
        let now = Utc::now();
        let mut record = self.load(account_id)?.unwrap_or(LockoutRecord {
            account_id: account_id.to_string(),
            attempts: 0,
            first_attempt_at: now,
            last_attempt_at: now,
            locked_until: None,
        });

        record.attempts += 1;
        record.last_attempt_at = now;

        if record.attempts >= self.policy.max_attempts {
            let until = now + self.policy.lockout_duration;
            record.locked_until = Some(until);
            self.save(&record)?;
            return Ok(AttemptOutcome {
                locked: true,
                remaining_seconds: Some(self.policy.lockout_duration.num_seconds()),
                remaining_attempts: None,
            });
        }

        self.save(&record)?;
        Ok(AttemptOutcome {
            locked: false,
            remaining_seconds: None,
            remaining_attempts: Some(self.policy.max_attempts - record.attempts),
        })
    }

    /// Forget everything about this account after a successful login.
    pub fn record_success(&self, account_id: &str) -> Result<()> {
        self.clear(account_id)
    }

    /// Attempts left before lockout: the full allowance if no record,
    /// zero while locked, otherwise the allowance minus failures so far.
    pub fn remaining_attempts(&self, account_id: &str) -> Result<u32> {
        let Some(record) = self.load(account_id)? else {
            return Ok(self.policy.max_attempts);
        };
        if self.is_locked(account_id)?.locked {
            return Ok(0);
        }
        Ok(self.policy.max_attempts.saturating_sub(record.attempts))
    }

    /// Admin snapshot of an account's lockout state.
    pub fn lockout_info(&self, account_id: &str) -> Result<LockoutInfo> {
        let Some(record) = self.load(account_id)? else {
            return Ok(LockoutInfo {
                attempts: 0,
                is_locked: false,
                remaining_attempts: self.policy.max_attempts,
                locked_until: None,
                first_attempt_at: None,
                last_attempt_at: None,
            });
        };

        let status = self.is_locked(account_id)?;
        Ok(LockoutInfo {
            attempts: record.attempts,
            is_locked: status.locked,
            remaining_attempts: if status.locked {
                0
            } else {
                self.policy.max_attempts.saturating_sub(record.attempts)
            },
            locked_until: record.locked_until,
            first_attempt_at: Some(record.first_attempt_at),
            last_attempt_at: Some(record.last_attempt_at),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::stores::memory_kv_store::MemoryKvStore;

    fn throttle() -> LoginThrottle<MemoryKvStore> {
        LoginThrottle::new(MemoryKvStore::new())
    }

    #[test]
    fn fresh_account_is_unlocked_with_full_allowance() {
        let t = throttle();
        let status = t.is_locked("a@x.com").unwrap();
        assert!(!status.locked);
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 3);
    }

    #[test]
    fn failures_count_down_then_lock() {
        let t = throttle();

        let first = t.record_failure("a@x.com").unwrap();
        assert!(!first.locked);
        assert_eq!(first.remaining_attempts, Some(2));

        let second = t.record_failure("a@x.com").unwrap();
        assert_eq!(second.remaining_attempts, Some(1));

        let third = t.record_failure("a@x.com").unwrap();
        assert!(third.locked);
        assert_eq!(third.remaining_seconds, Some(120));

        let status = t.is_locked("a@x.com").unwrap();
        assert!(status.locked);
        let remaining = status.remaining_seconds.unwrap();
        assert!((119..=120).contains(&remaining), "remaining {remaining}");
        assert!(status.unlock_at.is_some());
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 0);
    }

    #[test]
    fn success_resets_at_any_attempt_count() {
        let t = throttle();
        t.record_failure("a@x.com").unwrap();
        t.record_failure("a@x.com").unwrap();

        t.record_success("a@x.com").unwrap();
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 3);
        assert!(!t.is_locked("a@x.com").unwrap().locked);
    }

    #[test]
    fn expired_lock_is_cleared_lazily_on_read() {
        let store = MemoryKvStore::new();
        let expired = LockoutRecord {
            account_id: "a@x.com".into(),
            attempts: 3,
            first_attempt_at: Utc::now() - Duration::seconds(600),
            last_attempt_at: Utc::now() - Duration::seconds(400),
            locked_until: Some(Utc::now() - Duration::seconds(10)),
        };
        store
            .set("lockout_a@x.com", &serde_json::to_string(&expired).unwrap())
            .unwrap();

        let t = LoginThrottle::new(store);
        assert!(!t.is_locked("a@x.com").unwrap().locked);
        // Record is fully reset after the expiry was observed.
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 3);
    }

    #[test]
    fn unlocked_record_keeps_its_attempt_count() {
        let t = throttle();
        t.record_failure("a@x.com").unwrap();

        // A plain status read must not wipe the counter.
        assert!(!t.is_locked("a@x.com").unwrap().locked);
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 2);
    }

    #[test]
    fn accounts_are_throttled_independently() {
        let t = throttle();
        t.record_failure("a@x.com").unwrap();
        t.record_failure("a@x.com").unwrap();
        t.record_failure("a@x.com").unwrap();

        assert!(t.is_locked("a@x.com").unwrap().locked);
        assert!(!t.is_locked("b@x.com").unwrap().locked);
        assert_eq!(t.remaining_attempts("b@x.com").unwrap(), 3);
    }

    #[test]
    fn account_ids_are_case_sensitive_as_typed() {
        let t = throttle();
        t.record_failure("A@x.com").unwrap();
        assert_eq!(t.remaining_attempts("A@x.com").unwrap(), 2);
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 3);
    }

    #[test]
    fn custom_policy_changes_the_threshold() {
        let policy = LockoutPolicy {
            max_attempts: 5,
            lockout_duration: Duration::seconds(30),
        };
        let t = LoginThrottle::with_policy(MemoryKvStore::new(), policy);

        for _ in 0..4 {
            assert!(!t.record_failure("a@x.com").unwrap().locked);
        }
        let fifth = t.record_failure("a@x.com").unwrap();
        assert!(fifth.locked);
        assert_eq!(fifth.remaining_seconds, Some(30));
    }

    #[test]
    fn garbage_in_the_store_reads_as_no_record() {
        let store = MemoryKvStore::new();
        store.set("lockout_a@x.com", "{not json").unwrap();

        let t = LoginThrottle::new(store);
        assert!(!t.is_locked("a@x.com").unwrap().locked);
        assert_eq!(t.remaining_attempts("a@x.com").unwrap(), 3);
    }

    #[test]
    fn lockout_info_reports_admin_view() {
        let t = throttle();
        let info = t.lockout_info("a@x.com").unwrap();
        assert_eq!(info.attempts, 0);
        assert_eq!(info.remaining_attempts, 3);
        assert!(!info.is_locked);

        t.record_failure("a@x.com").unwrap();
        t.record_failure("a@x.com").unwrap();
        let info = t.lockout_info("a@x.com").unwrap();
        assert_eq!(info.attempts, 2);
        assert_eq!(info.remaining_attempts, 1);
        assert!(!info.is_locked);
        assert!(info.first_attempt_at.is_some());

        t.record_failure("a@x.com").unwrap();
        let info = t.lockout_info("a@x.com").unwrap();
        assert!(info.is_locked);
        assert_eq!(info.remaining_attempts, 0);
        assert!(info.locked_until.is_some());
    }
}
