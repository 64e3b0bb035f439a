use serde_json::json;

use crate::core::errors::{GuardError, Result};
use crate::core::models::audit_entry::Actor;
use crate::core::models::session_record::{InvalidReason, SessionRecord};
use crate::core::models::user_profile::{Role, UserProfile};
use crate::core::services::audit_service::AuditService;
use crate::core::services::session_service::SessionGuard;
use crate::core::services::throttle_service::LoginThrottle;
use crate::core::traits::audit::AuditSink;
use crate::core::traits::client_info::ClientInfo;
use crate::core::traits::identity::{IdentityProvider, ProviderErrorKind};
use crate::core::traits::kv_store::KeyValueStore;
use crate::core::traits::profile_store::ProfileStore;
use crate::core::validation;

/// Result of a login attempt. Everything except `Success` is an expected
/// rejection, not an error; infrastructure failures come back as `Err`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Success {
        profile: UserProfile,
        session: SessionRecord,
    },
    /// No profile document for this email. Unknown accounts never touch
    /// the failure counter, so probing cannot reveal lockout state.
    UnknownAccount,
    /// Rejected before the provider was consulted.
    Locked { remaining_seconds: i64 },
    /// The provider rejected the credential (or errored); the failure
    /// counter moved.
    BadCredentials {
        locked: bool,
        remaining_seconds: Option<i64>,
        remaining_attempts: Option<u32>,
    },
    /// Credentials were right but the email is not verified yet. The
    /// provider session has already been torn down.
    EmailNotVerified,
}

/// Composes the throttle engine, the session guard and the audit trail
/// around the identity provider's primitives.
pub struct AuthWorkflow<P, U, TK, SK, A, C>
where
    P: IdentityProvider,
    U: ProfileStore,
    TK: KeyValueStore,
    SK: KeyValueStore,
    A: AuditSink,
    C: ClientInfo,
{
    provider: P,
    profiles: U,
    throttle: LoginThrottle<TK>,
    sessions: SessionGuard<SK>,
    audit: AuditService<A, C>,
    /// Identity string of this client, captured once and used as the
    /// session device fingerprint.
    fingerprint: String,
}

impl<P, U, TK, SK, A, C> AuthWorkflow<P, U, TK, SK, A, C>
where
    P: IdentityProvider,
    U: ProfileStore,
    TK: KeyValueStore,
    SK: KeyValueStore,
    A: AuditSink,
    C: ClientInfo,
{
    pub fn new(
        provider: P,
        profiles: U,
        throttle: LoginThrottle<TK>,
        sessions: SessionGuard<SK>,
        audit: AuditService<A, C>,
        fingerprint: String,
    ) -> Self {
        Self {
            provider,
            profiles,
            throttle,
            sessions,
            audit,
            fingerprint,
        }
    }

    pub fn throttle(&self) -> &LoginThrottle<TK> {
        &self.throttle
    }

    pub fn sessions(&self) -> &SessionGuard<SK> {
        &self.sessions
    }

    pub fn audit(&self) -> &AuditService<A, C> {
        &self.audit
    }

    pub fn profiles(&self) -> &U {
        &self.profiles
    }

    fn actor_for(profile: &UserProfile) -> Actor {
        Actor::new(&profile.user_id, &profile.email, &profile.username)
    }

    /// Short classification string for audit details.
    fn classify(err: &GuardError) -> String {
        match err {
            GuardError::Provider { kind, .. } => kind.to_string(),
            _ => "infrastructure".to_string(),
        }
    }

    /// Create an account: local validation first (no provider round-trip
    /// for malformed input), then provider sign-up, profile document with
    /// the registration defaults, and a verification email.
    pub fn register(&self, email: &str, password: &str, username: &str) -> Result<UserProfile> {
        validation::validate_email(email)?;
        validation::validate_password(password)?;
        validation::validate_username(username)?;

        match self.try_register(email, password, username) {
            Ok(profile) => {
                self.audit.record(
                    &Self::actor_for(&profile),
                    "USER_REGISTRATION_SUCCESS",
                    json!({ "email": email }),
                );
                Ok(profile)
            }
            Err(err) => {
                self.audit.record(
                    &Actor::unidentified(email),
                    "USER_REGISTRATION_FAILED",
                    json!({ "success": false, "email": email, "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    fn try_register(&self, email: &str, password: &str, username: &str) -> Result<UserProfile> {
        let user = self.provider.create_account(email, password)?;
        let profile = UserProfile::new(&user.uid, username, email);
        self.profiles.upsert(&profile)?;
        self.provider.send_verification_email(&user.uid)?;
        Ok(profile)
    }

    /// Attempt a login. Order matters and is part of the contract:
    ///
    /// 1. account existence: unknown emails short-circuit and never
    ///    reach the throttle, so probing cannot reveal lockout state;
    /// 2. lockout check: a locked account is rejected without touching
    ///    the provider;
    /// 3. provider credential check: any provider failure other than
    ///    "user not found" counts against the allowance (including
    ///    outages; see DESIGN.md);
    /// 4. on success the counter resets, unverified emails are signed
    ///    straight back out, and a session opens for everyone else.
    pub fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        validation::validate_email(email)?;

        if !self.profiles.exists_by_email(email)? {
            self.audit.record(
                &Actor::unidentified(email),
                "USER_LOGIN_FAILED",
                json!({ "success": false, "email": email, "reason": "unknown_account" }),
            );
            return Ok(LoginOutcome::UnknownAccount);
        }

        let status = self.throttle.is_locked(email)?;
        if status.locked {
            let remaining = status.remaining_seconds.unwrap_or_default();
            self.audit.record(
                &Actor::unidentified(email),
                "USER_LOGIN_FAILED",
                json!({ "success": false, "email": email, "reason": "locked",
                        "remaining_seconds": remaining }),
            );
            return Ok(LoginOutcome::Locked {
                remaining_seconds: remaining,
            });
        }

        let user = match self.provider.sign_in(email, password) {
            Ok(user) => user,
            Err(GuardError::Provider {
                kind: ProviderErrorKind::UserNotFound,
                ..
            }) => {
                // Profile document exists but the provider disagrees;
                // treat like an unknown account, no counter movement.
                self.audit.record(
                    &Actor::unidentified(email),
                    "USER_LOGIN_FAILED",
                    json!({ "success": false, "email": email, "reason": "unknown_account" }),
                );
                return Ok(LoginOutcome::UnknownAccount);
            }
            Err(err) => {
                let outcome = self.throttle.record_failure(email)?;
                self.audit.record(
                    &Actor::unidentified(email),
                    "USER_LOGIN_FAILED",
                    json!({ "success": false, "email": email,
                            "reason": Self::classify(&err),
                            "locked": outcome.locked,
                            "remaining_attempts": outcome.remaining_attempts }),
                );
                return Ok(LoginOutcome::BadCredentials {
                    locked: outcome.locked,
                    remaining_seconds: outcome.remaining_seconds,
                    remaining_attempts: outcome.remaining_attempts,
                });
            }
        };

        self.throttle.record_success(email)?;

        let profile = self
            .profiles
            .find_by_email(email)?
            .ok_or_else(|| GuardError::ProfileNotFound {
                email: email.to_string(),
            })?;

        if !user.email_verified {
            // No authenticated provider session may survive this branch.
            if let Err(err) = self.provider.sign_out() {
                tracing::warn!(%err, "sign-out after unverified login failed");
            }
            self.audit.record(
                &Self::actor_for(&profile),
                "USER_LOGIN_FAILED",
                json!({ "success": false, "email": email, "reason": "email_not_verified" }),
            );
            return Ok(LoginOutcome::EmailNotVerified);
        }

        let session = self.sessions.initialize(&user.uid, &self.fingerprint)?;

        let action = if profile.is_admin() {
            "ADMIN_LOGIN_SUCCESS"
        } else {
            "USER_LOGIN_SUCCESS"
        };
        self.audit.record(
            &Self::actor_for(&profile),
            action,
            json!({ "role": profile.role.as_str(), "session_id": session.session_id }),
        );

        Ok(LoginOutcome::Success { profile, session })
    }

    /// Explicit logout: session teardown, provider sign-out, and one
    /// audit entry no matter which step failed.
    pub fn logout(&self, actor: &Actor) -> Result<()> {
        let session_result = self.sessions.terminate();
        let provider_result = self.provider.sign_out();

        let ok = session_result.is_ok() && provider_result.is_ok();
        self.audit
            .record(actor, "USER_LOGOUT", json!({ "success": ok, "forced": false }));

        session_result?;
        provider_result
    }

    /// Forced logout after the session guard rejected the session. The
    /// record is already gone (validate is fail-closed); this completes
    /// the workflow with the provider sign-out and the audit entry.
    pub fn force_logout(&self, actor: &Actor, reason: InvalidReason) -> Result<()> {
        let session_result = self.sessions.terminate();
        let provider_result = self.provider.sign_out();

        let ok = session_result.is_ok() && provider_result.is_ok();
        self.audit.record(
            actor,
            "USER_LOGOUT",
            json!({ "success": ok, "forced": true, "reason": reason.as_str() }),
        );

        session_result?;
        provider_result
    }

    /// Change a user's role, auditing the before/after pair.
    pub fn update_role(&self, actor: &Actor, target_email: &str, new_role: Role) -> Result<UserProfile> {
        let Some(target) = self.profiles.find_by_email(target_email)? else {
            self.audit.record(
                actor,
                "ROLE_UPDATE_FAILED",
                json!({ "success": false, "target_email": target_email,
                        "error": "target_not_found" }),
            );
            return Err(GuardError::ProfileNotFound {
                email: target_email.to_string(),
            });
        };

        match self.profiles.set_role(&target.user_id, new_role) {
            Ok(previous) => {
                self.audit.record(
                    actor,
                    "ROLE_UPDATED",
                    json!({ "target_user_id": target.user_id, "target_email": target.email,
                            "old_role": previous.role.as_str(), "new_role": new_role.as_str() }),
                );
                self.profiles.get(&target.user_id)?.ok_or_else(|| {
                    GuardError::ProfileNotFound {
                        email: target_email.to_string(),
                    }
                })
            }
            Err(err) => {
                self.audit.record(
                    actor,
                    "ROLE_UPDATE_FAILED",
                    json!({ "success": false, "target_email": target_email,
                            "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Remove a user's profile document, auditing the deleted identity.
    pub fn delete_user(&self, actor: &Actor, target_email: &str) -> Result<UserProfile> {
        let Some(target) = self.profiles.find_by_email(target_email)? else {
            self.audit.record(
                actor,
                "USER_DELETE_FAILED",
                json!({ "success": false, "target_email": target_email,
                        "error": "target_not_found" }),
            );
            return Err(GuardError::ProfileNotFound {
                email: target_email.to_string(),
            });
        };

        match self.profiles.delete(&target.user_id) {
            Ok(deleted) => {
                self.audit.record(
                    actor,
                    "USER_DELETED",
                    json!({ "target_user_id": deleted.user_id, "target_email": deleted.email,
                            "target_username": deleted.username,
                            "target_role": deleted.role.as_str() }),
                );
                Ok(deleted)
            }
            Err(err) => {
                self.audit.record(
                    actor,
                    "USER_DELETE_FAILED",
                    json!({ "success": false, "target_email": target_email,
                            "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Self-service account deletion: re-authenticate, remove the
    /// provider account and the profile document, end the session.
    /// The audit entry is the last trace of the account.
    pub fn delete_own_account(&self, actor: &Actor, password: &str) -> Result<()> {
        let result = self
            .provider
            .reauthenticate(&actor.email, password)
            .and_then(|()| self.provider.delete_account(&actor.id))
            .and_then(|()| self.profiles.delete(&actor.id).map(|_| ()))
            .and_then(|()| self.sessions.terminate());

        match result {
            Ok(()) => {
                self.audit.record(
                    actor,
                    "USER_ACCOUNT_DELETE",
                    json!({ "email": actor.email }),
                );
                Ok(())
            }
            Err(err) => {
                self.audit.record(
                    actor,
                    "USER_ACCOUNT_DELETE_FAILED",
                    json!({ "success": false, "email": actor.email,
                            "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Ask the provider to send a reset link. The requester is not
    /// signed in, so the audit actor is the submitted address.
    pub fn request_password_reset(&self, email: &str) -> Result<()> {
        validation::validate_email(email)?;

        match self.provider.send_password_reset(email) {
            Ok(()) => {
                self.audit.record(
                    &Actor::unidentified(email),
                    "PASSWORD_RESET_REQUESTED",
                    json!({ "email": email }),
                );
                Ok(())
            }
            Err(err) => {
                self.audit.record(
                    &Actor::unidentified(email),
                    "PASSWORD_RESET_REQUEST_FAILED",
                    json!({ "success": false, "email": email, "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Redeem a reset code with a new password. The code is checked
    /// first so an expired link fails before the password is sent.
    pub fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<String> {
        validation::validate_password(new_password)?;

        let result = self
            .provider
            .verify_reset_code(code)
            .and_then(|email| {
                self.provider.confirm_password_reset(code, new_password)?;
                Ok(email)
            });

        match result {
            Ok(email) => {
                self.audit.record(
                    &Actor::unidentified(&email),
                    "PASSWORD_RESET_COMPLETED",
                    json!({ "email": email }),
                );
                Ok(email)
            }
            Err(err) => {
                self.audit.record(
                    &Actor::unidentified("unknown"),
                    "PASSWORD_RESET_FAILED",
                    json!({ "success": false, "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Redeem an email-verification code and flip the profile flag.
    pub fn confirm_email_verification(&self, code: &str, email: &str) -> Result<()> {
        match self.provider.apply_verification_code(code) {
            Ok(()) => {
                let actor = match self.profiles.find_by_email(email)? {
                    Some(profile) => {
                        self.profiles.set_email_verified(&profile.user_id, true)?;
                        Self::actor_for(&profile)
                    }
                    None => Actor::unidentified(email),
                };
                self.audit.record(
                    &actor,
                    "EMAIL_VERIFICATION_COMPLETED",
                    json!({ "email": email }),
                );
                Ok(())
            }
            Err(err) => {
                self.audit.record(
                    &Actor::unidentified(email),
                    "EMAIL_VERIFICATION_FAILED",
                    json!({ "success": false, "email": email, "error": Self::classify(&err) }),
                );
                Err(err)
            }
        }
    }

    /// Role read used by the CLI's admin gate.
    pub fn check_if_admin(&self, user_id: &str) -> Result<bool> {
        Ok(self
            .profiles
            .get(user_id)?
            .map(|p| p.is_admin())
            .unwrap_or(false))
    }
}
