use crate::core::errors::Result;

/// Classified failure modes surfaced by the identity provider.
///
/// The auth workflow branches on these: `UserNotFound` must never reach
/// the throttle engine, `InvalidCredential` always does, and everything
/// else counts as a failed attempt too (see the sharp-edge note in
/// DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    InvalidCredential,
    UserNotFound,
    EmailAlreadyInUse,
    WeakPassword,
    ExpiredActionCode,
    InvalidActionCode,
    Unavailable,
}

impl std::fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProviderErrorKind::InvalidCredential => "invalid-credential",
            ProviderErrorKind::UserNotFound => "user-not-found",
            ProviderErrorKind::EmailAlreadyInUse => "email-already-in-use",
            ProviderErrorKind::WeakPassword => "weak-password",
            ProviderErrorKind::ExpiredActionCode => "expired-action-code",
            ProviderErrorKind::InvalidActionCode => "invalid-action-code",
            ProviderErrorKind::Unavailable => "unavailable",
        };
        f.write_str(s)
    }
}

/// Account data the provider reports after sign-up or sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderUser {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// Port over the external identity provider.
///
/// Credential verification, token issuance and email delivery all happen
/// on the provider's side; this crate only consumes the success/failure
/// signals. Nothing here stores or hashes a password.
pub trait IdentityProvider: Send + Sync {
    /// Create an account from an email/password pair.
    fn create_account(&self, email: &str, password: &str) -> Result<ProviderUser>;

    /// Verify a credential pair and open a provider-side session.
    fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser>;

    /// Drop the provider-side session, if any.
    fn sign_out(&self) -> Result<()>;

    /// Re-verify the credential of the signed-in user. Destructive
    /// self-service operations require this immediately beforehand.
    fn reauthenticate(&self, email: &str, password: &str) -> Result<()>;

    /// Ask the provider to email a verification link to the signed-in user.
    fn send_verification_email(&self, uid: &str) -> Result<()>;

    /// Redeem a verification code, marking the account's email verified.
    fn apply_verification_code(&self, code: &str) -> Result<()>;

    /// Ask the provider to email a password-reset link.
    fn send_password_reset(&self, email: &str) -> Result<()>;

    /// Check a reset code and return the email it was issued for.
    fn verify_reset_code(&self, code: &str) -> Result<String>;

    /// Redeem a reset code with the replacement password.
    fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<()>;

    /// Delete the provider-side account of the signed-in user.
    fn delete_account(&self, uid: &str) -> Result<()>;
}
