use std::path::PathBuf;

/// All domain errors for Roamguard.
///
/// Expected control-flow outcomes (account locked, session expired,
/// unknown account) are modeled as structured results in the services,
/// not as variants here. This enum covers the genuinely exceptional
/// conditions: bad input, broken state files, unreachable backends.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error(
        "Roamguard is not initialized here\n\n  \
         Run 'roamguard init' to create the .roamguard/ directory."
    )]
    NotInitialized,

    #[error("Invalid configuration: {detail}")]
    InvalidConfig { detail: String },

    #[error(
        "Invalid email address: '{email}'\n\n  \
         Expected something like name@example.com."
    )]
    InvalidEmail { email: String },

    #[error(
        "Password does not meet the security requirements:\n{requirements}\n  \
         Pick a longer password mixing upper/lower case, digits and symbols."
    )]
    WeakPassword { requirements: String },

    #[error("Username is required")]
    UsernameRequired,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("State file error: {detail}")]
    StoreError { detail: String },

    #[error("Corrupt state file at {path}: {detail}")]
    CorruptState { path: PathBuf, detail: String },

    #[error("Audit log error: {detail}")]
    AuditError { detail: String },

    #[error("No account found for '{email}'")]
    ProfileNotFound { email: String },

    #[error(
        "Not signed in\n\n  \
         Run 'roamguard login <email>' first."
    )]
    NotAuthenticated,

    #[error(
        "Permission denied: this command requires the admin role\n\n  \
         Ask an administrator to run 'roamguard users role <your-email> admin'."
    )]
    AdminRequired,

    #[error(
        "Refusing to {action} your own account\n\n  \
         Another administrator has to do this for you."
    )]
    SelfAction { action: String },

    #[error("Identity provider error ({kind}): {detail}")]
    Provider {
        kind: crate::core::traits::identity::ProviderErrorKind,
        detail: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GuardError>;
