use crate::core::errors::Result;
use crate::core::models::user_profile::{Role, UserProfile};

/// Port for the user-profile document collection.
///
/// Backed by a document database in production and a JSON file in the
/// default CLI adapter. Writes use per-document last-write-wins merge
/// semantics; there is no optimistic concurrency control.
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile by provider uid.
    fn get(&self, user_id: &str) -> Result<Option<UserProfile>>;

    /// Fetch a profile by email, exact match as typed.
    fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>>;

    /// Whether any profile exists for this email. The login workflow's
    /// account-existence gate; must not reveal anything else.
    fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.find_by_email(email)?.is_some())
    }

    /// Insert or fully replace a profile document.
    fn upsert(&self, profile: &UserProfile) -> Result<()>;

    /// Update the role of an existing profile, stamping `updated_at`.
    /// Returns the profile as it was before the change.
    fn set_role(&self, user_id: &str, role: Role) -> Result<UserProfile>;

    /// Flip the email-verified flag, stamping `updated_at`.
    fn set_email_verified(&self, user_id: &str, verified: bool) -> Result<()>;

    /// Remove a profile document. Removing an absent document is an error
    /// (admin flows need to know the target existed).
    fn delete(&self, user_id: &str) -> Result<UserProfile>;

    /// All profiles, for the admin listing.
    fn list(&self) -> Result<Vec<UserProfile>>;
}
