use std::sync::Mutex;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::errors::{GuardError, Result};
use crate::core::traits::identity::{IdentityProvider, ProviderErrorKind, ProviderUser};

/// Per-request timeout against the identity endpoint.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity provider adapter speaking an identity-toolkit style REST
/// API: every primitive is a POST to `{base_url}/accounts:<op>?key=...`
/// returning either the operation payload or `{"error": {"message":
/// "CODE"}}`. The provider-side session is the ID token returned by
/// sign-up/sign-in; it lives only for this process and `sign_out`
/// discards it.
pub struct RestIdentityProvider {
    base_url: String,
    api_key: String,
    /// Token of the currently signed-in account, if any.
    id_token: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    #[serde(default)]
    email_verified: bool,
}

#[derive(Debug, Deserialize)]
struct ResetCodeResponse {
    email: String,
}

/// Map the provider's error code string onto a classified kind.
/// Codes may carry a suffix ("WEAK_PASSWORD : Password should be..."),
/// so matching is by prefix.
fn classify_code(message: &str) -> ProviderErrorKind {
    let code = message.split(':').next().unwrap_or("").trim();
    match code {
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_CREDENTIAL" => {
            ProviderErrorKind::InvalidCredential
        }
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => ProviderErrorKind::UserNotFound,
        "EMAIL_EXISTS" => ProviderErrorKind::EmailAlreadyInUse,
        "WEAK_PASSWORD" => ProviderErrorKind::WeakPassword,
        "EXPIRED_OOB_CODE" => ProviderErrorKind::ExpiredActionCode,
        "INVALID_OOB_CODE" => ProviderErrorKind::InvalidActionCode,
        _ => ProviderErrorKind::Unavailable,
    }
}

impl RestIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            id_token: Mutex::new(None),
        }
    }

    fn endpoint(&self, op: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, op, self.api_key)
    }

    /// POST a JSON body and decode the response, translating provider
    /// error codes into classified `GuardError::Provider` values.
    fn post(&self, op: &str, body: Value) -> Result<Value> {
        let url = self.endpoint(op);

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GuardError::Provider {
                kind: ProviderErrorKind::Unavailable,
                detail: format!("Failed to create runtime: {e}"),
            })?;

        rt.block_on(async {
            let client = reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(crate::adapters::client_info::http_client_info::identity_string())
                .build()
                .map_err(|e| GuardError::Provider {
                    kind: ProviderErrorKind::Unavailable,
                    detail: format!("Failed to create HTTP client: {e}"),
                })?;

            let response = client.post(&url).json(&body).send().await.map_err(|e| {
                GuardError::Provider {
                    kind: ProviderErrorKind::Unavailable,
                    detail: format!("Identity provider unreachable: {e}"),
                }
            })?;

            let status = response.status();
            let payload: Value =
                response.json().await.map_err(|e| GuardError::Provider {
                    kind: ProviderErrorKind::Unavailable,
                    detail: format!("Unreadable provider response: {e}"),
                })?;

            if let Some(message) = payload
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
            {
                return Err(GuardError::Provider {
                    kind: classify_code(message),
                    detail: message.to_string(),
                });
            }
            if !status.is_success() {
                return Err(GuardError::Provider {
                    kind: ProviderErrorKind::Unavailable,
                    detail: format!("Provider returned HTTP {status}"),
                });
            }

            Ok(payload)
        })
    }

    fn decode<T: serde::de::DeserializeOwned>(payload: Value) -> Result<T> {
        serde_json::from_value(payload).map_err(|e| GuardError::Provider {
            kind: ProviderErrorKind::Unavailable,
            detail: format!("Unexpected provider payload: {e}"),
        })
    }

    fn current_token(&self) -> Result<String> {
        self.id_token
            .lock()
            .unwrap()
            .clone()
            .ok_or(GuardError::NotAuthenticated)
    }

    /// Fetch the account record behind a token; sign-in responses do not
    /// carry the verified flag, the lookup endpoint does.
    fn lookup(&self, id_token: &str) -> Result<LookupUser> {
        let payload = self.post("lookup", json!({ "idToken": id_token }))?;
        let mut decoded: LookupResponse = Self::decode(payload)?;
        if decoded.users.is_empty() {
            return Err(GuardError::Provider {
                kind: ProviderErrorKind::UserNotFound,
                detail: "Token resolved to no account".into(),
            });
        }
        Ok(decoded.users.remove(0))
    }
}

impl IdentityProvider for RestIdentityProvider {
    fn create_account(&self, email: &str, password: &str) -> Result<ProviderUser> {
        let payload = self.post(
            "signUp",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
        )?;
        let account: AccountResponse = Self::decode(payload)?;

        *self.id_token.lock().unwrap() = account.id_token.clone();

        Ok(ProviderUser {
            uid: account.local_id,
            email: account.email.unwrap_or_else(|| email.to_string()),
            display_name: account.display_name,
            email_verified: false,
        })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<ProviderUser> {
        let payload = self.post(
            "signInWithPassword",
            json!({ "email": email, "password": password, "returnSecureToken": true }),
        )?;
        let account: AccountResponse = Self::decode(payload)?;

        let token = account.id_token.clone().ok_or_else(|| GuardError::Provider {
            kind: ProviderErrorKind::Unavailable,
            detail: "Sign-in response carried no token".into(),
        })?;
        let record = self.lookup(&token)?;

        *self.id_token.lock().unwrap() = Some(token);

        Ok(ProviderUser {
            uid: record.local_id,
            email: record.email.or(account.email).unwrap_or_else(|| email.to_string()),
            display_name: record.display_name,
            email_verified: record.email_verified,
        })
    }

    fn sign_out(&self) -> Result<()> {
        // Token-based sessions end client-side: dropping the token is
        // the whole operation.
        *self.id_token.lock().unwrap() = None;
        Ok(())
    }

    fn reauthenticate(&self, email: &str, password: &str) -> Result<()> {
        // A fresh password sign-in doubles as re-authentication and
        // refreshes the stored token.
        self.sign_in(email, password).map(|_| ())
    }

    fn send_verification_email(&self, _uid: &str) -> Result<()> {
        let token = self.current_token()?;
        self.post(
            "sendOobCode",
            json!({ "requestType": "VERIFY_EMAIL", "idToken": token }),
        )?;
        Ok(())
    }

    fn apply_verification_code(&self, code: &str) -> Result<()> {
        self.post("update", json!({ "oobCode": code }))?;
        Ok(())
    }

    fn send_password_reset(&self, email: &str) -> Result<()> {
        self.post(
            "sendOobCode",
            json!({ "requestType": "PASSWORD_RESET", "email": email }),
        )?;
        Ok(())
    }

    fn verify_reset_code(&self, code: &str) -> Result<String> {
        let payload = self.post("resetPassword", json!({ "oobCode": code }))?;
        let decoded: ResetCodeResponse = Self::decode(payload)?;
        Ok(decoded.email)
    }

    fn confirm_password_reset(&self, code: &str, new_password: &str) -> Result<()> {
        self.post(
            "resetPassword",
            json!({ "oobCode": code, "newPassword": new_password }),
        )?;
        Ok(())
    }

    fn delete_account(&self, _uid: &str) -> Result<()> {
        let token = self.current_token()?;
        self.post("delete", json!({ "idToken": token }))?;
        *self.id_token.lock().unwrap() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_map_to_classified_kinds() {
        assert_eq!(
            classify_code("INVALID_LOGIN_CREDENTIALS"),
            ProviderErrorKind::InvalidCredential
        );
        assert_eq!(classify_code("INVALID_PASSWORD"), ProviderErrorKind::InvalidCredential);
        assert_eq!(classify_code("EMAIL_NOT_FOUND"), ProviderErrorKind::UserNotFound);
        assert_eq!(classify_code("EMAIL_EXISTS"), ProviderErrorKind::EmailAlreadyInUse);
        assert_eq!(classify_code("EXPIRED_OOB_CODE"), ProviderErrorKind::ExpiredActionCode);
        assert_eq!(classify_code("INVALID_OOB_CODE"), ProviderErrorKind::InvalidActionCode);
    }

    #[test]
    fn suffixed_codes_match_by_prefix() {
        assert_eq!(
            classify_code("WEAK_PASSWORD : Password should be at least 6 characters"),
            ProviderErrorKind::WeakPassword
        );
    }

    #[test]
    fn unknown_codes_classify_as_unavailable() {
        assert_eq!(classify_code("TOO_MANY_ATTEMPTS_TRY_LATER"), ProviderErrorKind::Unavailable);
        assert_eq!(classify_code(""), ProviderErrorKind::Unavailable);
    }

    #[test]
    fn endpoints_embed_operation_and_key() {
        let provider = RestIdentityProvider::new("https://id.example.com/v1/", "k123");
        assert_eq!(
            provider.endpoint("signUp"),
            "https://id.example.com/v1/accounts:signUp?key=k123"
        );
    }

    #[test]
    fn operations_needing_a_session_fail_without_one() {
        let provider = RestIdentityProvider::new("https://id.example.com/v1", "k");
        assert!(matches!(
            provider.send_verification_email("u1"),
            Err(GuardError::NotAuthenticated)
        ));
    }

    #[test]
    fn sign_out_discards_the_token() {
        let provider = RestIdentityProvider::new("https://id.example.com/v1", "k");
        *provider.id_token.lock().unwrap() = Some("tok".into());
        provider.sign_out().unwrap();
        assert!(provider.id_token.lock().unwrap().is_none());
    }
}
