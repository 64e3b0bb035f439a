use std::time::Duration;

use crate::core::traits::client_info::ClientInfo;

/// Public IP lookup endpoint. Returns `{"ip": "..."}`.
const IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

/// The lookup must stay invisible when the network is slow or absent.
const IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(serde::Deserialize)]
struct IpResponse {
    ip: String,
}

/// Client environment description backed by a public IP lookup.
///
/// Both methods honor the `ClientInfo` contract of never failing: the
/// lookup degrades to `"unknown"` on any error, and the identity string
/// is computed from compile-time facts.
#[derive(Debug, Clone, Default)]
pub struct HttpClientInfo;

impl HttpClientInfo {
    pub fn new() -> Self {
        Self
    }

    fn lookup_ip() -> Option<String> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .ok()?;

        rt.block_on(async {
            let client = reqwest::Client::builder()
                .timeout(IP_LOOKUP_TIMEOUT)
                .user_agent(identity_string())
                .build()
                .ok()?;
            let response = client.get(IP_LOOKUP_URL).send().await.ok()?;
            let body: IpResponse = response.json().await.ok()?;
            Some(body.ip)
        })
    }
}

/// Stable identity string of this installation: crate version plus the
/// compile-target platform. Serves as the session device fingerprint,
/// so it must not vary between invocations on the same machine.
pub fn identity_string() -> String {
    format!(
        "roamguard/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

impl ClientInfo for HttpClientInfo {
    fn public_ip(&self) -> String {
        match Self::lookup_ip() {
            Some(ip) => ip,
            None => {
                tracing::debug!("public IP lookup failed, recording \"unknown\"");
                "unknown".to_string()
            }
        }
    }

    fn identity_string(&self) -> String {
        identity_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_string_is_stable_and_versioned() {
        let a = identity_string();
        let b = identity_string();
        assert_eq!(a, b);
        assert!(a.starts_with("roamguard/"));
        assert!(a.contains(std::env::consts::OS));
    }
}
