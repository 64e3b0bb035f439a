/// Port for describing the client environment an action originates from.
///
/// Both methods are infallible by contract: audit instrumentation must
/// never become an availability hazard, so lookups fall back to fixed
/// placeholder values instead of erroring.
pub trait ClientInfo: Send + Sync {
    /// Best-effort public IP of this client; `"unknown"` when the lookup
    /// fails or is unavailable.
    fn public_ip(&self) -> String;

    /// Stable identity string for this client installation. Doubles as
    /// the session device fingerprint and the audit user-agent field.
    fn identity_string(&self) -> String;
}
