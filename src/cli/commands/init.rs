use serde_json::json;

use crate::adapters::audit::json_audit_log::JsonAuditLog;
use crate::adapters::client_info::http_client_info::HttpClientInfo;
use crate::cli::commands::helpers;
use crate::cli::context;
use crate::cli::output;
use crate::core::errors::{GuardError, Result};
use crate::core::models::audit_entry::Actor;
use crate::core::services::audit_service::AuditService;

/// Execute the `roamguard init` command.
///
/// Creates the data directory with default configuration and opens the
/// audit trail with a settings entry.
pub fn execute() -> Result<()> {
    let data_dir = context::data_dir();

    if data_dir.exists() {
        return Err(GuardError::InvalidConfig {
            detail: format!(
                "Roamguard is already initialized here ({} exists)",
                data_dir.display()
            ),
        });
    }

    output::header("Roamguard — Initializing");

    std::fs::create_dir_all(data_dir)?;
    output::success(&format!("Created {}/", data_dir.display()));

    let config_content = r#"[roamguard]
version = "0.3.0"

[provider]
# Identity provider REST endpoint and API key.
base_url = "https://identitytoolkit.googleapis.com/v1"
api_key = ""

[lockout]
max_attempts = 3
duration_secs = 120

[session]
absolute_timeout_secs = 18000
inactivity_timeout_secs = 900

[audit]
enabled = true
log_file = "audit.log"
"#;
    std::fs::write(data_dir.join("config.toml"), config_content)?;
    output::success("Generated config.toml with defaults");

    // First trail entry, attributed to whoever git thinks we are.
    let (name, email) = helpers::git_author();
    let actor = Actor::new("system", email.as_deref().unwrap_or("unknown"), &name);
    let audit = AuditService::new(JsonAuditLog::new(data_dir, "audit.log"), HttpClientInfo::new());
    audit.record(&actor, "SETTINGS_INIT", json!({ "directory": data_dir.display().to_string() }));
    output::success("Opened the audit trail");

    output::header("Next steps");
    output::info("1. Set provider.api_key in .roamguard/config.toml");
    output::info("2. roamguard register <email> <username>");
    println!();
    output::warning(
        "Lockout counters and session state are advisory and live in local \
         files; the identity provider remains the authority on credentials.",
    );

    Ok(())
}
