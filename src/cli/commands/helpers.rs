use std::io::{self, BufRead, Write};
use std::process::Command;

use serde_json::json;

use crate::adapters::audit::json_audit_log::JsonAuditLog;
use crate::adapters::client_info::http_client_info::{identity_string, HttpClientInfo};
use crate::adapters::identity::rest_identity::RestIdentityProvider;
use crate::adapters::profiles::file_profile_store::FileProfileStore;
use crate::adapters::stores::file_kv_store::FileKvStore;
use crate::cli::context;
use crate::config::app_config::AppConfig;
use crate::core::errors::{GuardError, Result};
use crate::core::models::audit_entry::Actor;
use crate::core::services::audit_service::AuditService;
use crate::core::services::auth_service::AuthWorkflow;
use crate::core::services::session_service::SessionGuard;
use crate::core::services::throttle_service::LoginThrottle;
use crate::core::traits::profile_store::ProfileStore;

/// The fully wired workflow every command composes at its root.
pub type CliWorkflow = AuthWorkflow<
    RestIdentityProvider,
    FileProfileStore,
    FileKvStore,
    FileKvStore,
    JsonAuditLog,
    HttpClientInfo,
>;

/// Load the configuration, failing with the init hint when absent.
pub fn load_config() -> Result<AppConfig> {
    AppConfig::load(context::data_dir())
}

/// Wire the file-backed adapters into a workflow.
pub fn build_workflow(config: &AppConfig) -> CliWorkflow {
    let data_dir = context::data_dir();

    let provider = RestIdentityProvider::new(&config.provider.base_url, &config.provider.api_key);
    let profiles = FileProfileStore::new(data_dir);
    let throttle = LoginThrottle::with_policy(
        FileKvStore::new(data_dir.join("lockouts.json")),
        config.lockout_policy(),
    );
    let sessions = SessionGuard::with_policy(
        FileKvStore::new(data_dir.join("session.json")),
        config.session_policy(),
    );
    let audit_section = config.audit.as_ref();
    let audit = AuditService::with_enabled(
        JsonAuditLog::from_config(data_dir, audit_section),
        HttpClientInfo::new(),
        JsonAuditLog::is_enabled(audit_section),
    );

    AuthWorkflow::new(
        provider,
        profiles,
        throttle,
        sessions,
        audit,
        identity_string(),
    )
}

/// The audit sink on its own, for the read-only viewer commands.
pub fn audit_log(config: &AppConfig) -> JsonAuditLog {
    JsonAuditLog::from_config(context::data_dir(), config.audit.as_ref())
}

/// Resolve the acting user from the live session. Fails when nobody is
/// signed in; falls back to a bare uid if the profile document is gone.
pub fn current_actor(workflow: &CliWorkflow) -> Result<Actor> {
    let session = workflow
        .sessions()
        .current()?
        .ok_or(GuardError::NotAuthenticated)?;

    Ok(match workflow.profiles().get(&session.user_id)? {
        Some(profile) => Actor::new(&profile.user_id, &profile.email, &profile.username),
        None => Actor::new(&session.user_id, "unknown", "Unknown"),
    })
}

/// Admin gate for the user-management commands. A denial is itself a
/// security event and lands in the trail.
pub fn require_admin(workflow: &CliWorkflow, actor: &Actor, command: &str) -> Result<()> {
    if workflow.check_if_admin(&actor.id)? {
        return Ok(());
    }
    workflow.audit().record(
        actor,
        "ACCESS_DENIED",
        json!({ "success": false, "command": command }),
    );
    Err(GuardError::AdminRequired)
}

/// Prompt for a line on stdin. Used for passwords so they never appear
/// in shell history or process listings.
pub fn prompt_line(prompt: &str) -> Result<String> {
    print!("  {prompt}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

/// Prompt for a new password twice and insist the entries match.
pub fn prompt_new_password() -> Result<String> {
    let password = prompt_line("New password")?;
    let confirm = prompt_line("Confirm password")?;
    if password != confirm {
        return Err(GuardError::PasswordMismatch);
    }
    Ok(password)
}

/// Read the git user name and email from the local/global config.
/// Returns `("unknown", None)` if git is not available. Used to label
/// audit entries for commands that run outside any session.
pub fn git_author() -> (String, Option<String>) {
    let name = Command::new("git")
        .args(["config", "user.name"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                Some(String::from_utf8_lossy(&o.stdout).trim().to_string())
            } else {
                None
            }
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let email = Command::new("git")
        .args(["config", "user.email"])
        .output()
        .ok()
        .and_then(|o| {
            if o.status.success() {
                let val = String::from_utf8_lossy(&o.stdout).trim().to_string();
                if val.is_empty() {
                    None
                } else {
                    Some(val)
                }
            } else {
                None
            }
        });

    (name, email)
}
