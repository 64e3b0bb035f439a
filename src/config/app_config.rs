use serde::Deserialize;
use std::path::Path;

use crate::core::errors::{GuardError, Result};
use crate::core::services::session_service::SessionPolicy;
use crate::core::services::throttle_service::LockoutPolicy;

/// Current format version supported by this build of Roamguard.
pub const CURRENT_FORMAT_VERSION: u32 = 1;

/// Top-level configuration read from `.roamguard/config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub roamguard: RoamguardSection,
    pub provider: ProviderSection,
    #[serde(default)]
    pub lockout: LockoutSection,
    #[serde(default)]
    pub session: SessionSection,
    pub audit: Option<AuditSection>,
}

impl AppConfig {
    /// Load the configuration from `{data_dir}/config.toml`.
    ///
    /// After parsing, validates the format version and the audit log
    /// filename to prevent path traversal from an edited config file.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join("config.toml");
        if !config_path.exists() {
            return Err(GuardError::NotInitialized);
        }
        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content).map_err(|e| GuardError::InvalidConfig {
            detail: format!("Failed to parse config.toml: {e}"),
        })?;

        if config.roamguard.format_version > CURRENT_FORMAT_VERSION {
            return Err(GuardError::InvalidConfig {
                detail: format!(
                    "config format version {} is newer than the supported version {}. \
                     Update roamguard.",
                    config.roamguard.format_version, CURRENT_FORMAT_VERSION
                ),
            });
        }

        if let Some(audit) = &config.audit {
            crate::cli::context::validate_simple_filename(&audit.log_file, "audit log file")?;
        }

        if config.lockout.max_attempts == 0 {
            return Err(GuardError::InvalidConfig {
                detail: "lockout.max_attempts must be at least 1".into(),
            });
        }

        Ok(config)
    }

    /// Throttle policy from the `[lockout]` section.
    pub fn lockout_policy(&self) -> LockoutPolicy {
        LockoutPolicy {
            max_attempts: self.lockout.max_attempts,
            lockout_duration: chrono::Duration::seconds(self.lockout.duration_secs),
        }
    }

    /// Session policy from the `[session]` section.
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            absolute_timeout: chrono::Duration::seconds(self.session.absolute_timeout_secs),
            inactivity_timeout: chrono::Duration::seconds(self.session.inactivity_timeout_secs),
        }
    }
}

/// The `[roamguard]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RoamguardSection {
    pub version: String,
    /// Format version for backward compatibility. Defaults to 1 if missing.
    #[serde(default = "default_format_version")]
    pub format_version: u32,
}

fn default_format_version() -> u32 {
    1
}

/// The `[provider]` section: where the identity provider lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSection {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

/// The `[lockout]` section. Defaults: 3 attempts, 120 second lock.
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutSection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_lockout_secs")]
    pub duration_secs: i64,
}

impl Default for LockoutSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            duration_secs: default_lockout_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_lockout_secs() -> i64 {
    120
}

/// The `[session]` section. Defaults: 5 hour absolute cap, 15 minute
/// inactivity window.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_absolute_secs")]
    pub absolute_timeout_secs: i64,
    #[serde(default = "default_inactivity_secs")]
    pub inactivity_timeout_secs: i64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            absolute_timeout_secs: default_absolute_secs(),
            inactivity_timeout_secs: default_inactivity_secs(),
        }
    }
}

fn default_absolute_secs() -> i64 {
    5 * 60 * 60
}

fn default_inactivity_secs() -> i64 {
    15 * 60
}

/// The `[audit]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditSection {
    pub enabled: bool,
    pub log_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), content).unwrap();
        dir
    }

    const MINIMAL: &str = r#"
[roamguard]
version = "0.3.0"

[provider]
base_url = "https://id.example.com/v1"
"#;

    #[test]
    fn minimal_config_gets_the_normative_defaults() {
        let dir = write_config(MINIMAL);
        let config = AppConfig::load(dir.path()).unwrap();

        let lockout = config.lockout_policy();
        assert_eq!(lockout.max_attempts, 3);
        assert_eq!(lockout.lockout_duration.num_seconds(), 120);

        let session = config.session_policy();
        assert_eq!(session.absolute_timeout.num_hours(), 5);
        assert_eq!(session.inactivity_timeout.num_minutes(), 15);

        assert!(config.audit.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let dir = write_config(
            r#"
[roamguard]
version = "0.3.0"

[provider]
base_url = "https://id.example.com/v1"
api_key = "k"

[lockout]
max_attempts = 5
duration_secs = 60

[session]
absolute_timeout_secs = 3600
inactivity_timeout_secs = 120

[audit]
enabled = true
log_file = "trail.log"
"#,
        );
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.lockout_policy().max_attempts, 5);
        assert_eq!(config.session_policy().inactivity_timeout.num_seconds(), 120);
        assert_eq!(config.audit.unwrap().log_file, "trail.log");
    }

    #[test]
    fn missing_config_means_not_initialized() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AppConfig::load(dir.path()),
            Err(GuardError::NotInitialized)
        ));
    }

    #[test]
    fn newer_format_version_is_rejected() {
        let dir = write_config(
            r#"
[roamguard]
version = "0.3.0"
format_version = 99

[provider]
base_url = "https://id.example.com/v1"
"#,
        );
        assert!(matches!(
            AppConfig::load(dir.path()),
            Err(GuardError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn audit_filename_with_path_separators_is_rejected() {
        let dir = write_config(
            r#"
[roamguard]
version = "0.3.0"

[provider]
base_url = "https://id.example.com/v1"

[audit]
enabled = true
log_file = "../outside.log"
"#,
        );
        assert!(AppConfig::load(dir.path()).is_err());
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let dir = write_config(
            r#"
[roamguard]
version = "0.3.0"

[provider]
base_url = "https://id.example.com/v1"

[lockout]
max_attempts = 0
"#,
        );
        assert!(AppConfig::load(dir.path()).is_err());
    }
}
