use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::core::errors::{GuardError, Result};

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the global data directory path.
/// If `custom` is provided, uses that path; otherwise defaults to `.roamguard`.
pub fn init(custom: Option<&str>) {
    let dir = custom
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".roamguard"));
    let _ = DATA_DIR.set(dir);
}

/// Get the current data directory path.
pub fn data_dir() -> &'static Path {
    DATA_DIR
        .get()
        .map(|p| p.as_path())
        .unwrap_or(Path::new(".roamguard"))
}

/// Reject filenames that could escape the data directory. Used for
/// config-supplied names like the audit log file.
pub fn validate_simple_filename(name: &str, what: &str) -> Result<()> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || name.starts_with('.')
    {
        return Err(GuardError::InvalidConfig {
            detail: format!("Invalid {what}: '{name}' must be a plain filename"),
        });
    }
    Ok(())
}
