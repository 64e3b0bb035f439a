use std::path::Path;

use crate::adapters::audit::json_audit_log::JsonAuditLog;
use crate::adapters::client_info::http_client_info::HttpClientInfo;
use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::audit_entry::AuditQuery;
use crate::core::services::audit_service::AuditService;
use crate::core::traits::audit::AuditSink;

/// Execute the `roamguard export` command: write the full audit trail
/// as CSV into the given directory (default: current directory).
pub fn execute(output_dir: Option<&str>) -> Result<()> {
    let config = helpers::load_config()?;
    let log = helpers::audit_log(&config);

    let entries = log.query(&AuditQuery {
        // Export everything, not just the default viewer page.
        limit: Some(usize::MAX),
        ..Default::default()
    })?;

    if entries.is_empty() {
        output::warning("No audit entries to export");
        return Ok(());
    }

    let dir = output_dir.map(Path::new).unwrap_or(Path::new("."));
    let path = AuditService::<JsonAuditLog, HttpClientInfo>::export_to_dir(&entries, dir)?;

    output::success(&format!(
        "Exported {} entries to {}",
        entries.len(),
        path.display()
    ));
    Ok(())
}
