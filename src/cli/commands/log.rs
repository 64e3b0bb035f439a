use colored::Colorize;

use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::{GuardError, Result};
use crate::core::models::audit_entry::{ActionCategory, AuditEntry, AuditQuery, Severity};
use crate::core::traits::audit::AuditSink;

/// Execute the `roamguard log` command.
///
/// Displays the audit trail, newest first, with optional actor,
/// category and severity filters.
pub fn execute(
    actor: Option<&str>,
    category: Option<&str>,
    severity: Option<&str>,
    limit: Option<usize>,
) -> Result<()> {
    let config = helpers::load_config()?;
    let log = helpers::audit_log(&config);

    let query = AuditQuery {
        actor_id: actor.map(|a| a.to_string()),
        category: category.map(parse_category).transpose()?,
        severity: severity.map(parse_severity).transpose()?,
        limit,
    };

    let entries = log.query(&query)?;

    if entries.is_empty() {
        output::header("roamguard log");
        output::warning("No audit entries found");
        if actor.is_some() || category.is_some() || severity.is_some() {
            println!("  Try removing filters to see all entries.");
        }
        return Ok(());
    }

    output::header(&format!("roamguard log ({} entries)", entries.len()));
    println!();

    for entry in &entries {
        print_entry(entry);
    }

    Ok(())
}

fn parse_category(s: &str) -> Result<ActionCategory> {
    ActionCategory::parse(s).ok_or_else(|| GuardError::InvalidConfig {
        detail: format!(
            "Unknown category: '{s}'. Expected one of user_management, authentication, \
             deletion, role_management, access_control, settings, general."
        ),
    })
}

fn parse_severity(s: &str) -> Result<Severity> {
    Severity::parse(s).ok_or_else(|| GuardError::InvalidConfig {
        detail: format!("Unknown severity: '{s}'. Expected high, medium or low."),
    })
}

/// Print a single audit entry as a formatted row.
fn print_entry(entry: &AuditEntry) {
    let date = entry.occurred_at.format("%Y-%m-%d %H:%M:%S");
    let outcome = if entry.success {
        "ok".green().to_string()
    } else {
        "fail".red().to_string()
    };

    println!(
        "  {} {} {} {:<28} {:<16} {} {}",
        date.to_string().dimmed(),
        "│".dimmed(),
        format_severity(entry.severity),
        entry.action,
        entry.category.as_str().dimmed(),
        entry.actor_email,
        outcome,
    );
}

/// Severity as a fixed-width colored tag.
fn format_severity(severity: Severity) -> String {
    match severity {
        Severity::High => "HIGH".red().bold().to_string(),
        Severity::Medium => "MED ".yellow().to_string(),
        Severity::Low => "LOW ".dimmed().to_string(),
    }
}
