use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `roamguard lockout` command: the admin view of one
/// account's throttle state. All of this is advisory local data.
pub fn execute(email: &str) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    let info = workflow.throttle().lockout_info(email)?;

    output::header(&format!("Lockout state for {email}"));
    if info.is_locked {
        let status = workflow.throttle().is_locked(email)?;
        output::warning(&format!(
            "Locked — unlocks in {}",
            output::format_countdown(status.remaining_seconds.unwrap_or_default())
        ));
    } else {
        output::success(&format!(
            "Not locked — {} of {} attempts remaining",
            info.remaining_attempts,
            workflow.throttle().policy().max_attempts
        ));
    }

    output::info(&format!("Failed attempts: {}", info.attempts));
    if let Some(first) = info.first_attempt_at {
        output::info(&format!("First failure:   {}", first.format("%Y-%m-%d %H:%M:%S")));
    }
    if let Some(last) = info.last_attempt_at {
        output::info(&format!("Last failure:    {}", last.format("%Y-%m-%d %H:%M:%S")));
    }

    Ok(())
}
