use std::time::Duration;

use crate::adapters::client_info::http_client_info::identity_string;
use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::models::session_record::{InvalidReason, SessionValidity};

/// Execute the `roamguard session` command.
///
/// Without `--watch`, runs one validity check and reports. With it,
/// keeps polling on the given interval and forces the full logout
/// workflow the moment the session goes invalid. `--touch` records
/// user activity first; shell integrations call it on input events.
pub fn execute(watch: bool, interval: u64, touch: bool) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    if touch {
        workflow.sessions().touch()?;
    }

    if !watch {
        check_once(&workflow)?;
        return Ok(());
    }

    output::header("Watching session");
    output::info(&format!("Checking every {interval}s. Ctrl-C to stop."));
    loop {
        if !check_once(&workflow)? {
            return Ok(());
        }
        std::thread::sleep(Duration::from_secs(interval));
    }
}

/// One validity pass. Returns false once the session is gone.
fn check_once(workflow: &helpers::CliWorkflow) -> Result<bool> {
    // Resolve the actor before validating: a failed check destroys the
    // record, and the forced-logout audit entry still needs a name.
    let Ok(actor) = helpers::current_actor(workflow) else {
        output::warning("No active session.");
        return Ok(false);
    };

    match workflow.sessions().validate(&identity_string())? {
        SessionValidity::Valid => {
            let remaining = workflow
                .sessions()
                .remaining_time()?
                .expect("valid session has remaining time");
            output::success(&format!(
                "Session for {} is active — {} absolute, {} inactivity",
                actor.email,
                output::format_countdown(remaining.absolute_remaining_ms / 1000),
                output::format_countdown(remaining.inactivity_remaining_ms / 1000),
            ));
            Ok(true)
        }
        SessionValidity::Invalid(InvalidReason::NoSession) => {
            output::warning("No active session.");
            Ok(false)
        }
        SessionValidity::Invalid(reason) => {
            workflow.force_logout(&actor, reason)?;
            output::warning(&format!(
                "Session ended ({}). Please log in again.",
                reason.as_str()
            ));
            Ok(false)
        }
    }
}
