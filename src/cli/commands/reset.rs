use crate::cli::commands::helpers;
use crate::cli::output;
use crate::cli::ResetAction;
use crate::core::errors::Result;

/// Execute the `roamguard reset` commands.
pub fn execute(action: &ResetAction) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    match action {
        ResetAction::Request { email } => {
            workflow.request_password_reset(email)?;
            output::success(&format!("Password-reset email sent to {email}"));
            output::info("Redeem it with 'roamguard reset confirm <code>'.");
        }
        ResetAction::Confirm { code } => {
            let new_password = helpers::prompt_new_password()?;
            let email = workflow.confirm_password_reset(code, &new_password)?;
            output::success(&format!("Password updated for {email}. You can log in now."));
        }
    }

    Ok(())
}
