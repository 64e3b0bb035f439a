use crate::cli::commands::helpers;
use crate::cli::output;
use crate::cli::VerifyAction;
use crate::core::errors::Result;

/// Execute the `roamguard verify` commands.
pub fn execute(action: &VerifyAction) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    match action {
        VerifyAction::Confirm { code, email } => {
            workflow.confirm_email_verification(code, email)?;
            output::success(&format!("Email {email} verified. You can log in now."));
        }
    }

    Ok(())
}
