use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::validation;

/// Execute the `roamguard register` command.
pub fn execute(email: &str, username: &str) -> Result<()> {
    let config = helpers::load_config()?;

    // Surface shape problems before asking for a password.
    validation::validate_email(email)?;
    validation::validate_username(username)?;

    let password = helpers::prompt_new_password()?;

    let workflow = helpers::build_workflow(&config);
    let profile = workflow.register(email, &password, username)?;

    output::success(&format!("Account created for {}", profile.email));
    output::info("Check your inbox and confirm with 'roamguard verify confirm <code> <email>'.");
    Ok(())
}
