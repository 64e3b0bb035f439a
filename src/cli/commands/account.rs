use crate::cli::commands::helpers;
use crate::cli::output;
use crate::cli::AccountAction;
use crate::core::errors::Result;

/// Execute the `roamguard account` commands.
pub fn execute(action: &AccountAction) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    match action {
        AccountAction::Delete => {
            let actor = helpers::current_actor(&workflow)?;

            output::warning(&format!(
                "This permanently deletes the account {} and everything attached to it.",
                actor.email
            ));
            let password = helpers::prompt_line("Password to confirm")?;

            workflow.delete_own_account(&actor, &password)?;
            output::success("Account deleted. Goodbye.");
        }
    }

    Ok(())
}
