use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;

/// Execute the `roamguard logout` command.
pub fn execute() -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    let actor = helpers::current_actor(&workflow)?;
    workflow.logout(&actor)?;

    output::success(&format!("Signed out {}", actor.email));
    Ok(())
}
