use colored::Colorize;

use crate::cli::commands::helpers;
use crate::cli::output;
use crate::cli::UsersAction;
use crate::core::errors::{GuardError, Result};
use crate::core::models::user_profile::Role;
use crate::core::traits::profile_store::ProfileStore;

/// Execute the `roamguard users` commands. All of them require a live
/// session whose profile carries the admin role.
pub fn execute(action: &UsersAction) -> Result<()> {
    let config = helpers::load_config()?;
    let workflow = helpers::build_workflow(&config);

    let actor = helpers::current_actor(&workflow)?;

    match action {
        UsersAction::List => {
            helpers::require_admin(&workflow, &actor, "users list")?;
            list(&workflow)
        }
        UsersAction::Role { email, role } => {
            helpers::require_admin(&workflow, &actor, "users role")?;
            let new_role = Role::parse(role).ok_or_else(|| GuardError::InvalidConfig {
                detail: format!("Unknown role: '{role}'. Expected 'user' or 'admin'."),
            })?;

            // An admin may not demote their own active account.
            if actor.email == *email && new_role != Role::Admin {
                return Err(GuardError::SelfAction {
                    action: "demote".into(),
                });
            }

            let updated = workflow.update_role(&actor, email, new_role)?;
            output::success(&format!(
                "Role of {} is now {}",
                updated.email,
                updated.role.as_str()
            ));
            Ok(())
        }
        UsersAction::Delete { email } => {
            helpers::require_admin(&workflow, &actor, "users delete")?;

            if actor.email == *email {
                return Err(GuardError::SelfAction {
                    action: "delete".into(),
                });
            }

            let deleted = workflow.delete_user(&actor, email)?;
            output::success(&format!(
                "Deleted profile of {} ({})",
                deleted.email, deleted.username
            ));
            output::info("The provider-side credential record is managed in the provider console.");
            Ok(())
        }
    }
}

fn list(workflow: &helpers::CliWorkflow) -> Result<()> {
    let mut profiles = workflow.profiles().list()?;
    profiles.sort_by(|a, b| a.email.cmp(&b.email));

    output::header(&format!("Users ({})", profiles.len()));
    if profiles.is_empty() {
        output::warning("No user profiles yet");
        return Ok(());
    }

    println!();
    for p in &profiles {
        let role = match p.role {
            Role::Admin => p.role.as_str().red().to_string(),
            Role::User => p.role.as_str().to_string(),
        };
        let verified = if p.email_verified {
            "verified".green().to_string()
        } else {
            "unverified".yellow().to_string()
        };
        println!("  {:<32} {:<16} {:<6} {}", p.email, p.username, role, verified);
    }

    Ok(())
}
