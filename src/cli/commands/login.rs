use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::commands::helpers;
use crate::cli::output;
use crate::core::errors::Result;
use crate::core::services::auth_service::LoginOutcome;
use crate::core::validation;

/// Execute the `roamguard login` command.
pub fn execute(email: &str) -> Result<()> {
    let config = helpers::load_config()?;
    validation::validate_email(email)?;

    let workflow = helpers::build_workflow(&config);

    // Check the lock before prompting so a locked account never asks
    // for a password it cannot use.
    let status = workflow.throttle().is_locked(email)?;
    if status.locked {
        reject_locked(status.remaining_seconds.unwrap_or_default());
        return Ok(());
    }

    // Mirror the login form: surface a dwindling allowance up front.
    let remaining = workflow.throttle().remaining_attempts(email)?;
    if remaining < workflow.throttle().policy().max_attempts {
        let plural = if remaining == 1 { "" } else { "s" };
        output::warning(&format!("{remaining} attempt{plural} remaining before lockout."));
    }

    let password = helpers::prompt_line("Password")?;

    match workflow.login(email, &password)? {
        LoginOutcome::Success { profile, session } => {
            output::success(&format!(
                "Welcome back, {} ({})",
                profile.username,
                profile.role.as_str()
            ));
            if let Some(remaining) = workflow.sessions().remaining_time()? {
                output::info(&format!(
                    "Session {} expires in {}",
                    session.session_id,
                    output::format_countdown(remaining.absolute_remaining_ms / 1000)
                ));
            }
        }
        LoginOutcome::UnknownAccount => {
            output::error(
                "No such user found. Please check your email or register a new account.",
            );
        }
        LoginOutcome::Locked { remaining_seconds } => {
            reject_locked(remaining_seconds);
        }
        LoginOutcome::BadCredentials {
            locked: true,
            remaining_seconds,
            ..
        } => {
            output::error(&format!(
                "Too many failed attempts. Account locked for {}.",
                output::format_countdown(remaining_seconds.unwrap_or_default())
            ));
            countdown(remaining_seconds.unwrap_or_default());
        }
        LoginOutcome::BadCredentials {
            remaining_attempts, ..
        } => {
            let n = remaining_attempts.unwrap_or_default();
            let plural = if n == 1 { "" } else { "s" };
            output::error(&format!("Incorrect password. {n} attempt{plural} remaining."));
        }
        LoginOutcome::EmailNotVerified => {
            output::error("Please verify your email before logging in.");
            output::info("Check your inbox for the verification link, then run 'roamguard verify confirm <code> <email>'.");
        }
    }

    Ok(())
}

fn reject_locked(remaining_seconds: i64) {
    output::error(&format!(
        "Account is locked. Please wait {} before trying again.",
        output::format_countdown(remaining_seconds)
    ));
    countdown(remaining_seconds);
}

/// Live countdown until the lock lifts. Interruptible with Ctrl-C; the
/// lock state itself lives in the store, not in this loop.
fn countdown(seconds: i64) {
    if seconds <= 0 {
        return;
    }

    let bar = ProgressBar::new(seconds as u64);
    bar.set_style(
        ProgressStyle::with_template("  {msg} {bar:40.red} {pos}/{len}s")
            .expect("countdown template is valid"),
    );
    bar.set_message("locked");

    for elapsed in 0..seconds {
        std::thread::sleep(Duration::from_secs(1));
        bar.set_position((elapsed + 1) as u64);
    }
    bar.finish_with_message("unlocked");
    output::info("You can try again now.");
}
