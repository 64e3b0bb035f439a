pub mod commands;
pub mod context;
pub mod output;

use clap::{Parser, Subcommand};

/// Guard your account. Watch your session. Trust your trail.
#[derive(Parser, Debug)]
#[command(name = "roamguard", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output (enables diagnostic tracing)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to an alternative data directory (default: .roamguard)
    #[arg(long, global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Roamguard in the current directory
    Init,

    /// Create an account (password read from stdin)
    Register {
        /// Email address for the new account
        email: String,
        /// Display name for the new account
        username: String,
    },

    /// Sign in (password read from stdin)
    Login {
        /// Email address of the account
        email: String,
    },

    /// Sign out and end the local session
    Logout,

    /// Show session state and remaining time
    Session {
        /// Keep polling session validity and force logout on expiry
        #[arg(long)]
        watch: bool,
        /// Polling interval in seconds for --watch
        #[arg(long, default_value_t = 60)]
        interval: u64,
        /// Record user activity, resetting the inactivity clock
        #[arg(long)]
        touch: bool,
    },

    /// Manage the signed-in account
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Show the lockout state for an account
    Lockout {
        /// Email address to inspect
        email: String,
    },

    /// Show the audit trail
    Log {
        /// Filter by actor id
        #[arg(long)]
        actor: Option<String>,
        /// Filter by category (e.g. authentication, role_management)
        #[arg(long)]
        category: Option<String>,
        /// Filter by severity (high, medium, low)
        #[arg(long)]
        severity: Option<String>,
        /// Show at most N entries
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Export the audit trail as CSV
    Export {
        /// Directory to write the export into (default: current directory)
        #[arg(long)]
        output: Option<String>,
    },

    /// Manage user accounts (admin only)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Email verification
    Verify {
        #[command(subcommand)]
        action: VerifyAction,
    },

    /// Password reset
    Reset {
        #[command(subcommand)]
        action: ResetAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum AccountAction {
    /// Permanently delete the signed-in account (password re-check)
    Delete,
}

#[derive(Subcommand, Debug)]
pub enum UsersAction {
    /// List all user profiles
    List,
    /// Change a user's role
    Role {
        /// Email of the target account
        email: String,
        /// New role: user or admin
        role: String,
    },
    /// Delete a user's profile
    Delete {
        /// Email of the target account
        email: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum VerifyAction {
    /// Redeem a verification code from the email link
    Confirm {
        /// The verification code
        code: String,
        /// Email the code was issued for
        email: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ResetAction {
    /// Request a password-reset email
    Request {
        /// Email address of the account
        email: String,
    },
    /// Redeem a reset code (new password read from stdin)
    Confirm {
        /// The reset code from the email link
        code: String,
    },
}
