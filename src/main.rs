mod adapters;
mod cli;
mod config;
mod core;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let args = Cli::parse();

    cli::context::init(args.dir.as_deref());

    if args.verbose {
        use tracing_subscriber::EnvFilter;
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
            )
            .with_writer(std::io::stderr)
            .init();
    }

    let result = match &args.command {
        Commands::Init => cli::commands::init::execute(),
        Commands::Register { email, username } => {
            cli::commands::register::execute(email, username)
        }
        Commands::Login { email } => cli::commands::login::execute(email),
        Commands::Logout => cli::commands::logout::execute(),
        Commands::Session {
            watch,
            interval,
            touch,
        } => cli::commands::session::execute(*watch, *interval, *touch),
        Commands::Account { action } => cli::commands::account::execute(action),
        Commands::Lockout { email } => cli::commands::lockout::execute(email),
        Commands::Log {
            actor,
            category,
            severity,
            limit,
        } => cli::commands::log::execute(
            actor.as_deref(),
            category.as_deref(),
            severity.as_deref(),
            *limit,
        ),
        Commands::Export { output } => cli::commands::export::execute(output.as_deref()),
        Commands::Users { action } => cli::commands::users::execute(action),
        Commands::Verify { action } => cli::commands::verify::execute(action),
        Commands::Reset { action } => cli::commands::reset::execute(action),
    };

    if let Err(e) = result {
        cli::output::error(&format!("Error: {e}"));
        std::process::exit(1);
    }
}
