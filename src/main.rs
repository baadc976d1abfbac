//! Salesesy CLI entry point.

use clap::Parser;
use salesesy::cli::commands;
use salesesy::cli::{Cli, Commands};
use salesesy::config::{load_dotenv, logging_disabled};
use salesesy::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    // .env must be loaded before clap reads `env = ...` defaults
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);
    if let Some(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

/// `RUST_LOG` wins; else `LOG_LEVEL` (`silent`/`none`/`off` disables
/// logging, any other value is used as a filter); else the `-v` count.
fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let log_level = std::env::var("LOG_LEVEL").ok();
    if quiet || logging_disabled(log_level.as_deref()) {
        return;
    }

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if let Some(level) = log_level.as_deref().filter(|l| !l.trim().is_empty()) {
        EnvFilter::try_new(level.trim()).unwrap_or_else(|_| EnvFilter::new("warn"))
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info,tower_http=info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let db = cli.db.as_deref();
    let json = cli.json;

    match &cli.command {
        Commands::Serve(args) => commands::serve::execute(db, args),
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Seed { reset } => commands::seed::execute(db, *reset, json),
        Commands::Leaderboard { remote, limit } => {
            commands::leaderboard::execute(remote, *limit, json)
        }
        Commands::Company { name, server } => commands::company::execute(server, name, json),
        Commands::Overview { remote } => commands::overview::execute(remote, json),
        Commands::View {
            tab,
            company,
            remote,
        } => commands::view::execute(*tab, company.as_deref(), remote, json),
        Commands::Completions { shell } => commands::completions::execute(*shell),
        Commands::Version => commands::version::execute(json),
    }
}
