//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::client::Tab;
use crate::config::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SERVER_URL};

pub mod commands;

/// Salesesy - contacts, deals, pipelines and tasks over a JSON API
#[derive(Parser, Debug)]
#[command(name = "salesesy", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path, or `:memory:` (default: platform data dir)
    #[arg(long, global = true, env = "SALESESY_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API
    Serve(ServeArgs),

    /// Create the database file and apply the schema
    Init {
        /// Recreate an existing database
        #[arg(long)]
        force: bool,
    },

    /// Insert the demo pipeline, contacts, deals and tasks
    Seed {
        /// Delete all existing rows first
        #[arg(long)]
        reset: bool,
    },

    /// Rank companies by pipeline value
    Leaderboard {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Show at most this many companies
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show one company's profile
    Company {
        /// Company name, any spelling
        name: String,

        /// API base URL
        #[arg(long, env = "SALESESY_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,
    },

    /// Dashboard figures
    Overview {
        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Load everything and render one tab
    View {
        /// dashboard, companies, contacts, deals, tasks or settings
        #[arg(default_value_t = Tab::Dashboard)]
        tab: Tab,

        /// Company to select on the companies tab
        #[arg(long)]
        company: Option<String>,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Print version information
    Version,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "SALESESY_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Load demo data into an empty database before serving
    #[arg(long)]
    pub seed: bool,
}

/// Options shared by commands that read from a running API.
#[derive(Args, Debug, Clone)]
pub struct RemoteArgs {
    /// API base URL
    #[arg(long, env = "SALESESY_SERVER", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Show bundled demo data when the API cannot be reached
    #[arg(long)]
    pub demo_fallback: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
