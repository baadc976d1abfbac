//! Print shell completion scripts.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, shells, Generator};

use crate::cli::{Cli, Shell};
use crate::error::Result;

const BIN_NAME: &str = "salesesy";

fn write_script<G: Generator>(generator: G) {
    let mut cmd = Cli::command();
    generate(generator, &mut cmd, BIN_NAME, &mut io::stdout());
}

/// Write the completion script for `shell` to stdout.
pub fn execute(shell: Shell) -> Result<()> {
    match shell {
        Shell::Bash => write_script(shells::Bash),
        Shell::Zsh => write_script(shells::Zsh),
        Shell::Fish => write_script(shells::Fish),
        Shell::PowerShell => write_script(shells::PowerShell),
        Shell::Elvish => write_script(shells::Elvish),
    }
    Ok(())
}
