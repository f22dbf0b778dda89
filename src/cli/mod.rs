//! CLI module for blobgate
//!
//! - init: write a starter configuration
//! - start: boot the storage backend and serve

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, start};
pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    match cli.command {
        Command::Init { config } => commands::init(&config),
        Command::Start { config } => commands::start(&config),
    }
}
