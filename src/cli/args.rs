//! CLI argument definitions using clap
//!
//! Commands:
//! - blobgate init --config <path>
//! - blobgate start --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// blobgate - pluggable object storage with signed transfer URLs
#[derive(Parser, Debug)]
#[command(name = "blobgate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a starter configuration with a freshly generated signing secret
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./blobgate.json")]
        config: PathBuf,
    },

    /// Validate configuration, build the storage backend, and serve
    Start {
        /// Path to configuration file
        #[arg(long, default_value = "./blobgate.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
