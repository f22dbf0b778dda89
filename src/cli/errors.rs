//! CLI error types
//!
//! Every CLI error is fatal; codes are stable for scripting.

use std::io;

use thiserror::Error;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("BLOBGATE_CONFIG_ERROR: {0}")]
    Config(String),

    #[error("BLOBGATE_IO_ERROR: {0}")]
    Io(String),

    #[error("BLOBGATE_ALREADY_INITIALIZED: configuration already exists at {0}")]
    AlreadyInitialized(String),

    #[error("BLOBGATE_BOOT_FAILED: {0}")]
    BootFailed(String),
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_carry_code_prefix() {
        let err = CliError::Config("bad json".to_string());
        assert!(err.to_string().starts_with("BLOBGATE_CONFIG_ERROR"));

        let err = CliError::AlreadyInitialized("./blobgate.json".to_string());
        assert!(err.to_string().starts_with("BLOBGATE_ALREADY_INITIALIZED"));
    }
}
