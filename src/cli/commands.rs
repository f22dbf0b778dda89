//! CLI command implementations

use std::fs;
use std::path::Path;

use rand::rngs::OsRng;
use rand::RngCore;

use crate::config::Config;
use crate::http_server::HttpServer;
use crate::storage::StorageService;

use super::errors::{CliError, CliResult};

/// Generate a fresh 256-bit signing secret, hex-encoded.
fn generate_secret() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write a starter configuration file with a generated signing secret.
pub fn init(path: &Path) -> CliResult<()> {
    if path.exists() {
        return Err(CliError::AlreadyInitialized(path.display().to_string()));
    }

    let config = Config {
        local_secret_key: Some(generate_secret()),
        ..Config::default()
    };
    let content = serde_json::to_string_pretty(&config)
        .map_err(|e| CliError::Io(format!("JSON error: {}", e)))?;
    fs::write(path, content)?;

    println!("Wrote starter configuration to {}", path.display());
    Ok(())
}

/// Boot sequence: load and validate the configuration, build the storage
/// facade (fails fast on backend misconfiguration), then serve.
pub fn start(path: &Path) -> CliResult<()> {
    let config = Config::load(path).map_err(|e| CliError::Config(e.to_string()))?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::BootFailed(e.to_string()))?;
    runtime.block_on(async {
        let _service = StorageService::from_config(&config)
            .await
            .map_err(|e| CliError::BootFailed(e.to_string()))?;

        let server =
            HttpServer::from_config(&config).map_err(|e| CliError::BootFailed(e.to_string()))?;
        println!("Starting blobgate on {}", config.socket_addr());
        println!("Status probe: http://{}/status", config.socket_addr());

        server
            .start()
            .await
            .map_err(|e| CliError::BootFailed(e.to_string()))
    })
}
