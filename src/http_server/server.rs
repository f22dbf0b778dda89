//! # HTTP Server
//!
//! Serves the signed-transfer endpoint (local backend mode) and the
//! liveness probe.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{BackendKind, Config};
use crate::observability::Logger;
use crate::storage::{StorageError, StorageResult};

use super::transfer_routes::{status_routes, transfer_routes, TransferState};

/// HTTP server for the signed-transfer front door.
pub struct HttpServer {
    addr: String,
    router: Router,
}

impl HttpServer {
    /// Build the server from configuration.
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        Ok(Self {
            addr: config.socket_addr(),
            router: Self::build_router(config)?,
        })
    }

    fn build_router(config: &Config) -> StorageResult<Router> {
        let cors = if config.cors_origins.is_empty() {
            // permissive for development when no origins are configured
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|s| s.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(Any)
                .allow_headers(Any)
        };

        let kind = config
            .backend_kind()
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut router = status_routes();
        // the transfer endpoint only exists when signed URLs are locally
        // emulated; in s3 mode transfers go straight to the provider
        if kind == BackendKind::Local {
            let state = Arc::new(TransferState::from_config(config)?);
            router = router.merge(
                transfer_routes(state).layer(DefaultBodyLimit::max(config.max_payload_bytes)),
            );
        }

        Ok(router.layer(cors))
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> &str {
        &self.addr
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Bind and serve until the process exits.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.addr.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.addr, e),
            )
        })?;

        Logger::info("HTTP_SERVER_STARTED", &[("addr", &addr.to_string())]);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_config() -> Config {
        Config {
            local_secret_key: Some("server-test-secret".to_string()),
            ..Config::default()
        }
    }

    #[test]
    fn test_server_builds_for_local_backend() {
        let server = HttpServer::from_config(&local_config()).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:8090");
        let _router = server.router();
    }

    #[test]
    fn test_server_builds_for_s3_backend_without_secret() {
        let config = Config {
            backend: "s3".to_string(),
            s3_bucket: Some("uploads".to_string()),
            ..Config::default()
        };
        // no transfer endpoint in s3 mode, so no signing secret is needed
        let server = HttpServer::from_config(&config).unwrap();
        let _router = server.router();
    }

    #[test]
    fn test_server_honors_configured_port() {
        let config = Config {
            http_port: 8080,
            ..local_config()
        };
        let server = HttpServer::from_config(&config).unwrap();
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }
}
