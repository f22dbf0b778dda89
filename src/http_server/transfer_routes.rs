//! Signed-Transfer Endpoint
//!
//! Makes the local backend's signed URLs resolvable. Each request carries
//! `filename`, `expiry`, `signature`, and `contentType` query parameters;
//! the token is re-derived and checked against the signing secret before
//! any I/O happens. Every request is validated independently; there is no
//! retry logic here.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::observability::Logger;
use crate::signing::SignedToken;
use crate::storage::local::{sanitize_object_path, LocalBackend, DEFAULT_CONTENT_TYPE};
use crate::storage::{ObjectBackend, SaveOptions, StorageError, StorageResult};

// ==================
// Shared State
// ==================

/// Transfer state shared across handlers.
///
/// Nothing here is mutable after startup, so requests run concurrently
/// without locking.
#[derive(Debug)]
pub struct TransferState {
    store: LocalBackend,
}

impl TransferState {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        Ok(Self {
            store: LocalBackend::from_config(config)?,
        })
    }
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Deserialize)]
pub struct TransferParams {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, rename = "contentType")]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
}

type Rejection = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: impl Into<String>) -> Rejection {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: status.as_u16(),
        }),
    )
}

/// Single message for both expiry and MAC failures; the response must not
/// reveal which check failed or whether the object exists.
const FORBIDDEN_MESSAGE: &str = "Invalid or expired signature";

fn storage_rejection(err: &StorageError) -> Rejection {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match err {
        StorageError::UrlExpired | StorageError::InvalidSignature => {
            reject(status, FORBIDDEN_MESSAGE)
        }
        _ => reject(status, err.to_string()),
    }
}

// ==================
// Routes
// ==================

/// Liveness probe, mounted in every backend mode.
pub fn status_routes() -> Router {
    Router::new().route("/status", get(status_handler))
}

/// Transfer routes, mounted only when signed URLs are locally emulated.
pub fn transfer_routes(state: Arc<TransferState>) -> Router {
    Router::new()
        .route("/upload", put(upload_handler))
        .route("/download", get(download_handler))
        .with_state(state)
}

// ==================
// Handlers
// ==================

/// Extract and check the signed token. Runs before any I/O: missing
/// parameters reject with 400, authorization failures with 403.
fn authorize(
    state: &TransferState,
    params: &TransferParams,
    headers: &HeaderMap,
) -> Result<SignedToken, Rejection> {
    let (Some(filename), Some(expiry), Some(signature)) = (
        params.filename.as_deref(),
        params.expiry.as_deref(),
        params.signature.as_deref(),
    ) else {
        return Err(storage_rejection(&StorageError::MissingParameter));
    };

    let expiry: i64 = expiry
        .parse()
        .map_err(|_| storage_rejection(&StorageError::MalformedExpiry(expiry.to_string())))?;

    let content_type = params
        .content_type
        .clone()
        .or_else(|| {
            headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    if let Err(e) = sanitize_object_path(filename) {
        return Err(storage_rejection(&e));
    }

    let token = SignedToken {
        path: filename.to_string(),
        expiry,
        content_type,
        signature: signature.to_string(),
    };
    state
        .store
        .signer()
        .check(&token)
        .map_err(|e| storage_rejection(&e))?;

    Ok(token)
}

async fn upload_handler(
    State(state): State<Arc<TransferState>>,
    Query(params): Query<TransferParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, Rejection> {
    let token = authorize(&state, &params, &headers)?;

    let options = SaveOptions {
        content_type: Some(token.content_type.clone()),
        timeout: None,
    };
    state.store.save(&token.path, &body, &options).await.map_err(|e| {
        Logger::error(
            "UPLOAD_FAILED",
            &[("path", token.path.as_str()), ("error", &e.to_string())],
        );
        storage_rejection(&e)
    })?;

    Logger::info(
        "UPLOAD_COMPLETE",
        &[("path", token.path.as_str()), ("bytes", &body.len().to_string())],
    );
    Ok(Json(MessageResponse {
        message: "File uploaded successfully".to_string(),
    }))
}

async fn download_handler(
    State(state): State<Arc<TransferState>>,
    Query(params): Query<TransferParams>,
    headers: HeaderMap,
) -> Result<(StatusCode, HeaderMap, Bytes), Rejection> {
    let token = authorize(&state, &params, &headers)?;

    // not-found is only reachable once authorization has passed
    let data = state.store.download(&token.path).await.map_err(|e| {
        Logger::error(
            "DOWNLOAD_FAILED",
            &[("path", token.path.as_str()), ("error", &e.to_string())],
        );
        storage_rejection(&e)
    })?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        token
            .content_type
            .parse()
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
    );

    Logger::info(
        "DOWNLOAD_COMPLETE",
        &[("path", token.path.as_str()), ("bytes", &data.len().to_string())],
    );
    Ok((StatusCode::OK, response_headers, Bytes::from(data)))
}

async fn status_handler() -> impl IntoResponse {
    let response = StatusResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    (StatusCode::OK, Json(response))
}
