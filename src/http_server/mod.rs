//! # HTTP Server Module
//!
//! Front door for the locally emulated signed-URL protocol.
//!
//! # Endpoints
//!
//! - `PUT /upload` - write an object, token-authorized
//! - `GET /download` - read an object, token-authorized
//! - `GET /status` - liveness probe

pub mod server;
pub mod transfer_routes;

pub use server::HttpServer;
pub use transfer_routes::{status_routes, transfer_routes, TransferState};
