//! # Observability
//!
//! Structured JSON logging for storage and transfer events.

mod logger;

pub use logger::{Logger, Severity};
