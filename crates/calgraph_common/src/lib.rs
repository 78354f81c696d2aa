// --- File: crates/calgraph_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Calendar data structures
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    auth_error, config_error, external_service_error, internal_error, validation_error,
    CalgraphError, Context,
};

// Re-export HTTP utilities for easier access
pub use http::client::create_client;

// Re-export logging utilities for easier access
pub use logging::{init, init_with_level, log_error, log_result};

// This crate provides functionality shared by the Graph client and the console.
