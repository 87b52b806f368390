//! # referral-server
//!
//! The HTTP surface: the axum router, the auth gate that separates
//! unauthenticated/viewer/admin capabilities, the upload and read
//! endpoints, and the bind/serve/graceful-shutdown lifecycle.

#![deny(unsafe_code)]

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{ServerConfig, ServerHandle, build_router, start, start_with_state};
pub use state::AppState;
