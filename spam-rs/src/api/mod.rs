//! REST API module for spam-rs
//!
//! Provides HTTP endpoints for classification, history and statistics

pub mod handlers;
pub mod server;

pub use handlers::{ApiResponse, AppState};
pub use server::{router, ApiServer};
