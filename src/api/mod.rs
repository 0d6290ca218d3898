/// HTTP API module
///
/// This module talks to the two remote endpoints:
/// - Wire types for the JSON bodies (types.rs)
/// - The error taxonomy shared by both calls (error.rs)
/// - The reqwest client: predict upload, recommendation fetch (client.rs)

pub mod client;
pub mod error;
pub mod types;

pub use client::{with_min_duration, ApiClient};
pub use error::ApiError;
