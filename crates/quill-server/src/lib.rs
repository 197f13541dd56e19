//! HTTP surface: submit, streamed generation over SSE, and session
//! housekeeping endpoints.

pub mod encoder;
pub mod error;
pub mod handlers;
pub mod server;
pub mod upload;

pub use error::{ApiError, UploadError};
pub use handlers::AppState;
pub use server::{build_router, start, ServerConfig, ServerHandle};
