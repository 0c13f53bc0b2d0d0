pub mod cache;
pub mod handlers;
pub mod resume;
pub mod routes;
pub mod search;

pub use routes::create_router;

use serde::Serialize;

/// Standard error payload for all API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Standard success payload for endpoints with nothing else to say.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub message: String,
}
