use serde::Serialize;
use utoipa::ToSchema;

/// Generic JSON error body for server-side failures. Never carries storage
/// detail; the original cause is logged server-side only.
#[derive(Debug, Serialize, ToSchema)]
pub struct ServerErrorResponse {
    /// Human-readable description of the failure
    message: String,
}

impl ServerErrorResponse {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}
