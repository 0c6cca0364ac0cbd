use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the assistant service on a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Error)]
#[error("assistant service error: {message}")]
pub struct ApiException {
    pub message: String,
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            message: value.error,
        }
    }
}
