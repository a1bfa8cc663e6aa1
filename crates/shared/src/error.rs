use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error code Discord answers with when the handshake names an unknown client id.
pub const INVALID_CLIENT_ID: i64 = 4000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_invalid_client_id(&self) -> bool {
        self.code == INVALID_CLIENT_ID
    }
}

#[derive(Debug, Error)]
#[error("ipc error {code}: {message}")]
pub struct ApiException {
    pub code: i64,
    pub message: String,
}

impl From<ApiError> for ApiException {
    fn from(value: ApiError) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}

impl From<ApiException> for ApiError {
    fn from(value: ApiException) -> Self {
        Self {
            code: value.code,
            message: value.message,
        }
    }
}
