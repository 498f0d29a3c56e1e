//! API error types.

use thiserror::Error;

/// HTTP status the relayer uses for an expired or missing session.
pub const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Too many authentication retries ({attempts} attempts)")]
    TooManyAuthRetries { attempts: u32 },

    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status code, if the relayer answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for a 401 answer, the only case the auth wrapper retries.
    pub fn is_auth_expired(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
