use super::common::ApiErrorDetails;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError {
        status: u16,
        message: String,
        #[source]
        details: Option<Box<ApiErrorDetails>>,
    },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Too many requests, rate limited")]
    RateLimited,

    #[error("Service unavailable, retry later")]
    ServiceUnavailable,

    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }

    /// Per-field messages from a validation failure, if the gateway sent any
    pub fn field_errors(&self) -> Vec<(String, Vec<String>)> {
        match self {
            ApiError::ApiError {
                details: Some(details),
                ..
            } => {
                let mut fields: Vec<_> = details
                    .field_errors
                    .iter()
                    .map(|(field, messages)| (field.clone(), messages.clone()))
                    .collect();
                fields.sort();
                fields
            }
            _ => Vec::new(),
        }
    }
}
