use serde::Deserialize;
use thiserror::Error;

/// Classification the auth server uses for rejected tokens and bad credentials
pub const FORBIDDEN_OPERATION: &str = "ForbiddenOperationException";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Forbidden operation: {0}")]
    Forbidden(String),

    #[error("Request rejected ({classification}): {message}")]
    Rejected {
        classification: String,
        message: String,
    },

    #[error("Auth server unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Error document returned by Yggdrasil-style auth servers
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

impl ProviderError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        if status.is_server_error() {
            return ProviderError::ServiceUnavailable(format!(
                "Status {}: {}",
                status,
                Self::truncate_body(body)
            ));
        }

        if let Ok(ErrorBody {
            error: Some(classification),
            error_message,
        }) = serde_json::from_str::<ErrorBody>(body)
        {
            let message = error_message.unwrap_or_else(|| status.to_string());
            return if classification == FORBIDDEN_OPERATION {
                ProviderError::Forbidden(message)
            } else {
                ProviderError::Rejected {
                    classification,
                    message,
                }
            };
        }

        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            401 | 403 => ProviderError::Forbidden(truncated),
            429 => ProviderError::Rejected {
                classification: "TooManyRequests".to_string(),
                message: truncated,
            },
            _ => ProviderError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// The provider-defined classification string for this error
    pub fn classification(&self) -> &str {
        match self {
            ProviderError::Forbidden(_) => FORBIDDEN_OPERATION,
            ProviderError::Rejected { classification, .. } => classification,
            ProviderError::ServiceUnavailable(_) => "ServiceUnavailable",
            ProviderError::NetworkError(_) => "NetworkError",
            ProviderError::InvalidResponse(_) => "InvalidResponse",
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, ProviderError::Forbidden(_))
    }

    /// Transport-level failure: the server could not be reached or is down
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            ProviderError::ServiceUnavailable(_) | ProviderError::NetworkError(_)
        )
    }
}
