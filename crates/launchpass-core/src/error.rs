use std::path::PathBuf;

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::provider::ProviderError;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Authentication failed: {0}")]
    Authentication(#[source] ProviderError),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("No account is selected")]
    NoSelectedAccount,

    #[error("Identity provider unavailable: {0}")]
    ProviderUnavailable(#[source] ProviderError),

    #[error("Identity provider error: {0}")]
    Provider(#[source] ProviderError),

    #[error("Access token for account {0} could not be refreshed - login required")]
    RefreshFailed(String),

    #[error("Account store I/O failed at {}: {}", .path.display(), .source)]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Account store is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("Account store could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Logged in as {actual} while re-authenticating {expected}")]
    AccountMismatch { expected: String, actual: String },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl SessionError {
    /// Wrap an error from a validate/refresh/invalidate call, splitting
    /// transport failures (retryable by the caller) from provider rejections.
    pub fn from_provider(err: ProviderError) -> Self {
        if err.is_unavailable() {
            SessionError::ProviderUnavailable(err)
        } else {
            SessionError::Provider(err)
        }
    }

    /// Provider classification string, when the error came from the provider
    pub fn classification(&self) -> Option<&str> {
        match self {
            SessionError::Authentication(e)
            | SessionError::ProviderUnavailable(e)
            | SessionError::Provider(e) => Some(e.classification()),
            _ => None,
        }
    }

    /// True when the caller should send the user back to the login form
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            SessionError::RefreshFailed(_) | SessionError::NoSelectedAccount
        )
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SessionError::Storage {
            path: path.into(),
            source,
        }
    }
}
