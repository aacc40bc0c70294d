//! Identity provider seam.
//!
//! The session flows only talk to an auth server through `IdentityProvider`.
//! `YggdrasilClient` implements it over HTTP; tests use a scripted fake.

pub mod error;
pub mod yggdrasil;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

pub use error::{ProviderError, FORBIDDEN_OPERATION};
pub use yggdrasil::YggdrasilClient;

/// Identity returned by a successful `authenticate`
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteIdentity {
    pub id: String,
    pub display_name: String,
    pub access_token: String,
}

impl std::fmt::Debug for RemoteIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteIdentity")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// New access token returned by a successful `refresh`
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshedToken {
    pub access_token: String,
}

impl std::fmt::Debug for RefreshedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshedToken")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Tag stored as the account `type`, e.g. "yggdrasil"
    fn provider_type(&self) -> &str;

    async fn authenticate(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<RemoteIdentity, ProviderError>;

    /// Ok(false) means the server answered and the token is no longer usable
    async fn validate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<bool, ProviderError>;

    async fn refresh(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<RefreshedToken, ProviderError>;

    async fn invalidate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<(), ProviderError>;
}
