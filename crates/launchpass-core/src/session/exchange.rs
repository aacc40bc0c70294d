use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::provider::{IdentityProvider, RemoteIdentity};
use crate::store::{Account, AccountStore, ClientToken};

/// Turns a username/password pair into a stored account.
pub struct CredentialExchange<'a, P: IdentityProvider + ?Sized> {
    provider: &'a P,
    store: &'a mut AccountStore,
}

impl<'a, P: IdentityProvider + ?Sized> CredentialExchange<'a, P> {
    pub fn new(provider: &'a P, store: &'a mut AccountStore) -> Self {
        Self { provider, store }
    }

    /// Authenticate and store the resulting account. The store is only
    /// persisted when authentication succeeds.
    pub async fn login(self, identifier: &str, secret: &str) -> Result<Account> {
        let identity = self.authenticate(identifier, secret).await?;
        self.store_identity(identity)
    }

    /// Log in again for an account already in the store. Nothing is stored
    /// if the server answers with a different account.
    pub async fn relogin(
        self,
        account_id: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<Account> {
        let identity = self.authenticate(identifier, secret).await?;
        if identity.id != account_id {
            warn!(
                expected = %account_id,
                actual = %identity.id,
                "Re-login returned another account"
            );
            return Err(SessionError::AccountMismatch {
                expected: account_id.to_string(),
                actual: identity.id,
            });
        }
        self.store_identity(identity)
    }

    async fn authenticate(&self, identifier: &str, secret: &str) -> Result<RemoteIdentity> {
        self.provider
            .authenticate(identifier, secret)
            .await
            .map_err(|e| {
                warn!(classification = e.classification(), error = %e, "Login rejected");
                SessionError::Authentication(e)
            })
    }

    fn store_identity(self, identity: RemoteIdentity) -> Result<Account> {
        let account = self.store.add_account(
            &identity.id,
            &identity.display_name,
            &identity.access_token,
            self.provider.provider_type(),
        );

        // The installation's client token is taken from the first account to log in
        if self.store.client_token().is_none() {
            self.store.set_client_token(ClientToken::new(identity.id.as_str()));
        }

        self.store.persist()?;
        info!(account = %account.id, name = %account.display_name, "Login successful");
        Ok(account)
    }
}
