use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::provider::IdentityProvider;
use crate::store::{Account, AccountStore, ClientToken};

/// Account removal, with or without revoking the token server side.
pub struct AccountLifecycle<'a, P: IdentityProvider + ?Sized> {
    provider: &'a P,
    store: &'a mut AccountStore,
}

impl<'a, P: IdentityProvider + ?Sized> AccountLifecycle<'a, P> {
    pub fn new(provider: &'a P, store: &'a mut AccountStore) -> Self {
        Self { provider, store }
    }

    /// Invalidate the account's access token, then remove it locally.
    /// If invalidation fails the account stays in the store.
    pub async fn remove_account(self, id: &str) -> Result<Account> {
        let access_token = self.store.get_account(id)?.access_token.clone();
        let client_token = self.store.client_token().map(ClientToken::as_str);

        if let Err(e) = self.provider.invalidate(&access_token, client_token).await {
            warn!(account = %id, error = %e, "Failed to invalidate access token, account kept");
            return Err(SessionError::from_provider(e));
        }

        let removed = self.store.remove_account(id)?;
        self.store.persist()?;
        info!(account = %id, "Account removed");
        Ok(removed)
    }

    /// Remove the account locally without contacting the auth server.
    /// The access token stays valid server side until it expires.
    pub fn forget(self, id: &str) -> Result<Account> {
        let removed = self.store.remove_account(id)?;
        self.store.persist()?;
        info!(account = %id, "Account forgotten without invalidation");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::{Call, FakeProvider};
    use crate::provider::ProviderError;

    fn store_with_two() -> AccountStore {
        let mut store = AccountStore::in_memory();
        store.add_account("u1", "Alice", "tok1", "provider-x");
        store.add_account("u2", "Bob", "tok2", "provider-x");
        store.set_client_token(ClientToken::new("u1"));
        store
    }

    #[tokio::test]
    async fn test_remove_invalidates_then_removes() {
        let provider = FakeProvider::new().on_invalidate(Ok(()));
        let mut store = store_with_two();

        let removed = AccountLifecycle::new(&provider, &mut store)
            .remove_account("u1")
            .await
            .unwrap();

        assert_eq!(removed.id, "u1");
        assert!(store.get_account("u1").is_err());
        assert_eq!(store.selected_id(), Some("u2"));
        assert_eq!(
            provider.calls(),
            vec![Call::Invalidate {
                access_token: "tok1".to_string(),
                client_token: Some("u1".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_failed_invalidation_keeps_account() {
        let provider = FakeProvider::new()
            .on_invalidate(Err(ProviderError::ServiceUnavailable("503".to_string())));
        let mut store = store_with_two();

        let err = AccountLifecycle::new(&provider, &mut store)
            .remove_account("u1")
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::ProviderUnavailable(_)));
        assert!(store.get_account("u1").is_ok());
        assert_eq!(store.selected_id(), Some("u1"));
    }

    #[tokio::test]
    async fn test_remove_unknown_account() {
        let provider = FakeProvider::new();
        let mut store = store_with_two();

        let err = AccountLifecycle::new(&provider, &mut store)
            .remove_account("nope")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let mut store = AccountStore::load(&path).unwrap();
        store.add_account("u1", "Alice", "tok1", "provider-x");
        store.persist().unwrap();

        let provider = FakeProvider::new().on_invalidate(Ok(()));
        AccountLifecycle::new(&provider, &mut store)
            .remove_account("u1")
            .await
            .unwrap();

        let reloaded = AccountStore::load(&path).unwrap();
        assert!(reloaded.is_empty());
        assert!(reloaded.selected_id().is_none());
    }

    #[test]
    fn test_forget_skips_auth_server() {
        let provider = FakeProvider::new();
        let mut store = store_with_two();

        AccountLifecycle::new(&provider, &mut store).forget("u2").unwrap();
        assert!(store.get_account("u2").is_err());
        assert_eq!(store.selected_id(), Some("u1"));
        assert!(provider.calls().is_empty());
    }
}
