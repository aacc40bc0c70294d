//! Session lifecycle flows.
//!
//! This module provides:
//! - `CredentialExchange`: username/password login into the store
//! - `SessionValidator`: validate, and if needed refresh, the selected account
//! - `AccountLifecycle`: invalidate and remove accounts
//! - `AuthManager`: owns a provider and a store and runs the flows above
//!
//! Each flow borrows the store mutably for its whole run, so callers get
//! the "one operation at a time per store" discipline from the borrow checker.

pub mod exchange;
pub mod lifecycle;
pub mod validator;

pub use exchange::CredentialExchange;
pub use lifecycle::AccountLifecycle;
pub use validator::{SessionState, SessionValidationResult, SessionValidator};

use tracing::info;

use crate::credentials::{CredentialStore, SecretBackend};
use crate::error::{Result, SessionError};
use crate::provider::IdentityProvider;
use crate::store::{Account, AccountStore};

pub struct AuthManager<P: IdentityProvider> {
    provider: P,
    store: AccountStore,
}

impl<P: IdentityProvider> AuthManager<P> {
    pub fn new(provider: P, store: AccountStore) -> Self {
        Self { provider, store }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    /// Select another stored account and persist the choice
    pub fn select_account(&mut self, id: &str) -> Result<()> {
        self.store.select_account(id)?;
        self.store.persist()
    }

    pub async fn login(&mut self, identifier: &str, secret: &str) -> Result<Account> {
        CredentialExchange::new(&self.provider, &mut self.store)
            .login(identifier, secret)
            .await
    }

    pub async fn validate_selected(&mut self) -> Result<bool> {
        SessionValidator::new(&self.provider, &mut self.store)
            .validate_selected()
            .await
    }

    pub async fn ensure_valid(&mut self) -> Result<Account> {
        SessionValidator::new(&self.provider, &mut self.store)
            .ensure_valid()
            .await
    }

    /// Like `ensure_valid`, but when the token cannot be refreshed the
    /// account's remembered login is used to authenticate it again.
    pub async fn ensure_valid_or_relogin<B: SecretBackend>(
        &mut self,
        credentials: &CredentialStore<B>,
    ) -> Result<Account> {
        let id = match self.ensure_valid().await {
            Err(SessionError::RefreshFailed(id)) => id,
            other => return other,
        };
        let Some(login) = credentials.recall(&id)? else {
            return Err(SessionError::RefreshFailed(id));
        };

        info!(account = %id, "Refresh failed, logging in with remembered credentials");
        CredentialExchange::new(&self.provider, &mut self.store)
            .relogin(&id, &login.username, &login.password)
            .await
    }

    pub async fn remove_account(&mut self, id: &str) -> Result<Account> {
        AccountLifecycle::new(&self.provider, &mut self.store)
            .remove_account(id)
            .await
    }

    pub fn forget_account(&mut self, id: &str) -> Result<Account> {
        AccountLifecycle::new(&self.provider, &mut self.store).forget(id)
    }
}
