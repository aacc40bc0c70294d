use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::provider::IdentityProvider;
use crate::store::{Account, AccountStore, ClientToken};

/// Outcome of one validation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionValidationResult {
    Valid,
    RefreshedValid,
    Invalid,
}

impl SessionValidationResult {
    /// True when the selected account can be used without a new login
    pub fn is_usable(self) -> bool {
        !matches!(self, SessionValidationResult::Invalid)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unchecked,
    Valid,
    Refreshing,
    RefreshedValid,
    Invalid,
}

impl From<SessionValidationResult> for SessionState {
    fn from(result: SessionValidationResult) -> Self {
        match result {
            SessionValidationResult::Valid => SessionState::Valid,
            SessionValidationResult::RefreshedValid => SessionState::RefreshedValid,
            SessionValidationResult::Invalid => SessionState::Invalid,
        }
    }
}

/// Checks the selected account's access token and refreshes it when the
/// server no longer accepts it.
///
/// One call is one `validate` and at most one `refresh`; nothing is retried.
pub struct SessionValidator<'a, P: IdentityProvider + ?Sized> {
    provider: &'a P,
    store: &'a mut AccountStore,
    state: SessionState,
}

impl<'a, P: IdentityProvider + ?Sized> SessionValidator<'a, P> {
    pub fn new(provider: &'a P, store: &'a mut AccountStore) -> Self {
        Self {
            provider,
            store,
            state: SessionState::Unchecked,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn validate_selected(&mut self) -> Result<bool> {
        Ok(self.validate_selected_detailed().await?.is_usable())
    }

    /// Validate, refreshing if needed, and return the selected account or
    /// `RefreshFailed` when a new login is required.
    pub async fn ensure_valid(&mut self) -> Result<Account> {
        let result = self.validate_selected_detailed().await?;
        let account = self.store.get_selected().ok_or(SessionError::NoSelectedAccount)?;
        if result.is_usable() {
            Ok(account.clone())
        } else {
            Err(SessionError::RefreshFailed(account.id.clone()))
        }
    }

    pub async fn validate_selected_detailed(&mut self) -> Result<SessionValidationResult> {
        self.state = SessionState::Unchecked;

        let (id, access_token) = match self.store.get_selected() {
            Some(account) => (account.id.clone(), account.access_token.clone()),
            None => return Err(SessionError::NoSelectedAccount),
        };
        let client_token = self.store.client_token().map(ClientToken::as_str).map(str::to_string);

        let valid = self
            .provider
            .validate(&access_token, client_token.as_deref())
            .await
            .map_err(SessionError::from_provider)?;

        if valid {
            info!(account = %id, "Account access token validated");
            return Ok(self.finish(SessionValidationResult::Valid));
        }

        self.state = SessionState::Refreshing;
        debug!(account = %id, "Access token rejected, refreshing");

        match self
            .provider
            .refresh(&access_token, client_token.as_deref())
            .await
        {
            Ok(refreshed) => {
                self.store.update_access_token(&id, &refreshed.access_token)?;
                self.store.persist()?;
                info!(account = %id, "Account access token refreshed");
                Ok(self.finish(SessionValidationResult::RefreshedValid))
            }
            Err(e) => {
                debug!(account = %id, error = %e, "Refresh of selected account failed");
                if e.is_forbidden() {
                    // No separate recovery for a forbidden refresh; the account stays
                    warn!(
                        account = %id,
                        classification = e.classification(),
                        "Refresh forbidden by auth server"
                    );
                }
                info!(account = %id, "Account access token is not valid");
                Ok(self.finish(SessionValidationResult::Invalid))
            }
        }
    }

    fn finish(&mut self, result: SessionValidationResult) -> SessionValidationResult {
        self.state = result.into();
        result
    }
}
