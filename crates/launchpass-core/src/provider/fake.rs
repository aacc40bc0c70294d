//! Scripted identity provider for session flow tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{IdentityProvider, ProviderError, RefreshedToken, RemoteIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Authenticate { identifier: String },
    Validate { access_token: String, client_token: Option<String> },
    Refresh { access_token: String, client_token: Option<String> },
    Invalidate { access_token: String, client_token: Option<String> },
}

/// Each operation answers from its own queue; an unscripted call panics.
#[derive(Default)]
pub(crate) struct FakeProvider {
    authenticate: Mutex<VecDeque<Result<RemoteIdentity, ProviderError>>>,
    validate: Mutex<VecDeque<Result<bool, ProviderError>>>,
    refresh: Mutex<VecDeque<Result<RefreshedToken, ProviderError>>>,
    invalidate: Mutex<VecDeque<Result<(), ProviderError>>>,
    calls: Mutex<Vec<Call>>,
}

pub(crate) fn identity(id: &str, name: &str, token: &str) -> RemoteIdentity {
    RemoteIdentity {
        id: id.to_string(),
        display_name: name.to_string(),
        access_token: token.to_string(),
    }
}

pub(crate) fn forbidden() -> ProviderError {
    ProviderError::Forbidden("Invalid token.".to_string())
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_authenticate(self, result: Result<RemoteIdentity, ProviderError>) -> Self {
        self.authenticate.lock().unwrap().push_back(result);
        self
    }

    pub fn on_validate(self, result: Result<bool, ProviderError>) -> Self {
        self.validate.lock().unwrap().push_back(result);
        self
    }

    pub fn on_refresh(self, result: Result<RefreshedToken, ProviderError>) -> Self {
        self.refresh.lock().unwrap().push_back(result);
        self
    }

    pub fn on_invalidate(self, result: Result<(), ProviderError>) -> Self {
        self.invalidate.lock().unwrap().push_back(result);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<T>>, op: &str) -> T {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected {} call", op))
    }
}

#[async_trait]
impl IdentityProvider for FakeProvider {
    fn provider_type(&self) -> &str {
        "fake"
    }

    async fn authenticate(
        &self,
        identifier: &str,
        _secret: &str,
    ) -> Result<RemoteIdentity, ProviderError> {
        self.record(Call::Authenticate {
            identifier: identifier.to_string(),
        });
        Self::next(&self.authenticate, "authenticate")
    }

    async fn validate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<bool, ProviderError> {
        self.record(Call::Validate {
            access_token: access_token.to_string(),
            client_token: client_token.map(str::to_string),
        });
        Self::next(&self.validate, "validate")
    }

    async fn refresh(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<RefreshedToken, ProviderError> {
        self.record(Call::Refresh {
            access_token: access_token.to_string(),
            client_token: client_token.map(str::to_string),
        });
        Self::next(&self.refresh, "refresh")
    }

    async fn invalidate(
        &self,
        access_token: &str,
        client_token: Option<&str>,
    ) -> Result<(), ProviderError> {
        self.record(Call::Invalidate {
            access_token: access_token.to_string(),
            client_token: client_token.map(str::to_string),
        });
        Self::next(&self.invalidate, "invalidate")
    }
}
