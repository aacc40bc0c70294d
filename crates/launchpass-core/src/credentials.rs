//! OS keychain storage for remembered logins.
//!
//! A remembered login is the identifier and password an account was created
//! with, stored under the account id. It lets a session whose token can no
//! longer be refreshed log in again without prompting.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const SERVICE_NAME: &str = "launchpass";

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Keychain error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Stored login is unreadable: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Where secrets are kept, keyed by account id
pub trait SecretBackend: Send + Sync {
    fn set(&self, key: &str, secret: &str) -> Result<(), CredentialError>;

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError>;

    /// Deleting a missing key is not an error
    fn delete(&self, key: &str) -> Result<(), CredentialError>;
}

/// Platform keychain (macOS Keychain, Windows Credential Manager, Secret Service)
#[derive(Debug, Clone)]
pub struct KeyringBackend {
    service: String,
}

impl KeyringBackend {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringBackend {
    fn default() -> Self {
        Self::new(SERVICE_NAME)
    }
}

impl SecretBackend for KeyringBackend {
    fn set(&self, key: &str, secret: &str) -> Result<(), CredentialError> {
        keyring::Entry::new(&self.service, key)?.set_password(secret)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, CredentialError> {
        match keyring::Entry::new(&self.service, key)?.get_password() {
            Ok(secret) => Ok(Some(secret)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<(), CredentialError> {
        match keyring::Entry::new(&self.service, key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Login identifier and password an account was created with
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedLogin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RememberedLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RememberedLogin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore<B: SecretBackend = KeyringBackend> {
    backend: B,
}

impl<B: SecretBackend> CredentialStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn remember(
        &self,
        account_id: &str,
        username: &str,
        password: &str,
    ) -> Result<(), CredentialError> {
        let login = RememberedLogin {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.backend.set(account_id, &serde_json::to_string(&login)?)?;
        debug!(account = %account_id, "Login remembered");
        Ok(())
    }

    pub fn recall(&self, account_id: &str) -> Result<Option<RememberedLogin>, CredentialError> {
        match self.backend.get(account_id)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn forget(&self, account_id: &str) -> Result<(), CredentialError> {
        self.backend.delete(account_id)?;
        debug!(account = %account_id, "Remembered login deleted");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::memory::MemoryBackend;
    use super::*;

    #[test]
    fn test_remember_recall_forget() {
        let credentials = CredentialStore::new(MemoryBackend::default());
        assert!(credentials.recall("u1").unwrap().is_none());

        credentials
            .remember("u1", "alice@example.org", "hunter2")
            .unwrap();
        let login = credentials.recall("u1").unwrap().unwrap();
        assert_eq!(login.username, "alice@example.org");
        assert_eq!(login.password, "hunter2");

        credentials.forget("u1").unwrap();
        assert!(credentials.recall("u1").unwrap().is_none());
        // Already gone
        credentials.forget("u1").unwrap();
    }

    #[test]
    fn test_logins_are_kept_per_account() {
        let credentials = CredentialStore::new(MemoryBackend::default());
        credentials.remember("u1", "alice", "pw-a").unwrap();
        credentials.remember("u2", "bob", "pw-b").unwrap();

        assert_eq!(credentials.recall("u1").unwrap().unwrap().username, "alice");
        assert_eq!(credentials.recall("u2").unwrap().unwrap().username, "bob");
    }

    #[test]
    fn test_malformed_secret() {
        let backend = MemoryBackend::default();
        backend.set("u1", "plain password").unwrap();
        let credentials = CredentialStore::new(backend);
        assert!(matches!(
            credentials.recall("u1"),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_redacts_password() {
        let login = RememberedLogin {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{:?}", login).contains("hunter2"));
    }

    // Needs a platform keychain; run with `--ignored` on a desktop session
    #[test]
    #[ignore]
    fn test_keyring_round_trip() {
        let credentials = CredentialStore::new(KeyringBackend::new("launchpass-test"));
        credentials.remember("u-test", "alice", "hunter2").unwrap();

        let fresh = CredentialStore::new(KeyringBackend::new("launchpass-test"));
        let login = fresh.recall("u-test").unwrap().unwrap();
        assert_eq!(login.password, "hunter2");

        fresh.forget("u-test").unwrap();
        assert!(credentials.recall("u-test").unwrap().is_none());
    }
}
