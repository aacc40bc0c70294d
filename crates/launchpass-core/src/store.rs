//! Persisted account database.
//!
//! Holds every logged-in account keyed by id, the selected account and the
//! installation's client token. Mutations only touch memory; callers run
//! `persist()` after each one that must survive a restart.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, SessionError};

/// Suffix for the scratch file written before the atomic rename
const TEMP_SUFFIX: &str = "tmp";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub display_name: String,
    pub access_token: String,
    /// Which identity provider issued the account
    #[serde(rename = "type")]
    pub provider_type: String,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("access_token", &"<redacted>")
            .field("provider_type", &self.provider_type)
            .finish()
    }
}

/// Installation-scoped token sent alongside access tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientToken(String);

impl ClientToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreData {
    #[serde(default)]
    authentication_database: BTreeMap<String, Account>,
    #[serde(default)]
    selected_account: Option<String>,
    #[serde(default)]
    client_token: Option<ClientToken>,
}

#[derive(Debug)]
pub struct AccountStore {
    path: Option<PathBuf>,
    data: StoreData,
}

impl AccountStore {
    /// Store that is never written to disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: StoreData::default(),
        }
    }

    /// Load the store at `path`, starting empty if the file does not exist yet
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents =
                std::fs::read_to_string(&path).map_err(|e| SessionError::storage(&path, e))?;
            serde_json::from_str(&contents).map_err(SessionError::Corrupt)?
        } else {
            debug!(path = %path.display(), "No account store yet, starting empty");
            StoreData::default()
        };

        let mut store = Self {
            path: Some(path),
            data,
        };
        store.repair_selection();
        debug!(
            accounts = store.data.authentication_database.len(),
            selected = ?store.data.selected_account,
            "Account store loaded"
        );
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.authentication_database.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.authentication_database.is_empty()
    }

    /// Insert or overwrite the account for `id`. The first account in an
    /// empty store becomes selected; otherwise selection is untouched.
    pub fn add_account(
        &mut self,
        id: &str,
        display_name: &str,
        access_token: &str,
        provider_type: &str,
    ) -> Account {
        let account = Account {
            id: id.to_string(),
            display_name: display_name.to_string(),
            access_token: access_token.to_string(),
            provider_type: provider_type.to_string(),
        };

        let was_empty = self.is_empty();
        self.data
            .authentication_database
            .insert(id.to_string(), account.clone());

        if was_empty {
            self.data.selected_account = Some(id.to_string());
        }
        debug!(account = %id, selected = was_empty, "Account added");
        account
    }

    pub fn get_account(&self, id: &str) -> Result<&Account> {
        self.data
            .authentication_database
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    /// All accounts, ordered by id
    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.data.authentication_database.values()
    }

    /// Remove the account for `id`. If it was selected, another remaining
    /// account is selected, or none if the store is now empty.
    pub fn remove_account(&mut self, id: &str) -> Result<Account> {
        let removed = self
            .data
            .authentication_database
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;

        if self.data.selected_account.as_deref() == Some(id) {
            self.data.selected_account = self.data.authentication_database.keys().next().cloned();
            debug!(
                account = %id,
                selected = ?self.data.selected_account,
                "Selected account removed"
            );
        } else {
            debug!(account = %id, "Account removed");
        }
        Ok(removed)
    }

    pub fn update_access_token(&mut self, id: &str, access_token: &str) -> Result<()> {
        let account = self
            .data
            .authentication_database
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        account.access_token = access_token.to_string();
        Ok(())
    }

    pub fn get_selected(&self) -> Option<&Account> {
        self.data
            .selected_account
            .as_deref()
            .and_then(|id| self.data.authentication_database.get(id))
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.data.selected_account.as_deref()
    }

    pub fn select_account(&mut self, id: &str) -> Result<()> {
        if !self.data.authentication_database.contains_key(id) {
            return Err(SessionError::NotFound(id.to_string()));
        }
        self.data.selected_account = Some(id.to_string());
        Ok(())
    }

    pub fn client_token(&self) -> Option<&ClientToken> {
        self.data.client_token.as_ref()
    }

    /// Set the client token once. Later calls are ignored until
    /// `reset_client_token`.
    pub fn set_client_token(&mut self, token: ClientToken) {
        if self.data.client_token.is_some() {
            debug!("Client token already set, keeping existing value");
            return;
        }
        self.data.client_token = Some(token);
    }

    pub fn reset_client_token(&mut self) {
        self.data.client_token = None;
    }

    /// Write the store to disk via a temp file and rename.
    /// In-memory stores are left alone.
    pub fn persist(&self) -> Result<()> {
        let Some(ref path) = self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::storage(parent, e))?;
        }

        let contents = serde_json::to_string_pretty(&self.data).map_err(SessionError::Encode)?;
        let temp_path = path.with_extension(TEMP_SUFFIX);
        std::fs::write(&temp_path, contents).map_err(|e| SessionError::storage(&temp_path, e))?;
        std::fs::rename(&temp_path, path).map_err(|e| SessionError::storage(path, e))?;

        debug!(path = %path.display(), "Account store persisted");
        Ok(())
    }

    /// A selection pointing at a missing account is moved to a remaining one
    fn repair_selection(&mut self) {
        let dangling = match self.data.selected_account.as_deref() {
            Some(id) => !self.data.authentication_database.contains_key(id),
            None => !self.is_empty(),
        };
        if dangling {
            let replacement = self.data.authentication_database.keys().next().cloned();
            warn!(
                stale = ?self.data.selected_account,
                selected = ?replacement,
                "Selected account missing from store, reassigning"
            );
            self.data.selected_account = replacement;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
