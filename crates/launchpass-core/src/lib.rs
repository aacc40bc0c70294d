//! launchpass core - account sessions for a game launcher.
//!
//! This crate provides:
//! - `AccountStore`: persisted accounts, the selected account and the client token
//! - `IdentityProvider`: the remote auth server seam, with `YggdrasilClient` as
//!   the HTTP implementation
//! - `session`: login, validation/refresh and removal flows over a store
//! - `Config` and `CredentialStore` for the launcher's settings and the
//!   keychain-backed remembered logins
//!
//! Every flow takes the store explicitly. Mutating flows borrow it mutably, so
//! two flows can never interleave on the same store.

pub mod config;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod session;
pub mod store;

pub use config::Config;
pub use credentials::{
    CredentialError, CredentialStore, KeyringBackend, RememberedLogin, SecretBackend,
};
pub use error::{Result, SessionError};
pub use provider::{
    IdentityProvider, ProviderError, RefreshedToken, RemoteIdentity, YggdrasilClient,
};
pub use session::{
    AccountLifecycle, AuthManager, CredentialExchange, SessionState, SessionValidationResult,
    SessionValidator,
};
pub use store::{Account, AccountStore, ClientToken};
