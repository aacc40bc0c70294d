//! launchpass - manage launcher accounts from the command line.
//!
//! Logs accounts in against a Yggdrasil-compatible auth server, keeps them in
//! the local account store and refreshes the selected account's token before
//! it is handed to the game.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use launchpass_core::{Account, AccountStore, AuthManager, Config, CredentialStore, YggdrasilClient};

#[derive(Parser)]
#[command(name = "launchpass", version, about = "Launcher account sessions")]
struct Cli {
    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and add the account to the store
    Login {
        username: String,
        /// Keep the password in the OS keychain for automatic re-login
        #[arg(long)]
        remember: bool,
    },
    /// List stored accounts
    List,
    /// Select the account used for the next launch
    Select { id: String },
    /// Check the selected account, refreshing its token if needed
    Validate,
    /// Remove an account, invalidating its token on the auth server
    Remove {
        id: String,
        /// Remove locally without contacting the auth server
        #[arg(long)]
        local: bool,
    },
    /// Show the selected account
    Whoami,
}

/// Initialize the tracing subscriber for logging.
/// The returned guard must stay alive for the file writer to flush.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir.unwrap_or(".".as_ref()), name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_ref())?;

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        Config::default()
    });
    let store_path = config.store_path()?;
    let store = AccountStore::load(&store_path)
        .with_context(|| format!("Failed to load account store {}", store_path.display()))?;
    let mut manager = AuthManager::new(config.provider()?, store);
    let credentials: CredentialStore = CredentialStore::default();

    info!(auth_server = %config.auth_server_url, "launchpass starting");

    match cli.command {
        Command::Login { username, remember } => {
            let password = rpassword::prompt_password("Password: ")?;
            let account = manager.login(&username, &password).await?;

            if remember {
                if let Err(e) = credentials.remember(&account.id, &username, &password) {
                    warn!(account = %account.id, error = %e, "Failed to store credentials");
                }
            }
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Logged in as {} ({})", account.display_name, account.id);
        }
        Command::List => {
            let selected = manager.store().selected_id();
            if manager.store().is_empty() {
                println!("No accounts. Run `launchpass login <username>` first.");
            }
            for account in manager.store().accounts() {
                let marker = if Some(account.id.as_str()) == selected { "*" } else { " " };
                println!(
                    "{} {}  {}  [{}]",
                    marker, account.id, account.display_name, account.provider_type
                );
            }
        }
        Command::Select { id } => {
            manager.select_account(&id)?;
            println!("Selected {}", id);
        }
        Command::Validate => validate(&mut manager, &credentials).await?,
        Command::Remove { id, local } => {
            let removed = if local {
                manager.forget_account(&id)?
            } else {
                manager.remove_account(&id).await?
            };
            forget_login(&credentials, &removed);
            println!("Removed {} ({})", removed.display_name, removed.id);
        }
        Command::Whoami => match manager.store().get_selected() {
            Some(account) => println!("{} ({})", account.display_name, account.id),
            None => println!("No account selected"),
        },
    }

    Ok(())
}

/// Validate the selected account, logging it in again with its remembered
/// password when the token could not be refreshed.
async fn validate(
    manager: &mut AuthManager<YggdrasilClient>,
    credentials: &CredentialStore,
) -> Result<()> {
    match manager.ensure_valid_or_relogin(credentials).await {
        Ok(account) => {
            println!("Session valid for {} ({})", account.display_name, account.id);
            Ok(())
        }
        Err(e) if e.requires_login() => {
            anyhow::bail!("{}. Run `launchpass login <username>` again.", e)
        }
        Err(e) => Err(e.into()),
    }
}

/// Drop a removed account's remembered login from the keychain
fn forget_login(credentials: &CredentialStore, account: &Account) {
    if let Err(e) = credentials.forget(&account.id) {
        warn!(account = %account.id, error = %e, "Failed to forget stored credentials");
    }
}
