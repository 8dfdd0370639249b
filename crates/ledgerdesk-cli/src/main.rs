//! ledgerdesk - command-line frontend for the operations dashboard.
//!
//! All session, refresh and redirect machinery lives in `ledgerdesk-core`;
//! this binary only parses arguments, prompts for credentials, and prints
//! what the API returns.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use ledgerdesk_core::api::ApiClient;
use ledgerdesk_core::auth::CredentialStore;
use ledgerdesk_core::config::Config;
use ledgerdesk_core::models::OperationKind;
use ledgerdesk_core::prefs::{self, ThemeMode};
use ledgerdesk_core::storage::{FileStorage, Storage};
use ledgerdesk_core::{is_protected_route, RedirectCoordinator, TokenStore};

/// Initialize the tracing subscriber: stderr for the session, plus a
/// non-blocking file log in the data directory. Use RUST_LOG to control the
/// level (e.g. RUST_LOG=debug).
fn init_tracing(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_appender = tracing_appender::rolling::never(data_dir, "ledgerdesk.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .with(filter)
        .init();
    guard
}

/// Wire the coordinator to this frontend: toasts and navigation intents go
/// to stderr.
fn register_frontend(coordinator: &Arc<RedirectCoordinator>) {
    coordinator.register_notifier(Arc::new(|message, severity, _duration| {
        eprintln!("[{severity:?}] {message}");
    }));
    coordinator.register_navigation(Arc::new(|route, _replace| {
        eprintln!("(redirecting to {route})");
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let data_dir = Config::data_dir()?;
    let _log_guard = init_tracing(&data_dir);
    info!("ledgerdesk starting");

    let storage = Arc::new(FileStorage::new(data_dir)?);
    let tokens = TokenStore::new(storage.clone());
    let coordinator = RedirectCoordinator::new();
    register_frontend(&coordinator);

    let client = ApiClient::new(config.api_url(), tokens, coordinator.clone())?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("help");

    match command {
        "login" => login(&client, config).await,
        "register" => register(&client).await,
        "forgot-password" => forgot_password(&client, args.get(2).map(String::as_str)).await,
        "logout" => logout(&client, &config),
        "balance" => {
            require_session(&client, &coordinator, "/").await?;
            balance(&client).await
        }
        "operations" => {
            require_session(&client, &coordinator, "/operation").await?;
            operations(&client).await
        }
        "new" => {
            require_session(&client, &coordinator, "/operation").await?;
            new_operation(&client, &args[2..]).await
        }
        "theme" => theme(storage.as_ref(), args.get(2).map(String::as_str)),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => bail!("unknown command: {other} (try `ledgerdesk help`)"),
    }
}

/// Commands that map onto protected dashboard routes need a live session;
/// without one the login redirect fires and the command aborts.
async fn require_session(
    client: &ApiClient,
    coordinator: &Arc<RedirectCoordinator>,
    route: &str,
) -> Result<()> {
    if is_protected_route(route) && !client.is_authenticated()? {
        coordinator.redirect_to_login();
        // Let the debounced navigation print its target before exiting.
        tokio::time::sleep(Duration::from_millis(150)).await;
        bail!("not signed in - run `ledgerdesk login` first");
    }
    Ok(())
}

async fn login(client: &ApiClient, mut config: Config) -> Result<()> {
    let email = prompt_line("Email", config.last_email.as_deref())?;

    let password = match CredentialStore::recall(&email) {
        Some(saved) => {
            println!("Using saved credentials for {email}.");
            saved
        }
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let user = match client.login(&email, &password).await {
        Ok(user) => user,
        Err(err) => {
            if err.is_auth_failure() {
                // A stale saved password should not wedge future logins.
                let _ = CredentialStore::forget(&email);
            }
            return Err(err.into());
        }
    };

    if let Err(e) = CredentialStore::remember(&email, &password) {
        debug!(error = %e, "could not save credentials to keychain");
    }
    config.last_email = Some(email);
    config.save()?;

    println!("Signed in as {} <{}>.", user.name, user.email);
    if let Some(account) = user.primary_account() {
        println!("Balance: {:.2} credits", account.credit);
    }
    Ok(())
}

async fn register(client: &ApiClient) -> Result<()> {
    let name = prompt_line("Name", None)?;
    let email = prompt_line("Email", None)?;
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    client.register(&name, &email, &password).await?;
    println!("Account created - run `ledgerdesk login` to sign in.");
    Ok(())
}

async fn forgot_password(client: &ApiClient, email: Option<&str>) -> Result<()> {
    let email = match email {
        Some(email) => email.to_string(),
        None => prompt_line("Email", None)?,
    };
    client.request_password_reset(&email).await?;
    println!("Password reset requested - check the inbox of {email}.");
    Ok(())
}

fn logout(client: &ApiClient, config: &Config) -> Result<()> {
    client.logout()?;
    if let Some(ref email) = config.last_email {
        let _ = CredentialStore::forget(email);
    }
    println!("Signed out.");
    Ok(())
}

async fn balance(client: &ApiClient) -> Result<()> {
    // Show the cached value immediately, then the fresh one.
    if let Ok(Some(account)) = client.token_store().cached_account() {
        println!("Cached balance: {:.2} credits", account.credit);
    }
    let account = client.fetch_balance().await?;
    println!("Balance: {:.2} credits", account.credit);
    Ok(())
}

async fn operations(client: &ApiClient) -> Result<()> {
    let operations = client.fetch_operations().await?;
    if operations.is_empty() {
        println!("No operations recorded.");
        return Ok(());
    }

    println!(
        "{:<17} {:<7} {:>10} {:>12}  {}",
        "DATE", "TYPE", "AMOUNT", "BALANCE", "CONCEPT"
    );
    for op in operations {
        let date = op.created_at.format("%Y-%m-%d %H:%M").to_string();
        println!(
            "{:<17} {:<7} {:>10.2} {:>12.2}  {}",
            date,
            op.kind.to_string(),
            op.amount,
            op.balance_after,
            op.concept
        );
    }
    Ok(())
}

async fn new_operation(client: &ApiClient, args: &[String]) -> Result<()> {
    let (kind_raw, amount_raw, concept) = match args {
        [kind, amount, rest @ ..] if !rest.is_empty() => (kind, amount, rest.join(" ")),
        _ => bail!("usage: ledgerdesk new <credit|debit> <amount> <concept...>"),
    };
    let kind = match kind_raw.as_str() {
        "credit" => OperationKind::Credit,
        "debit" => OperationKind::Debit,
        other => bail!("unknown operation type: {other} (expected credit or debit)"),
    };
    let amount: f64 = amount_raw.parse().context("amount must be a number")?;

    let op = client.create_operation(kind, amount, &concept).await?;
    println!(
        "Recorded {} of {:.2} credits. Balance: {:.2}",
        op.kind, op.amount, op.balance_after
    );
    Ok(())
}

fn theme(storage: &dyn Storage, choice: Option<&str>) -> Result<()> {
    match choice {
        None => println!("Theme: {}", prefs::theme_mode(storage)?),
        Some(name @ ("light" | "dark")) => {
            prefs::set_theme_mode(storage, ThemeMode::from_name(name))?;
            println!("Theme set to {name}.");
        }
        Some(other) => bail!("unknown theme: {other} (expected light or dark)"),
    }
    Ok(())
}

fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(value) => print!("{label} [{value}]: "),
        None => print!("{label}: "),
    }
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let input = input.trim();

    if input.is_empty() {
        match default {
            Some(value) => Ok(value.to_string()),
            None => bail!("{label} is required"),
        }
    } else {
        Ok(input.to_string())
    }
}

fn print_usage() {
    println!("ledgerdesk - operations dashboard client");
    println!();
    println!("Usage: ledgerdesk <command>");
    println!();
    println!("Commands:");
    println!("  login                              Sign in and store the session");
    println!("  register                           Create a new account");
    println!("  forgot-password [email]            Request a password reset link");
    println!("  logout                             Drop the stored session");
    println!("  balance                            Show the primary account balance");
    println!("  operations                         List the operations ledger");
    println!("  new <credit|debit> <amount> <...>  Record a new operation");
    println!("  theme [light|dark]                 Show or set the theme preference");
    println!();
    println!("Environment:");
    println!("  LEDGERDESK_API_URL  Override the API base URL");
    println!("  RUST_LOG            Log filter (e.g. debug)");
}
