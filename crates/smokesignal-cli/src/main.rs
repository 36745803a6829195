//! Smoke Signal CLI - terminal access to the BBQ admin dashboard API.
//!
//! Every run hydrates the stored session first, then executes one command
//! through the authorized gateway.

mod args;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use smokesignal_core::api::ApiError;
use smokesignal_core::auth::{self, SessionState};
use smokesignal_core::models::AdminResource;
use smokesignal_core::{AdminClient, Config, LoggingNavigator, Navigator, SessionStore};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Command, USAGE};

/// Read instead of prompting when set (scripts, CI)
const PASSWORD_ENV: &str = "SMOKESIGNAL_PASSWORD";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the log file on drop.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .log_to_file
        .then(|| config.cache_dir().ok())
        .flatten()
        .map(|dir| dir.join("logs"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "smokesignal.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

/// Terminal stand-in for the dashboard's login page redirect
struct CliRedirect {
    inner: LoggingNavigator,
    login_path: String,
}

impl CliRedirect {
    fn new(login_path: &str) -> Self {
        Self {
            inner: LoggingNavigator::new(login_path),
            login_path: login_path.to_string(),
        }
    }
}

impl CliRedirect {
    fn notice(&self) -> String {
        format!(
            "Not signed in. Run `smokesignal login` to continue (dashboard: {}).",
            self.login_path
        )
    }
}

impl Navigator for CliRedirect {
    fn redirect_to_login(&self) {
        self.inner.redirect_to_login();
        eprintln!("{}", self.notice());
    }
}

/// Whether `command` may run. A protected command with no hydrated session
/// is sent to login instead.
fn admit(command: &Command, session: &SessionStore, navigator: &dyn Navigator) -> bool {
    if command.is_protected() && !session.is_authenticated() {
        navigator.redirect_to_login();
        return false;
    }
    true
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let command = match args::parse(&argv) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let (mut config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = Config::default();
            config.apply_env(|key| std::env::var(key).ok());
            (config, Some(e))
        }
    };

    let _log_guard = init_tracing(&config);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }
    info!(api_url = %config.api_url, storage = ?config.storage, "Smoke Signal CLI starting");

    let storage = auth::storage_for(&config).context("Failed to open session storage")?;
    let navigator = Arc::new(CliRedirect::new(&config.login_path));
    let session = Arc::new(SessionStore::new(storage, navigator.clone()));
    session.hydrate();

    let client = AdminClient::from_config(&config, session.clone())
        .context("Failed to build HTTP client")?;

    if !admit(&command, &session, navigator.as_ref()) {
        return Ok(ExitCode::FAILURE);
    }

    run(command, &client, &mut config).await
}

async fn run(command: Command, client: &AdminClient, config: &mut Config) -> Result<ExitCode> {
    match command {
        Command::Login { email } => login(client, config, email).await,
        Command::Logout => {
            client.logout();
            println!("Signed out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Whoami => match client.session().snapshot() {
            SessionState::Authenticated(session) => {
                println!("{} <{}>", session.user.display_name(), session.user.email);
                println!("  id:     {}", session.user.id);
                println!("  role:   {}", session.user.role);
                println!("  signed in {}", session.age_display());
                Ok(ExitCode::SUCCESS)
            }
            SessionState::Unauthenticated => {
                println!("Not signed in.");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Health => match client.health().await {
            Ok(health) if health.is_ok() => {
                match health.timestamp {
                    Some(at) => println!("ok ({})", at.to_rfc3339()),
                    None => println!("ok"),
                }
                Ok(ExitCode::SUCCESS)
            }
            Ok(health) => {
                println!("{}", health.status);
                Ok(ExitCode::FAILURE)
            }
            Err(e) => report(e),
        },
        Command::Get { resources, limit } => fetch(client, &resources, limit).await,
        Command::SetStatus { resource, id, status } => {
            match client.set_status(resource, &id, &status).await {
                Ok(updated) => print_json(&updated),
                Err(e) => report(e),
            }
        }
        Command::Delete { resource, id } => match client.remove(resource, &id).await {
            Ok(()) => {
                println!("Deleted {} {}", resource, id);
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => report(e),
        },
        Command::Help => {
            println!("{}", USAGE);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn login(client: &AdminClient, config: &mut Config, email: Option<String>) -> Result<ExitCode> {
    if let Some(user) = client.session().identity() {
        println!("Currently signed in as {}; signing in again replaces that session.", user.email);
    }

    let email = match email {
        Some(email) => email,
        None => prompt_email(config.last_email.as_deref())?,
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) if !password.is_empty() => password,
        _ => rpassword::prompt_password("Password: ")?,
    };

    match client.login(&email, &password).await {
        Ok(user) => {
            config.last_email = Some(user.email.clone());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            println!("Signed in as {} ({})", user.display_name(), user.role);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => report(e),
    }
}

fn prompt_email(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Email [{}]: ", last),
        None => print!("Email: "),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(match (input.is_empty(), last) {
        (true, Some(last)) => last.to_string(),
        _ => input.to_string(),
    })
}

/// Fetch several collections concurrently; a 401 on any of them ends the session once.
async fn fetch(client: &AdminClient, resources: &[AdminResource], limit: Option<usize>) -> Result<ExitCode> {
    if let (Some(limit), [AdminResource::Orders]) = (limit, resources) {
        return match client.recent_orders(limit).await {
            Ok(orders) => print_json(&orders),
            Err(e) => report(e),
        };
    }

    let results = join_all(resources.iter().map(|r| client.list(*r))).await;

    let mut code = ExitCode::SUCCESS;
    for (resource, result) in resources.iter().zip(results) {
        match result {
            Ok(data) => {
                if resources.len() > 1 {
                    println!("# {}", resource);
                }
                print_json(&data)?;
            }
            Err(e) => {
                eprintln!("{}: {}", resource, friendly(&e));
                code = ExitCode::FAILURE;
            }
        }
    }
    Ok(code)
}

fn print_json(value: &serde_json::Value) -> Result<ExitCode> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(ExitCode::SUCCESS)
}

/// User-facing wording for API errors
fn friendly(err: &ApiError) -> String {
    match err {
        ApiError::NetworkError(e) if e.is_timeout() => {
            "Connection timed out. Please try again.".to_string()
        }
        ApiError::NetworkError(_) => {
            "Unable to connect to server. Check your internet connection.".to_string()
        }
        ApiError::Unauthorized(_) => "Session expired or invalid.".to_string(),
        other => other.to_string(),
    }
}

fn report(err: ApiError) -> Result<ExitCode> {
    warn!(error = %err, "Command failed");
    eprintln!("Error: {}", friendly(&err));
    Ok(ExitCode::FAILURE)
}
