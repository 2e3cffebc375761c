//! CLI command implementations

pub mod account;
pub mod login;
pub mod logs;
pub mod status;
pub mod transfer;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use bankline_core::services::{EntryPoint, LogEvent, LoggingService};
use bankline_core::{BanklineContext, Error, ErrorBody};
use dialoguer::{Confirm, Password};
use uuid::Uuid;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let bankline_dir = get_bankline_dir().ok()?;
    std::fs::create_dir_all(&bankline_dir).ok()?;
    LoggingService::new(&bankline_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// Record that a command ran
pub fn log_command(logger: &Option<LoggingService>, command: &str) {
    if let Some(l) = logger {
        let _ = l.log_command(command);
    }
}

/// Log the outcome event of a core operation
pub fn log_outcome<T>(
    logger: &Option<LoggingService>,
    command: &str,
    ok_event: &str,
    failed_event: Option<&str>,
    result: &bankline_core::domain::result::Result<T>,
) {
    match result {
        Ok(_) => log_event(logger, LogEvent::new(ok_event).with_command(command)),
        Err(e) => {
            if let Some(failed) = failed_event {
                log_event(logger, LogEvent::new(failed).with_command(command).with_error(e));
            }
        }
    }
}

/// Get the bankline directory from environment or default
pub fn get_bankline_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("BANKLINE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".bankline"))
        .ok_or_else(|| anyhow!("Could not find home directory; set BANKLINE_DIR"))
}

/// Open the bankline context, creating the directory on first use
pub fn get_context() -> Result<BanklineContext> {
    let bankline_dir = get_bankline_dir()?;

    std::fs::create_dir_all(&bankline_dir)
        .with_context(|| format!("Failed to create bankline directory: {:?}", bankline_dir))?;

    BanklineContext::new(&bankline_dir).context("Failed to initialize bankline context")
}

/// Resolve the caller's account from `--token` / `BANKLINE_TOKEN`
pub fn authenticate(ctx: &BanklineContext, token: Option<&str>) -> Result<Uuid> {
    Ok(ctx.auth_service.authenticate(token)?)
}

/// Use the given password or prompt for one without echo
pub fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
    if let Some(p) = password {
        return Ok(p);
    }
    let mut prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt = prompt.with_confirmation("Repeat password", "Passwords do not match");
    }
    Ok(prompt.interact()?)
}

/// Ask for confirmation unless `--force` was given; the prompt goes to stderr
pub fn confirm_unless_forced(force: bool, prompt: &str) -> Result<bool> {
    if force {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Error body for `--json` output; messages of foreign errors pass through
pub fn error_body(err: &anyhow::Error) -> ErrorBody {
    match err.downcast_ref::<Error>() {
        Some(core) => ErrorBody::from(core),
        None => ErrorBody {
            error: err.to_string(),
        },
    }
}
