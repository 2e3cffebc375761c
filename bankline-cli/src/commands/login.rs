//! Login command - exchange a username and password for a bearer token

use anyhow::Result;
use bankline_core::services::logging::{LOGIN_FAILED, LOGIN_SUCCEEDED};
use colored::Colorize;

use super::{get_context, get_logger, log_command, log_outcome, password_or_prompt};

pub fn run(username: &str, password: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "login");

    let password = password_or_prompt(password, false)?;
    let ctx = get_context()?;

    let result = ctx.auth_service.login(username, &password);
    log_outcome(&logger, "login", LOGIN_SUCCEEDED, Some(LOGIN_FAILED), &result);
    let token = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&token)?);
        return Ok(());
    }

    println!("{}", token.token);
    eprintln!(
        "\n{}",
        format!(
            "Valid for {} minutes. Use it with --token or export BANKLINE_TOKEN.",
            ctx.config.auth.token_ttl_secs / 60
        )
        .dimmed()
    );

    Ok(())
}
