//! Account commands - open, list, show and close accounts

use anyhow::Result;
use bankline_core::services::logging::{ACCOUNT_CREATED, ACCOUNT_DELETED};
use bankline_core::services::{parse_account_id, CreateAccountRequest};
use bankline_core::Account;
use clap::Subcommand;
use colored::Colorize;

use super::{
    authenticate, confirm_unless_forced, get_context, get_logger, log_command, log_outcome,
    password_or_prompt,
};
use crate::output;

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account with its login
    Create {
        /// Account holder name
        #[arg(long)]
        name: String,
        /// National tax id of the holder
        #[arg(long)]
        national_id: String,
        /// Username for logging in
        #[arg(long, short)]
        username: String,
        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all accounts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show your account
    Show {
        /// Account ID
        id: String,
        /// Bearer token from `bl login`
        #[arg(long, env = "BANKLINE_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Close your account and remove its login
    Delete {
        /// Account ID
        id: String,
        /// Bearer token from `bl login`
        #[arg(long, env = "BANKLINE_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Skip confirmation prompt (required when not on a terminal)
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl AccountCommands {
    pub fn json(&self) -> bool {
        match self {
            Self::Create { json, .. }
            | Self::List { json }
            | Self::Show { json, .. }
            | Self::Delete { json, .. } => *json,
        }
    }
}

pub fn run(command: AccountCommands) -> Result<()> {
    let logger = get_logger();

    match command {
        AccountCommands::Create {
            name,
            national_id,
            username,
            password,
            json,
        } => {
            log_command(&logger, "account create");
            let password = password_or_prompt(password, true)?;
            let ctx = get_context()?;

            let result = ctx.account_service.create_account(&CreateAccountRequest {
                name,
                national_id,
                username,
                password,
            });
            log_outcome(&logger, "account create", ACCOUNT_CREATED, None, &result);
            let account = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                output::success(&format!("Account #{} opened", account.number));
                print_account(&account);
            }
        }
        AccountCommands::List { json } => {
            log_command(&logger, "account list");
            let ctx = get_context()?;
            let accounts = ctx.account_service.list_accounts()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&accounts)?);
                return Ok(());
            }

            if accounts.is_empty() {
                println!("{}", "No accounts yet. Open one with `bl account create`.".dimmed());
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Number", "ID", "Name", "Balance"]);
            for account in &accounts {
                table.add_row(vec![
                    account.number.to_string(),
                    account.id.to_string(),
                    account.name.clone(),
                    output::format_balance(account.balance),
                ]);
            }
            println!("{}", table);
        }
        AccountCommands::Show { id, token, json } => {
            log_command(&logger, "account show");
            let ctx = get_context()?;
            let caller = authenticate(&ctx, token.as_deref())?;
            let account = ctx.account_service.get_account(caller, parse_account_id(&id)?)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&account)?);
            } else {
                print_account(&account);
            }
        }
        AccountCommands::Delete {
            id,
            token,
            force,
            json,
        } => {
            log_command(&logger, "account delete");
            let ctx = get_context()?;
            let caller = authenticate(&ctx, token.as_deref())?;
            let id = parse_account_id(&id)?;

            if !force && !json {
                println!(
                    "\n{}",
                    "This will close the account and remove its login.".yellow()
                );
            }
            if !confirm_unless_forced(force, "Close this account?")? {
                if json {
                    println!("{}", serde_json::json!({ "deleted": null }));
                } else {
                    println!("{}\n", "Cancelled".dimmed());
                }
                return Ok(());
            }

            let result = ctx.account_service.delete_account(caller, id);
            log_outcome(&logger, "account delete", ACCOUNT_DELETED, None, &result);
            result?;

            if json {
                println!("{}", serde_json::json!({ "deleted": id }));
            } else {
                output::success(&format!("Account {} closed", id));
            }
        }
    }

    Ok(())
}

fn print_account(account: &Account) {
    let mut table = output::create_table();
    table.add_row(vec!["Number".to_string(), account.number.to_string()]);
    table.add_row(vec!["ID".to_string(), account.id.to_string()]);
    table.add_row(vec!["Name".to_string(), account.name.clone()]);
    table.add_row(vec!["National ID".to_string(), account.national_id.clone()]);
    table.add_row(vec!["Balance".to_string(), output::format_balance(account.balance)]);
    table.add_row(vec![
        "Opened".to_string(),
        account.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]);
    println!("{}", table);
}
