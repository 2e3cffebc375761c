//! Bankline CLI - accounts and transfers from the terminal

use std::process::ExitCode;

use anyhow::Result;
use bankline_core::status_for;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{account, login, logs, status, transfer};

/// Bankline - a minimal banking back-end
#[derive(Parser)]
#[command(name = "bl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open, list, show and close accounts
    Account {
        #[command(subcommand)]
        command: account::AccountCommands,
    },

    /// Log in and print a bearer token
    Login {
        /// Username chosen at account creation
        #[arg(long, short)]
        username: String,
        /// Password (prompted if omitted)
        #[arg(long)]
        password: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Move funds from your account; sending to yourself is a deposit
    Transfer {
        /// Destination account ID
        #[arg(long)]
        to: String,
        /// Amount in the smallest currency unit (e.g. cents)
        #[arg(long, allow_negative_numbers = true)]
        amount: i64,
        /// Bearer token from `bl login`
        #[arg(long, env = "BANKLINE_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a summary of all accounts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Account { command } => command.json(),
            Commands::Logs { command } => command.json(),
            Commands::Login { json, .. }
            | Commands::Transfer { json, .. }
            | Commands::Status { json } => *json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.command.json();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                let body = commands::error_body(&e);
                match serde_json::to_string(&body) {
                    Ok(s) => println!("{}", s),
                    Err(_) => eprintln!("{}", e),
                }
            } else {
                output::error(&format!("Error ({}): {}", status_for(&e), e));
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Account { command } => account::run(command),
        Commands::Login {
            username,
            password,
            json,
        } => login::run(&username, password, json),
        Commands::Transfer {
            to,
            amount,
            token,
            json,
        } => transfer::run(&to, amount, token.as_deref(), json),
        Commands::Status { json } => status::run(json),
        Commands::Logs { command } => logs::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_transfer_accepts_negative_amount_for_validation() {
        let cli = Cli::try_parse_from([
            "bl", "transfer", "--to", "x", "--amount", "-5", "--token", "t", "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Transfer { amount, json, .. } => {
                assert_eq!(amount, -5);
                assert!(json);
            }
            _ => panic!("expected transfer"),
        }
    }

    #[test]
    fn test_json_does_not_imply_force_on_delete() {
        let cli = Cli::try_parse_from(["bl", "account", "delete", "abc", "--json"]).unwrap();
        match cli.command {
            Commands::Account {
                command: account::AccountCommands::Delete { force, json, .. },
            } => {
                assert!(json);
                assert!(!force);
            }
            _ => panic!("expected account delete"),
        }

        let cli = Cli::try_parse_from(["bl", "logs", "clear", "--json", "-f"]).unwrap();
        match cli.command {
            Commands::Logs {
                command: logs::LogsCommands::Clear { force, .. },
            } => assert!(force),
            _ => panic!("expected logs clear"),
        }
    }

    #[test]
    fn test_json_flag_on_nested_commands() {
        let cli = Cli::try_parse_from(["bl", "account", "list", "--json"]).unwrap();
        assert!(cli.command.json());

        let cli = Cli::try_parse_from(["bl", "logs", "stats"]).unwrap();
        assert!(!cli.command.json());
    }
}
