//! Status command - system-wide account summary

use anyhow::Result;
use colored::Colorize;

use super::{get_context, get_logger, log_command};
use crate::output;

pub fn run(json: bool) -> Result<()> {
    log_command(&get_logger(), "status");

    let ctx = get_context()?;
    let status = ctx.status_service.get_status()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Bankline Status".bold());
    println!();

    let mut table = output::create_table();
    table.add_row(vec!["Accounts".to_string(), status.total_accounts.to_string()]);
    table.add_row(vec!["Total balance".to_string(), status.total_balance.to_string()]);
    table.add_row(vec![
        "Transfers".to_string(),
        if ctx.config.transfers.atomic { "atomic" } else { "sequential" }.to_string(),
    ]);
    println!("{}", table);

    if status.negative_balances > 0 {
        println!();
        output::warning(&format!(
            "{} account(s) have a negative balance",
            status.negative_balances
        ));
    }

    if !status.accounts.is_empty() {
        println!();
        let mut accounts = output::create_table();
        accounts.set_header(vec!["Number", "Name", "Balance"]);
        for account in &status.accounts {
            accounts.add_row(vec![
                account.number.to_string(),
                account.name.clone(),
                output::format_balance(account.balance),
            ]);
        }
        println!("{}", accounts);
    }

    Ok(())
}
