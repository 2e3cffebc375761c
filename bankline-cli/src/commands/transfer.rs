//! Transfer command - move funds out of your account

use anyhow::Result;
use bankline_core::services::logging::{TRANSFER_COMPLETED, TRANSFER_FAILED};
use bankline_core::services::parse_account_id;
use bankline_core::{TransferInstruction, TransferKind};

use super::{authenticate, get_context, get_logger, log_command, log_outcome};
use crate::output;

pub fn run(to: &str, amount: i64, token: Option<&str>, json: bool) -> Result<()> {
    let logger = get_logger();
    log_command(&logger, "transfer");

    let ctx = get_context()?;
    let source = authenticate(&ctx, token)?;
    let instruction = TransferInstruction::new(parse_account_id(to)?, amount);

    let result = ctx.transfer_service.transfer(source, &instruction);
    log_outcome(&logger, "transfer", TRANSFER_COMPLETED, Some(TRANSFER_FAILED), &result);
    let receipt = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
        return Ok(());
    }

    output::success(&receipt.message);
    if receipt.kind == TransferKind::Transfer {
        output::info(&format!("Sent to {}", receipt.to_account_id));
    }
    println!("Balance: {}", output::format_balance(receipt.balance_after));

    Ok(())
}
