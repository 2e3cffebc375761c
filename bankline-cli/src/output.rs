//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg.green());
}

/// Print an error to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Balances are whole units; negatives are highlighted
pub fn format_balance(balance: i64) -> String {
    if balance < 0 {
        balance.to_string().red().to_string()
    } else {
        balance.to_string()
    }
}
