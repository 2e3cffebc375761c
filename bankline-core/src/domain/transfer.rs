//! Transfer instruction and receipt

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to move `amount` from the caller's account to `to_account_id`.
///
/// When the destination is the caller's own account the instruction is a
/// deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInstruction {
    pub to_account_id: Uuid,
    pub amount: i64,
}

impl TransferInstruction {
    pub fn new(to_account_id: Uuid, amount: i64) -> Self {
        Self { to_account_id, amount }
    }

    /// Amounts are in the smallest currency unit and must be positive
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.amount <= 0 {
            return Err("amount must be a positive integer");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferKind {
    Deposit,
    Transfer,
}

/// Outcome of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: i64,
    pub kind: TransferKind,
    pub balance_after: i64,
    pub message: String,
}

impl TransferReceipt {
    pub fn new(
        from_account_id: Uuid,
        to_account_id: Uuid,
        amount: i64,
        kind: TransferKind,
        balance_after: i64,
    ) -> Self {
        let message = match kind {
            TransferKind::Deposit => format!("Amount {} deposited successfully.", amount),
            TransferKind::Transfer => format!("Amount {} transferred successfully.", amount),
        };
        Self {
            from_account_id,
            to_account_id,
            amount,
            kind,
            balance_after,
            message,
        }
    }
}
