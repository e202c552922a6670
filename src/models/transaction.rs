use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ids::{AccountId, TransactionId};

/// Wire values match the product's transaction_type column: "transfer funds",
/// "pay anyone", "bpay".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "transfer funds")]
    TransferFunds,
    #[serde(rename = "pay anyone")]
    PayAnyone,
    #[serde(rename = "bpay")]
    Bpay,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::TransferFunds => "transfer funds",
            TransactionKind::PayAnyone => "pay anyone",
            TransactionKind::Bpay => "bpay",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "transfer funds" => Some(TransactionKind::TransferFunds),
            "pay anyone" => Some(TransactionKind::PayAnyone),
            "bpay" => Some(TransactionKind::Bpay),
            _ => None,
        }
    }
}

/// An immutable ledger record. Created once, never updated or deleted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub description: String,
    pub amount: Decimal,
    pub paid_on: DateTime<Utc>,
    pub from_account: AccountId,
    pub from_account_username: String,
    pub to_account: Option<AccountId>,
    pub to_account_username: Option<String>,
    pub transaction_type: TransactionKind,
}

#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub description: String,
    pub amount: Decimal,
    pub paid_on: DateTime<Utc>,
    pub from_account: AccountId,
    pub from_account_username: String,
    pub to_account: Option<AccountId>,
    pub to_account_username: Option<String>,
    pub transaction_type: TransactionKind,
}
