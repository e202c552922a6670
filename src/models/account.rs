use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ids::{AccountId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Personal,
    Savings,
    Credit,
    Debit,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Personal => "personal",
            AccountType::Savings => "savings",
            AccountType::Credit => "credit",
            AccountType::Debit => "debit",
            AccountType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(AccountType::Personal),
            "savings" => Some(AccountType::Savings),
            "credit" => Some(AccountType::Credit),
            "debit" => Some(AccountType::Debit),
            "other" => Some(AccountType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer account. `balance` is mutated only through ledger operations.
/// For credit accounts `opening_balance` doubles as the credit limit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub owner: UserId,
    pub owner_username: String,
    pub bsb: Option<String>,
    pub acc: Option<String>,
    pub opening_balance: Decimal,
}

/// Payload for creating an account row.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub account_type: AccountType,
    pub balance: Decimal,
    pub owner: UserId,
    pub owner_username: String,
    pub bsb: Option<String>,
    pub acc: Option<String>,
    pub opening_balance: Decimal,
}
