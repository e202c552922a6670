use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::ids::{BillId, BillerId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    Unpaid,
    Partial,
    Pending,
    Paid,
    Overdue,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Partial => "partial",
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Overdue => "overdue",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(BillStatus::Unpaid),
            "partial" => Some(BillStatus::Partial),
            "pending" => Some(BillStatus::Pending),
            "paid" => Some(BillStatus::Paid),
            "overdue" => Some(BillStatus::Overdue),
            _ => None,
        }
    }

    /// Statuses against which an incoming payment may still be applied.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            BillStatus::Unpaid | BillStatus::Partial | BillStatus::Overdue
        )
    }
}

/// A bill issued to a user. `amount` is the balance still owed and decreases
/// on partial payment; `paid` is terminal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub billed_user: UserId,
    pub from_biller: String,
    pub description: String,
    pub amount: Decimal,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub invoice_number: String,
    pub reference_number: String,
    pub linked_bill: Option<BillId>,
}

impl Bill {
    /// Overdue is derived from the due date on read, never persisted.
    pub fn status_as_of(&self, today: NaiveDate) -> BillStatus {
        match self.status {
            BillStatus::Unpaid | BillStatus::Partial if self.due_date < today => {
                BillStatus::Overdue
            }
            status => status,
        }
    }
}

/// Full payload for inserting a bill row; identifiers and dates are filled in
/// by the bill-assignment service.
#[derive(Clone, Debug)]
pub struct NewBill {
    pub billed_user: UserId,
    pub from_biller: String,
    pub description: String,
    pub amount: Decimal,
    pub status: BillStatus,
    pub created_at: DateTime<Utc>,
    pub due_date: NaiveDate,
    pub invoice_number: String,
    pub reference_number: String,
    pub linked_bill: Option<BillId>,
}

/// A BPAY biller the product can pay against.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Biller {
    pub id: BillerId,
    pub name: String,
    pub code: String,
    pub category: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewBiller {
    pub name: String,
    pub code: String,
    pub category: Option<String>,
}
