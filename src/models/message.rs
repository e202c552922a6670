use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ids::{BillId, MessageId, UserId};

/// What an inbox message is about; drives rendering in the inbox UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// A one-off scheduled payment was made.
    Schedule,
    /// A recurring payment was made and rescheduled forward.
    Recurring,
    /// A scheduled payment could not be made for lack of funds.
    Insufficient,
    /// A new bill was assigned.
    Bill,
    /// A bill payment was received.
    Payment,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Schedule => "schedule",
            MessageKind::Recurring => "recurring",
            MessageKind::Insufficient => "insufficient",
            MessageKind::Bill => "bill",
            MessageKind::Payment => "payment",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "schedule" => Some(MessageKind::Schedule),
            "recurring" => Some(MessageKind::Recurring),
            "insufficient" => Some(MessageKind::Insufficient),
            "bill" => Some(MessageKind::Bill),
            "payment" => Some(MessageKind::Payment),
            _ => None,
        }
    }
}

/// An immutable inbox record. `read` is toggled by the inbox UI only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender_name: String,
    pub to_user: UserId,
    pub description: String,
    pub kind: MessageKind,
    pub invoice_ref: Option<String>,
    pub linked_bill: Option<BillId>,
    pub schedule_ref: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct NewMessage {
    pub sender_name: String,
    pub to_user: UserId,
    pub description: String,
    pub kind: MessageKind,
    pub invoice_ref: Option<String>,
    pub linked_bill: Option<BillId>,
    pub schedule_ref: Option<String>,
}
