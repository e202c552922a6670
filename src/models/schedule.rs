//! Schedule and recurrence rows, plus the typed vocabularies the execution
//! engine dispatches on. Unknown wire values fail at the parse boundary
//! instead of defaulting.

use chrono::{DateTime, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;
use crate::models::ids::{AccountId, RecurrenceId, ScheduleId, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleType {
    #[default]
    TransferSchedule,
    BpaySchedule,
    TransferRecur,
    BpayRecur,
}

impl ScheduleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleType::TransferSchedule => "transfer_schedule",
            ScheduleType::BpaySchedule => "bpay_schedule",
            ScheduleType::TransferRecur => "transfer_recur",
            ScheduleType::BpayRecur => "bpay_recur",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        match s {
            "transfer_schedule" => Ok(ScheduleType::TransferSchedule),
            "bpay_schedule" => Ok(ScheduleType::BpaySchedule),
            "transfer_recur" => Ok(ScheduleType::TransferRecur),
            "bpay_recur" => Ok(ScheduleType::BpayRecur),
            other => Err(PaymentError::UnsupportedScheduleType(other.to_string())),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, ScheduleType::TransferRecur | ScheduleType::BpayRecur)
    }

    pub fn is_bpay(&self) -> bool {
        matches!(self, ScheduleType::BpaySchedule | ScheduleType::BpayRecur)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    /// Claimed by a running scan; invisible to subsequent scans.
    Processing,
    Completed,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "pending",
            ScheduleStatus::Processing => "processing",
            ScheduleStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ScheduleStatus::Pending),
            "processing" => Some(ScheduleStatus::Processing),
            "completed" => Some(ScheduleStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayInterval {
    Weekly,
    Fortnightly,
    #[default]
    Monthly,
    Quarterly,
}

impl PayInterval {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayInterval::Weekly => "weekly",
            PayInterval::Fortnightly => "fortnightly",
            PayInterval::Monthly => "monthly",
            PayInterval::Quarterly => "quarterly",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        match s {
            "weekly" => Ok(PayInterval::Weekly),
            "fortnightly" => Ok(PayInterval::Fortnightly),
            "monthly" => Ok(PayInterval::Monthly),
            "quarterly" => Ok(PayInterval::Quarterly),
            other => Err(PaymentError::UnsupportedInterval(other.to_string())),
        }
    }

    /// Calendar-aware successor of `from`. Month-based intervals clamp to the
    /// last day of a shorter month (Jan 31 + 1 month = Feb 28/29).
    pub fn next_occurrence(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            PayInterval::Weekly => from + Duration::weeks(1),
            PayInterval::Fortnightly => from + Duration::weeks(2),
            PayInterval::Monthly => from + Months::new(1),
            PayInterval::Quarterly => from + Months::new(3),
        }
    }
}

/// Wire values keep the product's camelCase recur_rule column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurRule {
    #[serde(rename = "untilFurtherNotice")]
    UntilFurtherNotice,
    #[serde(rename = "untilDate")]
    UntilDate,
    #[serde(rename = "forCount")]
    ForCount,
}

impl RecurRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecurRule::UntilFurtherNotice => "untilFurtherNotice",
            RecurRule::UntilDate => "untilDate",
            RecurRule::ForCount => "forCount",
        }
    }

    pub fn parse(s: &str) -> Result<Self, PaymentError> {
        match s {
            "untilFurtherNotice" => Ok(RecurRule::UntilFurtherNotice),
            "untilDate" => Ok(RecurRule::UntilDate),
            "forCount" => Ok(RecurRule::ForCount),
            other => Err(PaymentError::UnsupportedRecurrenceRule(other.to_string())),
        }
    }
}

/// A deferred payment. Created by a user action, mutated only by the
/// execution engine, never deleted in normal operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub pay_at: DateTime<Utc>,
    pub related_user: UserId,
    pub from_account: AccountId,
    pub to_account: Option<AccountId>,
    pub biller_name: Option<String>,
    pub biller_code: Option<String>,
    pub reference_number: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub schedule_ref: String,
    pub schedule_type: ScheduleType,
    pub status: ScheduleStatus,
    pub recurring_payment: Option<RecurrenceId>,
}

#[derive(Clone, Debug)]
pub struct NewSchedule {
    pub pay_at: DateTime<Utc>,
    pub related_user: UserId,
    pub from_account: AccountId,
    pub to_account: Option<AccountId>,
    pub biller_name: Option<String>,
    pub biller_code: Option<String>,
    pub reference_number: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub schedule_ref: String,
    pub schedule_type: ScheduleType,
}

/// One-to-one with its owning schedule. `recur_count_dec` counts remaining
/// occurrences and decrements only on a successful advance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recurrence {
    pub id: RecurrenceId,
    pub interval: PayInterval,
    pub related_schedule: ScheduleId,
    pub recur_rule: RecurRule,
    pub end_date: Option<DateTime<Utc>>,
    pub recur_count_dec: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct NewRecurrence {
    pub interval: PayInterval,
    pub related_schedule: ScheduleId,
    pub recur_rule: RecurRule,
    pub end_date: Option<DateTime<Utc>>,
    pub recur_count_dec: Option<i32>,
}
