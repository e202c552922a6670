//! Error taxonomy for the payments core.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::ids::{AccountId, ScheduleId};

/// Failures at the backing-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store read failed: {0}")]
    Read(String),
    #[error("store write failed: {0}")]
    Write(String),
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Errors raised by ledger operations, bill resolution and the schedule engine.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("transaction amount must not be zero")]
    ZeroAmount,
    #[error("insufficient funds in account {account}: balance {balance}, requested {amount}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        amount: Decimal,
    },
    #[error("unsupported schedule type: {0}")]
    UnsupportedScheduleType(String),
    #[error("unsupported recurrence rule: {0}")]
    UnsupportedRecurrenceRule(String),
    #[error("unsupported payment interval: {0}")]
    UnsupportedInterval(String),
    #[error("schedule {0} has no linked recurrence")]
    MissingRecurrence(ScheduleId),
    #[error("schedule {id} is missing {field}")]
    MalformedSchedule {
        id: ScheduleId,
        field: &'static str,
    },
    #[error("bpay payment processing failed")]
    BpayProcessingFailed(#[source] Box<PaymentError>),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
