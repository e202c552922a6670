//! Reference and invoice number generation.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::ids::BillId;

/// Invoice numbers continue the product's historic numbering.
const INVOICE_BASE: i64 = 20200;

/// How long a newly assigned bill stays payable before it is overdue.
const BILL_TERM_DAYS: i64 = 30;

/// A 12-digit numeric customer reference, e.g. for BPAY payments.
pub fn reference_number() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000_000;
    format!("{:012}", n)
}

/// Next invoice number given the highest existing bill id. Monotonic:
/// a bill with id `n` yields `INV/<20200 + n + 1>`.
pub fn invoice_number(max_bill_id: Option<BillId>) -> String {
    format!("INV/{}", INVOICE_BASE + max_bill_id.unwrap_or(0) + 1)
}

/// Due date for a bill assigned at `now`.
pub fn due_date_from(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::days(BILL_TERM_DAYS)).date_naive()
}

/// Unique reference identifying a schedule entry to the UI and the inbox.
pub fn schedule_ref() -> String {
    Uuid::new_v4().to_string()
}
