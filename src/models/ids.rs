//! Type aliases for row ids. All tables use BIGSERIAL keys; use these instead
//! of raw i64 where an id is required.

pub type UserId = i64;
pub type AccountId = i64;
pub type TransactionId = i64;
pub type BillId = i64;
pub type BillerId = i64;
pub type ScheduleId = i64;
pub type RecurrenceId = i64;
pub type MessageId = i64;
