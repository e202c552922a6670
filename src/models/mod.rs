//! Row types and typed vocabularies. Use chrono types for timestamps and
//! rust_decimal for money; never raw strings or floats.

pub mod account;
pub mod bill;
pub mod ids;
pub mod message;
pub mod schedule;
pub mod transaction;

pub use account::{Account, AccountType, NewAccount};
pub use bill::{Bill, BillStatus, Biller, NewBill, NewBiller};
pub use ids::{
    AccountId, BillId, BillerId, MessageId, RecurrenceId, ScheduleId, TransactionId, UserId,
};
pub use message::{Message, MessageKind, NewMessage};
pub use schedule::{
    NewRecurrence, NewSchedule, PayInterval, RecurRule, Recurrence, Schedule, ScheduleStatus,
    ScheduleType,
};
pub use transaction::{NewTransaction, Transaction, TransactionKind};
