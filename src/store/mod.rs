//! Table-scoped store boundary. The payments core never touches the backing
//! store directly; everything goes through [`Store`]. `PgStore` backs it with
//! Postgres, `MemStore` backs tests and local runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{
    Account, AccountId, Bill, BillId, BillStatus, Biller, Message, NewAccount, NewBill, NewBiller,
    NewMessage, NewRecurrence, NewSchedule, NewTransaction, Recurrence, RecurrenceId, Schedule,
    ScheduleId, Transaction, UserId,
};

pub use memory::MemStore;
pub use postgres::PgStore;

/// A pending single-field balance write, applied inside [`Store::commit_ledger`].
#[derive(Clone, Copy, Debug)]
pub struct BalanceUpdate {
    pub account: AccountId,
    pub balance: Decimal,
}

#[async_trait]
pub trait Store: Send + Sync {
    // accounts
    async fn insert_account(&self, account: NewAccount) -> Result<Account>;
    async fn account(&self, id: AccountId) -> Result<Account>;
    /// Unconditional balance write; callers own the invariants.
    async fn update_account_balance(&self, id: AccountId, balance: Decimal) -> Result<()>;

    // transactions
    async fn insert_transaction(&self, txn: NewTransaction) -> Result<Transaction>;
    /// Applies the balance updates and inserts the transaction record in one
    /// store transaction; on any failure nothing is written.
    async fn commit_ledger(
        &self,
        updates: &[BalanceUpdate],
        txn: NewTransaction,
    ) -> Result<Transaction>;
    /// Transaction history touching an account, newest first.
    async fn transactions_for_account(&self, account: AccountId) -> Result<Vec<Transaction>>;

    // billers
    async fn insert_biller(&self, biller: NewBiller) -> Result<Biller>;
    async fn billers(&self) -> Result<Vec<Biller>>;
    async fn biller_by_code(&self, code: &str) -> Result<Biller>;

    // bills
    async fn insert_bill(&self, bill: NewBill) -> Result<Bill>;
    async fn bills_for_user(&self, user: UserId) -> Result<Vec<Bill>>;
    /// A user's open (unpaid/partial/overdue) bills for one biller, sorted by
    /// due date ascending. The ordering is part of the contract: bill
    /// resolution applies payment oldest-due-first.
    async fn open_bills(&self, user: UserId, biller_name: &str) -> Result<Vec<Bill>>;
    async fn set_bill_status(&self, id: BillId, status: BillStatus) -> Result<()>;
    /// Records a partial payment: the remaining amount owed plus the status.
    async fn update_bill_payment(
        &self,
        id: BillId,
        amount: Decimal,
        status: BillStatus,
    ) -> Result<()>;
    async fn max_bill_id(&self) -> Result<Option<BillId>>;

    // schedules
    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule>;
    async fn schedule(&self, id: ScheduleId) -> Result<Schedule>;
    async fn schedule_by_ref(&self, schedule_ref: &str) -> Result<Schedule>;
    async fn link_recurrence(&self, id: ScheduleId, recurrence: RecurrenceId) -> Result<()>;
    /// Atomically flips every pending schedule with `pay_at <= now` to
    /// `processing` and returns the claimed rows. An overlapping scan claims
    /// nothing, so a due schedule is executed at most once.
    async fn claim_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>>;
    /// Returns a claimed schedule to `pending` untouched (retry on next scan).
    async fn release_schedule(&self, id: ScheduleId) -> Result<()>;
    async fn complete_schedule(&self, id: ScheduleId) -> Result<()>;
    /// Moves a claimed recurring schedule forward: new `pay_at`, back to `pending`.
    async fn reschedule(&self, id: ScheduleId, pay_at: DateTime<Utc>) -> Result<()>;

    // recurrences
    async fn insert_recurrence(&self, recurrence: NewRecurrence) -> Result<Recurrence>;
    async fn recurrence(&self, id: RecurrenceId) -> Result<Recurrence>;
    /// Decrements `recur_count_dec` and returns the post-decrement value.
    async fn decrement_recur_count(&self, id: RecurrenceId) -> Result<i32>;

    // messages
    async fn insert_message(&self, message: NewMessage) -> Result<Message>;
    async fn messages_for_user(&self, user: UserId) -> Result<Vec<Message>>;
}
