//! In-memory [`Store`] backed by a mutex-guarded table set. Used by the test
//! suite and local development; behavior matches `PgStore` contract-for-contract.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::{Result, StoreError};
use crate::models::{
    Account, AccountId, Bill, BillId, BillStatus, Biller, Message, NewAccount, NewBill, NewBiller,
    NewMessage, NewRecurrence, NewSchedule, NewTransaction, Recurrence, RecurrenceId, Schedule,
    ScheduleId, ScheduleStatus, Transaction, UserId,
};
use crate::store::{BalanceUpdate, Store};

#[derive(Default)]
struct Tables {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    bills: HashMap<BillId, Bill>,
    billers: Vec<Biller>,
    schedules: HashMap<ScheduleId, Schedule>,
    recurrences: HashMap<RecurrenceId, Recurrence>,
    messages: Vec<Message>,
    id_seq: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.id_seq += 1;
        self.id_seq
    }
}

#[derive(Default)]
pub struct MemStore {
    tables: Mutex<Tables>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Account {
            id,
            account_type: account.account_type,
            balance: account.balance,
            owner: account.owner,
            owner_username: account.owner_username,
            bsb: account.bsb,
            acc: account.acc,
            opening_balance: account.opening_balance,
        };
        t.accounts.insert(id, row.clone());
        Ok(row)
    }

    async fn account(&self, id: AccountId) -> Result<Account> {
        let t = self.tables.lock().unwrap();
        t.accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("account", id).into())
    }

    async fn update_account_balance(&self, id: AccountId, balance: Decimal) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let account = t
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("account", id))?;
        account.balance = balance;
        Ok(())
    }

    async fn insert_transaction(&self, txn: NewTransaction) -> Result<Transaction> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Transaction {
            id,
            description: txn.description,
            amount: txn.amount,
            paid_on: txn.paid_on,
            from_account: txn.from_account,
            from_account_username: txn.from_account_username,
            to_account: txn.to_account,
            to_account_username: txn.to_account_username,
            transaction_type: txn.transaction_type,
        };
        t.transactions.push(row.clone());
        Ok(row)
    }

    async fn commit_ledger(
        &self,
        updates: &[BalanceUpdate],
        txn: NewTransaction,
    ) -> Result<Transaction> {
        // One critical section covers balance writes and the insert, so the
        // commit is all-or-nothing like the Postgres transaction.
        let mut t = self.tables.lock().unwrap();
        for update in updates {
            if !t.accounts.contains_key(&update.account) {
                return Err(StoreError::not_found("account", update.account).into());
            }
        }
        for update in updates {
            if let Some(account) = t.accounts.get_mut(&update.account) {
                account.balance = update.balance;
            }
        }
        let id = t.next_id();
        let row = Transaction {
            id,
            description: txn.description,
            amount: txn.amount,
            paid_on: txn.paid_on,
            from_account: txn.from_account,
            from_account_username: txn.from_account_username,
            to_account: txn.to_account,
            to_account_username: txn.to_account_username,
            transaction_type: txn.transaction_type,
        };
        t.transactions.push(row.clone());
        Ok(row)
    }

    async fn transactions_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Transaction> = t
            .transactions
            .iter()
            .filter(|txn| txn.from_account == account || txn.to_account == Some(account))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.paid_on.cmp(&a.paid_on));
        Ok(rows)
    }

    async fn insert_biller(&self, biller: NewBiller) -> Result<Biller> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Biller {
            id,
            name: biller.name,
            code: biller.code,
            category: biller.category,
        };
        t.billers.push(row.clone());
        Ok(row)
    }

    async fn billers(&self) -> Result<Vec<Biller>> {
        let t = self.tables.lock().unwrap();
        Ok(t.billers.clone())
    }

    async fn biller_by_code(&self, code: &str) -> Result<Biller> {
        let t = self.tables.lock().unwrap();
        t.billers
            .iter()
            .find(|b| b.code == code)
            .cloned()
            .ok_or_else(|| StoreError::not_found("biller", code).into())
    }

    async fn insert_bill(&self, bill: NewBill) -> Result<Bill> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Bill {
            id,
            billed_user: bill.billed_user,
            from_biller: bill.from_biller,
            description: bill.description,
            amount: bill.amount,
            status: bill.status,
            created_at: bill.created_at,
            due_date: bill.due_date,
            invoice_number: bill.invoice_number,
            reference_number: bill.reference_number,
            linked_bill: bill.linked_bill,
        };
        t.bills.insert(id, row.clone());
        Ok(row)
    }

    async fn bills_for_user(&self, user: UserId) -> Result<Vec<Bill>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Bill> = t
            .bills
            .values()
            .filter(|b| b.billed_user == user)
            .cloned()
            .collect();
        rows.sort_by_key(|b| b.id);
        Ok(rows)
    }

    async fn open_bills(&self, user: UserId, biller_name: &str) -> Result<Vec<Bill>> {
        let t = self.tables.lock().unwrap();
        let mut rows: Vec<Bill> = t
            .bills
            .values()
            .filter(|b| b.billed_user == user && b.from_biller == biller_name && b.status.is_open())
            .cloned()
            .collect();
        rows.sort_by_key(|b| b.due_date);
        Ok(rows)
    }

    async fn set_bill_status(&self, id: BillId, status: BillStatus) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let bill = t
            .bills
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("bill", id))?;
        bill.status = status;
        Ok(())
    }

    async fn update_bill_payment(
        &self,
        id: BillId,
        amount: Decimal,
        status: BillStatus,
    ) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let bill = t
            .bills
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("bill", id))?;
        bill.amount = amount;
        bill.status = status;
        Ok(())
    }

    async fn max_bill_id(&self) -> Result<Option<BillId>> {
        let t = self.tables.lock().unwrap();
        Ok(t.bills.keys().max().copied())
    }

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Schedule {
            id,
            pay_at: schedule.pay_at,
            related_user: schedule.related_user,
            from_account: schedule.from_account,
            to_account: schedule.to_account,
            biller_name: schedule.biller_name,
            biller_code: schedule.biller_code,
            reference_number: schedule.reference_number,
            amount: schedule.amount,
            description: schedule.description,
            schedule_ref: schedule.schedule_ref,
            schedule_type: schedule.schedule_type,
            status: ScheduleStatus::Pending,
            recurring_payment: None,
        };
        t.schedules.insert(id, row.clone());
        Ok(row)
    }

    async fn schedule(&self, id: ScheduleId) -> Result<Schedule> {
        let t = self.tables.lock().unwrap();
        t.schedules
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("schedule", id).into())
    }

    async fn schedule_by_ref(&self, schedule_ref: &str) -> Result<Schedule> {
        let t = self.tables.lock().unwrap();
        t.schedules
            .values()
            .find(|s| s.schedule_ref == schedule_ref)
            .cloned()
            .ok_or_else(|| StoreError::not_found("schedule", schedule_ref).into())
    }

    async fn link_recurrence(&self, id: ScheduleId, recurrence: RecurrenceId) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let schedule = t
            .schedules
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;
        schedule.recurring_payment = Some(recurrence);
        Ok(())
    }

    async fn claim_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>> {
        let mut t = self.tables.lock().unwrap();
        let mut due: Vec<ScheduleId> = t
            .schedules
            .values()
            .filter(|s| s.status == ScheduleStatus::Pending && s.pay_at <= now)
            .map(|s| s.id)
            .collect();
        due.sort_unstable();
        let mut claimed = Vec::with_capacity(due.len());
        for id in due {
            if let Some(schedule) = t.schedules.get_mut(&id) {
                schedule.status = ScheduleStatus::Processing;
                claimed.push(schedule.clone());
            }
        }
        Ok(claimed)
    }

    async fn release_schedule(&self, id: ScheduleId) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let schedule = t
            .schedules
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;
        schedule.status = ScheduleStatus::Pending;
        Ok(())
    }

    async fn complete_schedule(&self, id: ScheduleId) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let schedule = t
            .schedules
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;
        schedule.status = ScheduleStatus::Completed;
        Ok(())
    }

    async fn reschedule(&self, id: ScheduleId, pay_at: DateTime<Utc>) -> Result<()> {
        let mut t = self.tables.lock().unwrap();
        let schedule = t
            .schedules
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("schedule", id))?;
        schedule.pay_at = pay_at;
        schedule.status = ScheduleStatus::Pending;
        Ok(())
    }

    async fn insert_recurrence(&self, recurrence: NewRecurrence) -> Result<Recurrence> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Recurrence {
            id,
            interval: recurrence.interval,
            related_schedule: recurrence.related_schedule,
            recur_rule: recurrence.recur_rule,
            end_date: recurrence.end_date,
            recur_count_dec: recurrence.recur_count_dec,
        };
        t.recurrences.insert(id, row.clone());
        Ok(row)
    }

    async fn recurrence(&self, id: RecurrenceId) -> Result<Recurrence> {
        let t = self.tables.lock().unwrap();
        t.recurrences
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("recurrence", id).into())
    }

    async fn decrement_recur_count(&self, id: RecurrenceId) -> Result<i32> {
        let mut t = self.tables.lock().unwrap();
        let recurrence = t
            .recurrences
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("recurrence", id))?;
        let remaining = recurrence
            .recur_count_dec
            .ok_or_else(|| StoreError::not_found("recurrence count", id))?
            - 1;
        recurrence.recur_count_dec = Some(remaining);
        Ok(remaining)
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        let mut t = self.tables.lock().unwrap();
        let id = t.next_id();
        let row = Message {
            id,
            sender_name: message.sender_name,
            to_user: message.to_user,
            description: message.description,
            kind: message.kind,
            invoice_ref: message.invoice_ref,
            linked_bill: message.linked_bill,
            schedule_ref: message.schedule_ref,
            read: false,
            created_at: Utc::now(),
        };
        t.messages.push(row.clone());
        Ok(row)
    }

    async fn messages_for_user(&self, user: UserId) -> Result<Vec<Message>> {
        let t = self.tables.lock().unwrap();
        Ok(t.messages
            .iter()
            .filter(|m| m.to_user == user)
            .cloned()
            .collect())
    }
}
