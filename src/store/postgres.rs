//! Postgres [`Store`] implementation over sqlx. Row mapping is explicit
//! (`try_get` per column) so enum columns fail loudly on unknown values
//! instead of defaulting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};

use crate::database::DatabasePool;
use crate::error::{PaymentError, Result, StoreError};
use crate::models::{
    Account, AccountId, AccountType, Bill, BillId, BillStatus, Biller, Message, MessageKind,
    NewAccount, NewBill, NewBiller, NewMessage, NewRecurrence, NewSchedule, NewTransaction,
    PayInterval, RecurRule, Recurrence, RecurrenceId, Schedule, ScheduleId, ScheduleStatus,
    ScheduleType, Transaction, TransactionKind, UserId,
};
use crate::store::{BalanceUpdate, Store};

pub struct PgStore {
    pool: DatabasePool,
}

impl PgStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn read_err(e: sqlx::Error) -> PaymentError {
    StoreError::Read(e.to_string()).into()
}

fn write_err(e: sqlx::Error) -> PaymentError {
    StoreError::Write(e.to_string()).into()
}

fn decode_err(
    column: &str,
    source: impl std::error::Error + Send + Sync + 'static,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(source),
    }
}

impl<'r> FromRow<'r, PgRow> for Account {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let type_str: String = row.try_get("account_type")?;
        let account_type = AccountType::from_str(&type_str).ok_or_else(|| {
            decode_err(
                "account_type",
                StoreError::Read(format!("unknown account_type: {type_str}")),
            )
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            account_type,
            balance: row.try_get("balance")?,
            owner: row.try_get("owner")?,
            owner_username: row.try_get("owner_username")?,
            bsb: row.try_get("bsb")?,
            acc: row.try_get("acc")?,
            opening_balance: row.try_get("opening_balance")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Transaction {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let type_str: String = row.try_get("transaction_type")?;
        let transaction_type = TransactionKind::from_str(&type_str).ok_or_else(|| {
            decode_err(
                "transaction_type",
                StoreError::Read(format!("unknown transaction_type: {type_str}")),
            )
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            description: row.try_get("description")?,
            amount: row.try_get("amount")?,
            paid_on: row.try_get("paid_on")?,
            from_account: row.try_get("from_account")?,
            from_account_username: row.try_get("from_account_username")?,
            to_account: row.try_get("to_account")?,
            to_account_username: row.try_get("to_account_username")?,
            transaction_type,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Bill {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let status_str: String = row.try_get("status")?;
        let status = BillStatus::from_str(&status_str).ok_or_else(|| {
            decode_err(
                "status",
                StoreError::Read(format!("unknown bill status: {status_str}")),
            )
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            billed_user: row.try_get("billed_user")?,
            from_biller: row.try_get("from_biller")?,
            description: row.try_get("description")?,
            amount: row.try_get("amount")?,
            status,
            created_at: row.try_get("created_at")?,
            due_date: row.try_get("due_date")?,
            invoice_number: row.try_get("invoice_number")?,
            reference_number: row.try_get("reference_number")?,
            linked_bill: row.try_get("linked_bill")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Biller {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            code: row.try_get("code")?,
            category: row.try_get("category")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Schedule {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let type_str: String = row.try_get("schedule_type")?;
        let schedule_type =
            ScheduleType::parse(&type_str).map_err(|e| decode_err("schedule_type", e))?;
        let status_str: String = row.try_get("status")?;
        let status = ScheduleStatus::from_str(&status_str).ok_or_else(|| {
            decode_err(
                "status",
                StoreError::Read(format!("unknown schedule status: {status_str}")),
            )
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            pay_at: row.try_get("pay_at")?,
            related_user: row.try_get("related_user")?,
            from_account: row.try_get("from_account")?,
            to_account: row.try_get("to_account")?,
            biller_name: row.try_get("biller_name")?,
            biller_code: row.try_get("biller_code")?,
            reference_number: row.try_get("reference_number")?,
            amount: row.try_get("amount")?,
            description: row.try_get("description")?,
            schedule_ref: row.try_get("schedule_ref")?,
            schedule_type,
            status,
            recurring_payment: row.try_get("recurring_payment")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Recurrence {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let interval_str: String = row.try_get("interval")?;
        let interval =
            PayInterval::parse(&interval_str).map_err(|e| decode_err("interval", e))?;
        let rule_str: String = row.try_get("recur_rule")?;
        let recur_rule = RecurRule::parse(&rule_str).map_err(|e| decode_err("recur_rule", e))?;
        Ok(Self {
            id: row.try_get("id")?,
            interval,
            related_schedule: row.try_get("related_schedule")?,
            recur_rule,
            end_date: row.try_get("end_date")?,
            recur_count_dec: row.try_get("recur_count_dec")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Message {
    fn from_row(row: &'r PgRow) -> std::result::Result<Self, sqlx::Error> {
        let kind_str: String = row.try_get("kind")?;
        let kind = MessageKind::from_str(&kind_str).ok_or_else(|| {
            decode_err(
                "kind",
                StoreError::Read(format!("unknown message kind: {kind_str}")),
            )
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            sender_name: row.try_get("sender_name")?,
            to_user: row.try_get("to_user")?,
            description: row.try_get("description")?,
            kind,
            invoice_ref: row.try_get("invoice_ref")?,
            linked_bill: row.try_get("linked_bill")?,
            schedule_ref: row.try_get("schedule_ref")?,
            read: row.try_get("read")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO account (account_type, balance, owner, owner_username, bsb, acc, opening_balance)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, account_type, balance, owner, owner_username, bsb, acc, opening_balance
            "#,
        )
        .bind(account.account_type.as_str())
        .bind(account.balance)
        .bind(account.owner)
        .bind(&account.owner_username)
        .bind(&account.bsb)
        .bind(&account.acc)
        .bind(account.opening_balance)
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn account(&self, id: AccountId) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            "SELECT id, account_type, balance, owner, owner_username, bsb, acc, opening_balance
             FROM account WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(read_err)?
        .ok_or_else(|| StoreError::not_found("account", id).into())
    }

    async fn update_account_balance(&self, id: AccountId, balance: Decimal) -> Result<()> {
        let result = sqlx::query("UPDATE account SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("account", id).into());
        }
        Ok(())
    }

    async fn insert_transaction(&self, txn: NewTransaction) -> Result<Transaction> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transaction
                (description, amount, paid_on, from_account, from_account_username,
                 to_account, to_account_username, transaction_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, description, amount, paid_on, from_account, from_account_username,
                      to_account, to_account_username, transaction_type
            "#,
        )
        .bind(&txn.description)
        .bind(txn.amount)
        .bind(txn.paid_on)
        .bind(txn.from_account)
        .bind(&txn.from_account_username)
        .bind(txn.to_account)
        .bind(&txn.to_account_username)
        .bind(txn.transaction_type.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn commit_ledger(
        &self,
        updates: &[BalanceUpdate],
        txn: NewTransaction,
    ) -> Result<Transaction> {
        let mut tx = self.pool.begin().await.map_err(write_err)?;
        for update in updates {
            let result = sqlx::query("UPDATE account SET balance = $1 WHERE id = $2")
                .bind(update.balance)
                .bind(update.account)
                .execute(&mut *tx)
                .await
                .map_err(write_err)?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found("account", update.account).into());
            }
        }
        let row = sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transaction
                (description, amount, paid_on, from_account, from_account_username,
                 to_account, to_account_username, transaction_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, description, amount, paid_on, from_account, from_account_username,
                      to_account, to_account_username, transaction_type
            "#,
        )
        .bind(&txn.description)
        .bind(txn.amount)
        .bind(txn.paid_on)
        .bind(txn.from_account)
        .bind(&txn.from_account_username)
        .bind(txn.to_account)
        .bind(&txn.to_account_username)
        .bind(txn.transaction_type.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(write_err)?;
        tx.commit().await.map_err(write_err)?;
        Ok(row)
    }

    async fn transactions_for_account(&self, account: AccountId) -> Result<Vec<Transaction>> {
        sqlx::query_as::<_, Transaction>(
            "SELECT id, description, amount, paid_on, from_account, from_account_username,
                    to_account, to_account_username, transaction_type
             FROM transaction
             WHERE from_account = $1 OR to_account = $1
             ORDER BY paid_on DESC",
        )
        .bind(account)
        .fetch_all(&*self.pool)
        .await
        .map_err(read_err)
    }

    async fn insert_biller(&self, biller: NewBiller) -> Result<Biller> {
        sqlx::query_as::<_, Biller>(
            "INSERT INTO billers (name, code, category) VALUES ($1, $2, $3)
             RETURNING id, name, code, category",
        )
        .bind(&biller.name)
        .bind(&biller.code)
        .bind(&biller.category)
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn billers(&self) -> Result<Vec<Biller>> {
        sqlx::query_as::<_, Biller>("SELECT id, name, code, category FROM billers ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(read_err)
    }

    async fn biller_by_code(&self, code: &str) -> Result<Biller> {
        sqlx::query_as::<_, Biller>("SELECT id, name, code, category FROM billers WHERE code = $1")
            .bind(code)
            .fetch_optional(&*self.pool)
            .await
            .map_err(read_err)?
            .ok_or_else(|| StoreError::not_found("biller", code).into())
    }

    async fn insert_bill(&self, bill: NewBill) -> Result<Bill> {
        sqlx::query_as::<_, Bill>(
            r#"
            INSERT INTO bills
                (billed_user, from_biller, description, amount, status, created_at,
                 due_date, invoice_number, reference_number, linked_bill)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, billed_user, from_biller, description, amount, status, created_at,
                      due_date, invoice_number, reference_number, linked_bill
            "#,
        )
        .bind(bill.billed_user)
        .bind(&bill.from_biller)
        .bind(&bill.description)
        .bind(bill.amount)
        .bind(bill.status.as_str())
        .bind(bill.created_at)
        .bind(bill.due_date)
        .bind(&bill.invoice_number)
        .bind(&bill.reference_number)
        .bind(bill.linked_bill)
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn bills_for_user(&self, user: UserId) -> Result<Vec<Bill>> {
        sqlx::query_as::<_, Bill>(
            "SELECT id, billed_user, from_biller, description, amount, status, created_at,
                    due_date, invoice_number, reference_number, linked_bill
             FROM bills WHERE billed_user = $1 ORDER BY id",
        )
        .bind(user)
        .fetch_all(&*self.pool)
        .await
        .map_err(read_err)
    }

    async fn open_bills(&self, user: UserId, biller_name: &str) -> Result<Vec<Bill>> {
        sqlx::query_as::<_, Bill>(
            "SELECT id, billed_user, from_biller, description, amount, status, created_at,
                    due_date, invoice_number, reference_number, linked_bill
             FROM bills
             WHERE billed_user = $1 AND from_biller = $2
               AND status IN ('unpaid', 'partial', 'overdue')
             ORDER BY due_date ASC",
        )
        .bind(user)
        .bind(biller_name)
        .fetch_all(&*self.pool)
        .await
        .map_err(read_err)
    }

    async fn set_bill_status(&self, id: BillId, status: BillStatus) -> Result<()> {
        let result = sqlx::query("UPDATE bills SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("bill", id).into());
        }
        Ok(())
    }

    async fn update_bill_payment(
        &self,
        id: BillId,
        amount: Decimal,
        status: BillStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE bills SET amount = $1, status = $2 WHERE id = $3")
            .bind(amount)
            .bind(status.as_str())
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("bill", id).into());
        }
        Ok(())
    }

    async fn max_bill_id(&self) -> Result<Option<BillId>> {
        sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(id) FROM bills")
            .fetch_one(&*self.pool)
            .await
            .map_err(read_err)
    }

    async fn insert_schedule(&self, schedule: NewSchedule) -> Result<Schedule> {
        sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedule_payments
                (pay_at, related_user, from_account, to_account, biller_name, biller_code,
                 reference_number, amount, description, schedule_ref, schedule_type, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
            RETURNING id, pay_at, related_user, from_account, to_account, biller_name,
                      biller_code, reference_number, amount, description, schedule_ref,
                      schedule_type, status, recurring_payment
            "#,
        )
        .bind(schedule.pay_at)
        .bind(schedule.related_user)
        .bind(schedule.from_account)
        .bind(schedule.to_account)
        .bind(&schedule.biller_name)
        .bind(&schedule.biller_code)
        .bind(&schedule.reference_number)
        .bind(schedule.amount)
        .bind(&schedule.description)
        .bind(&schedule.schedule_ref)
        .bind(schedule.schedule_type.as_str())
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn schedule(&self, id: ScheduleId) -> Result<Schedule> {
        sqlx::query_as::<_, Schedule>(
            "SELECT id, pay_at, related_user, from_account, to_account, biller_name,
                    biller_code, reference_number, amount, description, schedule_ref,
                    schedule_type, status, recurring_payment
             FROM schedule_payments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(read_err)?
        .ok_or_else(|| StoreError::not_found("schedule", id).into())
    }

    async fn schedule_by_ref(&self, schedule_ref: &str) -> Result<Schedule> {
        sqlx::query_as::<_, Schedule>(
            "SELECT id, pay_at, related_user, from_account, to_account, biller_name,
                    biller_code, reference_number, amount, description, schedule_ref,
                    schedule_type, status, recurring_payment
             FROM schedule_payments WHERE schedule_ref = $1",
        )
        .bind(schedule_ref)
        .fetch_optional(&*self.pool)
        .await
        .map_err(read_err)?
        .ok_or_else(|| StoreError::not_found("schedule", schedule_ref).into())
    }

    async fn link_recurrence(&self, id: ScheduleId, recurrence: RecurrenceId) -> Result<()> {
        let result =
            sqlx::query("UPDATE schedule_payments SET recurring_payment = $1 WHERE id = $2")
                .bind(recurrence)
                .bind(id)
                .execute(&*self.pool)
                .await
                .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("schedule", id).into());
        }
        Ok(())
    }

    async fn claim_due_schedules(&self, now: DateTime<Utc>) -> Result<Vec<Schedule>> {
        let mut claimed = sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedule_payments SET status = 'processing'
            WHERE status = 'pending' AND pay_at <= $1
            RETURNING id, pay_at, related_user, from_account, to_account, biller_name,
                      biller_code, reference_number, amount, description, schedule_ref,
                      schedule_type, status, recurring_payment
            "#,
        )
        .bind(now)
        .fetch_all(&*self.pool)
        .await
        .map_err(write_err)?;
        claimed.sort_by_key(|s| s.id);
        Ok(claimed)
    }

    async fn release_schedule(&self, id: ScheduleId) -> Result<()> {
        let result = sqlx::query("UPDATE schedule_payments SET status = 'pending' WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("schedule", id).into());
        }
        Ok(())
    }

    async fn complete_schedule(&self, id: ScheduleId) -> Result<()> {
        let result = sqlx::query("UPDATE schedule_payments SET status = 'completed' WHERE id = $1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("schedule", id).into());
        }
        Ok(())
    }

    async fn reschedule(&self, id: ScheduleId, pay_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE schedule_payments SET pay_at = $1, status = 'pending' WHERE id = $2",
        )
        .bind(pay_at)
        .bind(id)
        .execute(&*self.pool)
        .await
        .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("schedule", id).into());
        }
        Ok(())
    }

    async fn insert_recurrence(&self, recurrence: NewRecurrence) -> Result<Recurrence> {
        sqlx::query_as::<_, Recurrence>(
            r#"
            INSERT INTO recurring_payments
                (interval, related_schedule, recur_rule, end_date, recur_count_dec)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, interval, related_schedule, recur_rule, end_date, recur_count_dec
            "#,
        )
        .bind(recurrence.interval.as_str())
        .bind(recurrence.related_schedule)
        .bind(recurrence.recur_rule.as_str())
        .bind(recurrence.end_date)
        .bind(recurrence.recur_count_dec)
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn recurrence(&self, id: RecurrenceId) -> Result<Recurrence> {
        sqlx::query_as::<_, Recurrence>(
            "SELECT id, interval, related_schedule, recur_rule, end_date, recur_count_dec
             FROM recurring_payments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(read_err)?
        .ok_or_else(|| StoreError::not_found("recurrence", id).into())
    }

    async fn decrement_recur_count(&self, id: RecurrenceId) -> Result<i32> {
        let remaining = sqlx::query_scalar::<_, Option<i32>>(
            "UPDATE recurring_payments SET recur_count_dec = recur_count_dec - 1
             WHERE id = $1
             RETURNING recur_count_dec",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(write_err)?
        .ok_or_else(|| StoreError::not_found("recurrence", id))?;
        remaining.ok_or_else(|| StoreError::not_found("recurrence count", id).into())
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages
                (sender_name, to_user, description, kind, invoice_ref, linked_bill, schedule_ref)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, sender_name, to_user, description, kind, invoice_ref, linked_bill,
                      schedule_ref, read, created_at
            "#,
        )
        .bind(&message.sender_name)
        .bind(message.to_user)
        .bind(&message.description)
        .bind(message.kind.as_str())
        .bind(&message.invoice_ref)
        .bind(message.linked_bill)
        .bind(&message.schedule_ref)
        .fetch_one(&*self.pool)
        .await
        .map_err(write_err)
    }

    async fn messages_for_user(&self, user: UserId) -> Result<Vec<Message>> {
        sqlx::query_as::<_, Message>(
            "SELECT id, sender_name, to_user, description, kind, invoice_ref, linked_bill,
                    schedule_ref, read, created_at
             FROM messages WHERE to_user = $1 ORDER BY created_at DESC",
        )
        .bind(user)
        .fetch_all(&*self.pool)
        .await
        .map_err(read_err)
    }
}
