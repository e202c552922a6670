//! The schedule execution engine. A scan claims every due pending schedule
//! (`pending → processing`), then processes the claims sequentially: perform
//! the transfer or BPAY payment, notify the user, and either complete the
//! schedule or advance its recurrence. An underfunded schedule is released
//! back to `pending` untouched and re-attempted on every subsequent scan.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{PaymentError, Result};
use crate::models::{
    MessageKind, NewMessage, RecurRule, Schedule, ScheduleType, TransactionKind,
};
use crate::services::{bpay, ledger, notify};
use crate::store::Store;

/// Counters for one scan, logged and surfaced by the manual runner.
#[derive(Debug, Default, Serialize)]
pub struct ExecutionReport {
    pub claimed: usize,
    pub completed: usize,
    pub rescheduled: usize,
    pub skipped_insufficient: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    Rescheduled,
    SkippedInsufficient,
}

enum PaymentOutcome {
    Paid { recipient: String },
    InsufficientFunds,
}

pub struct ScheduleEngine {
    store: Arc<dyn Store>,
    sender_name: String,
}

impl ScheduleEngine {
    pub fn new(store: Arc<dyn Store>, sender_name: impl Into<String>) -> Self {
        Self {
            store,
            sender_name: sender_name.into(),
        }
    }

    /// One scan over everything due now.
    pub async fn run_once(&self) -> Result<ExecutionReport> {
        self.run_at(Utc::now()).await
    }

    /// One scan over everything due at `now`. Schedules are claimed
    /// atomically up front, so an overlapping scan sees nothing to do.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ExecutionReport> {
        let due = self.store.claim_due_schedules(now).await?;
        let mut report = ExecutionReport {
            claimed: due.len(),
            ..Default::default()
        };

        for schedule in &due {
            match self.execute(schedule).await {
                Ok(Outcome::Completed) => report.completed += 1,
                Ok(Outcome::Rescheduled) => report.rescheduled += 1,
                Ok(Outcome::SkippedInsufficient) => report.skipped_insufficient += 1,
                Err(e) => {
                    error!(schedule = schedule.id, error = %e, "schedule execution failed");
                    // Put the claim back so the schedule is picked up again
                    // on the next scan, as an unexecuted pending entry.
                    if let Err(release) = self.store.release_schedule(schedule.id).await {
                        error!(schedule = schedule.id, error = %release, "failed to release claim");
                    }
                    report.failed += 1;
                }
            }
        }

        if report.claimed > 0 {
            info!(
                claimed = report.claimed,
                completed = report.completed,
                rescheduled = report.rescheduled,
                skipped = report.skipped_insufficient,
                failed = report.failed,
                "schedule scan finished"
            );
        }
        Ok(report)
    }

    async fn execute(&self, schedule: &Schedule) -> Result<Outcome> {
        let payment = match schedule.schedule_type {
            ScheduleType::TransferSchedule | ScheduleType::TransferRecur => {
                self.execute_transfer(schedule).await?
            }
            ScheduleType::BpaySchedule | ScheduleType::BpayRecur => {
                self.execute_bpay(schedule).await?
            }
        };

        match payment {
            PaymentOutcome::InsufficientFunds => {
                // Notify-only policy: no failed state, no backoff. The
                // schedule returns to pending and is retried on every scan
                // until the account can cover it.
                self.store.release_schedule(schedule.id).await?;
                Ok(Outcome::SkippedInsufficient)
            }
            PaymentOutcome::Paid { recipient } => {
                if schedule.schedule_type.is_recurring() {
                    self.execute_recur(schedule, &recipient).await
                } else {
                    self.store.complete_schedule(schedule.id).await?;
                    Ok(Outcome::Completed)
                }
            }
        }
    }

    async fn execute_transfer(&self, schedule: &Schedule) -> Result<PaymentOutcome> {
        let from = self.store.account(schedule.from_account).await?;
        let to_id = schedule
            .to_account
            .ok_or(PaymentError::MalformedSchedule {
                id: schedule.id,
                field: "to_account",
            })?;
        let to = self.store.account(to_id).await?;

        if from.balance < schedule.amount {
            self.notify_insufficient(schedule).await;
            return Ok(PaymentOutcome::InsufficientFunds);
        }

        self.notify_paid(schedule, &to.owner_username).await;
        ledger::create_transaction(
            self.store.as_ref(),
            &from,
            &to,
            schedule.amount,
            &schedule.description,
            TransactionKind::TransferFunds,
        )
        .await?;
        Ok(PaymentOutcome::Paid {
            recipient: to.owner_username,
        })
    }

    async fn execute_bpay(&self, schedule: &Schedule) -> Result<PaymentOutcome> {
        let from = self.store.account(schedule.from_account).await?;
        let code = schedule
            .biller_code
            .as_deref()
            .ok_or(PaymentError::MalformedSchedule {
                id: schedule.id,
                field: "biller_code",
            })?;
        let biller = self.store.biller_by_code(code).await?;

        if from.balance < schedule.amount {
            self.notify_insufficient(schedule).await;
            return Ok(PaymentOutcome::InsufficientFunds);
        }

        let reference = schedule
            .reference_number
            .clone()
            .ok_or(PaymentError::MalformedSchedule {
                id: schedule.id,
                field: "reference_number",
            })?;

        self.notify_paid(schedule, &biller.name).await;
        bpay::pay_bills(
            self.store.as_ref(),
            &from,
            &biller.name,
            &biller.code,
            &reference,
            schedule.amount,
            &schedule.description,
            schedule.related_user,
        )
        .await?;
        Ok(PaymentOutcome::Paid {
            recipient: biller.name,
        })
    }

    /// Advances a recurring schedule after a successful payment: reschedule
    /// forward, or complete once the recurrence has run its course.
    async fn execute_recur(&self, schedule: &Schedule, recipient: &str) -> Result<Outcome> {
        let recurrence_id = schedule
            .recurring_payment
            .ok_or(PaymentError::MissingRecurrence(schedule.id))?;
        let recurrence = self.store.recurrence(recurrence_id).await?;
        let next_pay_at = recurrence.interval.next_occurrence(schedule.pay_at);

        match recurrence.recur_rule {
            RecurRule::UntilFurtherNotice => {
                self.advance(schedule, recipient, next_pay_at).await
            }
            RecurRule::UntilDate => match recurrence.end_date {
                Some(end_date) if next_pay_at > end_date => self.complete(schedule).await,
                _ => self.advance(schedule, recipient, next_pay_at).await,
            },
            RecurRule::ForCount => {
                let remaining = self.store.decrement_recur_count(recurrence_id).await?;
                if remaining <= 0 {
                    self.complete(schedule).await
                } else {
                    self.advance(schedule, recipient, next_pay_at).await
                }
            }
        }
    }

    async fn complete(&self, schedule: &Schedule) -> Result<Outcome> {
        self.store.complete_schedule(schedule.id).await?;
        info!(schedule = schedule.id, "recurring schedule completed");
        Ok(Outcome::Completed)
    }

    async fn advance(
        &self,
        schedule: &Schedule,
        recipient: &str,
        next_pay_at: DateTime<Utc>,
    ) -> Result<Outcome> {
        self.store.reschedule(schedule.id, next_pay_at).await?;
        notify::notify(
            self.store.as_ref(),
            NewMessage {
                sender_name: self.sender_name.clone(),
                to_user: schedule.related_user,
                description: format!(
                    "Recurring payment of ${} to {} was made; the next payment is on {}",
                    schedule.amount,
                    recipient,
                    next_pay_at.date_naive()
                ),
                kind: MessageKind::Recurring,
                invoice_ref: None,
                linked_bill: None,
                schedule_ref: Some(schedule.schedule_ref.clone()),
            },
        )
        .await;
        Ok(Outcome::Rescheduled)
    }

    async fn notify_paid(&self, schedule: &Schedule, recipient: &str) {
        notify::notify(
            self.store.as_ref(),
            NewMessage {
                sender_name: self.sender_name.clone(),
                to_user: schedule.related_user,
                description: format!(
                    "Scheduled payment of ${} to {} was made",
                    schedule.amount, recipient
                ),
                kind: MessageKind::Schedule,
                invoice_ref: None,
                linked_bill: None,
                schedule_ref: Some(schedule.schedule_ref.clone()),
            },
        )
        .await;
    }

    async fn notify_insufficient(&self, schedule: &Schedule) {
        notify::notify(
            self.store.as_ref(),
            NewMessage {
                sender_name: self.sender_name.clone(),
                to_user: schedule.related_user,
                description: format!(
                    "Scheduled payment of ${} could not be made: insufficient funds in the source account",
                    schedule.amount
                ),
                kind: MessageKind::Insufficient,
                invoice_ref: None,
                linked_bill: None,
                schedule_ref: Some(schedule.schedule_ref.clone()),
            },
        )
        .await;
    }
}
