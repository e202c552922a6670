//! Schedule entry creation. `ScheduleConfig` is an immutable per-call value:
//! nothing carries over between entries, so stale recurrence settings cannot
//! leak from one creation into the next.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;
use crate::models::{
    AccountId, NewRecurrence, NewSchedule, PayInterval, RecurRule, ScheduleType, UserId,
};
use crate::store::Store;
use crate::utils::idgen;

/// How a schedule entry repeats, if at all. Defaults to a one-off transfer
/// paid monthly should it ever recur.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScheduleConfig {
    schedule_type: ScheduleType,
    interval: PayInterval,
    recur_rule: Option<RecurRule>,
    end_date: Option<DateTime<Utc>>,
    recur_count: Option<i32>,
}

impl ScheduleConfig {
    pub fn new(schedule_type: ScheduleType) -> Self {
        Self {
            schedule_type,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: PayInterval) -> Self {
        self.interval = interval;
        self
    }

    /// Only meaningful for the `*_recur` schedule types; ignored otherwise.
    pub fn with_recur_rule(mut self, rule: RecurRule) -> Self {
        self.recur_rule = Some(rule);
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_recur_count(mut self, count: i32) -> Self {
        self.recur_count = Some(count);
        self
    }

    pub fn schedule_type(&self) -> ScheduleType {
        self.schedule_type
    }
}

/// The payment being deferred: source, destination or biller, amount and
/// when it first falls due.
#[derive(Clone, Debug)]
pub struct NewScheduleEntry {
    pub from_account: AccountId,
    pub to_account: Option<AccountId>,
    pub biller_name: Option<String>,
    pub biller_code: Option<String>,
    pub reference_number: Option<String>,
    pub amount: Decimal,
    pub description: String,
    pub pay_at: DateTime<Utc>,
    pub related_user: UserId,
}

/// Persists a pending schedule (and, for recurring types, its linked
/// recurrence row) and returns the generated `schedule_ref`.
pub async fn create_schedule_entry(
    store: &dyn Store,
    config: ScheduleConfig,
    entry: NewScheduleEntry,
) -> Result<String> {
    let schedule_ref = idgen::schedule_ref();
    let is_bpay = config.schedule_type.is_bpay();

    let schedule = store
        .insert_schedule(NewSchedule {
            pay_at: entry.pay_at,
            related_user: entry.related_user,
            from_account: entry.from_account,
            to_account: if is_bpay { None } else { entry.to_account },
            biller_name: if is_bpay { entry.biller_name } else { None },
            biller_code: if is_bpay { entry.biller_code } else { None },
            reference_number: if is_bpay { entry.reference_number } else { None },
            amount: entry.amount,
            description: entry.description,
            schedule_ref: schedule_ref.clone(),
            schedule_type: config.schedule_type,
        })
        .await?;

    if config.schedule_type.is_recurring() {
        let recurrence = store
            .insert_recurrence(NewRecurrence {
                interval: config.interval,
                related_schedule: schedule.id,
                recur_rule: config.recur_rule.unwrap_or(RecurRule::UntilFurtherNotice),
                end_date: config.end_date,
                recur_count_dec: config.recur_count,
            })
            .await?;
        store.link_recurrence(schedule.id, recurrence.id).await?;
    }

    info!(
        schedule = schedule.id,
        schedule_ref = %schedule_ref,
        schedule_type = config.schedule_type.as_str(),
        pay_at = %entry.pay_at,
        "schedule entry created"
    );
    Ok(schedule_ref)
}
