// Tests for the schedule execution engine:
// - one-off transfer and BPAY schedules complete after paying
// - underfunded schedules stay pending, notify, and retry on every scan
// - recurring schedules advance on calendar-aware intervals
// - forCount / untilDate recurrences terminate
// - claiming makes overlapping scans safe (no double debit)

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use netbank_api::error::PaymentError;
use netbank_api::models::{
    BillStatus, MessageKind, PayInterval, RecurRule, ScheduleStatus, ScheduleType,
};
use netbank_api::services::{schedule, NewScheduleEntry, ScheduleConfig, ScheduleEngine};
use netbank_api::store::{MemStore, Store};

use test_helpers::*;

fn engine(store: &Arc<MemStore>) -> ScheduleEngine {
    ScheduleEngine::new(store.clone(), "NetBank")
}

fn transfer_entry(
    from: i64,
    to: i64,
    amount: rust_decimal::Decimal,
    pay_at: chrono::DateTime<Utc>,
) -> NewScheduleEntry {
    NewScheduleEntry {
        from_account: from,
        to_account: Some(to),
        biller_name: None,
        biller_code: None,
        reference_number: None,
        amount,
        description: "scheduled transfer".to_string(),
        pay_at,
        related_user: 1,
    }
}

#[tokio::test]
async fn due_transfer_schedule_pays_and_completes() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferSchedule),
        transfer_entry(from.id, to.id, dec!(30), now - Duration::hours(1)),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.claimed, 1);
    assert_eq!(report.completed, 1);

    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Completed);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(70));
    assert_eq!(store.account(to.id).await.unwrap().balance, dec!(30));

    let messages = store.messages_for_user(1).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Schedule);
    assert_eq!(messages[0].schedule_ref.as_deref(), Some(schedule_ref.as_str()));
}

#[tokio::test]
async fn future_schedules_are_not_claimed() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferSchedule),
        transfer_entry(from.id, to.id, dec!(30), now + Duration::days(1)),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.claimed, 0);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(100));
}

#[tokio::test]
async fn underfunded_schedule_stays_pending_and_notifies_each_scan() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(10)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferSchedule),
        transfer_entry(from.id, to.id, dec!(50), now - Duration::hours(1)),
    )
    .await
    .unwrap();

    let eng = engine(&store);
    let report = eng.run_at(now).await.unwrap();
    assert_eq!(report.skipped_insufficient, 1);

    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Pending);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(10));

    // Retry-until-funded: the next scan picks it up again and notifies again.
    let report = eng.run_at(now + Duration::minutes(5)).await.unwrap();
    assert_eq!(report.skipped_insufficient, 1);

    let messages = store.messages_for_user(1).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(messages
        .iter()
        .all(|m| m.kind == MessageKind::Insufficient));

    // Once funded, the schedule finally executes.
    store
        .update_account_balance(from.id, dec!(60))
        .await
        .unwrap();
    let report = eng.run_at(now + Duration::minutes(10)).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(10));
}

#[tokio::test]
async fn overlapping_scans_do_not_double_debit() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferSchedule),
        transfer_entry(from.id, to.id, dec!(30), now - Duration::hours(1)),
    )
    .await
    .unwrap();

    let eng = engine(&store);
    let (a, b) = tokio::join!(eng.run_at(now), eng.run_at(now));
    let (a, b) = (a.unwrap(), b.unwrap());

    // Exactly one scan claimed the schedule; the other saw nothing due.
    assert_eq!(a.claimed + b.claimed, 1);
    assert_eq!(a.completed + b.completed, 1);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(70));
    assert_eq!(store.account(to.id).await.unwrap().balance, dec!(30));
}

#[tokio::test]
async fn for_count_recurrence_completes_on_last_execution() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferRecur)
            .with_interval(PayInterval::Weekly)
            .with_recur_rule(RecurRule::ForCount)
            .with_recur_count(1),
        transfer_entry(from.id, to.id, dec!(20), now - Duration::hours(1)),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.completed, 1);
    assert_eq!(report.rescheduled, 0);

    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Completed);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(80));

    let recurrence = store
        .recurrence(entry.recurring_payment.expect("recurrence linked"))
        .await
        .unwrap();
    assert_eq!(recurrence.recur_count_dec, Some(0));
}

#[tokio::test]
async fn for_count_recurrence_reschedules_while_count_remains() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    let pay_at = now - Duration::hours(1);

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferRecur)
            .with_interval(PayInterval::Weekly)
            .with_recur_rule(RecurRule::ForCount)
            .with_recur_count(3),
        transfer_entry(from.id, to.id, dec!(20), pay_at),
    )
    .await
    .unwrap();

    let eng = engine(&store);
    let report = eng.run_at(now).await.unwrap();
    assert_eq!(report.rescheduled, 1);

    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Pending);
    assert_eq!(entry.pay_at, pay_at + Duration::weeks(1));

    let recurrence = store
        .recurrence(entry.recurring_payment.expect("recurrence linked"))
        .await
        .unwrap();
    assert_eq!(recurrence.recur_count_dec, Some(2));

    let messages = store.messages_for_user(1).await.unwrap();
    assert!(messages.iter().any(|m| m.kind == MessageKind::Recurring));

    // The rescheduled entry is a week out, so an immediate re-scan is a no-op.
    let report = eng.run_at(now).await.unwrap();
    assert_eq!(report.claimed, 0);
}

#[tokio::test]
async fn until_date_recurrence_completes_when_next_payment_passes_end_date() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferRecur)
            .with_interval(PayInterval::Monthly)
            .with_recur_rule(RecurRule::UntilDate)
            .with_end_date(now + Duration::days(14)),
        transfer_entry(from.id, to.id, dec!(20), now - Duration::hours(1)),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.completed, 1);

    // The payment itself was still made; only the recurrence ended.
    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Completed);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(80));
}

#[tokio::test]
async fn until_further_notice_advances_on_calendar_months() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let pay_at = Utc.with_ymd_and_hms(2026, 1, 31, 9, 0, 0).unwrap();
    let now = pay_at + Duration::hours(1);

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferRecur)
            .with_interval(PayInterval::Monthly)
            .with_recur_rule(RecurRule::UntilFurtherNotice),
        transfer_entry(from.id, to.id, dec!(20), pay_at),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.rescheduled, 1);

    // Jan 31 + 1 calendar month clamps to Feb 28.
    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Pending);
    assert_eq!(
        entry.pay_at,
        Utc.with_ymd_and_hms(2026, 2, 28, 9, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn underfunded_recurring_schedule_does_not_advance() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(5)).await;
    let to = create_test_account(store.as_ref(), 2, "ben", dec!(0)).await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    let pay_at = now - Duration::hours(1);

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::TransferRecur)
            .with_interval(PayInterval::Fortnightly)
            .with_recur_rule(RecurRule::ForCount)
            .with_recur_count(2),
        transfer_entry(from.id, to.id, dec!(50), pay_at),
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.skipped_insufficient, 1);

    // No payment, no advance: pay_at and the remaining count are untouched.
    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Pending);
    assert_eq!(entry.pay_at, pay_at);
    let recurrence = store
        .recurrence(entry.recurring_payment.expect("recurrence linked"))
        .await
        .unwrap();
    assert_eq!(recurrence.recur_count_dec, Some(2));
}

#[tokio::test]
async fn due_bpay_schedule_resolves_bills_and_completes() {
    let store = setup_test_store();
    let from = create_test_account(store.as_ref(), 1, "ava", dec!(100)).await;
    let biller = create_test_biller(store.as_ref(), "City Power & Gas", "2775").await;
    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 0, 0).unwrap();
    let bill = create_test_bill(
        store.as_ref(),
        1,
        &biller.name,
        dec!(30),
        (now - Duration::days(5)).date_naive(),
    )
    .await;

    let schedule_ref = schedule::create_schedule_entry(
        store.as_ref(),
        ScheduleConfig::new(ScheduleType::BpaySchedule),
        NewScheduleEntry {
            from_account: from.id,
            to_account: None,
            biller_name: Some(biller.name.clone()),
            biller_code: Some(biller.code.clone()),
            reference_number: Some("000123456789".to_string()),
            amount: dec!(30),
            description: "power bill".to_string(),
            pay_at: now - Duration::hours(1),
            related_user: 1,
        },
    )
    .await
    .unwrap();

    let report = engine(&store).run_at(now).await.unwrap();
    assert_eq!(report.completed, 1);

    let entry = store.schedule_by_ref(&schedule_ref).await.unwrap();
    assert_eq!(entry.status, ScheduleStatus::Completed);
    assert_eq!(store.account(from.id).await.unwrap().balance, dec!(70));

    let bills = store.bills_for_user(1).await.unwrap();
    assert_eq!(bills.iter().find(|b| b.id == bill.id).unwrap().status, BillStatus::Paid);
}

#[tokio::test]
async fn unknown_wire_values_fail_to_parse() {
    assert!(matches!(
        ScheduleType::parse("weekly_magic"),
        Err(PaymentError::UnsupportedScheduleType(_))
    ));
    assert!(matches!(
        RecurRule::parse("sometimes"),
        Err(PaymentError::UnsupportedRecurrenceRule(_))
    ));
    assert!(matches!(
        PayInterval::parse("daily"),
        Err(PaymentError::UnsupportedInterval(_))
    ));
}
