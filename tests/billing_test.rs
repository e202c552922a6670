// Tests for bill assignment: invoice numbering, reference numbers, the
// 30-day term, and overdue derivation on read.

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

use netbank_api::models::{BillStatus, MessageKind};
use netbank_api::services::bills::{self, BillAssignment};
use netbank_api::store::Store;
use netbank_api::utils::idgen;

use test_helpers::*;

fn assignment(user: i64, biller: &str, amount: rust_decimal::Decimal) -> BillAssignment {
    BillAssignment {
        billed_user: user,
        from_biller: biller.to_string(),
        description: format!("{biller} quarterly bill"),
        amount,
        linked_bill: None,
    }
}

#[tokio::test]
async fn invoice_numbers_are_monotonic() {
    assert_eq!(idgen::invoice_number(None), "INV/20201");
    assert_eq!(idgen::invoice_number(Some(7)), "INV/20208");
    assert_eq!(idgen::invoice_number(Some(8)), "INV/20209");

    let store = setup_test_store();
    let first = bills::assign_bill(store.as_ref(), assignment(1, "City Power & Gas", dec!(40)))
        .await
        .unwrap();
    let second = bills::assign_bill(store.as_ref(), assignment(1, "AquaNet Water", dec!(25)))
        .await
        .unwrap();
    let third = bills::assign_bill(store.as_ref(), assignment(2, "AquaNet Water", dec!(10)))
        .await
        .unwrap();

    // Each invoice continues from the highest existing bill id.
    assert_eq!(
        second.invoice_number,
        format!("INV/{}", 20200 + first.id + 1)
    );
    assert_eq!(
        third.invoice_number,
        format!("INV/{}", 20200 + second.id + 1)
    );
    assert!(third.invoice_number > second.invoice_number);
    assert!(second.invoice_number > first.invoice_number);
}

#[tokio::test]
async fn reference_numbers_are_twelve_digit_numeric_strings() {
    for _ in 0..50 {
        let reference = idgen::reference_number();
        assert_eq!(reference.len(), 12);
        assert!(reference.chars().all(|c| c.is_ascii_digit()));
    }
}

#[tokio::test]
async fn assigned_bill_gets_a_30_day_term_and_notifies_the_user() {
    let store = setup_test_store();
    let before = Utc::now();
    let bill = bills::assign_bill(store.as_ref(), assignment(1, "MetroNet Internet", dec!(55)))
        .await
        .unwrap();
    let after = Utc::now();

    assert_eq!(bill.status, BillStatus::Unpaid);
    assert_eq!(bill.amount, dec!(55));
    assert!(bill.due_date >= (before + Duration::days(30)).date_naive());
    assert!(bill.due_date <= (after + Duration::days(30)).date_naive());

    let messages = store.messages_for_user(1).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::Bill);
    assert_eq!(
        messages[0].invoice_ref.as_deref(),
        Some(bill.invoice_number.as_str())
    );
    assert_eq!(messages[0].linked_bill, Some(bill.id));
}

#[tokio::test]
async fn overdue_is_derived_on_read_and_never_persisted() {
    let store = setup_test_store();
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let next_week = (Utc::now() + Duration::days(7)).date_naive();
    let late = create_test_bill(store.as_ref(), 1, "City Power & Gas", dec!(40), yesterday).await;
    let current = create_test_bill(store.as_ref(), 1, "City Power & Gas", dec!(25), next_week).await;

    let listed = bills::bills_with_derived_status(store.as_ref(), 1)
        .await
        .unwrap();
    let get = |id| listed.iter().find(|b| b.id == id).unwrap();
    assert_eq!(get(late.id).status, BillStatus::Overdue);
    assert_eq!(get(current.id).status, BillStatus::Unpaid);

    // The stored row keeps its lifecycle status; overdue is read-side only.
    let stored = store.bills_for_user(1).await.unwrap();
    assert!(stored.iter().all(|b| b.status == BillStatus::Unpaid));
}

#[tokio::test]
async fn paid_bills_never_show_as_overdue() {
    let store = setup_test_store();
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let bill = create_test_bill(store.as_ref(), 1, "AquaNet Water", dec!(30), yesterday).await;
    store
        .set_bill_status(bill.id, BillStatus::Paid)
        .await
        .unwrap();

    let listed = bills::bills_with_derived_status(store.as_ref(), 1)
        .await
        .unwrap();
    assert_eq!(listed[0].status, BillStatus::Paid);
}
