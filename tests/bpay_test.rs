// Tests for bill resolution: oldest-due-first application, partial splits,
// and the overpayment refund.

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use netbank_api::models::{BillStatus, TransactionKind};
use netbank_api::services::bpay;
use netbank_api::store::Store;

use test_helpers::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[tokio::test]
async fn payment_is_applied_oldest_due_first_and_splits_partials() {
    let store = setup_test_store();
    let account = create_test_account(store.as_ref(), 1, "ava", dec!(200)).await;
    let biller = "City Power & Gas";
    let oldest = create_test_bill(store.as_ref(), 1, biller, dec!(40), date(2026, 3, 1)).await;
    let middle = create_test_bill(store.as_ref(), 1, biller, dec!(25), date(2026, 4, 1)).await;
    let newest = create_test_bill(store.as_ref(), 1, biller, dec!(10), date(2026, 5, 1)).await;

    bpay::pay_bills(
        store.as_ref(),
        &account,
        biller,
        "2775",
        "000123456789",
        dec!(50),
        "bill run",
        1,
    )
    .await
    .expect("bill resolution should succeed");

    let bills = store.bills_for_user(1).await.unwrap();
    let get = |id| bills.iter().find(|b| b.id == id).unwrap();

    // 40 fully covers the oldest bill; the remaining 10 splits the next one.
    assert_eq!(get(oldest.id).status, BillStatus::Paid);
    assert_eq!(get(middle.id).status, BillStatus::Partial);
    assert_eq!(get(middle.id).amount, dec!(15));
    assert_eq!(get(newest.id).status, BillStatus::Unpaid);
    assert_eq!(get(newest.id).amount, dec!(10));

    // The whole payment was consumed, so no refund.
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(150));

    let txns = store.transactions_for_account(account.id).await.unwrap();
    assert_eq!(txns.len(), 2);
    assert!(txns.iter().all(|t| t.transaction_type == TransactionKind::Bpay));
    let mut amounts: Vec<_> = txns.iter().map(|t| t.amount).collect();
    amounts.sort();
    assert_eq!(amounts, vec![dec!(10), dec!(40)]);
}

#[tokio::test]
async fn overpayment_is_refunded_after_bills_are_settled() {
    let store = setup_test_store();
    let account = create_test_account(store.as_ref(), 1, "ava", dec!(500)).await;
    let biller = "AquaNet Water";
    let bill = create_test_bill(store.as_ref(), 1, biller, dec!(30), date(2026, 3, 1)).await;

    bpay::pay_bills(
        store.as_ref(),
        &account,
        biller,
        "51003",
        "000987654321",
        dec!(100),
        "water bill",
        1,
    )
    .await
    .expect("bill resolution should succeed");

    let bills = store.bills_for_user(1).await.unwrap();
    assert_eq!(bills[0].id, bill.id);
    assert_eq!(bills[0].status, BillStatus::Paid);

    // Net debit is only what the bill needed; the 70 excess came back.
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(470));

    let txns = store.transactions_for_account(account.id).await.unwrap();
    assert_eq!(txns.len(), 1);
    assert_eq!(txns[0].amount, dec!(30));
}

#[tokio::test]
async fn payment_with_no_open_bills_is_fully_refunded() {
    let store = setup_test_store();
    let account = create_test_account(store.as_ref(), 1, "ava", dec!(200)).await;

    bpay::pay_bills(
        store.as_ref(),
        &account,
        "MetroNet Internet",
        "93557",
        "000000000042",
        dec!(60),
        "internet",
        1,
    )
    .await
    .expect("bill resolution should succeed");

    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(200));
    assert!(store
        .transactions_for_account(account.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn paid_bills_are_not_picked_up_again() {
    let store = setup_test_store();
    let account = create_test_account(store.as_ref(), 1, "ava", dec!(200)).await;
    let biller = "City Power & Gas";
    let bill = create_test_bill(store.as_ref(), 1, biller, dec!(20), date(2026, 3, 1)).await;
    store
        .set_bill_status(bill.id, BillStatus::Paid)
        .await
        .unwrap();

    bpay::pay_bills(
        store.as_ref(),
        &account,
        biller,
        "2775",
        "000123456789",
        dec!(20),
        "already paid",
        1,
    )
    .await
    .expect("bill resolution should succeed");

    // Nothing open to apply against, so the payment came straight back.
    assert_eq!(store.account(account.id).await.unwrap().balance, dec!(200));
}
