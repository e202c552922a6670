//! Bill resolution: applies an incoming BPAY payment across the paying
//! user's open bills for a biller, oldest due date first.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{error, info};

use crate::error::{PaymentError, Result};
use crate::models::{
    Account, BillStatus, NewTransaction, TransactionKind, UserId,
};
use crate::services::ledger;
use crate::store::Store;

/// Pays the user's open bills for `biller_name` with `amount` from `from`.
///
/// The full amount is debited up front; whatever cannot be applied to a bill
/// is refunded afterwards. Partial coverage leaves the bill `partial` with
/// the uncovered remainder still owed. Errors are wrapped as
/// `BpayProcessingFailed`; the up-front debit is not compensated beyond the
/// refund path.
#[allow(clippy::too_many_arguments)]
pub async fn pay_bills(
    store: &dyn Store,
    from: &Account,
    biller_name: &str,
    biller_code: &str,
    reference_number: &str,
    amount: Decimal,
    description: &str,
    paying_user: UserId,
) -> Result<()> {
    match apply_payment(
        store,
        from,
        biller_name,
        biller_code,
        reference_number,
        amount,
        description,
        paying_user,
    )
    .await
    {
        Ok(()) => Ok(()),
        Err(e) => {
            error!(
                user = paying_user,
                biller = biller_name,
                %amount,
                error = %e,
                "bpay bill resolution failed"
            );
            Err(PaymentError::BpayProcessingFailed(Box::new(e)))
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn apply_payment(
    store: &dyn Store,
    from: &Account,
    biller_name: &str,
    biller_code: &str,
    reference_number: &str,
    amount: Decimal,
    description: &str,
    paying_user: UserId,
) -> Result<()> {
    // Debit the whole payment up front; the unapplied remainder is refunded
    // at the end.
    ledger::update_account_balance(store, from, from.balance - amount).await?;

    let bills = store.open_bills(paying_user, biller_name).await?;

    let mut bill_credit = amount;
    for bill in &bills {
        if bill_credit <= Decimal::ZERO {
            break;
        }
        if bill_credit >= bill.amount {
            // Full cover: record the payment at the billed amount.
            store
                .insert_transaction(NewTransaction {
                    description: ledger::bpay_description(
                        description,
                        biller_name,
                        biller_code,
                        reference_number,
                    ),
                    amount: bill.amount,
                    paid_on: Utc::now(),
                    from_account: from.id,
                    from_account_username: from.owner_username.clone(),
                    to_account: None,
                    to_account_username: None,
                    transaction_type: TransactionKind::Bpay,
                })
                .await?;
            store.set_bill_status(bill.id, BillStatus::Paid).await?;
            bill_credit -= bill.amount;
        } else {
            // Partial cover: the remainder stays owed on the bill.
            store
                .insert_transaction(NewTransaction {
                    description: ledger::bpay_description(
                        description,
                        biller_name,
                        biller_code,
                        reference_number,
                    ),
                    amount: bill_credit,
                    paid_on: Utc::now(),
                    from_account: from.id,
                    from_account_username: from.owner_username.clone(),
                    to_account: None,
                    to_account_username: None,
                    transaction_type: TransactionKind::Bpay,
                })
                .await?;
            store
                .update_bill_payment(bill.id, bill.amount - bill_credit, BillStatus::Partial)
                .await?;
            bill_credit = Decimal::ZERO;
        }
    }

    if bill_credit > Decimal::ZERO {
        // Overpayment, or no open bills matched: refund the unused portion.
        let account = store.account(from.id).await?;
        ledger::update_account_balance(store, &account, account.balance + bill_credit).await?;
        info!(
            user = paying_user,
            biller = biller_name,
            refunded = %bill_credit,
            "bpay payment exceeded open bills, remainder refunded"
        );
    }

    info!(
        user = paying_user,
        biller = biller_name,
        %amount,
        bills = bills.len(),
        "bpay payment applied"
    );
    Ok(())
}
