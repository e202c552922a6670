//! Ledger operations: the only code path allowed to move money. Balance
//! writes and the transaction record are committed atomically through
//! [`Store::commit_ledger`], so a failed call leaves every balance untouched.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::{PaymentError, Result};
use crate::models::{Account, AccountType, NewTransaction, Transaction, TransactionKind};
use crate::store::{BalanceUpdate, Store};

/// Moves `amount` from one account to another and records the transaction.
///
/// Fails with `ZeroAmount` for a zero amount, and with `InsufficientFunds`
/// when the debit would drive the source negative or the credit would push a
/// credit-type destination above its limit (`opening_balance`).
pub async fn create_transaction(
    store: &dyn Store,
    from: &Account,
    to: &Account,
    amount: Decimal,
    description: &str,
    kind: TransactionKind,
) -> Result<Transaction> {
    if amount.is_zero() {
        return Err(PaymentError::ZeroAmount);
    }

    let from_balance = from.balance - amount;
    if from_balance < Decimal::ZERO {
        return Err(PaymentError::InsufficientFunds {
            account: from.id,
            balance: from.balance,
            amount,
        });
    }

    let to_balance = to.balance + amount;
    if to.account_type == AccountType::Credit && to_balance > to.opening_balance {
        return Err(PaymentError::InsufficientFunds {
            account: to.id,
            balance: to.balance,
            amount,
        });
    }

    let transaction = store
        .commit_ledger(
            &[
                BalanceUpdate {
                    account: from.id,
                    balance: from_balance,
                },
                BalanceUpdate {
                    account: to.id,
                    balance: to_balance,
                },
            ],
            NewTransaction {
                description: description.to_string(),
                amount,
                paid_on: Utc::now(),
                from_account: from.id,
                from_account_username: from.owner_username.clone(),
                to_account: Some(to.id),
                to_account_username: Some(to.owner_username.clone()),
                transaction_type: kind,
            },
        )
        .await?;

    info!(
        transaction = transaction.id,
        from = from.id,
        to = to.id,
        %amount,
        "transfer committed"
    );
    Ok(transaction)
}

/// Debits `amount` for a BPAY payment and records a `bpay` transaction whose
/// description embeds the biller name, code and customer reference.
pub async fn create_bpay_transaction(
    store: &dyn Store,
    from: &Account,
    biller_name: &str,
    biller_code: &str,
    reference_number: &str,
    amount: Decimal,
    description: &str,
) -> Result<Transaction> {
    if amount.is_zero() {
        return Err(PaymentError::ZeroAmount);
    }

    let from_balance = from.balance - amount;
    if from_balance < Decimal::ZERO {
        return Err(PaymentError::InsufficientFunds {
            account: from.id,
            balance: from.balance,
            amount,
        });
    }

    let transaction = store
        .commit_ledger(
            &[BalanceUpdate {
                account: from.id,
                balance: from_balance,
            }],
            NewTransaction {
                description: bpay_description(description, biller_name, biller_code, reference_number),
                amount,
                paid_on: Utc::now(),
                from_account: from.id,
                from_account_username: from.owner_username.clone(),
                to_account: None,
                to_account_username: None,
                transaction_type: TransactionKind::Bpay,
            },
        )
        .await?;

    info!(
        transaction = transaction.id,
        from = from.id,
        biller = biller_name,
        %amount,
        "bpay payment committed"
    );
    Ok(transaction)
}

/// Unconditional single-field balance write. No validation; callers own the
/// balance invariants.
pub async fn update_account_balance(
    store: &dyn Store,
    account: &Account,
    new_balance: Decimal,
) -> Result<()> {
    store.update_account_balance(account.id, new_balance).await
}

/// Transaction description for a BPAY payment, as shown in statements.
pub fn bpay_description(
    description: &str,
    biller_name: &str,
    biller_code: &str,
    reference_number: &str,
) -> String {
    format!("{description} - BPAY {biller_name} (code {biller_code}) ref {reference_number}")
}
