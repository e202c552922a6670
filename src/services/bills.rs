//! Bill assignment and the bill read path.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::Result;
use crate::models::{Bill, BillId, BillStatus, MessageKind, NewBill, NewMessage, UserId};
use crate::services::notify;
use crate::store::Store;
use crate::utils::idgen;

/// What a biller (or the admin console) supplies when assigning a bill.
#[derive(Clone, Debug)]
pub struct BillAssignment {
    pub billed_user: UserId,
    pub from_biller: String,
    pub description: String,
    pub amount: Decimal,
    pub linked_bill: Option<BillId>,
}

/// Creates a bill with a generated invoice number, customer reference and a
/// due date 30 days out, then notifies the billed user.
pub async fn assign_bill(store: &dyn Store, assignment: BillAssignment) -> Result<Bill> {
    let now = Utc::now();
    let invoice_number = idgen::invoice_number(store.max_bill_id().await?);

    let bill = store
        .insert_bill(NewBill {
            billed_user: assignment.billed_user,
            from_biller: assignment.from_biller.clone(),
            description: assignment.description,
            amount: assignment.amount,
            status: BillStatus::Unpaid,
            created_at: now,
            due_date: idgen::due_date_from(now),
            invoice_number: invoice_number.clone(),
            reference_number: idgen::reference_number(),
            linked_bill: assignment.linked_bill,
        })
        .await?;

    info!(
        bill = bill.id,
        user = bill.billed_user,
        biller = %bill.from_biller,
        invoice = %invoice_number,
        "bill assigned"
    );

    notify::notify(
        store,
        NewMessage {
            sender_name: assignment.from_biller,
            to_user: bill.billed_user,
            description: format!(
                "New bill {} for ${} is due on {}",
                invoice_number, bill.amount, bill.due_date
            ),
            kind: MessageKind::Bill,
            invoice_ref: Some(invoice_number),
            linked_bill: Some(bill.id),
            schedule_ref: None,
        },
    )
    .await;

    Ok(bill)
}

/// A user's bills with `overdue` derived from the due date. Derivation is
/// read-side only; the stored status stays `unpaid`/`partial`.
pub async fn bills_with_derived_status(store: &dyn Store, user: UserId) -> Result<Vec<Bill>> {
    let today = Utc::now().date_naive();
    let bills = store
        .bills_for_user(user)
        .await?
        .into_iter()
        .map(|mut bill| {
            bill.status = bill.status_as_of(today);
            bill
        })
        .collect();
    Ok(bills)
}
