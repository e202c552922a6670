//! Inbox notification emitter. Fire-and-forget: a failed insert is logged
//! and swallowed so it never blocks the money movement that triggered it.

use tracing::warn;

use crate::models::NewMessage;
use crate::store::Store;

pub async fn notify(store: &dyn Store, message: NewMessage) {
    let to_user = message.to_user;
    let kind = message.kind;
    if let Err(e) = store.insert_message(message).await {
        warn!(
            user = to_user,
            kind = kind.as_str(),
            error = %e,
            "failed to deliver inbox notification"
        );
    }
}
