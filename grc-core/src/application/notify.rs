// grc-core/src/application/notify.rs

use tracing::warn;

use crate::domain::notification::Notification;
use crate::ports::Notifier;

/// Delivery failures are logged and swallowed; the caller's write already happened.
pub(crate) async fn notify_best_effort(notifier: &dyn Notifier, notification: Notification) -> bool {
    match notifier.notify(&notification).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                user = %notification.user_id,
                entity = ?notification.entity_id,
                error = %e,
                "Notification not delivered"
            );
            false
        }
    }
}
