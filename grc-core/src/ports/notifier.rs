// grc-core/src/ports/notifier.rs

use async_trait::async_trait;

use crate::domain::notification::Notification;
use crate::error::GrcError;

/// Outbound delivery. Callers treat failures as non-fatal.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), GrcError>;
}

/// Default when no delivery channel is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _notification: &Notification) -> Result<(), GrcError> {
        Ok(())
    }
}
