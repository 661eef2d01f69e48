// grc-core/src/infrastructure/adapters/notifier.rs

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use crate::domain::notification::Notification;
use crate::error::GrcError;
use crate::ports::notifier::Notifier;

/// Email stand-in: logs what would have been sent.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), GrcError> {
        info!(
            to = %notification.user_id,
            priority = %notification.priority,
            subject = %notification.title,
            "Email notification (not delivered): {}",
            notification.message
        );
        Ok(())
    }
}

/// Delivers to every channel concurrently. A failing channel does not stop the others;
/// the first error is returned once all were tried.
pub struct FanOutNotifier {
    channels: Vec<Arc<dyn Notifier>>,
}

impl FanOutNotifier {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }
}

#[async_trait]
impl Notifier for FanOutNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), GrcError> {
        let deliveries = self.channels.iter().map(|channel| channel.notify(notification));
        let mut first_error = None;
        for result in join_all(deliveries).await {
            if let Err(e) = result {
                warn!(notification = %notification.id, error = %e, "Notification channel failed");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn notify(&self, _: &Notification) -> Result<(), GrcError> {
            Err(GrcError::InternalError("smtp down".into()))
        }
    }

    #[derive(Default)]
    struct Recording(Mutex<Vec<Uuid>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn notify(&self, n: &Notification) -> Result<(), GrcError> {
            self.0.lock().unwrap().push(n.id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fan_out_tries_every_channel() {
        let recording = Arc::new(Recording::default());
        let notifier = FanOutNotifier::new(vec![
            Arc::new(Failing),
            recording.clone(),
            Arc::new(LogNotifier),
        ]);
        let n = Notification::new(Uuid::new_v4(), "t", "m");
        assert!(notifier.notify(&n).await.is_err());
        assert_eq!(recording.0.lock().unwrap().as_slice(), &[n.id]);
    }
}
