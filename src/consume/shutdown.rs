use tokio::sync::watch;

/// Creates linked pair of shutdown trigger and its listener
pub fn shutdown_signal() -> (ShutdownTrigger, Shutdown) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownTrigger { sender }, Shutdown { receiver })
}

#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signals every listener, repeated calls have no effect
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }
}

/// Listener side of shutdown signal
///
/// Dropping the trigger without calling [`ShutdownTrigger::trigger`]
/// never counts as shutdown.
#[derive(Debug, Clone)]
pub struct Shutdown {
    receiver: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown is triggered
    pub async fn triggered(&mut self) {
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn resolves_after_trigger() {
        let (trigger, mut shutdown) = shutdown_signal();
        let mut listener = shutdown.clone();

        let waiting = tokio::spawn(async move { listener.triggered().await });
        trigger.trigger();

        waiting.await.unwrap();
        shutdown.triggered().await;
        assert!(shutdown.is_triggered());
        assert!(trigger.is_triggered());
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_trigger_is_not_shutdown() {
        let (trigger, mut shutdown) = shutdown_signal();
        drop(trigger);

        assert!(timeout(Duration::from_secs(60), shutdown.triggered())
            .await
            .is_err());
        assert!(!shutdown.is_triggered());
    }
}
