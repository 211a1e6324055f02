//! Cancellable delayed message delivery.

use std::time::Duration;

use murmur_types::Msg;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

/// Posts a `Msg` onto the app channel after a fixed delay.
///
/// At most one delivery is pending: scheduling again aborts the previous task
/// first, so only the most recent call takes effect. Dropping the debouncer
/// cancels whatever is still pending.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    sender: UnboundedSender<Msg>,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration, sender: UnboundedSender<Msg>) -> Self {
        Self {
            delay,
            sender,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending delivery with `msg`, due after the configured delay.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, msg: Msg) {
        self.cancel();
        let sender = self.sender.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver is gone when the app is shutting down.
            let _ = sender.send(msg);
        }));
    }

    /// Abort the pending delivery, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            trace!("cancelling pending delayed message");
            handle.abort();
        }
    }

    /// `true` while a scheduled message has not been delivered or cancelled.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn settled(term: &str) -> Msg {
        Msg::DirectChannelsSearchSettled(term.to_string())
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_latest_schedule_is_delivered() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(250), sender);

        debouncer.schedule(settled("a"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(settled("al"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.schedule(settled("ali"));

        tokio::time::sleep(Duration::from_millis(249)).await;
        assert!(receiver.try_recv().is_err());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(receiver.recv().await, Some(settled("ali")));
        assert!(receiver.try_recv().is_err());
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_drop_prevent_delivery() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(Duration::from_millis(100), sender.clone());
        debouncer.schedule(settled("x"));
        assert!(debouncer.is_pending());
        debouncer.cancel();
        assert!(!debouncer.is_pending());

        let mut dropped = Debouncer::new(Duration::from_millis(100), sender);
        dropped.schedule(settled("y"));
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(receiver.try_recv().is_err());
    }
}
