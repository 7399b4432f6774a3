//! The view timer.
//!
//! One timer is armed at a time. Arming it again aborts the pending task, and
//! each firing carries the height and view it was armed for so the service
//! can ignore it once the round has moved on.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A (height, view) pair.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HView {
    pub height: u32,
    pub view_number: u8,
}

impl std::fmt::Display for HView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.height, self.view_number)
    }
}

/// `block_time << (view + 1)`, the backup timeout and view-change backoff.
#[inline]
pub fn backoff(block_time: Duration, view_number: u8) -> Duration {
    let shift = (u32::from(view_number) + 1).min(31);
    block_time.saturating_mul(1u32 << shift)
}

/// Posts `on_fire(view)` into a mailbox once the armed delay elapses.
pub struct ViewTimer<T> {
    mailbox: mpsc::UnboundedSender<T>,
    on_fire: fn(HView) -> T,
    pending: Option<(HView, JoinHandle<()>)>,
}

impl<T: Send + 'static> ViewTimer<T> {
    pub fn new(mailbox: mpsc::UnboundedSender<T>, on_fire: fn(HView) -> T) -> Self {
        Self {
            mailbox,
            on_fire,
            pending: None,
        }
    }

    /// Replaces any pending timer with one for `view` after `delay`.
    pub fn reset(&mut self, view: HView, delay: Duration) {
        self.stop();
        let mailbox = self.mailbox.clone();
        let message = (self.on_fire)(view);
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The service may already be gone.
            let _ = mailbox.send(message);
        });
        self.pending = Some((view, task));
    }

    pub fn stop(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.abort();
        }
    }
}

impl<T> Drop for ViewTimer<T> {
    fn drop(&mut self) {
        if let Some((_, task)) = self.pending.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff() {
        let block_time = Duration::from_secs(6);
        assert_eq!(backoff(block_time, 0), Duration::from_secs(12));
        assert_eq!(backoff(block_time, 2), Duration::from_secs(48));
        assert!(backoff(block_time, u8::MAX) > backoff(block_time, 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_with_armed_view() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ViewTimer::new(tx, |view| view);
        let view = HView {
            height: 3,
            view_number: 1,
        };
        timer.reset(view, Duration::from_secs(5));
        assert_eq!(rx.recv().await, Some(view));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_previous() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timer = ViewTimer::new(tx, |view| view);
        let first = HView {
            height: 1,
            view_number: 0,
        };
        let second = HView {
            height: 1,
            view_number: 1,
        };
        timer.reset(first, Duration::from_secs(1));
        timer.reset(second, Duration::from_secs(2));
        assert_eq!(rx.recv().await, Some(second));

        timer.stop();
        timer.reset(first, Duration::from_secs(1));
        timer.stop();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
