//! Periodic background tasks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Calls a closure at a fixed period on a background task until stopped.
///
/// The task is aborted on [`stop`](Self::stop) or when the ticker is
/// dropped.
#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// First call after one full period.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime or if `period` is zero.
    pub fn spawn<F>(period: Duration, tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::start(period, false, tick)
    }

    /// First call right away, then every period.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime or if `period` is zero.
    pub fn spawn_immediate<F>(period: Duration, tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::start(period, true, tick)
    }

    fn start<F>(period: Duration, immediate: bool, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick of an interval completes immediately
            interval.tick().await;
            if immediate {
                tick();
            }
            loop {
                interval.tick().await;
                tick();
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    /// Abort pending and future ticks. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_once_per_period() {
        let (count, tick) = counter();
        let _ticker = Ticker::spawn(Duration::from_secs(5), tick);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn should_tick_right_away_when_immediate() {
        let (count, tick) = counter();
        let _ticker = Ticker::spawn_immediate(Duration::from_secs(60), tick);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_ticking_after_stop() {
        let (count, tick) = counter();
        let mut ticker = Ticker::spawn(Duration::from_secs(1), tick);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        ticker.stop();
        ticker.stop();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!ticker.is_running());
    }
}
