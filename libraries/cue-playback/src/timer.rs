//! Cancelable delayed tasks
//!
//! The coordinator keeps three of these (debounce tail, seek settle, grace
//! period). At most one instance of each is outstanding: scheduling always
//! cancels the previous one first.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A single-slot delayed task
#[derive(Debug, Default)]
pub struct DelayedTask {
    handle: Option<JoinHandle<()>>,
}

impl DelayedTask {
    /// Create an empty slot
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Run `task` after `delay`, cancelling whatever was scheduled before
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancel the scheduled task
    ///
    /// Returns true if a task was still pending or running.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let was_running = !handle.is_finished();
                handle.abort();
                was_running
            }
            None => false,
        }
    }

    /// Whether a task is scheduled and has not finished
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut task = DelayedTask::new();

        let counter = Arc::clone(&fired);
        task.schedule(Duration::from_millis(300), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(task.is_pending());

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!task.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_cancels_previous() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut task = DelayedTask::new();

        for _ in 0..5 {
            let counter = Arc::clone(&fired);
            task.schedule(Duration::from_millis(300), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut task = DelayedTask::new();

        let counter = Arc::clone(&fired);
        task.schedule(Duration::from_millis(300), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(task.cancel());
        assert!(!task.cancel());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
