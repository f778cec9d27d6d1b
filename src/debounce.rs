//! Cancellable scheduled task used to debounce search keystrokes
//!
//! Each keystroke aborts the previously armed task before arming a new
//! sleep-then-run one, so at most one search fires per pause in typing.
//! Explicit submit cancels outright and runs the search immediately.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Delay between the last keystroke and the automatic search.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Default)]
pub struct Debouncer {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `task` to run after `delay`, aborting any previously armed
    /// task first. The stale handle is invalidated before the new timer
    /// starts, so last action always wins.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.handle.lock().unwrap();
        if let Some(old) = slot.take() {
            old.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        }));
    }

    /// Cancels the armed task, if any.
    pub fn cancel(&self) {
        if let Some(old) = self.handle.lock().unwrap().take() {
            old.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn bump(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_keystrokes_coalesce_into_one_run() {
        let counter = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        // "a", "ab", "abc" typed well within the window.
        for _ in 0..3 {
            debouncer.schedule(SEARCH_DEBOUNCE, bump(&counter));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(SEARCH_DEBOUNCE * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn a_pause_longer_than_the_window_runs_each_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.schedule(SEARCH_DEBOUNCE, bump(&counter));
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(100)).await;
        debouncer.schedule(SEARCH_DEBOUNCE, bump(&counter));
        tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_the_armed_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        let debouncer = Debouncer::new();

        debouncer.schedule(SEARCH_DEBOUNCE, bump(&counter));
        debouncer.cancel();
        tokio::time::sleep(SEARCH_DEBOUNCE * 2).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
