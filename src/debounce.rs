// File: src/debounce.rs
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Trailing-edge debounce for async work.
///
/// Only the timer is cancellable. Once the delay elapses the work is spawned
/// detached, so two calls far enough apart both run to completion in
/// whatever order they finish.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn call<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tokio::spawn(work);
        });
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(timer) {
            previous.abort();
        }
    }

    /// Drops the pending call, if its timer has not fired yet.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_once() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            debouncer.call(counting(&counter));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_all_run() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let counter = Arc::new(AtomicUsize::new(0));
        debouncer.call(counting(&counter));
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.call(counting(&counter));
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_work_is_not_cancelled() {
        let debouncer = Debouncer::new(Duration::from_millis(300));
        let counter = Arc::new(AtomicUsize::new(0));
        let slow = {
            let counter = counter.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };
        debouncer.call(slow);
        tokio::time::sleep(Duration::from_millis(400)).await;
        debouncer.call(counting(&counter));
        debouncer.cancel();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
