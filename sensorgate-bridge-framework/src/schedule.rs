//! Fixed-period task scheduling.

use std::future::Future;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

/// Work run once per scheduler tick.
///
/// The task owns its state, so each run gets exclusive `&mut` access and no
/// locking is needed.
pub trait PeriodicTask: Send + 'static {
    /// Run one iteration.
    fn run(&mut self) -> impl Future<Output = ()> + Send;
}

/// Run `task` every `period`, forever.
///
/// The first run happens immediately. Runs never overlap: if one takes longer
/// than the period, the next starts as soon as it finishes and the schedule
/// shifts instead of bursting to catch up.
pub async fn run_periodic<T: PeriodicTask>(period: Duration, mut task: T) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        task.run().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Counter {
        runs: Arc<AtomicUsize>,
        busy: Arc<AtomicBool>,
        overlapped: Arc<AtomicBool>,
        work: Duration,
    }

    impl PeriodicTask for Counter {
        async fn run(&mut self) {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlapped.store(true, Ordering::SeqCst);
            }
            tokio::time::sleep(self.work).await;
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.busy.store(false, Ordering::SeqCst);
        }
    }

    fn counter(work: Duration) -> (Counter, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let overlapped = Arc::new(AtomicBool::new(false));
        let task = Counter {
            runs: runs.clone(),
            busy: Arc::new(AtomicBool::new(false)),
            overlapped: overlapped.clone(),
            work,
        };
        (task, runs, overlapped)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_once_per_period() {
        let (task, runs, _) = counter(Duration::ZERO);
        let handle = tokio::spawn(run_periodic(Duration::from_millis(1000), task));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        handle.abort();

        // Ticks at 0, 1000, 2000 and 3000 ms
        assert_eq!(runs.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_runs_never_overlap() {
        let (task, runs, overlapped) = counter(Duration::from_millis(2500));
        let handle = tokio::spawn(run_periodic(Duration::from_millis(1000), task));

        tokio::time::sleep(Duration::from_millis(6000)).await;
        handle.abort();

        assert!(!overlapped.load(Ordering::SeqCst));
        // Completed at 2500 and 5000 ms
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
