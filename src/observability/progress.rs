//! Image progress counters for a batch run.
//!
//! One `RunProgress` per run, shared by reference with the rayon workers.
//! Counters are independent of each other, so relaxed ordering is enough.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RunProgress {
    processed: AtomicUsize,
    total: AtomicUsize,
}

impl RunProgress {
    pub fn new(total: usize) -> Self {
        Self {
            processed: AtomicUsize::new(0),
            total: AtomicUsize::new(total),
        }
    }

    /// Thread-safe; called from parallel iterators.
    pub fn increment_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Current (processed, total).
    #[must_use]
    pub fn get(&self) -> (usize, usize) {
        (
            self.processed.load(Ordering::Relaxed),
            self.total.load(Ordering::Relaxed),
        )
    }

    pub fn reset(&self, total: usize) {
        self.processed.store(0, Ordering::Relaxed);
        self.total.store(total, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_increment_processed() {
        let progress = RunProgress::new(100);
        progress.increment_processed();
        progress.increment_processed();
        progress.increment_processed();
        assert_eq!(progress.get(), (3, 100));
    }

    #[test]
    fn test_parallel_increments() {
        let progress = RunProgress::new(1000);
        (0..1000).into_par_iter().for_each(|_| progress.increment_processed());
        assert_eq!(progress.get(), (1000, 1000));

        progress.reset(10);
        assert_eq!(progress.get(), (0, 10));
    }
}
