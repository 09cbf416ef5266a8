use crate::config;
use crate::warnings::RuntimeWarning;

use crossbeam::utils::Backoff;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Centralized sense reversing barrier shared by every PE of a fabric.
///
/// The last PE to arrive resets the arrival counter and then bumps the
/// generation, releasing everyone spinning on the previous generation.
pub(crate) struct Barrier {
    num_pes: usize,
    arrived: AtomicUsize,
    generation: AtomicUsize,
    poisoned: Arc<AtomicBool>,
}

impl std::fmt::Debug for Barrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Barrier {{ num_pes: {}, arrived: {}, generation: {} }}",
            self.num_pes,
            self.arrived.load(Ordering::Relaxed),
            self.generation.load(Ordering::Relaxed)
        )
    }
}

impl Barrier {
    pub(crate) fn new(num_pes: usize, poisoned: Arc<AtomicBool>) -> Barrier {
        assert!(num_pes > 0, "a barrier requires at least one pe");
        Barrier {
            num_pes,
            arrived: AtomicUsize::new(0),
            generation: AtomicUsize::new(0),
            poisoned,
        }
    }

    fn check_poisoned(&self) {
        if self.poisoned.load(Ordering::SeqCst) {
            panic!("[LAMELLAR ERROR] a peer PE panicked while this PE was waiting in a barrier");
        }
    }

    pub(crate) fn barrier(&self) {
        if self.num_pes == 1 {
            return;
        }
        if std::thread::panicking() {
            // a collective reached while unwinding can never complete, release the peers instead
            self.poisoned.store(true, Ordering::SeqCst);
            return;
        }
        self.check_poisoned();
        let generation = self.generation.load(Ordering::SeqCst);
        if self.arrived.fetch_add(1, Ordering::SeqCst) + 1 == self.num_pes {
            self.arrived.store(0, Ordering::SeqCst);
            self.generation.fetch_add(1, Ordering::SeqCst);
            return;
        }
        let backoff = Backoff::new();
        let mut s = Instant::now();
        while self.generation.load(Ordering::SeqCst) == generation {
            self.check_poisoned();
            backoff.snooze();
            let elapsed = s.elapsed().as_secs_f64();
            if elapsed > config().deadlock_timeout {
                RuntimeWarning::BarrierTimeout(elapsed).print();
                tracing::debug!("{:?}", self);
                s = Instant::now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn releases_all_pes_every_generation() {
        let num_pes = 4;
        let barrier = Arc::new(Barrier::new(num_pes, Arc::new(AtomicBool::new(false))));
        let counter = Arc::new(AtomicUsize::new(0));
        crossbeam::scope(|s| {
            for _ in 0..num_pes {
                let barrier = barrier.clone();
                let counter = counter.clone();
                s.spawn(move |_| {
                    for round in 0..10 {
                        counter.fetch_add(1, Ordering::SeqCst);
                        barrier.barrier();
                        // nobody may start the next round before everyone finished this one
                        assert!(counter.load(Ordering::SeqCst) >= (round + 1) * num_pes);
                        barrier.barrier();
                    }
                });
            }
        })
        .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 10 * num_pes);
    }

    #[test]
    fn poisoned_barrier_panics_waiters() {
        let poisoned = Arc::new(AtomicBool::new(false));
        let barrier = Arc::new(Barrier::new(2, poisoned.clone()));
        let waiter = {
            let barrier = barrier.clone();
            std::thread::spawn(move || barrier.barrier())
        };
        poisoned.store(true, Ordering::SeqCst);
        assert!(waiter.join().is_err());
    }
}
