//! Auto-reset signalable latch.
//!
//! A binary "event" with `signal`/`wait`/`reset` semantics, built on
//! [`Mutex`] + [`Condvar`]. It solves the signal-before-wait problem: a
//! `signal` that arrives before any thread is waiting is remembered and
//! consumed by the very next `wait`, instead of being lost.
//!
//! ## Not a semaphore
//!
//! This is **not** a counting semaphore. Two `signal` calls with no
//! interleaving `wait` still leave the latch `signaled = true` exactly
//! once — the second signal is a no-op beyond (redundantly) waking any
//! already-parked waiter. Callers must not rely on a count: the bounded
//! queue in [`crate::sync::queue`] only ever treats a latch as a
//! wake-up hint and re-validates its own predicate (is there room? is
//! there an item?) under its own mutex after waking up.
//!
//! ## Why no `destroy`
//!
//! A manual `destroy` operation only has one precondition to uphold: "no
//! thread is currently suspended on it". Rust's ownership model enforces
//! that precondition statically instead: a latch cannot be dropped while a
//! `&Latch` borrowed by another thread is still blocked inside
//! [`Latch::wait`], because that borrow keeps the latch alive. Dropping the
//! [`Mutex`] and [`Condvar`] fields happens for free when the latch itself
//! goes out of scope.

use std::sync::{Condvar, Mutex};

use crate::error::{PipelineError, Result};

/// An auto-reset event: `signal` sets it, the next `wait` clears it.
pub struct Latch {
    signaled: Mutex<bool>,
    condvar: Condvar,
}

impl Latch {
    /// Creates a latch in the unsignaled state.
    ///
    /// Kept fallible (returning [`Result`]) for contract fidelity with the
    /// source's `init`, which could fail with *ResourceExhausted* if the
    /// underlying OS primitives couldn't be created. `Mutex::new` and
    /// `Condvar::new` are infallible in `std`, so this never actually
    /// returns an error; the one place *ResourceExhausted* is reachable
    /// in this rewrite is `Stage::init`'s thread spawn.
    pub fn new() -> Result<Self> {
        Ok(Self {
            signaled: Mutex::new(false),
            condvar: Condvar::new(),
        })
    }

    /// Sets `signaled` and wakes one waiter. Idempotent: signalling an
    /// already-signaled latch is a no-op beyond the (harmless) wake-up call.
    pub fn signal(&self) {
        let mut signaled = match self.signaled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *signaled = true;
        self.condvar.notify_one();
    }

    /// Blocks until signaled, then clears the flag and returns.
    ///
    /// Spurious wake-ups are handled by looping on the predicate rather
    /// than trusting a single `notify`.
    pub fn wait(&self) -> Result<()> {
        let mut signaled = self
            .signaled
            .lock()
            .map_err(|_| PipelineError::WaitInterrupted("latch mutex poisoned".into()))?;
        while !*signaled {
            signaled = self
                .condvar
                .wait(signaled)
                .map_err(|_| PipelineError::WaitInterrupted("latch condvar poisoned".into()))?;
        }
        *signaled = false;
        Ok(())
    }

    /// Clears `signaled` without waiting.
    pub fn reset(&self) {
        let mut signaled = match self.signaled.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *signaled = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Signal-before-wait: a signal parked on an idle latch is consumed by
    /// the very next wait, which must return immediately.
    #[test]
    fn signal_before_wait_returns_immediately() {
        let latch = Latch::new().unwrap();
        latch.signal();

        let start = Instant::now();
        latch.wait().unwrap();
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    /// Two signals with no intervening wait coalesce into one: the next
    /// wait returns immediately, the one after blocks.
    #[test]
    fn signal_coalescing() {
        let latch = Arc::new(Latch::new().unwrap());
        latch.signal();
        latch.signal();

        latch.wait().unwrap(); // consumes the coalesced signal

        let latch2 = latch.clone();
        let handle = thread::spawn(move || {
            latch2.wait().unwrap();
        });

        // Give the spawned thread a chance to actually park in `wait`.
        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        latch.signal();
        handle.join().unwrap();
    }

    /// A waiter parked before any signal is woken once one arrives.
    #[test]
    fn wait_then_signal_wakes_waiter() {
        let latch = Arc::new(Latch::new().unwrap());
        let latch2 = latch.clone();

        let handle = thread::spawn(move || {
            let start = Instant::now();
            latch2.wait().unwrap();
            start.elapsed()
        });

        thread::sleep(Duration::from_millis(50));
        latch.signal();

        let elapsed = handle.join().unwrap();
        assert!(elapsed < Duration::from_millis(200));
    }

    #[test]
    fn reset_clears_without_waiting() {
        let latch = Latch::new().unwrap();
        latch.signal();
        latch.reset();

        let latch = Arc::new(latch);
        let latch2 = latch.clone();
        let handle = thread::spawn(move || latch2.wait());

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        latch.signal();
        handle.join().unwrap().unwrap();
    }
}
