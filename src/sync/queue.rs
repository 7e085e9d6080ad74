//! Bounded FIFO queue.
//!
//! A capacity-limited buffer shared between exactly one producer and one
//! consumer, with blocking `put`/`get` and a one-way `finished` flag used to
//! drain the queue and then release any consumer parked on an empty queue.
//!
//! ## Synchronization
//!
//! The buffer and its `head`/`tail`/`count` bookkeeping live behind a single
//! [`Mutex`]. Three [`Latch`]es are used purely as wake-up hints:
//!
//! | Latch | Signaled by | Woken party |
//! |-------|-------------|-------------|
//! | `not_full` | `get` (a slot freed up) | a producer parked in `put` |
//! | `not_empty` | `put`, `signal_finished` | a consumer parked in `get` |
//! | `finished_latch` | `signal_finished` | a caller parked in `wait_finished` |
//!
//! Because a latch only remembers "has a signal happened since the last
//! wait", not a count, every `put`/`get` loop re-checks its predicate under
//! the queue's own mutex after waking up rather than trusting that the
//! wake-up alone means the predicate now holds. This also means the mutex
//! is always released before a latch's `wait` is called — the classic
//! monitor idiom — so the queue's lock and a latch's internal lock are
//! never nested.

use std::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::ring::RingBuffer;
use crate::sync::latch::Latch;

struct State<T> {
    buffer: RingBuffer<T>,
    head: usize,
    tail: usize,
    count: usize,
    finished: bool,
}

/// A bounded, bookkeeping-only FIFO queue guarded by a mutex and three
/// [`Latch`]es. See the module docs for the synchronization design.
pub struct Queue<T> {
    state: Mutex<State<T>>,
    capacity: usize,
    not_full: Latch,
    not_empty: Latch,
    finished_latch: Latch,
}

impl<T> Queue<T> {
    /// Creates an empty queue of the given capacity.
    ///
    /// Fails with [`PipelineError::BadArgument`] if `capacity == 0`.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PipelineError::BadArgument(
                "queue capacity must be at least 1".into(),
            ));
        }
        Ok(Self {
            state: Mutex::new(State {
                buffer: RingBuffer::new(capacity),
                head: 0,
                tail: 0,
                count: 0,
                finished: false,
            }),
            capacity,
            not_full: Latch::new()?,
            not_empty: Latch::new()?,
            finished_latch: Latch::new()?,
        })
    }

    /// Moves `item` into the queue, blocking while the queue is full.
    ///
    /// Does not check `finished` — the caller (the stage layer) is
    /// responsible for never calling `put` after `signal_finished`.
    pub fn put(&self, item: T) -> Result<()> {
        loop {
            {
                let mut state = self
                    .state
                    .lock()
                    .map_err(|_| PipelineError::WaitInterrupted("queue mutex poisoned".into()))?;
                if state.count < self.capacity {
                    let i = state.buffer.index(state.tail);
                    state.buffer.put(i, item);
                    state.tail = state.tail.wrapping_add(1);
                    state.count += 1;
                    drop(state);
                    self.not_empty.signal();
                    return Ok(());
                }
            }
            self.not_full.wait()?;
        }
    }

    /// Removes and returns the oldest item, blocking while the queue is
    /// empty and not yet finished.
    ///
    /// Returns `Ok(None)` — the termination marker — once the queue is
    /// both finished and drained, or if the underlying wait fails.
    pub fn get(&self) -> Option<T> {
        loop {
            {
                let mut state = match self.state.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if state.count > 0 {
                    let i = state.buffer.index(state.head);
                    let item = state.buffer.take(i);
                    state.head = state.head.wrapping_add(1);
                    state.count -= 1;
                    drop(state);
                    self.not_full.signal();
                    return Some(item);
                }
                if state.finished && state.count == 0 {
                    return None;
                }
            }
            if self.not_empty.wait().is_err() {
                return None;
            }
        }
    }

    /// Marks the queue finished: no more items will ever arrive. Wakes any
    /// consumer parked in `get` (so it can observe `finished && count == 0`)
    /// and anyone parked in `wait_finished`.
    pub fn signal_finished(&self) {
        {
            let mut state = match self.state.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            state.finished = true;
        }
        self.finished_latch.signal();
        self.not_empty.signal();
    }

    /// Blocks until [`Queue::signal_finished`] has been called.
    pub fn wait_finished(&self) -> Result<()> {
        self.finished_latch.wait()
    }

    /// Approximate number of items currently buffered (for diagnostics).
    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(guard) => guard.count,
            Err(poisoned) => poisoned.into_inner().count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
