//! A capacity-bounded ring buffer used as the backing store of
//! [`crate::sync::queue::Queue`].
//!
//! Unlike a lock-free SPSC ring, every access to this buffer happens while
//! the queue's mutex is held, so slots are plain `Option<T>` rather than
//! `UnsafeCell<MaybeUninit<T>>`: there is no data race to guard against,
//! only bookkeeping. Capacity is chosen at construction time from a
//! runtime value (the CLI's `queue_size`), not fixed by a const generic, so
//! indexing uses ordinary modulo arithmetic instead of a power-of-two mask.

pub(crate) struct RingBuffer<T> {
    slots: Box<[Option<T>]>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty ring buffer. Panics if `capacity == 0`; callers are
    /// expected to validate `capacity >= 1` before construction (see
    /// [`crate::error::PipelineError::BadArgument`]).
    pub(crate) fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be positive");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            capacity,
        }
    }

    #[inline]
    pub(crate) const fn index(&self, seq: usize) -> usize {
        seq % self.capacity
    }

    /// Stores `value` at slot `i`, overwriting whatever was there (the
    /// caller is responsible for knowing the slot is vacant).
    #[inline]
    pub(crate) fn put(&mut self, i: usize, value: T) {
        self.slots[i] = Some(value);
    }

    /// Takes the value out of slot `i`, leaving it vacant.
    ///
    /// Panics if the slot was vacant, which would indicate a bookkeeping
    /// bug in the queue (`head`/`tail`/`count` out of sync with the buffer).
    #[inline]
    pub(crate) fn take(&mut self, i: usize) -> T {
        self.slots[i]
            .take()
            .expect("ring buffer slot read before it was written")
    }
}
