//! Synchronization primitives underpinning the pipeline substrate: the
//! auto-reset [`latch`] and the bounded [`queue`] built on top of it.

pub mod latch;
pub mod queue;
