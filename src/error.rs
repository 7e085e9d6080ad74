//! The error taxonomy shared by every fallible operation in the pipeline substrate.
//!
//! Modeling the taxonomy as an enum lets callers `match` on the kind and lets
//! every fallible call site propagate with `?`.

use thiserror::Error;

/// Errors surfaced by the latch, queue, stage, and pipeline layers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A non-positive queue capacity, a missing CLI argument, or an unrecognized
    /// stage name.
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// An operation was invoked on a stage that has not been (or is no longer)
    /// initialized.
    #[error("stage not initialized")]
    NotInitialized,

    /// `place_work` was handed an absent item.
    ///
    /// Kept for contract fidelity; unreachable here since `place_work` takes
    /// an owned `String` rather than a nullable pointer — there is no value
    /// of that type that represents "absent".
    #[error("null input not allowed")]
    NullInput,

    /// Memory exhaustion in the buffer, an item copy, or a thread spawn.
    ///
    /// Unreachable in practice here because `Vec`/`Box<[_]>` growth aborts
    /// the process on allocation failure rather than returning an error,
    /// and thread-spawn failure is reported as
    /// [`PipelineError::ResourceExhausted`] instead.
    #[error("allocation failed: {0}")]
    AllocFailed(String),

    /// An OS primitive (in practice: a worker thread) could not be created.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// A wait on a synchronization primitive failed. In this rewrite the only
    /// way that happens is a poisoned mutex: some other thread already
    /// panicked while holding it.
    #[error("wait interrupted: {0}")]
    WaitInterrupted(String),

    /// Reading a line of input failed. Sits at the CLI/driver boundary,
    /// where `std::io::Error` has to become a `PipelineError` somehow.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
