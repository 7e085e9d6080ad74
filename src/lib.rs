//! A threaded line-processing pipeline: an ordered chain of independently
//! scheduled stages, each pulling items off its own bounded queue, running a
//! transform, and handing the result to the next stage.
//!
//! The core of this crate is the concurrent substrate in [`sync`] (the
//! auto-reset [`sync::latch::Latch`] and the bounded [`sync::queue::Queue`])
//! and the [`stage`] lifecycle built on top of it. [`pipeline`] wires stages
//! into a chain and drives input through them; [`transforms`] supplies the
//! handful of pure `String -> String` collaborators the `analyzer` binary
//! exposes on the command line.

pub mod error;
pub mod pipeline;
mod ring;
pub mod stage;
pub mod sync;
pub mod transforms;

pub use error::{PipelineError, Result};

/// The distinguished item value that triggers orderly pipeline shutdown.
pub const SENTINEL: &str = "<END>";
