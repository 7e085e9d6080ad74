//! The pipeline driver: builds a chain of [`Stage`]s, wires each one's
//! forward handle to the next, feeds it input line by line, and coordinates
//! orderly shutdown.

use std::io::BufRead;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::stage::{ForwardHandle, Stage};
use crate::transforms;
use crate::SENTINEL;

/// A chain of stages, wired `stage[0] -> stage[1] -> ... -> stage[N-1]`.
pub struct Pipeline {
    stages: Vec<Arc<Stage>>,
}

impl Pipeline {
    /// Resolves each name in `stage_names` to its transform collaborator,
    /// initializes a stage of the given shared `capacity` for each, and
    /// attaches every non-tail stage to the next one's `place_work`.
    ///
    /// Fails with [`PipelineError::BadArgument`] for an unrecognized stage
    /// name or a non-positive capacity, propagating whatever a stage's
    /// [`Stage::init`] returns otherwise.
    pub fn build(stage_names: &[String], capacity: usize) -> Result<Self> {
        if stage_names.is_empty() {
            return Err(PipelineError::BadArgument(
                "at least one stage is required".into(),
            ));
        }

        let mut stages = Vec::with_capacity(stage_names.len());
        for name in stage_names {
            let transform = transforms::resolve(name)
                .ok_or_else(|| PipelineError::BadArgument(format!("unknown stage '{name}'")))?;
            let stage = Stage::new(name.clone(), transform);
            stage.init(capacity)?;
            stages.push(stage);
        }

        for i in 0..stages.len().saturating_sub(1) {
            let next = Arc::clone(&stages[i + 1]);
            stages[i].attach(Arc::new(move |item: String| next.place_work(item)));
        }

        Ok(Self { stages })
    }

    /// Attaches an extra forward handle onto the tail stage, so a caller can
    /// observe exactly what the pipeline would otherwise have dropped on the
    /// floor. Must be called before [`Pipeline::run`]. Exists for tests and
    /// embedders that want the pipeline's output as values rather than only
    /// as stage-level side effects (e.g. `logger`'s stdout writes).
    pub fn attach_tail(&self, sink: ForwardHandle) {
        self.stages[self.stages.len() - 1].attach(sink);
    }

    /// Feeds `input` line by line (trailing newline stripped) to the head
    /// stage, then drains and tears down every stage in pipeline order.
    ///
    /// If `input` reaches EOF without ever producing a literal `<END>` line,
    /// one is synthesized and fed before shutdown proceeds — otherwise a
    /// pipeline fed from a closed file or pipe would hang forever waiting
    /// for a sentinel that will never arrive.
    pub fn run<R: BufRead>(&self, input: R) -> Result<()> {
        let head = &self.stages[0];
        let mut saw_sentinel = false;

        for line in input.lines() {
            let line = line?;
            if line == SENTINEL {
                saw_sentinel = true;
            }
            head.place_work(line)?;
            if saw_sentinel {
                break;
            }
        }

        if !saw_sentinel {
            log::warn!("input ended without <END>; synthesizing one to drain the pipeline");
            head.place_work(SENTINEL.into())?;
        }

        for stage in &self.stages {
            stage.wait_finished()?;
        }
        for stage in &self.stages {
            stage.fini()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::time::Duration;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run_and_collect(stages: &[&str], capacity: usize, input: &[u8]) -> Vec<String> {
        let pipeline = Pipeline::build(&names(stages), capacity).unwrap();
        let (tx, rx) = mpsc::channel();
        pipeline.attach_tail(Arc::new(move |item| {
            tx.send(item).unwrap();
            Ok(())
        }));
        pipeline.run(Cursor::new(input.to_vec())).unwrap();

        let mut out = Vec::new();
        while let Ok(item) = rx.recv_timeout(Duration::from_millis(500)) {
            out.push(item);
        }
        out
    }

    /// S1: capacity 20, chain [uppercaser], input "hello\n<END>\n" — tail
    /// sees HELLO then <END>.
    #[test]
    fn s1_single_stage_uppercases() {
        let out = run_and_collect(&["uppercaser"], 20, b"hello\n<END>\n");
        assert_eq!(out, vec!["HELLO", SENTINEL]);
    }

    /// S3: capacity 1, chain [flipper], input "ab\ncd\n<END>\n" — exercises
    /// backpressure at every step since the queue can only ever hold one item.
    #[test]
    fn s3_tiny_capacity_still_drains_in_order() {
        let out = run_and_collect(&["flipper"], 1, b"ab\ncd\n<END>\n");
        assert_eq!(out, vec!["ba", "dc", SENTINEL]);
    }

    /// Multi-stage chain composes each stage's transform in order, and the
    /// sentinel survives the whole chain intact.
    #[test]
    fn multi_stage_chain_composes_transforms() {
        // hello -> HELLO (uppercaser) -> OHELL (rotator) -> LLEHO (flipper)
        let out = run_and_collect(&["uppercaser", "rotator", "flipper"], 8, b"hello\n<END>\n");
        assert_eq!(out, vec!["LLEHO", SENTINEL]);
    }

    /// Unknown stage names are rejected at build time, before any thread is
    /// spawned.
    #[test]
    fn build_rejects_unknown_stage_name() {
        let err = Pipeline::build(&names(&["not-a-real-stage"]), 4).unwrap_err();
        assert!(matches!(err, PipelineError::BadArgument(_)));
    }

    /// Zero capacity is rejected per-stage, surfaced as the stage's own error.
    #[test]
    fn build_rejects_zero_capacity() {
        let err = Pipeline::build(&names(&["uppercaser"]), 0).unwrap_err();
        assert!(matches!(err, PipelineError::BadArgument(_)));
    }

    /// EOF without a literal <END> still drains and terminates instead of
    /// hanging, with a synthesized sentinel appearing at the tail.
    #[test]
    fn eof_without_sentinel_still_terminates() {
        let out = run_and_collect(&["uppercaser"], 4, b"hello\nworld\n");
        assert_eq!(out, vec!["HELLO", "WORLD", SENTINEL]);
    }

    /// Lossless, in-order delivery through a longer identity-ish chain.
    #[test]
    fn lossless_in_order_delivery() {
        let out = run_and_collect(&["uppercaser", "uppercaser"], 2, b"a\nb\nc\n<END>\n");
        assert_eq!(out, vec!["A", "B", "C", SENTINEL]);
    }
}
