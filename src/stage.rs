//! A single stage of the pipeline: a queue, a transform, a worker thread,
//! and an optional handle onto the next stage's [`Stage::place_work`].
//!
//! A stage is an explicit, self-contained handle rather than hidden
//! process-wide state — two `Stage`s (even for the same transform) can
//! coexist in one process, each with its own queue and worker thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_utils::CachePadded;

use crate::error::{PipelineError, Result};
use crate::sync::queue::Queue;
use crate::transforms::Transform;
use crate::SENTINEL;

/// The downstream stage's `place_work`, held by every non-tail stage.
pub type ForwardHandle = Arc<dyn Fn(String) -> Result<()> + Send + Sync>;

/// One node of the pipeline.
///
/// `Stage::new` builds an uninitialized handle; [`Stage::init`] allocates the
/// queue and spawns the worker. Call
/// [`Stage::attach`] before feeding any work in, then [`Stage::place_work`]
/// to feed items, and [`Stage::wait_finished`]/[`Stage::fini`] to shut down.
pub struct Stage {
    name: String,
    transform: Transform,
    queue: Mutex<Option<Arc<Queue<String>>>>,
    forward: Mutex<Option<ForwardHandle>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    initialized: AtomicBool,
    finished: CachePadded<AtomicBool>,
}

impl Stage {
    /// Creates an uninitialized stage. Call [`Stage::init`] before doing
    /// anything else with it.
    pub fn new(name: impl Into<String>, transform: Transform) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            transform,
            queue: Mutex::new(None),
            forward: Mutex::new(None),
            worker: Mutex::new(None),
            initialized: AtomicBool::new(false),
            finished: CachePadded::new(AtomicBool::new(false)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Allocates the queue and spawns the worker thread.
    ///
    /// Fails with [`PipelineError::BadArgument`] if `capacity == 0`, or
    /// [`PipelineError::ResourceExhausted`] if the worker thread cannot be
    /// spawned.
    pub fn init(self: &Arc<Self>, capacity: usize) -> Result<()> {
        let queue = Arc::new(Queue::new(capacity)?);
        let worker_stage = Arc::clone(self);
        let worker_queue = Arc::clone(&queue);
        let handle = std::thread::Builder::new()
            .name(format!("stage-{}", self.name))
            .spawn(move || worker_stage.run(worker_queue))
            .map_err(|e| PipelineError::ResourceExhausted(e.to_string()))?;

        *self.queue.lock().expect("queue mutex poisoned") = Some(queue);
        *self.worker.lock().expect("worker mutex poisoned") = Some(handle);
        self.initialized.store(true, Ordering::SeqCst);
        log::info!("stage '{}' initialized with capacity {capacity}", self.name);
        Ok(())
    }

    /// Records the downstream `place_work` handle. Must be called before the
    /// first [`Stage::place_work`]. Calling it again overwrites the handle.
    pub fn attach(&self, next: ForwardHandle) {
        *self.forward.lock().expect("forward mutex poisoned") = Some(next);
    }

    /// Enqueues `item`, blocking while this stage's queue is full.
    pub fn place_work(&self, item: String) -> Result<()> {
        if !self.initialized.load(Ordering::SeqCst) {
            return Err(PipelineError::NotInitialized);
        }
        let queue = self
            .queue
            .lock()
            .expect("queue mutex poisoned")
            .clone()
            .ok_or(PipelineError::NotInitialized)?;
        queue.put(item)
    }

    /// Blocks until the worker thread has returned. Idempotent: calling it
    /// again after the worker has already been joined is a no-op.
    pub fn wait_finished(&self) -> Result<()> {
        let handle = self.worker.lock().expect("worker mutex poisoned").take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| PipelineError::WaitInterrupted(format!("stage '{}' worker panicked", self.name)))?;
        }
        Ok(())
    }

    /// Signals the queue finished, joins the worker, and drops the queue.
    ///
    /// Does not require `<END>` to have passed through first: signalling
    /// finished is exactly what wakes a worker parked in `queue.get()` on an
    /// empty, not-yet-finished queue, so a mid-pipeline teardown is
    /// supported.
    pub fn fini(&self) -> Result<()> {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            return Err(PipelineError::NotInitialized);
        }
        if let Some(queue) = self.queue.lock().expect("queue mutex poisoned").take() {
            queue.signal_finished();
        }
        self.wait_finished()?;
        log::info!("stage '{}' torn down", self.name);
        Ok(())
    }

    /// Whether the worker loop has returned (for diagnostics/tests).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    fn run(self: Arc<Self>, queue: Arc<Queue<String>>) {
        log::info!("stage '{}' worker started", self.name);
        loop {
            let item = match queue.get() {
                Some(item) => item,
                None => break,
            };
            log::trace!("stage '{}' received {item:?}", self.name);

            if item == SENTINEL {
                // Let a side-effecting transform (logger, typewriter) observe
                // shutdown too, but always forward a fresh sentinel
                // downstream regardless of what the transform returns —
                // the sentinel's identity must survive every stage intact.
                let _ = (self.transform)(item);
                if let Some(forward) = self.forward.lock().expect("forward mutex poisoned").as_ref() {
                    if let Err(err) = forward(SENTINEL.to_string()) {
                        log::error!("stage '{}' failed to forward sentinel: {err}", self.name);
                    }
                }
                queue.signal_finished();
                break;
            }

            match (self.transform)(item) {
                Some(out) => {
                    if let Some(forward) = self.forward.lock().expect("forward mutex poisoned").as_ref() {
                        if let Err(err) = forward(out) {
                            log::error!("stage '{}' failed to forward item: {err}", self.name);
                        }
                    }
                }
                None => log::warn!("stage '{}' dropped an item", self.name),
            }
        }
        self.finished.store(true, Ordering::SeqCst);
        log::info!("stage '{}' worker finished", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn place_work_before_init_is_not_initialized() {
        let stage = Stage::new("noop", Arc::new(|s: String| Some(s)));
        assert!(matches!(
            stage.place_work("x".into()),
            Err(PipelineError::NotInitialized)
        ));
    }

    #[test]
    fn tail_stage_transforms_and_terminates_on_sentinel() {
        let stage = Stage::new("uppercaser", Arc::new(crate::transforms::uppercase));
        stage.init(4).unwrap();

        let (tx, rx) = mpsc::channel();
        stage.attach(Arc::new(move |item| {
            tx.send(item).unwrap();
            Ok(())
        }));

        stage.place_work("hello".into()).unwrap();
        stage.place_work(SENTINEL.into()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "HELLO");
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), SENTINEL);

        stage.wait_finished().unwrap();
        assert!(stage.is_finished());
        stage.fini().unwrap();
    }

    #[test]
    fn dropped_item_does_not_stall_the_worker() {
        // A transform that drops one specific line; none of the six real
        // collaborators ever return `None`, so this stage exists only to
        // exercise the worker's drop-and-continue branch.
        let stage = Stage::new(
            "discard-skip",
            Arc::new(|line: String| if line == "skip" { None } else { Some(line) }),
        );
        stage.init(4).unwrap();

        let (tx, rx) = mpsc::channel();
        stage.attach(Arc::new(move |item| {
            tx.send(item).unwrap();
            Ok(())
        }));

        stage.place_work("skip".into()).unwrap();
        stage.place_work("ok".into()).unwrap();
        stage.place_work(SENTINEL.into()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), "ok");
        assert_eq!(rx.recv_timeout(Duration::from_secs(1)).unwrap(), SENTINEL);
        stage.fini().unwrap();
    }

    #[test]
    fn fini_without_a_prior_sentinel_still_joins_the_worker() {
        let stage = Stage::new("uppercaser", Arc::new(crate::transforms::uppercase));
        stage.init(4).unwrap();
        // No place_work call at all: the worker is parked in queue.get().
        stage.fini().unwrap();
        assert!(stage.is_finished());
    }

    #[test]
    fn fini_is_not_idempotent_a_second_call_reports_not_initialized() {
        let stage = Stage::new("uppercaser", Arc::new(crate::transforms::uppercase));
        stage.init(4).unwrap();
        stage.fini().unwrap();
        assert!(matches!(stage.fini(), Err(PipelineError::NotInitialized)));
    }
}
