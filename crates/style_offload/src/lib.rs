//! Off-main-thread style evaluation.
//!
//! Large chunk trees can be evaluated on a single background worker (a
//! one-thread rayon pool). Every failure mode resolves to an empty
//! [`Evaluation`], which callers treat as "evaluate on the calling thread".
//!
//! Requests are correlated by id through a pending map of oneshot resolvers.
//! An entry leaves the map exactly once: on completion, on a worker failure
//! (which resolves every pending entry and tears the worker down), or on
//! timeout.

use anyhow::Result;
use log::{debug, warn};
use parking_lot::Mutex;
use rayon::{ThreadPool, ThreadPoolBuilder};
use rustc_hash::FxHashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;
use style_core::{Evaluation, EvaluationContext, StyleChunk, evaluate};
use tokio::sync::oneshot;
use tokio::time::timeout;

/// Trees with at most this many top-level chunks are never offloaded.
pub const COMPLEXITY_THRESHOLD: usize = 10;

/// How long a request may wait for the worker before falling back.
pub const OFFLOAD_TIMEOUT: Duration = Duration::from_secs(2);

/// Creates the background worker.
pub type WorkerFactory = fn() -> Result<ThreadPool>;

/// Default worker: one named rayon thread.
///
/// # Errors
/// Returns an error if the thread cannot be spawned.
pub fn spawn_worker() -> Result<ThreadPool> {
    Ok(ThreadPoolBuilder::new()
        .num_threads(1)
        .thread_name(|_| "style-offload".to_owned())
        .build()?)
}

enum WorkerReply {
    Done(Evaluation),
    Failed(String),
}

#[derive(Debug, Default)]
struct OffloadState {
    worker: Option<Arc<ThreadPool>>,
    pending: FxHashMap<u64, oneshot::Sender<Evaluation>>,
    next_id: u64,
}

/// Handle to the lazily created background worker.
///
/// Clones share the same worker and pending map.
#[derive(Clone, Debug)]
pub struct WorkerOffload {
    state: Arc<Mutex<OffloadState>>,
    /// `None` when the host has no background-thread capability.
    factory: Option<WorkerFactory>,
    timeout: Duration,
}

impl Default for WorkerOffload {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerOffload {
    /// Offload using [`spawn_worker`].
    pub fn new() -> Self {
        Self::with_factory(spawn_worker)
    }

    /// Offload using a custom worker factory.
    pub fn with_factory(factory: WorkerFactory) -> Self {
        Self {
            state: Arc::default(),
            factory: Some(factory),
            timeout: OFFLOAD_TIMEOUT,
        }
    }

    /// Offload for a host without background threads. Every request resolves
    /// empty.
    pub fn unsupported() -> Self {
        Self {
            state: Arc::default(),
            factory: None,
            timeout: OFFLOAD_TIMEOUT,
        }
    }

    /// Override the response timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a request for `chunks` would reach the worker.
    #[inline]
    pub fn qualifies(&self, chunks: &[StyleChunk]) -> bool {
        self.factory.is_some() && chunks.len() > COMPLEXITY_THRESHOLD
    }

    /// Whether the worker currently exists.
    pub fn has_worker(&self) -> bool {
        self.state.lock().worker.is_some()
    }

    /// Requests still waiting for a reply.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Evaluate `chunks` on the worker.
    ///
    /// Resolves empty right away when the request does not qualify or the
    /// worker cannot be created, and after the timeout when the worker does not
    /// answer in time.
    pub async fn calculate_off_thread(
        &self,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
    ) -> Evaluation {
        if !self.qualifies(chunks) {
            return Evaluation::default();
        }
        let Some((id, reply)) = self.post(chunks, context) else {
            return Evaluation::default();
        };
        match timeout(self.timeout, reply).await {
            Ok(Ok(evaluation)) => evaluation,
            // Resolver dropped without an answer.
            Ok(Err(_)) => Evaluation::default(),
            Err(_) => {
                self.state.lock().pending.remove(&id);
                debug!("style offload task {id} timed out after {:?}", self.timeout);
                Evaluation::default()
            }
        }
    }

    fn post(
        &self,
        chunks: &[StyleChunk],
        context: &EvaluationContext,
    ) -> Option<(u64, oneshot::Receiver<Evaluation>)> {
        let factory = self.factory?;
        let mut state = self.state.lock();
        let worker = if let Some(worker) = &state.worker {
            Arc::clone(worker)
        } else {
            match factory() {
                Ok(pool) => {
                    let worker = Arc::new(pool);
                    state.worker = Some(Arc::clone(&worker));
                    debug!("style offload worker started");
                    worker
                }
                Err(error) => {
                    warn!("style offload worker unavailable: {error:#}");
                    return None;
                }
            }
        };
        state.next_id += 1;
        let id = state.next_id;
        let (resolver, reply) = oneshot::channel();
        state.pending.insert(id, resolver);
        drop(state);

        let shared = Arc::clone(&self.state);
        let chunks = chunks.to_vec();
        let context = context.clone();
        worker.spawn(move || {
            let reply = match catch_unwind(AssertUnwindSafe(|| evaluate(&chunks, &context))) {
                Ok(Ok(evaluation)) => WorkerReply::Done(evaluation),
                Ok(Err(error)) => WorkerReply::Failed(format!("{error:#}")),
                Err(_) => WorkerReply::Failed("evaluation panicked".to_owned()),
            };
            complete(&shared, id, reply);
        });
        Some((id, reply))
    }
}

fn complete(shared: &Mutex<OffloadState>, id: u64, reply: WorkerReply) {
    let mut state = shared.lock();
    match reply {
        WorkerReply::Done(evaluation) => {
            // Absent when the request already timed out.
            if let Some(resolver) = state.pending.remove(&id) {
                resolve(id, resolver, evaluation);
            }
        }
        WorkerReply::Failed(reason) => {
            warn!(
                "style offload task {id} failed: {reason}; dropping {} pending request(s) and the worker",
                state.pending.len()
            );
            for (pending_id, resolver) in state.pending.drain() {
                resolve(pending_id, resolver, Evaluation::default());
            }
            state.worker = None;
        }
    }
}

fn resolve(id: u64, resolver: oneshot::Sender<Evaluation>, evaluation: Evaluation) {
    if resolver.send(evaluation).is_err() {
        debug!("style offload task {id} finished after its caller went away");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualification_needs_capability_and_size() {
        let chunks = vec![StyleChunk::from("a"); COMPLEXITY_THRESHOLD + 1];
        assert!(WorkerOffload::new().qualifies(&chunks));
        assert!(!WorkerOffload::new().qualifies(&chunks[..COMPLEXITY_THRESHOLD]));
        assert!(!WorkerOffload::unsupported().qualifies(&chunks));
    }

    #[test]
    fn failure_resolves_every_pending_request() {
        let shared = Mutex::new(OffloadState::default());
        let (first, mut first_reply) = oneshot::channel();
        let (second, mut second_reply) = oneshot::channel();
        shared.lock().pending.insert(1, first);
        shared.lock().pending.insert(2, second);

        complete(&shared, 1, WorkerReply::Failed("boom".to_owned()));

        assert!(shared.lock().pending.is_empty());
        assert_eq!(first_reply.try_recv().ok(), Some(Evaluation::default()));
        assert_eq!(second_reply.try_recv().ok(), Some(Evaluation::default()));
    }
}
