//! Job dispatch
//!
//! Two interchangeable execution paths behind one `submit(job_id)` contract:
//! a durable FIFO queue backed by a single background worker, and an inline
//! fallback that spawns the pipeline in the current process when the queue
//! cannot accept the job. The choice is a capability probe at call time, so a
//! queue outage degrades to best-effort inline execution instead of rejecting
//! uploads. Only the job id travels through the queue; the job record itself
//! carries all the state a run needs.

use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::config::PipelineConfig;
use crate::engine::TranscriptionEngine;
use crate::pipeline::run_job;
use crate::store::TranscriptionStore;

/// Durable FIFO queue: a bounded channel drained by one background worker.
///
/// Jobs are processed one at a time in arrival order; a job's chunks are
/// already sequential, so the worker gives each run the whole machine. Each
/// run is bounded by a generous wall-clock ceiling (hours, not seconds)
/// because inference over long recordings is itself slow.
#[derive(Clone)]
pub struct JobQueue {
    job_tx: mpsc::Sender<i64>,
}

impl JobQueue {
    /// Start the background worker and return a handle for enqueueing
    pub fn start(
        store: TranscriptionStore,
        engine: Arc<dyn TranscriptionEngine>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        let (job_tx, mut job_rx) = mpsc::channel::<i64>(config.queue_capacity);
        let ceiling = Duration::from_secs(config.job_timeout_hours * 3600);

        tokio::spawn(async move {
            info!("Job worker started");

            while let Some(job_id) = job_rx.recv().await {
                let run = run_job(&store, engine.as_ref(), &config, job_id);
                match tokio::time::timeout(ceiling, run).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        // Terminal state is already persisted; this is the
                        // out-of-band logging surface
                        error!("Queued job {} ended in failure: {}", job_id, e);
                    }
                    Err(_) => {
                        error!(
                            "Queued job {} exceeded the {}h wall-clock ceiling",
                            job_id,
                            ceiling.as_secs() / 3600
                        );
                    }
                }
            }

            info!("Job worker stopped");
        });

        Self { job_tx }
    }

    /// Offer a job to the queue without blocking.
    ///
    /// Fails when the queue is full or its worker is gone; the caller is
    /// expected to fall back to inline execution.
    pub fn try_enqueue(&self, job_id: i64) -> Result<(), TrySendError<i64>> {
        self.job_tx.try_send(job_id)
    }

    /// A queue whose worker is gone, for exercising the fallback path
    #[cfg(test)]
    pub(crate) fn unavailable() -> Self {
        let (job_tx, job_rx) = mpsc::channel::<i64>(1);
        drop(job_rx);
        Self { job_tx }
    }
}

/// Entry point the HTTP boundary uses to fire a job
#[derive(Clone)]
pub struct Dispatcher {
    queue: JobQueue,
    store: TranscriptionStore,
    engine: Arc<dyn TranscriptionEngine>,
    config: Arc<PipelineConfig>,
}

impl Dispatcher {
    pub fn new(
        queue: JobQueue,
        store: TranscriptionStore,
        engine: Arc<dyn TranscriptionEngine>,
        config: Arc<PipelineConfig>,
    ) -> Self {
        Self {
            queue,
            store,
            engine,
            config,
        }
    }

    /// Submit a job for execution, fire-and-forget.
    ///
    /// Never fails from the caller's point of view: if the queue rejects the
    /// job it runs inline in this process instead, asynchronously relative to
    /// the upload response. User-visible failure is always observed through
    /// status polling, never here.
    pub fn submit(&self, job_id: i64) {
        match self.queue.try_enqueue(job_id) {
            Ok(()) => {
                info!("Job {} enqueued", job_id);
            }
            Err(e) => {
                warn!(
                    "Queue unavailable for job {} ({}), falling back to inline execution",
                    job_id, e
                );
                let store = self.store.clone();
                let engine = Arc::clone(&self.engine);
                let config = Arc::clone(&self.config);
                tokio::spawn(async move {
                    if let Err(e) = run_job(&store, engine.as_ref(), &config, job_id).await {
                        error!("Inline job {} ended in failure: {}", job_id, e);
                    }
                });
            }
        }
    }
}
