//! Verification orchestrator: FIFO queue, bounded worker pool and
//! per-document deduplication.
//!
//! The dedup map counts queued or running attempts per document, so a forced
//! duplicate keeps the gate closed until the last of them finishes.
//!
//! Shutdown: [`VerificationOrchestrator::shutdown`] stops the dispatcher; it does
//! not wait for in-flight attempts, which run to completion on their own tasks.

use keystone_core::models::VerificationOutcome;
use keystone_core::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, Semaphore};
use uuid::Uuid;

use crate::pipeline::VerificationPipeline;

/// Optional sender notified with the outcome of every finished attempt.
pub type VerificationFinishedSender = mpsc::Sender<(Uuid, VerificationOutcome)>;

type InFlight = Arc<Mutex<HashMap<Uuid, usize>>>;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    pub max_workers: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_workers: 2 }
    }
}

fn lock(in_flight: &InFlight) -> MutexGuard<'_, HashMap<Uuid, usize>> {
    in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn release(in_flight: &InFlight, document_id: Uuid) {
    let mut in_flight = lock(in_flight);
    if let Some(count) = in_flight.get_mut(&document_id) {
        *count -= 1;
        if *count == 0 {
            in_flight.remove(&document_id);
        }
    }
}

/// Releases one attempt's hold on a document when dropped, including when the
/// attempt panics.
struct InFlightGuard {
    in_flight: InFlight,
    document_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        release(&self.in_flight, self.document_id);
    }
}

pub struct VerificationOrchestrator {
    pipeline: Arc<VerificationPipeline>,
    queue_tx: mpsc::UnboundedSender<Uuid>,
    in_flight: InFlight,
    shutdown_tx: mpsc::Sender<()>,
}

impl VerificationOrchestrator {
    /// Create the orchestrator and spawn its dispatcher. Must be called from
    /// within a tokio runtime.
    pub fn new(
        pipeline: Arc<VerificationPipeline>,
        config: OrchestratorConfig,
        finished_tx: Option<VerificationFinishedSender>,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let in_flight: InFlight = Arc::new(Mutex::new(HashMap::new()));

        tokio::spawn(Self::dispatcher(
            pipeline.clone(),
            config,
            in_flight.clone(),
            queue_rx,
            shutdown_rx,
            finished_tx,
        ));

        Self {
            pipeline,
            queue_tx,
            in_flight,
            shutdown_tx,
        }
    }

    /// Queue a document for verification and return immediately.
    ///
    /// Without `force`, a document that is already queued or running is not
    /// queued again. Returns whether the document was queued.
    pub fn enqueue_verification(&self, document_id: Uuid, force: bool) -> bool {
        {
            let mut in_flight = lock(&self.in_flight);
            let count = in_flight.entry(document_id).or_insert(0);
            if *count > 0 && !force {
                tracing::debug!(document.id = %document_id, "Verification already in flight");
                return false;
            }
            *count += 1;
        }

        if self.queue_tx.send(document_id).is_err() {
            tracing::warn!(document.id = %document_id, "Dispatcher stopped, verification not queued");
            release(&self.in_flight, document_id);
            return false;
        }

        tracing::debug!(document.id = %document_id, force, "Verification queued");
        true
    }

    /// Manual re-verification; bypasses deduplication.
    pub fn reverify_document(&self, document_id: Uuid) -> bool {
        self.enqueue_verification(document_id, true)
    }

    /// Startup sweep: queue every pending document that has not been decided.
    pub async fn initialize(&self) -> Result<usize, AppError> {
        let documents = self.pipeline.store().find_pending_unverified().await?;
        let mut queued = 0;
        for document in &documents {
            if self.enqueue_verification(document.id, true) {
                queued += 1;
            }
        }

        tracing::info!(queued, "Startup verification sweep queued documents");
        Ok(queued)
    }

    pub fn is_in_flight(&self, document_id: Uuid) -> bool {
        lock(&self.in_flight).contains_key(&document_id)
    }

    pub async fn shutdown(&self) {
        tracing::info!("Initiating verification orchestrator shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn dispatcher(
        pipeline: Arc<VerificationPipeline>,
        config: OrchestratorConfig,
        in_flight: InFlight,
        mut queue_rx: mpsc::UnboundedReceiver<Uuid>,
        mut shutdown_rx: mpsc::Receiver<()>,
        finished_tx: Option<VerificationFinishedSender>,
    ) {
        let max_workers = config.max_workers.max(1);
        let semaphore = Arc::new(Semaphore::new(max_workers));
        tracing::info!(max_workers, "Verification worker pool started");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Verification worker pool shutting down");
                    break;
                }
                next = queue_rx.recv() => {
                    let Some(document_id) = next else { break };

                    let permit = tokio::select! {
                        permit = semaphore.clone().acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Verification worker pool shutting down");
                            break;
                        }
                    };

                    let guard = InFlightGuard {
                        in_flight: in_flight.clone(),
                        document_id,
                    };
                    let pipeline = pipeline.clone();
                    let finished_tx = finished_tx.clone();

                    tokio::spawn(async move {
                        let _permit = permit;
                        let outcome = pipeline.verify(document_id).await;
                        drop(guard);
                        if let Some(tx) = finished_tx {
                            let _ = tx.send((document_id, outcome)).await;
                        }
                    });
                }
            }
        }

        tracing::info!("Verification worker pool stopped");
    }
}
