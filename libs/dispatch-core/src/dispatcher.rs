use std::sync::Arc;
use std::time::Duration;

use observability::DispatchMetrics;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::adapter::CacheQueueBus;
use crate::config::DispatchConfig;
use crate::producer::AggregateProducer;
use crate::request::{Request, RequestParseError};
use crate::worker::Worker;

/// Server-side block timeout for the queue pop (§4.2 step 1).
const QUEUE_POP_TIMEOUT: Duration = Duration::from_secs(60);

/// Pulls requests off the shared queue forever and launches a `Worker` per
/// request under a process-wide parallelism ceiling.
///
/// §9 recommends a channel-backed semaphore over the polling
/// sleep-and-recheck design described in §4.2 step 3 "where the language
/// supports it" — Rust does, via `tokio::sync::Semaphore`, so admission is
/// `acquire_owned().await` rather than a sleep loop. The popped request is
/// still held in memory until a permit is available, matching the spec's
/// "not re-queued while waiting" guarantee; the permit itself stands in for
/// `activeWorkers`, released automatically when the worker task finishes.
pub struct WorkerDispatcher {
    bus: Arc<dyn CacheQueueBus>,
    producer: Arc<dyn AggregateProducer>,
    config: DispatchConfig,
    semaphore: Arc<Semaphore>,
}

impl WorkerDispatcher {
    pub fn new(bus: Arc<dyn CacheQueueBus>, producer: Arc<dyn AggregateProducer>, config: DispatchConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_workers_count));
        Self {
            bus,
            producer,
            config,
            semaphore,
        }
    }

    /// Runs the dispatch loop until `shutdown` resolves.
    pub async fn run(&self, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("dispatcher received shutdown signal");
                    return;
                }
                raw = self.bus.queue_blocking_pop(QUEUE_POP_TIMEOUT) => {
                    match raw {
                        Ok(Some(raw)) => self.dispatch_one(raw).await,
                        Ok(None) => debug!("queue pop timed out with nothing to pop"),
                        Err(error) => warn!(%error, "queue pop failed"),
                    }
                }
            }
        }
    }

    async fn dispatch_one(&self, raw: String) {
        let request = match Request::parse(&raw) {
            Ok(request) => request,
            Err(error) => {
                self.log_malformed(&error);
                return;
            }
        };

        // Acquired before the worker task is spawned: this is the ceiling
        // wait from §4.2 step 3, expressed as a suspension instead of a
        // poll. The request stays in `request` (in memory) the whole time.
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("dispatcher semaphore is never closed");

        DispatchMetrics::set_active_workers(self.config.max_workers_count - self.semaphore.available_permits());

        let worker = Worker::new(self.bus.clone(), self.producer.clone(), self.config);
        let semaphore = self.semaphore.clone();
        let max_workers = self.config.max_workers_count;
        tokio::spawn(async move {
            worker.run(request).await;
            drop(permit);
            DispatchMetrics::set_active_workers(max_workers - semaphore.available_permits());
        });
    }

    fn log_malformed(&self, error: &RequestParseError) {
        warn!(%error, "dropping malformed queue entry");
    }
}
