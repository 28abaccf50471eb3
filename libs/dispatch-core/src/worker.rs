use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use observability::DispatchMetrics;
use tracing::{info, warn};

use crate::adapter::{CacheQueueBus, Outcome};
use crate::config::DispatchConfig;
use crate::fibonacci::fib;
use crate::producer::AggregateProducer;
use crate::redis_adapter::RedisCacheQueueBus;
use crate::request::Request;

/// A counter's hygiene TTL is a multiple of the subscribe timeout (§9
/// "Principal counter hygiene" redesign): long enough to outlive any
/// in-flight request, short enough that a crashed worker's leaked
/// increment self-heals quickly.
const COUNTER_TTL_MULTIPLE: u64 = 5;

/// Handles exactly one `Request` per spec.md §4.3, then publishes an
/// `Outcome` (or, on the retry path, silently re-enqueues).
pub struct Worker {
    bus: Arc<dyn CacheQueueBus>,
    producer: Arc<dyn AggregateProducer>,
    config: DispatchConfig,
}

impl Worker {
    pub fn new(bus: Arc<dyn CacheQueueBus>, producer: Arc<dyn AggregateProducer>, config: DispatchConfig) -> Self {
        Self { bus, producer, config }
    }

    fn counter_ttl(&self) -> Duration {
        Duration::from_secs(self.config.subscribe_timeout_seconds * COUNTER_TTL_MULTIPLE)
    }

    /// Runs the full admission/producer/retry flow for `request`.
    ///
    /// Never returns an error: every exit path either publishes an outcome
    /// or re-enqueues, per §4.3 and §7's "workers never throw through the
    /// queue boundary".
    pub async fn run(&self, request: Request) {
        let topic = request.topic();
        let in_flight_key = RedisCacheQueueBus::in_flight_key(&request.principal);
        let retry_key = RedisCacheQueueBus::retries_key(&request.principal);

        let in_flight = match self.bus.counter_get(&in_flight_key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, principal = %request.principal, "failed to read inFlight counter");
                self.publish_outcome(&topic, Outcome::InternalErr).await;
                return;
            }
        };

        if in_flight >= self.config.max_requests_count {
            DispatchMetrics::record_admission(false);
            self.deny_admission(&request, &retry_key).await;
            return;
        }

        DispatchMetrics::record_admission(true);
        self.admit(&request, &in_flight_key, &retry_key, &topic).await;
    }

    async fn deny_admission(&self, request: &Request, retry_key: &str) {
        let retries = match self.bus.counter_inc(retry_key).await {
            Ok(value) => value,
            Err(error) => {
                warn!(%error, principal = %request.principal, "failed to increment retries counter");
                self.publish_outcome(&request.topic(), Outcome::InternalErr).await;
                return;
            }
        };
        if let Err(error) = self.bus.counter_expire(retry_key, self.counter_ttl()).await {
            warn!(%error, key = retry_key, "failed to refresh retries counter TTL");
        }

        if retries > self.config.max_retry_count {
            info!(principal = %request.principal, retries, "max retry count exceeded");
            self.publish_outcome(&request.topic(), Outcome::MaxRetryCount).await;
            return;
        }

        let delay = Duration::from_secs(fib(retries as u32));
        info!(principal = %request.principal, retries, delay_secs = delay.as_secs(), "admission denied, backing off");
        DispatchMetrics::record_backoff(delay.as_secs());
        tokio::time::sleep(delay).await;

        if let Err(error) = self.bus.queue_push(&request.encode()).await {
            warn!(%error, "failed to re-enqueue request after back-off");
            self.publish_outcome(&request.topic(), Outcome::InternalErr).await;
        }
        // On success, nothing is published — the front-gateway keeps waiting
        // on its original subscription (§4.3 step 2c).
    }

    async fn admit(&self, request: &Request, in_flight_key: &str, retry_key: &str, topic: &str) {
        if let Err(error) = self.bus.counter_inc(in_flight_key).await {
            warn!(%error, principal = %request.principal, "failed to increment inFlight counter");
            self.publish_outcome(topic, Outcome::InternalErr).await;
            return;
        }
        if let Err(error) = self.bus.counter_expire(in_flight_key, self.counter_ttl()).await {
            warn!(%error, key = in_flight_key, "failed to refresh inFlight counter TTL");
        }

        let outcome = self.execute(request).await;

        if let Err(error) = self.bus.counter_dec(in_flight_key).await {
            warn!(%error, principal = %request.principal, "failed to decrement inFlight counter");
        }

        if outcome == Outcome::Success {
            if let Err(error) = self.bus.counter_reset(retry_key).await {
                warn!(%error, key = retry_key, "failed to reset retries counter after successful admission");
            }
        }

        self.publish_outcome(topic, outcome).await;
    }

    async fn execute(&self, request: &Request) -> Outcome {
        let started = std::time::Instant::now();
        let produced = self.producer.produce(request.kind).await;
        DispatchMetrics::record_producer_duration(request.kind.as_str(), started.elapsed().as_secs_f64());

        let rows = match produced {
            Ok(rows) => rows,
            Err(error) => {
                warn!(%error, kind = %request.kind, "aggregate producer failed");
                return Outcome::InternalErr;
            }
        };

        let entry: HashMap<String, String> = rows
            .into_iter()
            .map(|row| (row.manufacturer, row.count.to_string()))
            .collect();

        let ttl = Duration::from_secs(self.config.cache_expire_seconds);
        if let Err(error) = self.bus.cache_put(request.kind, &entry, ttl).await {
            warn!(%error, kind = %request.kind, "failed to write cache entry");
            return Outcome::InternalErr;
        }

        Outcome::Success
    }

    async fn publish_outcome(&self, topic: &str, outcome: Outcome) {
        DispatchMetrics::record_worker_outcome(outcome.as_str());
        if let Err(error) = self.bus.publish(topic, outcome.as_str()).await {
            warn!(%error, topic, %outcome, "failed to publish outcome");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CacheEntry, MockCacheQueueBus};
    use crate::kind::AggregateKind;
    use crate::producer::{AggregateError, ManufacturerCount, MockAggregateProducer};
    use mockall::predicate::eq;

    fn config() -> DispatchConfig {
        DispatchConfig::with_max_workers(4)
    }

    #[tokio::test]
    async fn admitted_request_writes_cache_and_publishes_success() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_counter_get().with(eq("lock:alice")).returning(|_| Ok(0));
        bus.expect_counter_inc().with(eq("lock:alice")).returning(|_| Ok(1));
        bus.expect_counter_expire().returning(|_, _| Ok(()));
        bus.expect_cache_put()
            .withf(|kind, entry: &CacheEntry, _ttl| {
                *kind == AggregateKind::ProductsBought && entry.get("Acme") == Some(&"3".to_string())
            })
            .returning(|_, _, _| Ok(()));
        bus.expect_counter_dec().with(eq("lock:alice")).returning(|_| Ok(()));
        bus.expect_counter_reset().with(eq("retry:alice")).returning(|_| Ok(()));
        bus.expect_publish()
            .withf(|topic, payload| topic == "alice:corr1" && payload == "success")
            .returning(|_, _| Ok(()));

        let mut producer = MockAggregateProducer::new();
        producer.expect_produce().returning(|_| {
            Ok(vec![ManufacturerCount {
                manufacturer: "Acme".to_string(),
                count: 3,
            }])
        });

        let worker = Worker::new(Arc::new(bus), Arc::new(producer), config());
        worker
            .run(Request::new("alice", "corr1", AggregateKind::ProductsBought))
            .await;
    }

    #[tokio::test]
    async fn producer_failure_publishes_internal_err() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_counter_get().returning(|_| Ok(0));
        bus.expect_counter_inc().returning(|_| Ok(1));
        bus.expect_counter_expire().returning(|_, _| Ok(()));
        bus.expect_counter_dec().returning(|_| Ok(()));
        bus.expect_publish()
            .withf(|_, payload| payload == "internal_err")
            .returning(|_, _| Ok(()));

        let mut producer = MockAggregateProducer::new();
        producer
            .expect_produce()
            .returning(|_| Err(AggregateError::Database("connection reset".to_string())));

        let worker = Worker::new(Arc::new(bus), Arc::new(producer), config());
        worker
            .run(Request::new("alice", "corr1", AggregateKind::ItemsBought))
            .await;
    }

    #[tokio::test]
    async fn denied_admission_backs_off_then_reenqueues() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_counter_get().with(eq("lock:alice")).returning(|_| Ok(10));
        bus.expect_counter_inc().with(eq("retry:alice")).returning(|_| Ok(1));
        bus.expect_counter_expire().returning(|_, _| Ok(()));
        bus.expect_queue_push()
            .withf(|raw| raw == "alice:corr1:products:bought")
            .returning(|_| Ok(()));

        let producer = MockAggregateProducer::new();
        let worker = Worker::new(Arc::new(bus), Arc::new(producer), config());

        tokio::time::pause();
        let request = Request::new("alice", "corr1", AggregateKind::ProductsBought);
        let handle = tokio::spawn(async move { worker.run(request).await });
        tokio::time::advance(Duration::from_secs(2)).await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn exhausted_retries_publishes_max_retry_count() {
        let mut config = config();
        config.max_retry_count = 10;

        let mut bus = MockCacheQueueBus::new();
        bus.expect_counter_get().with(eq("lock:alice")).returning(|_| Ok(10));
        bus.expect_counter_inc().with(eq("retry:alice")).returning(|_| Ok(11));
        bus.expect_counter_expire().returning(|_, _| Ok(()));
        bus.expect_publish()
            .withf(|_, payload| payload == "max_retry_count")
            .returning(|_, _| Ok(()));

        let producer = MockAggregateProducer::new();
        let worker = Worker::new(Arc::new(bus), Arc::new(producer), config);
        worker
            .run(Request::new("alice", "corr1", AggregateKind::ProductsBought))
            .await;
    }
}
