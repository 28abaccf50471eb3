use std::sync::Arc;
use std::time::Duration;

use observability::DispatchMetrics;
use rand::distr::{Alphanumeric, SampleString};
use tracing::warn;

use crate::adapter::{CacheQueueBus, SubscribeOutcome};
use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::kind::AggregateKind;
use crate::producer::ManufacturerCount;
use crate::request::Request;

/// Length of a generated correlation id (§4.1 step 2): "uniformly random
/// alphanumeric token, length 16, collision-avoidance by size alone".
const CORRELATION_ID_LEN: usize = 16;

/// The synchronous read-through entry point (§4.1). Stateless beyond its
/// handle on the cache/queue/bus boundary and the dispatch configuration.
pub struct FrontGateway {
    bus: Arc<dyn CacheQueueBus>,
    config: DispatchConfig,
}

impl FrontGateway {
    pub fn new(bus: Arc<dyn CacheQueueBus>, config: DispatchConfig) -> Self {
        Self { bus, config }
    }

    /// Runs the read-through algorithm for `kind` on behalf of `principal`.
    pub async fn fetch(&self, kind: AggregateKind, principal: &str) -> Result<Vec<ManufacturerCount>, DispatchError> {
        if principal.is_empty() {
            return Err(DispatchError::BadRequest("token must be provided".to_string()));
        }

        if let Some(entry) = self
            .bus
            .cache_get(kind)
            .await
            .map_err(|error| DispatchError::UpstreamFailure(error.to_string()))?
        {
            DispatchMetrics::record_cache_hit(kind.as_str());
            DispatchMetrics::record_gateway_result(kind.as_str(), "ok");
            return Ok(decode_cache_entry(kind, entry));
        }
        DispatchMetrics::record_cache_miss(kind.as_str());

        let result = self.fetch_via_dispatch(kind, principal).await;
        DispatchMetrics::record_gateway_result(kind.as_str(), result_label(&result));
        result
    }

    async fn fetch_via_dispatch(
        &self,
        kind: AggregateKind,
        principal: &str,
    ) -> Result<Vec<ManufacturerCount>, DispatchError> {
        let correlation_id = generate_correlation_id();
        let request = Request::new(principal, correlation_id, kind);
        let topic = request.topic();

        // Subscribing before enqueuing is what closes the race spec.md §9
        // calls out — `subscribe` only returns once established.
        let mut subscription = self
            .bus
            .subscribe(&topic)
            .await
            .map_err(|error| DispatchError::UpstreamFailure(error.to_string()))?;

        self.bus
            .queue_push(&request.encode())
            .await
            .map_err(|error| DispatchError::UpstreamFailure(error.to_string()))?;

        let timeout = Duration::from_secs(self.config.subscribe_timeout_seconds);
        let outcome = subscription
            .recv_once(timeout)
            .await
            .map_err(|error| DispatchError::UpstreamFailure(error.to_string()))?;

        match outcome {
            SubscribeOutcome::TimedOut => Err(DispatchError::Timeout),
            SubscribeOutcome::Message(payload) => self.handle_payload(kind, &payload).await,
        }
        // `subscription` drops here on every exit path, closing it (§4.1 step 6).
    }

    async fn handle_payload(
        &self,
        kind: AggregateKind,
        payload: &str,
    ) -> Result<Vec<ManufacturerCount>, DispatchError> {
        match payload {
            "success" => {
                let entry = self
                    .bus
                    .cache_get(kind)
                    .await
                    .map_err(|error| DispatchError::UpstreamFailure(error.to_string()))?
                    .unwrap_or_default();
                Ok(decode_cache_entry(kind, entry))
            }
            "internal_err" => Err(DispatchError::UpstreamFailure("worker reported internal_err".to_string())),
            "max_retry_count" => Err(DispatchError::Throttled),
            other => {
                // §9 "Unknown publication payloads": preserved for
                // compatibility, but logged loudly.
                warn!(payload = other, "unrecognized pub/sub payload, returning empty result");
                Ok(Vec::new())
            }
        }
    }
}

fn result_label(result: &Result<Vec<ManufacturerCount>, DispatchError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(DispatchError::BadRequest(_)) => "bad_request",
        Err(DispatchError::Throttled) => "throttled",
        Err(DispatchError::Timeout) => "timeout",
        Err(DispatchError::UpstreamFailure(_)) => "upstream_failure",
    }
}

fn generate_correlation_id() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CORRELATION_ID_LEN)
}

/// Decodes a raw cache hash into ordered rows, substituting zero (and
/// logging a warning) for any field whose value doesn't parse as an
/// integer (§4.1 step 1).
fn decode_cache_entry(kind: AggregateKind, entry: std::collections::HashMap<String, String>) -> Vec<ManufacturerCount> {
    entry
        .into_iter()
        .filter(|(manufacturer, _)| !manufacturer.is_empty())
        .map(|(manufacturer, raw_count)| {
            let count = raw_count.parse::<i64>().unwrap_or_else(|_| {
                warn!(%kind, manufacturer, raw_count, "non-numeric cached count, substituting zero");
                0
            });
            ManufacturerCount { manufacturer, count }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{CacheEntry, MockCacheQueueBus, MockSubscription};
    use mockall::predicate::always;

    fn config() -> DispatchConfig {
        DispatchConfig::with_max_workers(4)
    }

    #[tokio::test]
    async fn missing_principal_is_bad_request() {
        let bus = MockCacheQueueBus::new();
        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "").await;
        assert!(matches!(result, Err(DispatchError::BadRequest(_))));
    }

    #[tokio::test]
    async fn warm_cache_hit_returns_without_enqueueing() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_cache_get().returning(|_| {
            let mut entry = CacheEntry::new();
            entry.insert("Acme".to_string(), "3".to_string());
            Ok(Some(entry))
        });
        // No expectations on queue_push/subscribe: a call would panic the mock.

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "alice").await.unwrap();
        assert_eq!(
            result,
            vec![ManufacturerCount {
                manufacturer: "Acme".to_string(),
                count: 3
            }]
        );
    }

    #[tokio::test]
    async fn non_numeric_count_decodes_to_zero_with_warning() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_cache_get().returning(|_| {
            let mut entry = CacheEntry::new();
            entry.insert("Acme".to_string(), "not-a-number".to_string());
            Ok(Some(entry))
        });

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "alice").await.unwrap();
        assert_eq!(result[0].count, 0);
    }

    #[tokio::test]
    async fn cold_cache_enqueues_and_awaits_success() {
        let mut bus = MockCacheQueueBus::new();
        let mut call_count = 0;
        bus.expect_cache_get().returning(move |_| {
            call_count += 1;
            if call_count == 1 {
                Ok(None)
            } else {
                let mut entry = CacheEntry::new();
                entry.insert("Acme".to_string(), "3".to_string());
                Ok(Some(entry))
            }
        });
        bus.expect_subscribe().with(always()).returning(|_| {
            let mut subscription = MockSubscription::new();
            subscription
                .expect_recv_once()
                .returning(|_| Ok(SubscribeOutcome::Message("success".to_string())));
            Ok(Box::new(subscription) as Box<dyn crate::adapter::Subscription>)
        });
        bus.expect_queue_push().returning(|_| Ok(()));

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "alice").await.unwrap();
        assert_eq!(result[0].manufacturer, "Acme");
    }

    #[tokio::test]
    async fn max_retry_count_outcome_is_throttled() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_cache_get().returning(|_| Ok(None));
        bus.expect_subscribe().returning(|_| {
            let mut subscription = MockSubscription::new();
            subscription
                .expect_recv_once()
                .returning(|_| Ok(SubscribeOutcome::Message("max_retry_count".to_string())));
            Ok(Box::new(subscription) as Box<dyn crate::adapter::Subscription>)
        });
        bus.expect_queue_push().returning(|_| Ok(()));

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "alice").await;
        assert!(matches!(result, Err(DispatchError::Throttled)));
    }

    #[tokio::test]
    async fn timeout_outcome_surfaces_as_timeout_error() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_cache_get().returning(|_| Ok(None));
        bus.expect_subscribe().returning(|_| {
            let mut subscription = MockSubscription::new();
            subscription.expect_recv_once().returning(|_| Ok(SubscribeOutcome::TimedOut));
            Ok(Box::new(subscription) as Box<dyn crate::adapter::Subscription>)
        });
        bus.expect_queue_push().returning(|_| Ok(()));

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ItemsBought, "alice").await;
        assert!(matches!(result, Err(DispatchError::Timeout)));
    }

    #[tokio::test]
    async fn unrecognized_payload_returns_empty_result_without_error() {
        let mut bus = MockCacheQueueBus::new();
        bus.expect_cache_get().returning(|_| Ok(None));
        bus.expect_subscribe().returning(|_| {
            let mut subscription = MockSubscription::new();
            subscription
                .expect_recv_once()
                .returning(|_| Ok(SubscribeOutcome::Message("something_else".to_string())));
            Ok(Box::new(subscription) as Box<dyn crate::adapter::Subscription>)
        });
        bus.expect_queue_push().returning(|_| Ok(()));

        let gateway = FrontGateway::new(Arc::new(bus), config());
        let result = gateway.fetch(AggregateKind::ProductsBought, "alice").await.unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn correlation_id_has_spec_length() {
        assert_eq!(generate_correlation_id().len(), CORRELATION_ID_LEN);
    }
}
