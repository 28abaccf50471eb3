//! Integration tests for `RedisCacheQueueBus` against real Redis via
//! testcontainers (spec.md §4.5, §8's end-to-end scenarios 1/2/5/6).

use std::time::Duration;

use dispatch_core::{AggregateKind, CacheQueueBus, RedisCacheQueueBus, SubscribeOutcome, Subscription};
use redis::aio::ConnectionManager;
use test_utils::TestRedis;

async fn bus(redis: &TestRedis) -> RedisCacheQueueBus {
    let manager = ConnectionManager::new(redis.client()).await.expect("failed to build connection manager");
    RedisCacheQueueBus::new(manager, redis.client())
}

#[tokio::test]
async fn cache_get_returns_none_when_key_absent() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    let entry = bus.cache_get(AggregateKind::ProductsBought).await.unwrap();
    assert_eq!(entry, None);
}

#[tokio::test]
async fn cache_put_then_get_round_trips() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    let mut entry = dispatch_core::CacheEntry::new();
    entry.insert("Acme".to_string(), "3".to_string());
    bus.cache_put(AggregateKind::ProductsBought, &entry, Duration::from_secs(30))
        .await
        .unwrap();

    let read_back = bus.cache_get(AggregateKind::ProductsBought).await.unwrap();
    assert_eq!(read_back, Some(entry));
}

#[tokio::test]
async fn empty_cache_entry_is_present_not_absent() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    let entry = dispatch_core::CacheEntry::new();
    bus.cache_put(AggregateKind::ItemsBought, &entry, Duration::from_secs(30))
        .await
        .unwrap();

    let read_back = bus.cache_get(AggregateKind::ItemsBought).await.unwrap();
    assert_eq!(
        read_back,
        Some(dispatch_core::CacheEntry::new()),
        "present-but-empty hash must read back as present and empty (§3), with no sentinel leaking through"
    );
}

#[tokio::test]
async fn queue_push_then_blocking_pop_round_trips() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    bus.queue_push("alice:corr1:products:bought").await.unwrap();
    let popped = bus.queue_blocking_pop(Duration::from_secs(1)).await.unwrap();
    assert_eq!(popped, Some("alice:corr1:products:bought".to_string()));
}

#[tokio::test]
async fn blocking_pop_times_out_on_empty_queue() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    let popped = bus.queue_blocking_pop(Duration::from_millis(200)).await.unwrap();
    assert_eq!(popped, None);
}

#[tokio::test]
async fn subscribe_before_publish_observes_the_message() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    // Mirrors gateway.rs's subscribe-then-enqueue ordering (§4.1 step 3,
    // §9 "race between subscribe and publish").
    let mut subscription = bus.subscribe("alice:corr1").await.unwrap();
    bus.publish("alice:corr1", "success").await.unwrap();

    let outcome = subscription.recv_once(Duration::from_secs(2)).await.unwrap();
    assert_eq!(outcome, SubscribeOutcome::Message("success".to_string()));
}

#[tokio::test]
async fn recv_once_times_out_with_no_publication() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    let mut subscription = bus.subscribe("alice:corr-none").await.unwrap();
    let outcome = subscription.recv_once(Duration::from_millis(200)).await.unwrap();
    assert_eq!(outcome, SubscribeOutcome::TimedOut);
}

#[tokio::test]
async fn counter_inc_dec_get_round_trip() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    assert_eq!(bus.counter_get("lock:alice").await.unwrap(), 0);
    assert_eq!(bus.counter_inc("lock:alice").await.unwrap(), 1);
    assert_eq!(bus.counter_inc("lock:alice").await.unwrap(), 2);
    assert_eq!(bus.counter_get("lock:alice").await.unwrap(), 2);
    bus.counter_dec("lock:alice").await.unwrap();
    assert_eq!(bus.counter_get("lock:alice").await.unwrap(), 1);
}

#[tokio::test]
async fn counter_reset_sets_value_to_zero() {
    let redis = TestRedis::new().await;
    let bus = bus(&redis).await;

    bus.counter_inc("retry:alice").await.unwrap();
    bus.counter_inc("retry:alice").await.unwrap();
    bus.counter_reset("retry:alice").await.unwrap();
    assert_eq!(bus.counter_get("retry:alice").await.unwrap(), 0);
}
