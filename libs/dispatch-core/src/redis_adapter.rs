use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;
use tracing::warn;

use crate::adapter::{AdapterError, CacheEntry, CacheQueueBus, SubscribeOutcome, Subscription};
use crate::kind::AggregateKind;

const QUEUE_KEY: &str = "warehouse:requests";

/// The production `CacheQueueBus`, backed by a single Redis deployment.
///
/// `manager` serves hash/list/counter commands (cheap to clone, reconnects
/// transparently). `client` is used to open a dedicated connection per
/// `subscribe` call, since a Redis connection in subscriber mode can't also
/// run ordinary commands.
#[derive(Clone)]
pub struct RedisCacheQueueBus {
    manager: ConnectionManager,
    client: Client,
}

impl RedisCacheQueueBus {
    pub fn new(manager: ConnectionManager, client: Client) -> Self {
        Self { manager, client }
    }

    fn lock_key(principal: &str) -> String {
        format!("lock:{}", principal)
    }

    fn retry_key(principal: &str) -> String {
        format!("retry:{}", principal)
    }

    pub fn in_flight_key(principal: &str) -> String {
        Self::lock_key(principal)
    }

    pub fn retries_key(principal: &str) -> String {
        Self::retry_key(principal)
    }
}

#[async_trait]
impl CacheQueueBus for RedisCacheQueueBus {
    async fn cache_get(&self, kind: AggregateKind) -> Result<Option<CacheEntry>, AdapterError> {
        let mut conn = self.manager.clone();
        let exists: bool = conn.exists(kind.cache_key()).await?;
        if !exists {
            return Ok(None);
        }
        let mut entry: CacheEntry = conn.hgetall(kind.cache_key()).await?;
        // Strip the empty-hash sentinel `cache_put` writes (see below) so
        // the boundary honors its own documented contract: present-but-empty
        // is `Some(HashMap::new())`, never a spurious `""` manufacturer.
        entry.remove("");
        Ok(Some(entry))
    }

    async fn cache_put(&self, kind: AggregateKind, entry: &CacheEntry, ttl: Duration) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        let mut pipe = redis::pipe();
        pipe.atomic().del(kind.cache_key());
        if !entry.is_empty() {
            pipe.hset_multiple(kind.cache_key(), &entry.iter().collect::<Vec<_>>());
        } else {
            // Redis has no "empty hash" primitive; a sentinel field keeps the
            // key present (§3: present-but-empty must read back as present)
            // without ever surfacing in a real response, since manufacturer
            // names are never empty strings.
            pipe.hset(kind.cache_key(), "", "");
        }
        pipe.expire(kind.cache_key(), ttl.as_secs() as i64);
        pipe.query_async::<()>(&mut conn).await?;
        Ok(())
    }

    async fn queue_push(&self, raw: &str) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        conn.rpush::<_, _, ()>(QUEUE_KEY, raw).await?;
        Ok(())
    }

    async fn queue_blocking_pop(&self, timeout: Duration) -> Result<Option<String>, AdapterError> {
        let mut conn = self.manager.clone();
        let popped: Option<(String, String)> = conn.blpop(QUEUE_KEY, timeout.as_secs_f64()).await?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn publish(&self, topic: &str, payload: &str) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        conn.publish::<_, _, ()>(topic, payload).await?;
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Box<dyn Subscription>, AdapterError> {
        let mut pubsub = self.client.get_async_pubsub().await?;
        // The SUBSCRIBE command is acknowledged before this returns — this
        // is what closes the subscribe/enqueue race spec.md §9 calls out.
        pubsub.subscribe(topic).await?;
        Ok(Box::new(RedisSubscription { pubsub }))
    }

    async fn counter_inc(&self, key: &str) -> Result<i64, AdapterError> {
        let mut conn = self.manager.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn counter_dec(&self, key: &str) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        let new_value: i64 = conn.decr(key, 1).await?;
        if new_value < 0 {
            warn!(key, new_value, "counter went negative on decrement");
        }
        Ok(())
    }

    async fn counter_get(&self, key: &str) -> Result<i64, AdapterError> {
        let mut conn = self.manager.clone();
        let value: Option<i64> = conn.get(key).await?;
        Ok(value.unwrap_or(0))
    }

    async fn counter_expire(&self, key: &str, ttl: Duration) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        conn.expire::<_, ()>(key, ttl.as_secs() as i64).await?;
        Ok(())
    }

    async fn counter_reset(&self, key: &str) -> Result<(), AdapterError> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, 0i64).await?;
        Ok(())
    }
}

/// A live Redis pub/sub subscription. Holds its own connection, separate
/// from `manager`, since a connection in subscriber mode can't run other
/// commands.
struct RedisSubscription {
    pubsub: redis::aio::PubSub,
}

#[async_trait]
impl Subscription for RedisSubscription {
    async fn recv_once(&mut self, timeout: Duration) -> Result<SubscribeOutcome, AdapterError> {
        let mut stream = self.pubsub.on_message();
        match tokio::time::timeout(timeout, stream.next()).await {
            Ok(Some(message)) => {
                let payload: String = message
                    .get_payload()
                    .map_err(|error| AdapterError::Decode(format!("non-UTF8 pub/sub payload: {error}")))?;
                Ok(SubscribeOutcome::Message(payload))
            }
            Ok(None) => Err(AdapterError::Decode("pub/sub stream closed unexpectedly".to_string())),
            Err(_elapsed) => Ok(SubscribeOutcome::TimedOut),
        }
    }
}
