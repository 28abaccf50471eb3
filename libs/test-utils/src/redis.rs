//! Redis test infrastructure: a `TestRedis` helper backed by a throwaway container.

use redis::aio::MultiplexedConnection;
use redis::Client;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// A Redis container with automatic cleanup on drop.
pub struct TestRedis {
    #[allow(dead_code)]
    container: ContainerAsync<Redis>,
    connection: MultiplexedConnection,
    pub connection_string: String,
}

impl TestRedis {
    pub async fn new() -> Self {
        let image = Redis::default().with_tag("8-alpine");
        let container = image.start().await.expect("failed to start Redis container");
        let host_port = container.get_host_port_ipv4(6379).await.expect("failed to get Redis port");
        let connection_string = format!("redis://127.0.0.1:{}", host_port);

        let client = Client::open(connection_string.clone()).expect("failed to create Redis client");
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .expect("failed to connect to test Redis");

        tracing::info!(port = host_port, "test Redis ready");

        Self {
            container,
            connection,
            connection_string,
        }
    }

    /// A plain client, for constructing a dedicated pub/sub connection.
    pub fn client(&self) -> Client {
        Client::open(self.connection_string.clone()).expect("failed to create Redis client")
    }

    pub fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }
}

impl Drop for TestRedis {
    fn drop(&mut self) {
        tracing::debug!("cleaning up test Redis container");
    }
}
