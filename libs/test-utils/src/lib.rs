//! Shared test infrastructure for the dispatch core and its collaborators.
//!
//! - `TestRedis`: Redis container with automatic cleanup (feature: "redis")
//! - `TestDatabase`: Postgres container with automatic cleanup (feature: "postgres")
//! - `TestDataBuilder`: deterministic test data generation, always available

use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;
#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Deterministic test data, seeded from the test name so runs are reproducible.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    pub fn id(&self) -> Uuid {
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&bytes);
        Uuid::from_bytes(uuid_bytes)
    }

    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_instances_with_same_seed() {
        let a = TestDataBuilder::new(42);
        let b = TestDataBuilder::new(42);
        assert_eq!(a.id(), b.id());
        assert_eq!(a.name("principal", "alice"), b.name("principal", "alice"));
    }

    #[test]
    fn different_test_names_diverge() {
        let a = TestDataBuilder::from_test_name("test_a");
        let b = TestDataBuilder::from_test_name("test_b");
        assert_ne!(a.id(), b.id());
    }
}
