use std::fmt;
use std::str::FromStr;

/// The closed set of supported materialized aggregates.
///
/// Each kind maps 1:1 to a cache key, a producer procedure, and a response
/// shape. Adding a new kind means touching all three — `as_str`,
/// `FromStr`, the `AggregateProducer` implementation, and the HTTP handler
/// that shapes its response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggregateKind {
    ProductsBought,
    ItemsBought,
}

impl AggregateKind {
    /// The wire/cache-key form, e.g. `products:bought`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductsBought => "products:bought",
            Self::ItemsBought => "items:bought",
        }
    }

    /// The redis hash key this kind's cache entry lives under. Identical to
    /// `as_str` today, kept distinct because the cache key and the wire
    /// form are conceptually different contracts (§3, §6).
    pub fn cache_key(&self) -> &'static str {
        self.as_str()
    }

    pub fn all() -> [AggregateKind; 2] {
        [Self::ProductsBought, Self::ItemsBought]
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AggregateKind {
    type Err = UnknownAggregateKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "products:bought" => Ok(Self::ProductsBought),
            "items:bought" => Ok(Self::ItemsBought),
            other => Err(UnknownAggregateKind(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown aggregate kind: {0}")]
pub struct UnknownAggregateKind(pub String);
