use crate::kind::AggregateKind;

/// A request in flight: identifies the caller, the correlation token used
/// to address the pub/sub reply, and the aggregate being requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub principal: String,
    pub correlation_id: String,
    pub kind: AggregateKind,
}

/// Why a queue entry couldn't be turned into a `Request`.
///
/// Malformed entries are dropped with a log line (§3, §4.2) rather than
/// propagated — there is no caller left to report the error to.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestParseError {
    #[error("queue entry has fewer than 3 ':'-delimited fields: {0:?}")]
    TooFewFields(String),
    #[error("principal field is empty in {0:?}")]
    EmptyPrincipal(String),
    #[error("correlation id field is empty in {0:?}")]
    EmptyCorrelationId(String),
    #[error("unknown or empty aggregate kind in {0:?}")]
    InvalidKind(String),
}

impl Request {
    pub fn new(principal: impl Into<String>, correlation_id: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            principal: principal.into(),
            correlation_id: correlation_id.into(),
            kind,
        }
    }

    /// The topic a worker publishes this request's outcome to.
    pub fn topic(&self) -> String {
        format!("{}:{}", self.principal, self.correlation_id)
    }

    /// Encode as `<principal>:<correlationId>:<kind>` for the shared queue.
    ///
    /// The kind itself contains one `:` (e.g. `products:bought`), so the
    /// inverse, `parse`, must split on the first two `:`s only and rejoin
    /// the remainder.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.principal, self.correlation_id, self.kind)
    }

    /// Parse a raw queue entry. See `encode` for the wire format.
    pub fn parse(raw: &str) -> Result<Self, RequestParseError> {
        let mut parts = raw.splitn(3, ':');
        let principal = parts.next().unwrap_or("");
        let correlation_id = parts.next().ok_or_else(|| RequestParseError::TooFewFields(raw.to_string()))?;
        let kind_str = parts.next().ok_or_else(|| RequestParseError::TooFewFields(raw.to_string()))?;

        if principal.is_empty() {
            return Err(RequestParseError::EmptyPrincipal(raw.to_string()));
        }
        if correlation_id.is_empty() {
            return Err(RequestParseError::EmptyCorrelationId(raw.to_string()));
        }
        let kind: AggregateKind = kind_str
            .parse()
            .map_err(|_| RequestParseError::InvalidKind(raw.to_string()))?;

        Ok(Self {
            principal: principal.to_string(),
            correlation_id: correlation_id.to_string(),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_parse_round_trips() {
        let request = Request::new("alice", "abcd1234abcd1234", AggregateKind::ProductsBought);
        let encoded = request.encode();
        assert_eq!(encoded, "alice:abcd1234abcd1234:products:bought");
        assert_eq!(Request::parse(&encoded).unwrap(), request);
    }

    #[test]
    fn parse_rejects_malformed_entry_with_no_colons() {
        assert_eq!(
            Request::parse("foo"),
            Err(RequestParseError::TooFewFields("foo".to_string()))
        );
    }

    #[test]
    fn parse_rejects_empty_principal() {
        let raw = ":abcd1234:products:bought";
        assert!(matches!(Request::parse(raw), Err(RequestParseError::EmptyPrincipal(_))));
    }

    #[test]
    fn parse_rejects_empty_correlation_id() {
        let raw = "alice::products:bought";
        assert!(matches!(Request::parse(raw), Err(RequestParseError::EmptyCorrelationId(_))));
    }

    #[test]
    fn parse_rejects_unknown_kind() {
        let raw = "alice:abcd1234:unknown:kind";
        assert!(matches!(Request::parse(raw), Err(RequestParseError::InvalidKind(_))));
    }

    #[test]
    fn topic_joins_principal_and_correlation_id() {
        let request = Request::new("alice", "xyz", AggregateKind::ItemsBought);
        assert_eq!(request.topic(), "alice:xyz");
    }
}
