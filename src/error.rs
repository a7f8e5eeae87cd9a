//! Error taxonomy for the interaction engine.
//!
//! Transport failures come from the completion service and are never retried.
//! Invalid responses are content failures that exhausted the retry budget.
//! A skipped feedback prompt is not an error at all.

use thiserror::Error;

/// Failure reaching the completion service.
///
/// Distinct from a response that arrived but was unusable: a
/// [`TransportError`] means no response was obtained.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Network or provider failure.
    #[error("network error: {0}")]
    Network(String),
    /// Rate limit or quota exhaustion reported by the provider.
    #[error("quota exceeded: {0}")]
    Quota(String),
    /// The request did not complete within the configured time.
    #[error("request timed out after {0}s")]
    Timeout(u64),
}

impl TransportError {
    /// Classifies a provider error message as quota exhaustion or a generic
    /// network failure.
    pub fn from_provider_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        let status_429 = lower
            .split(|c: char| !c.is_ascii_digit())
            .any(|digits| digits == "429");
        if status_429
            || lower.contains("quota")
            || lower.contains("rate limit")
            || lower.contains("rate_limit")
            || lower.contains("insufficient_quota")
        {
            Self::Quota(message)
        } else {
            Self::Network(message)
        }
    }
}

/// Reported outcome of a turn that ended without a usable answer.
///
/// Every variant carries the query that triggered it so the human can
/// re-submit it.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The completion service failed; nothing was logged for this turn.
    #[error("request failed for \"{query}\": {source}")]
    Transport {
        query: String,
        #[source]
        source: TransportError,
    },
    /// Every attempt came back invalid; the last attempt is in the history.
    #[error("no usable response for \"{query}\" after {attempts} attempts")]
    InvalidResponse {
        query: String,
        attempts: u32,
        last_response: String,
    },
}

impl TurnError {
    /// The query that produced this error.
    pub fn query(&self) -> &str {
        match self {
            Self::Transport { query, .. } | Self::InvalidResponse { query, .. } => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_messages_are_classified() {
        assert!(matches!(
            TransportError::from_provider_message("HTTP 429 Too Many Requests"),
            TransportError::Quota(_)
        ));
        assert!(matches!(
            TransportError::from_provider_message("You exceeded your current quota"),
            TransportError::Quota(_)
        ));
        assert!(matches!(
            TransportError::from_provider_message("connection reset by peer"),
            TransportError::Network(_)
        ));
    }

    #[test]
    fn test_429_only_matches_a_whole_number() {
        assert!(matches!(
            TransportError::from_provider_message("status: 429, body: slow down"),
            TransportError::Quota(_)
        ));
        assert!(matches!(
            TransportError::from_provider_message("request 84290 failed: connection reset"),
            TransportError::Network(_)
        ));
        assert!(matches!(
            TransportError::from_provider_message("upstream 4291 error"),
            TransportError::Network(_)
        ));
    }

    #[test]
    fn test_turn_error_keeps_query() {
        let err = TurnError::Transport {
            query: "reverse a string".to_string(),
            source: TransportError::Timeout(30),
        };
        assert_eq!(err.query(), "reverse a string");
        assert!(err.to_string().contains("reverse a string"));
        assert!(err.to_string().contains("timed out after 30s"));

        let err = TurnError::InvalidResponse {
            query: "sort a list".to_string(),
            attempts: 3,
            last_response: String::new(),
        };
        assert_eq!(err.query(), "sort a list");
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
