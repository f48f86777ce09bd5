//! Trade Error Taxonomy
//!
//! Every failure the swap path can produce, classified so callers know
//! whether to retry, wait on the server, or give up immediately.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradeError {
    /// Missing or unusable settings (fixed_buy <= 0, no root wallet, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeouts, connection failures and other transport-level faults
    #[error("Network error: {0}")]
    Transient(String),

    /// 429 from the aggregator, optionally with a server-provided delay
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-success status other than 429
    #[error("Aggregator returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Malformed body, missing route plan, bad address or key
    #[error("Validation error: {0}")]
    Validation(String),

    /// Amount below the dust floor
    #[error("Amount too small: {lamports} lamports (minimum {minimum})")]
    AmountTooSmall { lamports: u64, minimum: u64 },

    /// Ledger rejected or failed to accept the transaction
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Retry budget spent
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl TradeError {
    /// Check if the error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, TradeError::Transient(_) | TradeError::RateLimited { .. })
    }

    /// Check if the error came from a 429 response
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, TradeError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for TradeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TradeError::Validation(err.to_string())
        } else {
            TradeError::Transient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TradeError {
    fn from(err: serde_json::Error) -> Self {
        TradeError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(TradeError::Transient("reset".into()).is_retryable());
        assert!(TradeError::RateLimited { retry_after: None }.is_retryable());

        assert!(!TradeError::Validation("no route".into()).is_retryable());
        assert!(!TradeError::Rejected { status: 400, body: String::new() }.is_retryable());
        assert!(!TradeError::Configuration("fixed_buy".into()).is_retryable());
    }

    #[test]
    fn test_rate_limit_detection() {
        let err = TradeError::RateLimited {
            retry_after: Some(Duration::from_secs(3)),
        };
        assert!(err.is_rate_limit());
        assert!(!TradeError::Transient("x".into()).is_rate_limit());
    }

    #[test]
    fn test_error_display() {
        let err = TradeError::AmountTooSmall {
            lamports: 99_999,
            minimum: 100_000,
        };
        assert!(err.to_string().contains("99999"));

        let err = TradeError::RetriesExhausted {
            attempts: 5,
            last_error: "timeout".into(),
        };
        assert!(err.to_string().contains("5 attempts"));
    }

    #[test]
    fn test_json_errors_are_validation() {
        let err: TradeError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, TradeError::Validation(_)));
    }
}
