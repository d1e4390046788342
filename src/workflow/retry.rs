//! Bounded retry policy for citation lookups
//!
//! The lookup loop runs at most `max_attempts` searches per record with a
//! fixed delay between attempts, and classifies each failed attempt into
//! the terminal reason it becomes once the budget runs out. Keeping the
//! classification pure lets the policy be tested without network waits.

use crate::services::semantic_scholar::SourceError;
use std::fmt;
use std::time::Duration;

/// Why a record's lookup ultimately failed. Attached to the record in
/// the run summary; never aborts the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupFailure {
    /// Rate-limited on every attempt
    MaxRetriesExceeded,
    /// The service returned no candidates on any attempt
    EmptyResults,
    /// Transport or API failure on every attempt
    RequestError,
    /// Candidates came back, but none matched the search key exactly
    TitleMismatch,
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LookupFailure::MaxRetriesExceeded => write!(f, "max retries exceeded"),
            LookupFailure::EmptyResults => write!(f, "empty results"),
            LookupFailure::RequestError => write!(f, "request error"),
            LookupFailure::TitleMismatch => write!(f, "title not exactly matched"),
        }
    }
}

/// A single attempt's failure, as seen by the retry loop. All three kinds
/// are retried; only the eventual terminal reason differs.
#[derive(Debug)]
pub enum AttemptError {
    RateLimited,
    EmptyResults,
    Transport(SourceError),
}

impl AttemptError {
    /// Terminal failure reported when the retry budget is exhausted on
    /// this kind of error.
    pub fn into_failure(self) -> LookupFailure {
        match self {
            AttemptError::RateLimited => LookupFailure::MaxRetriesExceeded,
            AttemptError::EmptyResults => LookupFailure::EmptyResults,
            AttemptError::Transport(_) => LookupFailure::RequestError,
        }
    }
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AttemptError::RateLimited => write!(f, "rate limited"),
            AttemptError::EmptyResults => write!(f, "empty result set"),
            AttemptError::Transport(e) => write!(f, "{e}"),
        }
    }
}

/// Fixed-budget, fixed-delay retry policy
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay between attempts, shared with inter-record pacing
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a failed 1-based `attempt` leaves budget for another
    pub fn retries_left(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_accessors() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_retries_left_boundary() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        assert!(policy.retries_left(1));
        assert!(policy.retries_left(2));
        assert!(!policy.retries_left(3));
    }

    #[test]
    fn test_single_attempt_policy_never_retries() {
        let policy = RetryPolicy::new(1, Duration::from_millis(1));
        assert!(!policy.retries_left(1));
    }

    #[test]
    fn test_attempt_error_terminal_reasons() {
        assert_eq!(
            AttemptError::RateLimited.into_failure(),
            LookupFailure::MaxRetriesExceeded
        );
        assert_eq!(
            AttemptError::EmptyResults.into_failure(),
            LookupFailure::EmptyResults
        );
        assert_eq!(
            AttemptError::Transport(SourceError::ApiError(500, "boom".to_string())).into_failure(),
            LookupFailure::RequestError
        );
    }

    #[test]
    fn test_failure_reason_strings() {
        assert_eq!(
            LookupFailure::MaxRetriesExceeded.to_string(),
            "max retries exceeded"
        );
        assert_eq!(LookupFailure::EmptyResults.to_string(), "empty results");
        assert_eq!(LookupFailure::RequestError.to_string(), "request error");
        assert_eq!(
            LookupFailure::TitleMismatch.to_string(),
            "title not exactly matched"
        );
    }
}
