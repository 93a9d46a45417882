//! Error types for the filings pipeline.
//!
//! This module defines [`PipelineError`], the single error taxonomy shared by
//! every stage of the pipeline. Only [`PipelineError::Configuration`] is
//! fatal to a run; everything else is scoped to the operation that produced
//! it.

use thiserror::Error;

/// Underlying cause of a failed fetch.
///
/// Network failures, timeouts, non-2xx statuses and body-decode failures are
/// all surfaced as [`PipelineError::Fetch`], distinguishable through this
/// cause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchCause {
    /// Connection-level failure (DNS, refused, reset).
    Network,
    /// The request exceeded the client's deadline.
    Timeout,
    /// The server answered with a non-success HTTP status.
    Http(u16),
    /// The response body was not valid JSON.
    Decode,
}

impl std::fmt::Display for FetchCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Timeout => write!(f, "timeout"),
            Self::Http(status) => write!(f, "http {status}"),
            Self::Decode => write!(f, "decode"),
        }
    }
}

/// Errors that can occur in the filings pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid template, identifier or other required input. Fatal to the
    /// operation; never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A request to the filings API failed.
    #[error("Fetch error ({cause}): {message}")]
    Fetch {
        /// What went wrong on the wire.
        cause: FetchCause,
        /// Human-readable context.
        message: String,
    },

    /// A payload decoded fine but did not have the expected shape.
    #[error("Parse error in {kind} payload: {message}")]
    Parse {
        /// The response kind (or dataset) that failed to parse.
        kind: String,
        /// Human-readable context.
        message: String,
    },

    /// Filesystem read/write failure while persisting or resolving artifacts.
    #[error("Storage error: {0}")]
    Storage(String),

    /// An expected artifact, category or entity is absent. A normal outcome
    /// on first runs.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl PipelineError {
    /// Shorthand for a [`PipelineError::Fetch`].
    pub fn fetch(cause: FetchCause, message: impl Into<String>) -> Self {
        Self::Fetch {
            cause,
            message: message.into(),
        }
    }

    /// Shorthand for a [`PipelineError::Parse`].
    pub fn parse(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error should abort the whole run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for the expected-absence case.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<polars::error::PolarsError> for PipelineError {
    fn from(err: polars::error::PolarsError) -> Self {
        Self::parse("dataframe", err.to_string())
    }
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_configuration_is_fatal() {
        assert!(PipelineError::Configuration("bad template".into()).is_fatal());
        assert!(!PipelineError::fetch(FetchCause::Timeout, "deadline").is_fatal());
        assert!(!PipelineError::NotFound("no artifacts".into()).is_fatal());
        assert!(!PipelineError::Storage("disk full".into()).is_fatal());
    }

    #[test]
    fn fetch_cause_is_distinguishable_in_display() {
        let err = PipelineError::fetch(FetchCause::Http(503), "service unavailable");
        assert!(err.to_string().contains("http 503"));

        let err = PipelineError::fetch(FetchCause::Decode, "not json");
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn not_found_is_recognizable() {
        assert!(PipelineError::NotFound("Liquidity".into()).is_not_found());
        assert!(!PipelineError::Storage("boom".into()).is_not_found());
    }
}
