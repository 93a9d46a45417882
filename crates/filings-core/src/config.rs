//! Pipeline configuration.
//!
//! All recognized options enter as explicit construction parameters; nothing
//! is read from ambient process state.

use std::path::PathBuf;
use std::time::Duration;

use crate::period::PeriodType;

/// Default cache time-to-live: one hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Default extra wait added past a rate-limit reset instant.
pub const DEFAULT_COOLDOWN_BUFFER: Duration = Duration::from_secs(1);

/// Credentials for an external warehouse sink.
///
/// Opaque to the pipeline; handed to whichever sink implementation is
/// injected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkCredentials {
    /// Account or host identifier.
    pub account: String,
    /// User name.
    pub user: String,
    /// Password, token or key.
    pub secret: String,
}

/// Configuration for a [`FilingsPipeline`](https://docs.rs/filings) run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Root directory for persisted artifacts.
    pub storage_root: PathBuf,
    /// Identifying User-Agent sent with every API request.
    pub user_agent: String,
    /// How long cached API responses stay valid.
    pub cache_ttl: Duration,
    /// Extra wait added past a rate-limit reset instant.
    pub cooldown_buffer: Duration,
    /// Period basis the normalizer runs with.
    pub period_type: PeriodType,
    /// Optional credentials for an external sink.
    pub sink_credentials: Option<SinkCredentials>,
}

impl PipelineConfig {
    /// Creates a configuration with defaults for everything but the storage
    /// root and user agent.
    #[must_use]
    pub fn new(storage_root: impl Into<PathBuf>, user_agent: impl Into<String>) -> Self {
        Self {
            storage_root: storage_root.into(),
            user_agent: user_agent.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cooldown_buffer: DEFAULT_COOLDOWN_BUFFER,
            period_type: PeriodType::default(),
            sink_credentials: None,
        }
    }

    /// Sets the cache time-to-live.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the rate-limit cooldown buffer.
    #[must_use]
    pub const fn with_cooldown_buffer(mut self, buffer: Duration) -> Self {
        self.cooldown_buffer = buffer;
        self
    }

    /// Sets the period basis.
    #[must_use]
    pub const fn with_period_type(mut self, period_type: PeriodType) -> Self {
        self.period_type = period_type;
        self
    }

    /// Sets external sink credentials.
    #[must_use]
    pub fn with_sink_credentials(mut self, credentials: SinkCredentials) -> Self {
        self.sink_credentials = Some(credentials);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_contract() {
        let config = PipelineConfig::new("/tmp/data", "Test/1.0 (test@example.com)");
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.cooldown_buffer, Duration::from_secs(1));
        assert_eq!(config.period_type, PeriodType::Annual);
        assert!(config.sink_credentials.is_none());
    }

    #[test]
    fn builders_override_defaults() {
        let config = PipelineConfig::new("/tmp/data", "Test/1.0")
            .with_cache_ttl(Duration::from_secs(60))
            .with_period_type(PeriodType::Quarterly);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.period_type, PeriodType::Quarterly);
    }
}
