//! Cached, rate-limit-aware client for the EDGAR API.
//!
//! One [`EdgarClient`] may serve many concurrent entity pipelines; its cache
//! and rate-limit memory are the only cross-entity shared state and are lock
//! protected. Every failure is logged here before being returned.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use filings_core::{
    Cik, DEFAULT_CACHE_TTL, DEFAULT_COOLDOWN_BUFFER, FactTable, FetchCause, PipelineError, Result,
};

use crate::cache::ResponseCache;
use crate::endpoints::{EndpointRegistry, EndpointReport, ResponseKind};
use crate::models::{self, ParsedResponse, SubmissionHistory, TickerRecord};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Most recently observed rate-limit headers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RateLimitState {
    remaining: u32,
    reset: DateTime<Utc>,
}

impl RateLimitState {
    /// How long to sleep before the next request, if the remembered call
    /// budget is exhausted and the reset instant has not passed.
    fn cooldown(&self, now: DateTime<Utc>, buffer: Duration) -> Option<Duration> {
        if self.remaining != 0 {
            return None;
        }
        let until_reset = self.reset - now;
        if until_reset <= TimeDelta::zero() {
            return None;
        }
        until_reset.to_std().ok().map(|wait| wait + buffer)
    }

    fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = headers
            .get(REMAINING_HEADER)?
            .to_str()
            .ok()?
            .parse::<u32>()
            .ok()?;
        let reset = headers
            .get(RESET_HEADER)?
            .to_str()
            .ok()?
            .parse::<i64>()
            .ok()?;
        let reset = DateTime::from_timestamp(reset, 0)?;
        Some(Self { remaining, reset })
    }
}

/// Client for the EDGAR API with response caching and advisory rate-limit
/// backoff.
///
/// # Example
/// ```no_run
/// use filings_edgar::EdgarClient;
/// use filings_core::Cik;
///
/// # async fn example() -> filings_core::Result<()> {
/// let client = EdgarClient::new("MyApp/1.0 (contact@example.com)");
/// let cik = Cik::new("12927")?;
/// let table = client.fetch_company_facts(&cik).await?;
/// println!("{} facts for {}", table.len(), table.entity_name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EdgarClient {
    client: reqwest::Client,
    endpoints: EndpointRegistry,
    cache: ResponseCache,
    rate_limit: Mutex<Option<RateLimitState>>,
    cooldown_buffer: Duration,
}

impl EdgarClient {
    /// Creates a client with the default cache TTL (1 hour) and cooldown
    /// buffer (1 second).
    ///
    /// The API requires an identifying user agent of the form
    /// `"AppName/Version (contact@email.com)"`.
    #[must_use]
    pub fn new(user_agent: &str) -> Self {
        Self::with_options(user_agent, DEFAULT_CACHE_TTL, DEFAULT_COOLDOWN_BUFFER)
    }

    /// Creates a client with explicit cache and cooldown settings.
    #[must_use]
    pub fn with_options(user_agent: &str, cache_ttl: Duration, cooldown_buffer: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            endpoints: EndpointRegistry::new(),
            cache: ResponseCache::new(cache_ttl),
            rate_limit: Mutex::new(None),
            cooldown_buffer,
        }
    }

    /// Replaces the endpoint registry, e.g. to point at a mirror.
    #[must_use]
    pub fn with_registry(mut self, endpoints: EndpointRegistry) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// The endpoint registry in use.
    #[must_use]
    pub const fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    /// Probes the three endpoints for an entity and reports per-endpoint
    /// health without erroring.
    pub async fn preflight(&self, cik: &Cik) -> EndpointReport {
        self.endpoints.preflight(&self.client, cik).await
    }

    /// Fetches the global company-tickers listing.
    pub async fn fetch_company_tickers(&self) -> Result<Vec<TickerRecord>> {
        match self.fetch_parsed(ResponseKind::Tickers, None).await? {
            ParsedResponse::Tickers(records) => Ok(records),
            other => Err(unexpected_kind(ResponseKind::Tickers, &other)),
        }
    }

    /// Fetches an entity's submission history.
    pub async fn fetch_submissions(&self, cik: &Cik) -> Result<SubmissionHistory> {
        match self
            .fetch_parsed(ResponseKind::Submissions, Some(cik))
            .await?
        {
            ParsedResponse::Submissions(history) => Ok(history),
            other => Err(unexpected_kind(ResponseKind::Submissions, &other)),
        }
    }

    /// Fetches and flattens an entity's company facts.
    pub async fn fetch_company_facts(&self, cik: &Cik) -> Result<FactTable> {
        match self
            .fetch_parsed(ResponseKind::CompanyFacts, Some(cik))
            .await?
        {
            ParsedResponse::CompanyFacts(table) => Ok(table),
            other => Err(unexpected_kind(ResponseKind::CompanyFacts, &other)),
        }
    }

    /// Resolves a ticker symbol to its CIK via the cached ticker listing.
    pub async fn lookup_cik(&self, ticker: &str) -> Result<Cik> {
        if ticker.is_empty() {
            return Err(PipelineError::Configuration("empty ticker".to_string()));
        }
        let upper = ticker.to_uppercase();
        let records = self.fetch_company_tickers().await?;
        records
            .iter()
            .find(|record| record.ticker.to_uppercase() == upper)
            .map(|record| record.cik.clone())
            .ok_or_else(|| {
                warn!(ticker, "ticker not present in company listing");
                PipelineError::NotFound(format!("ticker {ticker}"))
            })
    }

    /// Evicts expired cache entries, returning how many were removed.
    pub async fn sweep_cache(&self) -> usize {
        self.cache.sweep().await
    }

    /// Drops every cached response.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    async fn fetch_parsed(
        &self,
        kind: ResponseKind,
        cik: Option<&Cik>,
    ) -> Result<ParsedResponse> {
        let key = kind.cache_key(cik);
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let url = self.endpoints.url(kind, cik)?;
        let payload = self.send_get(&url, kind, cik).await?;
        let parsed = self.parse_response(kind, payload).inspect_err(|err| {
            error!(kind = %kind, cik = ?cik, error = %err, "failed to parse response");
        })?;
        self.cache.put(key, parsed.clone()).await;
        Ok(parsed)
    }

    fn parse_response(
        &self,
        kind: ResponseKind,
        payload: serde_json::Value,
    ) -> Result<ParsedResponse> {
        match kind {
            ResponseKind::Tickers => models::tickers_from(payload).map(ParsedResponse::Tickers),
            ResponseKind::Submissions => {
                models::submissions_from(payload).map(ParsedResponse::Submissions)
            }
            ResponseKind::CompanyFacts => {
                models::company_facts_from(payload, Utc::now()).map(ParsedResponse::CompanyFacts)
            }
        }
    }

    async fn send_get(
        &self,
        url: &str,
        kind: ResponseKind,
        cik: Option<&Cik>,
    ) -> Result<serde_json::Value> {
        self.wait_for_cooldown().await;

        debug!(kind = %kind, url, "sending GET request");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                let cause = if err.is_timeout() {
                    FetchCause::Timeout
                } else {
                    FetchCause::Network
                };
                let err = PipelineError::fetch(cause, err.to_string());
                error!(kind = %kind, cik = ?cik, error = %err, "request failed");
                return Err(err);
            }
        };

        // Header state is remembered for every response, success or not.
        self.remember_rate_limit(response.headers()).await;

        let status = response.status();
        if !status.is_success() {
            let err = PipelineError::fetch(
                FetchCause::Http(status.as_u16()),
                format!("GET {url} returned {status}"),
            );
            error!(kind = %kind, cik = ?cik, error = %err, "request rejected");
            return Err(err);
        }

        match response.json::<serde_json::Value>().await {
            Ok(payload) => Ok(payload),
            Err(err) => {
                let err = PipelineError::fetch(FetchCause::Decode, err.to_string());
                error!(kind = %kind, cik = ?cik, error = %err, "response body was not JSON");
                Err(err)
            }
        }
    }

    async fn wait_for_cooldown(&self) {
        let wait = {
            let state = self.rate_limit.lock().await;
            state.and_then(|limit| limit.cooldown(Utc::now(), self.cooldown_buffer))
        };
        if let Some(wait) = wait {
            debug!(
                seconds = wait.as_secs_f64(),
                "rate limit exhausted, cooling down"
            );
            sleep(wait).await;
        }
    }

    async fn remember_rate_limit(&self, headers: &HeaderMap) {
        if let Some(state) = RateLimitState::from_headers(headers) {
            debug!(remaining = state.remaining, reset = %state.reset, "observed rate-limit headers");
            *self.rate_limit.lock().await = Some(state);
        }
    }
}

fn unexpected_kind(expected: ResponseKind, got: &ParsedResponse) -> PipelineError {
    let got = match got {
        ParsedResponse::Tickers(_) => ResponseKind::Tickers,
        ParsedResponse::Submissions(_) => ResponseKind::Submissions,
        ParsedResponse::CompanyFacts(_) => ResponseKind::CompanyFacts,
    };
    let err = PipelineError::parse(
        expected.as_str(),
        format!("cache returned a {got} payload"),
    );
    error!(expected = %expected, got = %got, "response kind mismatch");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn exhausted_limit_waits_past_reset_plus_buffer() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: 0,
            reset: now + TimeDelta::seconds(5),
        };

        let wait = state.cooldown(now, Duration::from_secs(1)).unwrap();
        assert!(wait >= Duration::from_secs(5) + Duration::from_secs(1));
        assert!(wait <= Duration::from_secs(7));
    }

    #[test]
    fn remaining_budget_means_no_wait() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: 3,
            reset: now + TimeDelta::seconds(5),
        };
        assert!(state.cooldown(now, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn elapsed_reset_means_no_wait() {
        let now = Utc::now();
        let state = RateLimitState {
            remaining: 0,
            reset: now - TimeDelta::seconds(5),
        };
        assert!(state.cooldown(now, Duration::from_secs(1)).is_none());
    }

    #[test]
    fn rate_limit_headers_parse() {
        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("0"));
        headers.insert(RESET_HEADER, HeaderValue::from_static("1700000000"));

        let state = RateLimitState::from_headers(&headers).unwrap();
        assert_eq!(state.remaining, 0);
        assert_eq!(state.reset, DateTime::from_timestamp(1_700_000_000, 0).unwrap());
    }

    #[test]
    fn missing_headers_leave_state_unset() {
        let headers = HeaderMap::new();
        assert!(RateLimitState::from_headers(&headers).is_none());

        let mut headers = HeaderMap::new();
        headers.insert(REMAINING_HEADER, HeaderValue::from_static("10"));
        assert!(RateLimitState::from_headers(&headers).is_none());
    }
}
