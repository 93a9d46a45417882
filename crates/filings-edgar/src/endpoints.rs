//! Endpoint registry for the EDGAR API.
//!
//! Resolves the three API URLs (ticker list, submissions, company facts)
//! from templates, and probes their health without erroring. The registry is
//! a pure function of its templates; it holds no other state.

use std::fmt;

use filings_core::{Cik, PipelineError, Result};

/// Company tickers listing (global, not entity-scoped).
pub const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Submission history template, `{cik}` substituted per entity.
pub const SUBMISSIONS_TEMPLATE: &str = "https://data.sec.gov/submissions/CIK{cik}.json";

/// Company facts template, `{cik}` substituted per entity.
pub const COMPANY_FACTS_TEMPLATE: &str =
    "https://data.sec.gov/api/xbrl/companyfacts/CIK{cik}.json";

const CIK_PLACEHOLDER: &str = "{cik}";

/// The three response kinds the client can retrieve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    /// The global ticker-to-CIK listing.
    Tickers,
    /// An entity's submission history.
    Submissions,
    /// An entity's company facts.
    CompanyFacts,
}

impl ResponseKind {
    /// All kinds, in preflight order.
    pub const ALL: [Self; 3] = [Self::Tickers, Self::Submissions, Self::CompanyFacts];

    /// Canonical kind label, also the cache-key prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tickers => "company_tickers",
            Self::Submissions => "submissions",
            Self::CompanyFacts => "company_facts",
        }
    }

    /// Returns true if the kind's URL needs a CIK substituted.
    #[must_use]
    pub const fn is_entity_scoped(&self) -> bool {
        !matches!(self, Self::Tickers)
    }

    /// Cache key for this kind: `{kind}_{cik}`, with the CIK omitted for
    /// the global tickers listing.
    #[must_use]
    pub fn cache_key(&self, cik: Option<&Cik>) -> String {
        match (self.is_entity_scoped(), cik) {
            (true, Some(cik)) => format!("{}_{}", self.as_str(), cik),
            _ => self.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Health verdict for one resolved endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EndpointHealth {
    /// The endpoint answered with a success status.
    Ok,
    /// The endpoint answered with a non-success status code.
    HttpFailure(u16),
    /// The endpoint could not be reached.
    NetworkError(String),
}

impl EndpointHealth {
    /// Returns true for the healthy verdict.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for EndpointHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::HttpFailure(code) => write!(f, "Failed (Status Code: {code})"),
            Self::NetworkError(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Per-endpoint health verdicts from a preflight probe.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointReport {
    /// Verdict for the ticker listing.
    pub tickers: EndpointHealth,
    /// Verdict for the submissions endpoint.
    pub submissions: EndpointHealth,
    /// Verdict for the company-facts endpoint.
    pub company_facts: EndpointHealth,
}

impl EndpointReport {
    /// Returns true when every endpoint answered healthy.
    #[must_use]
    pub const fn all_ok(&self) -> bool {
        self.tickers.is_ok() && self.submissions.is_ok() && self.company_facts.is_ok()
    }
}

/// The three API URLs resolved for one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedEndpoints {
    /// Ticker listing URL.
    pub tickers: String,
    /// Submissions URL with the CIK substituted.
    pub submissions: String,
    /// Company-facts URL with the CIK substituted.
    pub company_facts: String,
}

/// Resolves entity-scoped and global API URLs from templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointRegistry {
    tickers: String,
    submissions: String,
    company_facts: String,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self {
            tickers: COMPANY_TICKERS_URL.to_string(),
            submissions: SUBMISSIONS_TEMPLATE.to_string(),
            company_facts: COMPANY_FACTS_TEMPLATE.to_string(),
        }
    }
}

impl EndpointRegistry {
    /// Creates a registry with the standard EDGAR templates.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with custom templates.
    ///
    /// # Errors
    /// Returns [`PipelineError::Configuration`] if an entity-scoped template
    /// is missing the `{cik}` placeholder.
    pub fn with_templates(
        tickers: impl Into<String>,
        submissions: impl Into<String>,
        company_facts: impl Into<String>,
    ) -> Result<Self> {
        let submissions = submissions.into();
        let company_facts = company_facts.into();
        for (kind, template) in [
            (ResponseKind::Submissions, &submissions),
            (ResponseKind::CompanyFacts, &company_facts),
        ] {
            if !template.contains(CIK_PLACEHOLDER) {
                return Err(PipelineError::Configuration(format!(
                    "{kind} template {template:?} is missing the {CIK_PLACEHOLDER} placeholder"
                )));
            }
        }
        Ok(Self {
            tickers: tickers.into(),
            submissions,
            company_facts,
        })
    }

    /// Resolves the URL for one response kind.
    ///
    /// # Errors
    /// Returns [`PipelineError::Configuration`] when an entity-scoped kind
    /// is requested without a CIK.
    pub fn url(&self, kind: ResponseKind, cik: Option<&Cik>) -> Result<String> {
        match kind {
            ResponseKind::Tickers => Ok(self.tickers.clone()),
            ResponseKind::Submissions | ResponseKind::CompanyFacts => {
                let cik = cik.ok_or_else(|| {
                    PipelineError::Configuration(format!("{kind} endpoint requires a CIK"))
                })?;
                let template = match kind {
                    ResponseKind::Submissions => &self.submissions,
                    _ => &self.company_facts,
                };
                Ok(template.replace(CIK_PLACEHOLDER, cik.as_str()))
            }
        }
    }

    /// Resolves all three URLs for one entity.
    #[must_use]
    pub fn resolve(&self, cik: &Cik) -> ResolvedEndpoints {
        ResolvedEndpoints {
            tickers: self.tickers.clone(),
            submissions: self.submissions.replace(CIK_PLACEHOLDER, cik.as_str()),
            company_facts: self.company_facts.replace(CIK_PLACEHOLDER, cik.as_str()),
        }
    }

    /// Probes each resolved endpoint with a GET request and reports a
    /// per-endpoint verdict. Never errors; callers decide whether to
    /// proceed.
    pub async fn preflight(&self, client: &reqwest::Client, cik: &Cik) -> EndpointReport {
        let resolved = self.resolve(cik);
        EndpointReport {
            tickers: probe(client, &resolved.tickers).await,
            submissions: probe(client, &resolved.submissions).await,
            company_facts: probe(client, &resolved.company_facts).await,
        }
    }
}

async fn probe(client: &reqwest::Client, url: &str) -> EndpointHealth {
    match client.get(url).send().await {
        Ok(response) if response.status().is_success() => EndpointHealth::Ok,
        Ok(response) => EndpointHealth::HttpFailure(response.status().as_u16()),
        Err(err) => EndpointHealth::NetworkError(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cik() -> Cik {
        Cik::new("12927").unwrap()
    }

    #[test]
    fn resolves_standard_urls() {
        let registry = EndpointRegistry::new();
        let resolved = registry.resolve(&cik());
        assert_eq!(resolved.tickers, COMPANY_TICKERS_URL);
        assert_eq!(
            resolved.submissions,
            "https://data.sec.gov/submissions/CIK0000012927.json"
        );
        assert_eq!(
            resolved.company_facts,
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000012927.json"
        );
    }

    #[test]
    fn rejects_templates_without_placeholder() {
        let result = EndpointRegistry::with_templates(
            COMPANY_TICKERS_URL,
            "https://example.com/submissions.json",
            COMPANY_FACTS_TEMPLATE,
        );
        assert!(matches!(result, Err(PipelineError::Configuration(_))));
    }

    #[test]
    fn entity_scoped_url_requires_cik() {
        let registry = EndpointRegistry::new();
        assert!(registry.url(ResponseKind::CompanyFacts, None).is_err());
        assert!(registry.url(ResponseKind::Tickers, None).is_ok());
    }

    #[test]
    fn cache_keys_follow_the_kind_scheme() {
        let cik = cik();
        assert_eq!(
            ResponseKind::Tickers.cache_key(Some(&cik)),
            "company_tickers"
        );
        assert_eq!(
            ResponseKind::Submissions.cache_key(Some(&cik)),
            "submissions_0000012927"
        );
        assert_eq!(
            ResponseKind::CompanyFacts.cache_key(Some(&cik)),
            "company_facts_0000012927"
        );
    }
}
