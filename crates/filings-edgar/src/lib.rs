#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR endpoint registry and fact-fetch client.
//!
//! This crate covers the network-facing front of the pipeline:
//!
//! - [`EndpointRegistry`] - resolves the three API URLs from templates and
//!   probes their health
//! - [`EdgarClient`] - cached, rate-limit-aware retrieval of the ticker
//!   listing, submission histories and company facts
//!
//! Responses are parsed into the `filings-core` fact model; raw payloads
//! never leave this crate.

mod cache;
/// Cached, rate-limit-aware API client.
pub mod client;
/// Endpoint templates, resolution and preflight checks.
pub mod endpoints;
/// Parsed response types and payload flattening.
pub mod models;

pub use client::EdgarClient;
pub use endpoints::{
    COMPANY_FACTS_TEMPLATE, COMPANY_TICKERS_URL, EndpointHealth, EndpointRegistry, EndpointReport,
    ResolvedEndpoints, ResponseKind, SUBMISSIONS_TEMPLATE,
};
pub use models::{ParsedResponse, SubmissionHistory, TickerRecord};
