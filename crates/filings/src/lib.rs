#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Regulatory-filings fact pipeline.
//!
//! This crate ties the pipeline stages together and re-exports the pieces
//! callers need:
//!
//! - fetch standardized facts from the filings API (cached, rate-limit
//!   aware)
//! - normalize them into ordered annual or quarterly views
//! - derive category ratios
//! - persist raw and derived datasets with a discoverable version history
//!
//! # Example
//!
//! ```rust,ignore
//! use filings::{Cik, FilingsPipeline, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> filings::Result<()> {
//!     let config = PipelineConfig::new("data", "MyApp/1.0 (contact@example.com)");
//!     let pipeline = FilingsPipeline::new(config);
//!
//!     let cik = Cik::new("12927")?;
//!     let report = pipeline.process_entity(&cik).await?;
//!     for outcome in &report.categories {
//!         println!("{}: {} rows", outcome.category, outcome.rows);
//!     }
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use filings_core::*;

// Pipeline stages
pub use filings_edgar::{EdgarClient, EndpointHealth, EndpointRegistry, EndpointReport};
pub use filings_normalize::{
    AnnualNormalizer, MetricSelection, NormalizedFacts, PeriodNormalizer, QuarterlyNormalizer,
    normalizer_for,
};
pub use filings_ratios::{CategoryResult, RatioEngine};
pub use filings_store::{ArtifactStore, IndexManager, TIMESTAMP_FORMAT};

/// Chart-data transforms for the presentation collaborator.
pub mod charts;
mod pipeline;

pub use pipeline::{CategoryOutcome, EntityReport, FilingsPipeline};
