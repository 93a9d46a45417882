#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/filingsworks/filings/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core types for the filings pipeline.
//!
//! This crate provides the foundational pieces shared by every stage:
//!
//! - [`PipelineError`](error::PipelineError) - the error taxonomy
//! - [`Cik`](types::Cik), [`Fact`](types::Fact), [`FactTable`](types::FactTable) - fact data model
//! - [`ReportingPeriod`](period::ReportingPeriod) - period classification
//! - [`Category`](category::Category), [`StorageKind`](category::StorageKind) - dataset taxonomy
//! - [`PipelineConfig`](config::PipelineConfig) - explicit configuration surface
//! - [`DatasetSink`](sink::DatasetSink), [`StockPriceProvider`](sink::StockPriceProvider) - collaborator contracts

/// Ratio categories and storage kinds.
pub mod category;
/// Pipeline configuration.
pub mod config;
/// Error types for pipeline operations.
pub mod error;
/// DataFrame construction helpers.
pub mod frame;
/// Reporting-period classification.
pub mod period;
/// External collaborator contracts.
pub mod sink;
/// Core data types (Cik, Fact, FactTable, StockPrices).
pub mod types;

// Re-export commonly used items at crate root
pub use category::{Category, RAW_FACTS_CATEGORY, StorageKind};
pub use config::{DEFAULT_CACHE_TTL, DEFAULT_COOLDOWN_BUFFER, PipelineConfig, SinkCredentials};
pub use error::{FetchCause, PipelineError, Result};
pub use period::{PeriodType, QuarterMark, ReportingPeriod, quarter_label};
pub use sink::{DatasetSink, StockPriceProvider};
pub use types::{Cik, Fact, FactTable, StockPrices};
