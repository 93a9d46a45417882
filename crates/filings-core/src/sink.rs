//! External collaborator contracts.
//!
//! The pipeline's only outbound surfaces besides the local artifact store:
//! a warehouse-style [`DatasetSink`] and an optional [`StockPriceProvider`].
//! Both are injected; neither has a default implementation here.

use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::fmt::Debug;

use crate::category::Category;
use crate::error::Result;
use crate::types::Cik;

/// A warehouse-style dataset sink.
///
/// How the sink stores or queries data is its own concern; the pipeline
/// only hands over finished category datasets.
#[async_trait]
pub trait DatasetSink: Send + Sync + Debug {
    /// Name of this sink, for logging.
    fn name(&self) -> &str;

    /// Uploads one category dataset.
    async fn upload(&self, dataset: &DataFrame, category: Category) -> Result<()>;
}

/// An external source of stock price observations.
///
/// Price data is optional everywhere it is consumed; `Ok(None)` is the
/// explicit absent state and never an error.
#[async_trait]
pub trait StockPriceProvider: Send + Sync + Debug {
    /// Returns the closing price for an entity on a date, if known.
    async fn price_on(&self, cik: &Cik, date: NaiveDate) -> Result<Option<f64>>;
}
