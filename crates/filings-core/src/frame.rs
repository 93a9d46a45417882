//! Small DataFrame construction helpers shared by the pipeline stages.

use chrono::NaiveDate;
use polars::prelude::{Column, DataType};

use crate::error::Result;

/// Days since the Unix epoch, the physical representation of a polars date.
fn epoch_days(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Builds a date-typed column from dates.
pub fn date_column(name: &str, dates: &[NaiveDate]) -> Result<Column> {
    let days: Vec<i32> = dates.iter().copied().map(epoch_days).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}

/// Builds a date-typed column where observations may be absent.
pub fn optional_date_column(name: &str, dates: &[Option<NaiveDate>]) -> Result<Column> {
    let days: Vec<Option<i32>> = dates.iter().map(|d| d.map(epoch_days)).collect();
    Ok(Column::new(name.into(), days).cast(&DataType::Date)?)
}
