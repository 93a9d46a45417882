//! Reporting-period classification.
//!
//! Facts arrive with a short period identifier (a "frame") of the shape
//! `CY2023`, `CY2023Q1` or `CY2023Q1I`: a 4-digit calendar year at bytes
//! 2..6 and an optional quarter code at bytes 6..8. This module parses those
//! identifiers into [`ReportingPeriod`] values with a total ordering, and
//! derives display labels for period-end dates.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Period basis for fundamental data.
///
/// Selects which normalizer strategy a pipeline runs with.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

/// Quarter marker within a reporting year.
///
/// `FY` denotes a full-year figure and sorts after the four quarters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QuarterMark {
    /// First quarter.
    Q1,
    /// Second quarter.
    Q2,
    /// Third quarter.
    Q3,
    /// Fourth quarter.
    Q4,
    /// Full year.
    #[serde(rename = "FY")]
    Fy,
}

impl QuarterMark {
    /// Sort rank: Q1..Q4 map to 1..4, FY to 5.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Q1 => 1,
            Self::Q2 => 2,
            Self::Q3 => 3,
            Self::Q4 => 4,
            Self::Fy => 5,
        }
    }

    /// The marker as it appears in period identifiers.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q1 => "Q1",
            Self::Q2 => "Q2",
            Self::Q3 => "Q3",
            Self::Q4 => "Q4",
            Self::Fy => "FY",
        }
    }

    /// Parses an explicit quarter code (`"Q1"`..`"Q4"`). `"FY"` and anything
    /// else return `None`.
    #[must_use]
    pub fn from_quarter_code(code: &str) -> Option<Self> {
        match code {
            "Q1" => Some(Self::Q1),
            "Q2" => Some(Self::Q2),
            "Q3" => Some(Self::Q3),
            "Q4" => Some(Self::Q4),
            _ => None,
        }
    }
}

impl std::fmt::Display for QuarterMark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A classified reporting period: a calendar year and a quarter marker.
///
/// Ordering is `(year, quarter rank)` with FY last within a year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// 4-digit calendar year; 0 when the identifier carried no readable year.
    pub year: i32,
    /// Quarter marker within the year.
    pub quarter: QuarterMark,
}

impl ReportingPeriod {
    /// Creates a period from its parts.
    #[must_use]
    pub const fn new(year: i32, quarter: QuarterMark) -> Self {
        Self { year, quarter }
    }

    /// Lenient parse used by the annual view: never fails.
    ///
    /// Any identifier not literally encoding Q1..Q4 is bucketed as FY.
    /// Identifiers too short to carry a 4-digit year keep the row alive with
    /// year 0, so it sorts before every real year.
    #[must_use]
    pub fn parse_lenient(frame: &str) -> Self {
        let year = frame
            .get(2..6)
            .and_then(|y| y.parse::<i32>().ok())
            .unwrap_or(0);
        let quarter = frame
            .get(6..8)
            .and_then(QuarterMark::from_quarter_code)
            .unwrap_or(QuarterMark::Fy);
        Self { year, quarter }
    }

    /// Strict parse used by the quarterly view.
    ///
    /// Returns `None` unless the identifier carries both a 4-digit year and
    /// a literal Q1..Q4 marker; callers drop such rows entirely.
    #[must_use]
    pub fn parse_quarterly(frame: &str) -> Option<Self> {
        let year = frame.get(2..6)?.parse::<i32>().ok()?;
        let quarter = frame.get(6..8).and_then(QuarterMark::from_quarter_code)?;
        Some(Self { year, quarter })
    }
}

impl std::fmt::Display for ReportingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.year, self.quarter)
    }
}

/// Derives the `Q{n}-{year}` label for a period-end date.
///
/// Every category output row carries this label, computed from the calendar
/// month of the period end.
#[must_use]
pub fn quarter_label(date: NaiveDate) -> String {
    let quarter = (date.month0() / 3) + 1;
    format!("Q{}-{}", quarter, date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_parse_extracts_year_and_quarter() {
        for (frame, year, quarter) in [
            ("CY2007Q1", 2007, QuarterMark::Q1),
            ("CY2019Q3", 2019, QuarterMark::Q3),
            ("CY2023Q4I", 2023, QuarterMark::Q4),
        ] {
            let period = ReportingPeriod::parse_quarterly(frame).unwrap();
            assert_eq!(period.year, year);
            assert_eq!(period.quarter, quarter);
        }
    }

    #[test]
    fn strict_parse_rejects_full_year_frames() {
        assert!(ReportingPeriod::parse_quarterly("CY2007").is_none());
        assert!(ReportingPeriod::parse_quarterly("CY2007FY").is_none());
    }

    #[test]
    fn strict_parse_rejects_short_frames() {
        assert!(ReportingPeriod::parse_quarterly("CY").is_none());
        assert!(ReportingPeriod::parse_quarterly("CY20").is_none());
        assert!(ReportingPeriod::parse_quarterly("").is_none());
    }

    #[test]
    fn lenient_parse_defaults_to_fy() {
        let period = ReportingPeriod::parse_lenient("CY2007");
        assert_eq!(period, ReportingPeriod::new(2007, QuarterMark::Fy));

        let period = ReportingPeriod::parse_lenient("CY2012Q2");
        assert_eq!(period, ReportingPeriod::new(2012, QuarterMark::Q2));
    }

    #[test]
    fn lenient_parse_survives_short_frames() {
        let period = ReportingPeriod::parse_lenient("CY");
        assert_eq!(period, ReportingPeriod::new(0, QuarterMark::Fy));

        let period = ReportingPeriod::parse_lenient("C");
        assert_eq!(period, ReportingPeriod::new(0, QuarterMark::Fy));
    }

    #[test]
    fn periods_order_by_year_then_rank() {
        let mut periods = vec![
            ReportingPeriod::new(2020, QuarterMark::Fy),
            ReportingPeriod::new(2021, QuarterMark::Q1),
            ReportingPeriod::new(2020, QuarterMark::Q4),
            ReportingPeriod::new(2020, QuarterMark::Q1),
        ];
        periods.sort();
        assert_eq!(
            periods,
            vec![
                ReportingPeriod::new(2020, QuarterMark::Q1),
                ReportingPeriod::new(2020, QuarterMark::Q4),
                ReportingPeriod::new(2020, QuarterMark::Fy),
                ReportingPeriod::new(2021, QuarterMark::Q1),
            ]
        );
    }

    #[test]
    fn quarter_labels_follow_calendar_months() {
        let date = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap();
        assert_eq!(quarter_label(date), "Q4-2022");

        let date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        assert_eq!(quarter_label(date), "Q1-2023");

        let date = NaiveDate::from_ymd_opt(2023, 6, 30).unwrap();
        assert_eq!(quarter_label(date), "Q2-2023");
    }
}
