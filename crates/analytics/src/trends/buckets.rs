//! Time buckets
//!
//! A window is cut into contiguous buckets counted from the window start.
//! Calendar units are added from the origin each time (never chained), so
//! month-end clamping cannot drift.

use chrono::{Days, Months, NaiveDate};
use litgraph_common::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Upper bound on buckets in one window
pub const MAX_BUCKETS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketUnit {
    Day,
    Week,
    Month,
    Year,
}

/// Bucket length: `count` units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
pub struct BucketSize {
    pub unit: BucketUnit,

    #[validate(range(min = 1))]
    pub count: u32,
}

impl BucketSize {
    pub fn new(unit: BucketUnit, count: u32) -> Self {
        Self { unit, count }
    }

    pub fn months(count: u32) -> Self {
        Self::new(BucketUnit::Month, count)
    }

    /// Start of the `k`-th bucket counted from `origin`
    fn nth_start(&self, origin: NaiveDate, k: u32) -> Option<NaiveDate> {
        let steps = k.checked_mul(self.count)?;
        match self.unit {
            BucketUnit::Day => origin.checked_add_days(Days::new(u64::from(steps))),
            BucketUnit::Week => origin.checked_add_days(Days::new(u64::from(steps) * 7)),
            BucketUnit::Month => origin.checked_add_months(Months::new(steps)),
            BucketUnit::Year => origin.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TimeWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// One bucket's inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Contiguous buckets covering a window
#[derive(Debug, Clone)]
pub struct BucketGrid {
    starts: Vec<NaiveDate>,
    end: NaiveDate,
}

impl BucketGrid {
    pub fn new(window: TimeWindow, size: BucketSize) -> Result<Self> {
        size.validate()?;
        if window.end < window.start {
            return Err(AppError::invalid_parameter("window", "end must not precede start"));
        }

        let mut starts = Vec::new();
        let mut k = 0u32;
        while let Some(start) = size.nth_start(window.start, k) {
            if start > window.end {
                break;
            }
            if starts.len() == MAX_BUCKETS {
                return Err(AppError::invalid_parameter(
                    "bucket",
                    format!("window holds more than {} buckets", MAX_BUCKETS),
                ));
            }
            starts.push(start);
            k += 1;
        }

        Ok(Self {
            starts,
            end: window.end,
        })
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Bucket holding `date`, if inside the window
    pub fn locate(&self, date: NaiveDate) -> Option<usize> {
        if date > self.end || self.starts.first().map_or(true, |first| date < *first) {
            return None;
        }
        Some(self.starts.partition_point(|start| *start <= date) - 1)
    }

    pub fn period(&self, index: usize) -> Period {
        let end = match self.starts.get(index + 1) {
            Some(next) => next.pred_opt().unwrap_or(self.end),
            None => self.end,
        };
        Period {
            start: self.starts[index],
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_grid() {
        let window = TimeWindow::new(date(2023, 1, 1), date(2023, 6, 30));
        let grid = BucketGrid::new(window, BucketSize::months(1)).unwrap();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.locate(date(2023, 1, 1)), Some(0));
        assert_eq!(grid.locate(date(2023, 3, 31)), Some(2));
        assert_eq!(grid.locate(date(2023, 6, 30)), Some(5));
        assert_eq!(grid.locate(date(2023, 7, 1)), None);
        assert_eq!(grid.locate(date(2022, 12, 31)), None);
        assert_eq!(
            grid.period(1),
            Period {
                start: date(2023, 2, 1),
                end: date(2023, 2, 28)
            }
        );
    }

    #[test]
    fn test_month_end_origin_does_not_drift() {
        let window = TimeWindow::new(date(2023, 1, 31), date(2023, 4, 30));
        let grid = BucketGrid::new(window, BucketSize::months(1)).unwrap();
        assert_eq!(grid.period(1).start, date(2023, 2, 28));
        assert_eq!(grid.period(2).start, date(2023, 3, 31));
        assert_eq!(grid.period(3).end, date(2023, 4, 30));
    }

    #[test]
    fn test_partial_last_bucket_is_clipped() {
        let grid = BucketGrid::new(
            TimeWindow::new(date(2024, 1, 1), date(2024, 1, 10)),
            BucketSize::new(BucketUnit::Week, 1),
        )
        .unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.period(1).end, date(2024, 1, 10));
    }

    #[test]
    fn test_invalid_grids() {
        let window = TimeWindow::new(date(2024, 1, 1), date(2024, 12, 31));
        assert!(BucketGrid::new(window, BucketSize::new(BucketUnit::Day, 0)).is_err());

        let reversed = TimeWindow::new(date(2024, 1, 2), date(2024, 1, 1));
        assert!(BucketGrid::new(reversed, BucketSize::months(1)).is_err());

        let huge = TimeWindow::new(date(1000, 1, 1), date(2900, 1, 1));
        assert!(BucketGrid::new(huge, BucketSize::new(BucketUnit::Day, 1)).is_err());
    }

    #[test]
    fn test_single_day_window() {
        let day = date(2024, 2, 29);
        let yearly = BucketSize::new(BucketUnit::Year, 1);
        let grid = BucketGrid::new(TimeWindow::new(day, day), yearly).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.locate(day), Some(0));
    }
}
