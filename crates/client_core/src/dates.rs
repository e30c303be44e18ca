use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::ViewerError;

/// Forecasts are published roughly half a day after their run date.
const PUBLICATION_LAG_HOURS: i64 = 12;
const ARCHIVE_DAYS: i64 = 59;

/// Range of forecast run dates the data API serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForecastDateBounds {
    pub min: NaiveDate,
    pub max: NaiveDate,
}

impl ForecastDateBounds {
    pub fn from_now(now: DateTime<Utc>) -> Self {
        let latest = now - TimeDelta::hours(PUBLICATION_LAG_HOURS);
        Self {
            min: (latest - TimeDelta::days(ARCHIVE_DAYS)).date_naive(),
            max: latest.date_naive(),
        }
    }

    pub fn default_date(&self) -> NaiveDate {
        self.max
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.min..=self.max).contains(&date)
    }

    pub fn check(&self, date: NaiveDate) -> Result<NaiveDate, ViewerError> {
        if self.contains(date) {
            Ok(date)
        } else {
            Err(ViewerError::DateOutOfRange {
                date,
                min: self.min,
                max: self.max,
            })
        }
    }
}
