//! Pay period models.
//!
//! This module contains the [`PayPeriodKind`] and [`PayPeriod`] types that
//! define the window punches are aggregated over for payroll.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// The length of a pay period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayPeriodKind {
    /// Calendar week starting Sunday.
    #[default]
    Week,
    /// Calendar month.
    Month,
    /// Calendar quarter.
    Quarter,
    /// Calendar year.
    Year,
}

impl PayPeriodKind {
    /// Number of weeks the weekly overtime threshold is multiplied by.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::PayPeriodKind;
    ///
    /// assert_eq!(PayPeriodKind::Week.weeks_in_period(), 1);
    /// assert_eq!(PayPeriodKind::Quarter.weeks_in_period(), 13);
    /// ```
    pub fn weeks_in_period(&self) -> u32 {
        match self {
            PayPeriodKind::Week => 1,
            PayPeriodKind::Month => 4,
            PayPeriodKind::Quarter => 13,
            PayPeriodKind::Year => 52,
        }
    }

    /// Number of periods per year, used to prorate annual salaries.
    pub fn periods_per_year(&self) -> u32 {
        match self {
            PayPeriodKind::Week => 52,
            PayPeriodKind::Month => 12,
            PayPeriodKind::Quarter => 4,
            PayPeriodKind::Year => 1,
        }
    }

    /// Returns the organization-local first day of the period containing `date`.
    pub fn first_day(&self, date: NaiveDate) -> NaiveDate {
        match self {
            PayPeriodKind::Week => {
                date - TimeDelta::days(i64::from(date.weekday().num_days_from_sunday()))
            }
            PayPeriodKind::Month => date - TimeDelta::days(i64::from(date.day0())),
            PayPeriodKind::Quarter => {
                let month_in_quarter = date.month0() % 3;
                let mut first = date - TimeDelta::days(i64::from(date.day0()));
                for _ in 0..month_in_quarter {
                    first = first - TimeDelta::days(1);
                    first = first - TimeDelta::days(i64::from(first.day0()));
                }
                first
            }
            PayPeriodKind::Year => date - TimeDelta::days(i64::from(date.ordinal0())),
        }
    }
}

/// A concrete pay period: its kind and the UTC instant it started.
///
/// Periods are open-ended at "now"; punches from `start` onwards count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayPeriod {
    /// The period length.
    pub kind: PayPeriodKind,
    /// Organization-local midnight of the first day, as a UTC instant.
    pub start: DateTime<Utc>,
}

impl PayPeriod {
    /// Returns the period of `kind` containing `now` in the organization's time zone.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::{PayPeriod, PayPeriodKind};
    /// use chrono::{FixedOffset, TimeZone, Utc};
    ///
    /// // Wednesday 2026-01-14 15:00 UTC
    /// let now = Utc.with_ymd_and_hms(2026, 1, 14, 15, 0, 0).unwrap();
    /// let utc = FixedOffset::east_opt(0).unwrap();
    /// let period = PayPeriod::containing(PayPeriodKind::Week, now, utc);
    ///
    /// // Week starts on the preceding Sunday
    /// assert_eq!(period.start, Utc.with_ymd_and_hms(2026, 1, 11, 0, 0, 0).unwrap());
    /// ```
    pub fn containing(kind: PayPeriodKind, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_date = now.with_timezone(&offset).date_naive();
        Self {
            kind,
            start: local_midnight(kind.first_day(local_date), offset),
        }
    }

    /// Checks whether an instant falls within the period (start inclusive).
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start
    }
}

/// Converts organization-local midnight of `date` into a UTC instant.
pub fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    Utc.from_utc_datetime(&utc)
}
