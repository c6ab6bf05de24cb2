//! Reporting periods and date ranges
//!
//! Ranges are computed in the dashboard's local time zone and returned as
//! UTC instants for querying. The previous range has the same length as the
//! current one and ends on the day before it starts.

use crate::error::AppError;
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Year used as the lower bound of the "all" period
pub const ALL_TIME_START_YEAR: i32 = 2000;

/// Years a custom range may start or end in
pub const CUSTOM_YEARS: RangeInclusive<i32> = 1970..=9999;

/// Period selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Period {
    #[serde(rename = "today")]
    Today,
    #[default]
    #[serde(rename = "7days")]
    Last7Days,
    #[serde(rename = "15days")]
    Last15Days,
    #[serde(rename = "30days")]
    Last30Days,
    #[serde(rename = "all")]
    All,
    #[serde(rename = "custom")]
    Custom,
}

impl Period {
    /// Wire name of the period
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Today => "today",
            Period::Last7Days => "7days",
            Period::Last15Days => "15days",
            Period::Last30Days => "30days",
            Period::All => "all",
            Period::Custom => "custom",
        }
    }

    /// Calendar days subtracted from today to find the range start
    fn lookback_days(&self) -> Option<i64> {
        match self {
            Period::Today => Some(0),
            Period::Last7Days => Some(7),
            Period::Last15Days => Some(15),
            Period::Last30Days => Some(30),
            Period::All | Period::Custom => None,
        }
    }
}

/// Inclusive calendar-day range chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CustomRange {
    /// The last seven days ending today, the default custom selection
    pub fn default_for(now: DateTime<Utc>, tz: Tz) -> Self {
        let today = now.with_timezone(&tz).date_naive();
        Self {
            start: today - Duration::days(7),
            end: today,
        }
    }
}

/// Half-open in spirit, inclusive in practice: both bounds are queried with
/// `gte` / `lte`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Period length in whole days, rounded up and never below one
    pub fn period_days(&self) -> i64 {
        let ms = (self.end - self.start).num_milliseconds();
        if ms <= 0 {
            return 1;
        }
        ((ms + MS_PER_DAY - 1) / MS_PER_DAY).max(1)
    }

    /// The immediately preceding range of equal length
    pub fn previous(&self, tz: Tz) -> Result<DateRange, AppError> {
        let length = self.end - self.start;

        let end_day = self
            .start
            .checked_sub_signed(Duration::milliseconds(1))
            .ok_or_else(out_of_range)?
            .with_timezone(&tz)
            .date_naive();
        let end = end_of_day(end_day, tz)?;

        let start_day = end
            .checked_sub_signed(length)
            .ok_or_else(out_of_range)?
            .with_timezone(&tz)
            .date_naive();
        let start = start_of_day(start_day, tz)?;

        Ok(DateRange { start, end })
    }

    /// Whether an instant falls inside the range
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

/// A period plus the custom dates that go with it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PeriodSelection {
    pub period: Period,
    #[serde(default)]
    pub custom: Option<CustomRange>,
}

impl PeriodSelection {
    pub fn new(period: Period, custom: Option<CustomRange>) -> Self {
        Self { period, custom }
    }

    /// Resolve the current range relative to `now`
    pub fn current_range(&self, now: DateTime<Utc>, tz: Tz) -> Result<DateRange, AppError> {
        let today = now.with_timezone(&tz).date_naive();

        if self.period == Period::Custom {
            let custom = self.custom.ok_or_else(|| {
                AppError::Validation("custom period requires start and end dates".to_string())
            })?;
            for day in [custom.start, custom.end] {
                if !CUSTOM_YEARS.contains(&day.year()) {
                    return Err(AppError::Validation(format!(
                        "custom period date {} is outside {}..={}",
                        day,
                        CUSTOM_YEARS.start(),
                        CUSTOM_YEARS.end()
                    )));
                }
            }
            if custom.start > custom.end {
                return Err(AppError::Validation(format!(
                    "custom period starts after it ends ({} > {})",
                    custom.start, custom.end
                )));
            }
            return Ok(DateRange {
                start: start_of_day(custom.start, tz)?,
                end: end_of_day(custom.end, tz)?,
            });
        }

        let start_day = match self.period.lookback_days() {
            Some(days) => today - Duration::days(days),
            None => today.with_year(ALL_TIME_START_YEAR).unwrap_or(today),
        };

        Ok(DateRange {
            start: start_of_day(start_day, tz)?,
            end: end_of_day(today, tz)?,
        })
    }

    /// Resolve both the current and the comparison range
    pub fn ranges(&self, now: DateTime<Utc>, tz: Tz) -> Result<(DateRange, DateRange), AppError> {
        let current = self.current_range(now, tz)?;
        Ok((current, current.previous(tz)?))
    }
}

/// First instant of a local calendar day
pub fn start_of_day(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    local_to_utc(day.and_time(NaiveTime::MIN), tz).ok_or_else(out_of_range)
}

/// Last millisecond of a local calendar day
pub fn end_of_day(day: NaiveDate, tz: Tz) -> Result<DateTime<Utc>, AppError> {
    day.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::days(1))
        .and_then(|next_midnight| local_to_utc(next_midnight, tz))
        .and_then(|dt| dt.checked_sub_signed(Duration::milliseconds(1)))
        .ok_or_else(out_of_range)
}

/// Map a local wall-clock time to UTC, stepping past DST gaps
fn local_to_utc(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            let shifted = naive.checked_add_signed(Duration::hours(1))?;
            match tz.from_local_datetime(&shifted) {
                LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                    Some(dt.with_timezone(&Utc))
                }
                LocalResult::None => Some(Utc.from_utc_datetime(&naive)),
            }
        }
    }
}

fn out_of_range() -> AppError {
    AppError::Validation("date range is out of range".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Sao_Paulo;
    use chrono_tz::UTC;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_period_wire_names() {
        let p: Period = serde_json::from_str("\"7days\"").unwrap();
        assert_eq!(p, Period::Last7Days);
        assert_eq!(Period::All.as_str(), "all");
        assert_eq!(Period::default(), Period::Last7Days);
    }

    #[test]
    fn test_today_range_in_utc() {
        let range = PeriodSelection::new(Period::Today, None)
            .current_range(now(), UTC)
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap());
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(range.period_days(), 1);
    }

    #[test]
    fn test_seven_days_spans_eight_calendar_days() {
        let range = PeriodSelection::new(Period::Last7Days, None)
            .current_range(now(), UTC)
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 6, 8, 0, 0, 0).unwrap());
        assert_eq!(range.period_days(), 8);
    }

    #[test]
    fn test_local_day_boundaries() {
        // 15:30 UTC is 12:30 in São Paulo (UTC-3)
        let range = PeriodSelection::new(Period::Today, None)
            .current_range(now(), Sao_Paulo)
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2024, 6, 15, 3, 0, 0).unwrap());
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2024, 6, 16, 2, 59, 59).unwrap() + Duration::milliseconds(999)
        );
    }

    #[test]
    fn test_all_period_starts_in_2000() {
        let range = PeriodSelection::new(Period::All, None)
            .current_range(now(), UTC)
            .unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2000, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_custom_range_validation() {
        let missing = PeriodSelection::new(Period::Custom, None).current_range(now(), UTC);
        assert!(matches!(missing, Err(AppError::Validation(_))));

        let inverted = PeriodSelection::new(
            Period::Custom,
            Some(CustomRange {
                start: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            }),
        )
        .current_range(now(), UTC);
        assert!(matches!(inverted, Err(AppError::Validation(_))));

        let ok = PeriodSelection::new(
            Period::Custom,
            Some(CustomRange {
                start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            }),
        )
        .current_range(now(), UTC)
        .unwrap();
        assert_eq!(ok.period_days(), 10);
    }

    #[test]
    fn test_previous_range_is_adjacent_and_equal_length() {
        let (current, previous) = PeriodSelection::new(Period::Last7Days, None)
            .ranges(now(), UTC)
            .unwrap();

        assert_eq!(previous.end, current.start - Duration::milliseconds(1));
        assert_eq!(previous.start, Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap());
        assert_eq!(previous.period_days(), current.period_days());
    }

    #[test]
    fn test_custom_dates_at_the_calendar_limits_are_rejected() {
        let far_end: NaiveDate = serde_json::from_str("\"+262142-12-31\"").unwrap();
        let far_start: NaiveDate = serde_json::from_str("\"-262143-01-01\"").unwrap();
        let jan_first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        for (start, end) in [(jan_first, far_end), (far_start, jan_first), (far_start, far_end)] {
            let result = PeriodSelection::new(Period::Custom, Some(CustomRange { start, end }))
                .ranges(now(), Sao_Paulo);
            assert!(matches!(result, Err(AppError::Validation(_))), "{} .. {}", start, end);
        }

        let edge = PeriodSelection::new(
            Period::Custom,
            Some(CustomRange {
                start: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(9999, 12, 31).unwrap(),
            }),
        )
        .ranges(now(), UTC);
        assert!(edge.is_ok());
    }

    #[test]
    fn test_day_bounds_overflow_is_an_error() {
        assert!(end_of_day(NaiveDate::MAX, UTC).is_err());

        let range = DateRange {
            start: DateTime::<Utc>::MIN_UTC,
            end: DateTime::<Utc>::MIN_UTC,
        };
        assert!(range.previous(UTC).is_err());
    }

    #[test]
    fn test_period_days_floor_is_one() {
        let instant = now();
        let range = DateRange {
            start: instant,
            end: instant,
        };
        assert_eq!(range.period_days(), 1);
    }

    #[test]
    fn test_default_custom_range() {
        let custom = CustomRange::default_for(now(), UTC);
        assert_eq!(custom.end, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(custom.start, NaiveDate::from_ymd_opt(2024, 6, 8).unwrap());
    }
}
