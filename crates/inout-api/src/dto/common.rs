//! Common DTOs used across the API

use chrono::NaiveDate;
use inout_core::{
    models::{CustomRange, Period, PeriodSelection},
    AppError,
};
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// Period query parameters
///
/// `start` / `end` are only read for the custom period.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodParams {
    #[serde(default)]
    pub period: Period,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PeriodParams {
    /// Resolve into a selection, rejecting a half-specified custom range
    pub fn selection(&self) -> Result<PeriodSelection, AppError> {
        if self.period != Period::Custom {
            return Ok(PeriodSelection::new(self.period, None));
        }

        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(PeriodSelection::new(
                Period::Custom,
                Some(CustomRange { start, end }),
            )),
            _ => Err(AppError::Validation(
                "custom period requires start and end (YYYY-MM-DD)".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_params_default_is_seven_days() {
        let params = PeriodParams::default();
        assert_eq!(params.selection().unwrap().period, Period::Last7Days);
    }

    #[test]
    fn test_custom_period_requires_both_dates() {
        let params = PeriodParams {
            period: Period::Custom,
            start: NaiveDate::from_ymd_opt(2024, 6, 1),
            end: None,
        };
        assert!(matches!(params.selection(), Err(AppError::Validation(_))));

        let params = PeriodParams {
            end: NaiveDate::from_ymd_opt(2024, 6, 9),
            ..params
        };
        let selection = params.selection().unwrap();
        assert_eq!(
            selection.custom.map(|c| c.end),
            NaiveDate::from_ymd_opt(2024, 6, 9)
        );
    }

    #[test]
    fn test_non_custom_period_ignores_dates() {
        let params = PeriodParams {
            period: Period::Today,
            start: NaiveDate::from_ymd_opt(2024, 6, 1),
            end: None,
        };
        assert!(params.selection().unwrap().custom.is_none());
    }
}
