//! Regularization date-range validation.
//!
//! Range-level problems (a date that is not in the past, an inverted range)
//! stop validation immediately. Per-date problems are collected for every
//! offending date so the employee sees the whole list at once.

use chrono::NaiveDate;
use error::AppError;
use serde::{Deserialize, Serialize};

use crate::models::{RegularizationRequest, RequestType, WeekendDays};

/// Why a date or range was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvalidReason {
    #[serde(rename = "future-or-today: from")]
    FutureOrTodayFrom,
    #[serde(rename = "future-or-today: to")]
    FutureOrTodayTo,
    #[serde(rename = "inverted-range")]
    InvertedRange,
    #[serde(rename = "weekend")]
    Weekend,
    #[serde(rename = "holiday")]
    Holiday,
    #[serde(rename = "leave-conflict")]
    LeaveConflict,
}

impl InvalidReason {
    pub fn label(self) -> &'static str {
        match self {
            InvalidReason::FutureOrTodayFrom => "future-or-today: from",
            InvalidReason::FutureOrTodayTo => "future-or-today: to",
            InvalidReason::InvertedRange => "inverted-range",
            InvalidReason::Weekend => "weekend",
            InvalidReason::Holiday => "holiday",
            InvalidReason::LeaveConflict => "leave-conflict",
        }
    }

    /// Whether the reason rejects the whole range rather than one date.
    pub fn is_range_level(self) -> bool {
        match self {
            InvalidReason::FutureOrTodayFrom
            | InvalidReason::FutureOrTodayTo
            | InvalidReason::InvertedRange => true,
            InvalidReason::Weekend | InvalidReason::Holiday | InvalidReason::LeaveConflict => false,
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidDate {
    pub date: NaiveDate,
    pub reason: InvalidReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeValidation {
    pub is_valid: bool,
    pub invalid_dates: Vec<InvalidDate>,
}

impl RangeValidation {
    fn range_failure(date: NaiveDate, reason: InvalidReason) -> Self {
        Self {
            is_valid: false,
            invalid_dates: vec![InvalidDate { date, reason }],
        }
    }

    pub fn has_range_failure(&self) -> bool {
        self.invalid_dates.iter().any(|d| d.reason.is_range_level())
    }

    /// One line per offending date, for error messages.
    pub fn describe(&self) -> String {
        self.invalid_dates
            .iter()
            .map(|d| format!("{} ({})", d.date, d.reason))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Optional per-date checks backed by auxiliary data.
///
/// A check left as `None` is skipped, which is also how the service
/// applies its fail-open policy when the backing data cannot be fetched.
#[derive(Default, Clone, Copy)]
pub struct AuxiliaryChecks<'a> {
    pub is_holiday: Option<&'a dyn Fn(NaiveDate) -> bool>,
    pub has_leave_conflict: Option<&'a dyn Fn(NaiveDate) -> bool>,
}

impl<'a> AuxiliaryChecks<'a> {
    pub fn with_holidays(mut self, predicate: &'a dyn Fn(NaiveDate) -> bool) -> Self {
        self.is_holiday = Some(predicate);
        self
    }

    pub fn with_leave_conflicts(mut self, predicate: &'a dyn Fn(NaiveDate) -> bool) -> Self {
        self.has_leave_conflict = Some(predicate);
        self
    }
}

/// Validate a regularization range against `today`.
pub fn validate(
    from: NaiveDate,
    to: NaiveDate,
    weekend: WeekendDays,
    today: NaiveDate,
    checks: &AuxiliaryChecks<'_>,
) -> RangeValidation {
    if from >= today {
        return RangeValidation::range_failure(from, InvalidReason::FutureOrTodayFrom);
    }
    if to >= today {
        return RangeValidation::range_failure(to, InvalidReason::FutureOrTodayTo);
    }
    if to < from {
        return RangeValidation::range_failure(from, InvalidReason::InvertedRange);
    }

    let invalid_dates: Vec<InvalidDate> = from
        .iter_days()
        .take_while(|date| *date <= to)
        .filter_map(|date| {
            let reason = if weekend.contains_date(date) {
                Some(InvalidReason::Weekend)
            } else if checks.is_holiday.is_some_and(|f| f(date)) {
                Some(InvalidReason::Holiday)
            } else if checks.has_leave_conflict.is_some_and(|f| f(date)) {
                Some(InvalidReason::LeaveConflict)
            } else {
                None
            };
            reason.map(|reason| InvalidDate { date, reason })
        })
        .collect();

    RangeValidation {
        is_valid: invalid_dates.is_empty(),
        invalid_dates,
    }
}

/// Field-level checks on a request before any date validation.
pub fn check_request_fields(request: &RegularizationRequest) -> Result<(), AppError> {
    if request.reason.trim().is_empty() {
        return Err(AppError::Validation("reason is required".to_string()));
    }

    match request.request_type {
        RequestType::DayBased => Ok(()),
        RequestType::TimeBased => match (request.expected_in, request.expected_out) {
            (Some(expected_in), Some(expected_out)) if expected_in < expected_out => Ok(()),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "expected out time must be after expected in time".to_string(),
            )),
            _ => Err(AppError::Validation(
                "time based requests need expected in and out times".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weekend() -> WeekendDays {
        WeekendDays::from_sunday_indices(&[0, 6]).unwrap()
    }

    #[test]
    fn test_past_weekday_is_valid() {
        // 2025-01-01 is a Wednesday.
        let result = validate(
            date("2025-01-01"),
            date("2025-01-01"),
            weekend(),
            date("2025-01-02"),
            &AuxiliaryChecks::default(),
        );
        assert!(result.is_valid);
        assert!(result.invalid_dates.is_empty());
    }

    #[test]
    fn test_today_is_rejected() {
        let today = date("2025-03-10");
        let result = validate(today, today, weekend(), today, &AuxiliaryChecks::default());
        assert!(!result.is_valid);
        assert_eq!(result.invalid_dates[0].reason, InvalidReason::FutureOrTodayFrom);
        assert!(result.invalid_dates[0].reason.label().starts_with("future-or-today"));
    }

    #[test]
    fn test_to_date_in_future() {
        let result = validate(
            date("2025-03-03"),
            date("2025-03-12"),
            weekend(),
            date("2025-03-10"),
            &AuxiliaryChecks::default(),
        );
        assert_eq!(
            result.invalid_dates,
            vec![InvalidDate {
                date: date("2025-03-12"),
                reason: InvalidReason::FutureOrTodayTo
            }]
        );
        assert!(result.has_range_failure());
    }

    #[test]
    fn test_inverted_range() {
        let result = validate(
            date("2025-03-05"),
            date("2025-03-03"),
            weekend(),
            date("2025-03-10"),
            &AuxiliaryChecks::default(),
        );
        assert!(!result.is_valid);
        assert_eq!(result.invalid_dates[0].reason, InvalidReason::InvertedRange);
    }

    #[test]
    fn test_saturday_is_rejected() {
        // 2025-01-04 is a Saturday.
        let result = validate(
            date("2025-01-04"),
            date("2025-01-04"),
            weekend(),
            date("2025-02-01"),
            &AuxiliaryChecks::default(),
        );
        assert!(!result.is_valid);
        assert_eq!(result.invalid_dates[0].reason, InvalidReason::Weekend);
        assert!(!result.has_range_failure());
    }

    #[test]
    fn test_collects_every_offending_date() {
        let holiday = date("2025-01-01");
        let leave_day = date("2025-01-08");
        let is_holiday = move |d: NaiveDate| d == holiday;
        let has_leave = move |d: NaiveDate| d == leave_day;
        let checks = AuxiliaryChecks::default()
            .with_holidays(&is_holiday)
            .with_leave_conflicts(&has_leave);

        let result = validate(
            date("2025-01-01"),
            date("2025-01-08"),
            weekend(),
            date("2025-02-01"),
            &checks,
        );

        let reasons: Vec<(NaiveDate, InvalidReason)> = result
            .invalid_dates
            .iter()
            .map(|d| (d.date, d.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (date("2025-01-01"), InvalidReason::Holiday),
                (date("2025-01-04"), InvalidReason::Weekend),
                (date("2025-01-05"), InvalidReason::Weekend),
                (date("2025-01-08"), InvalidReason::LeaveConflict),
            ]
        );
        assert!(!result.is_valid);
    }

    #[test]
    fn test_reason_serializes_as_label() {
        let json = serde_json::to_string(&InvalidReason::FutureOrTodayFrom).unwrap();
        assert_eq!(json, "\"future-or-today: from\"");
    }

    fn request(request_type: RequestType) -> RegularizationRequest {
        RegularizationRequest {
            id: None,
            employee_id: "e1".to_string(),
            request_type,
            from_date: date("2025-01-06"),
            to_date: date("2025-01-06"),
            expected_in: None,
            expected_out: None,
            reason: "Missed punch".to_string(),
            status: RequestStatus::Pending,
            manager_comment: None,
        }
    }

    #[test]
    fn test_request_fields() {
        assert!(check_request_fields(&request(RequestType::DayBased)).is_ok());

        let mut blank = request(RequestType::DayBased);
        blank.reason = "   ".to_string();
        assert!(matches!(check_request_fields(&blank), Err(AppError::Validation(_))));

        let mut timed = request(RequestType::TimeBased);
        assert!(check_request_fields(&timed).is_err());
        timed.expected_in = NaiveTime::from_hms_opt(9, 30, 0);
        timed.expected_out = NaiveTime::from_hms_opt(18, 0, 0);
        assert!(check_request_fields(&timed).is_ok());
        timed.expected_out = NaiveTime::from_hms_opt(9, 0, 0);
        assert!(check_request_fields(&timed).is_err());
    }
}
