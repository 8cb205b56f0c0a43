//! Timesheet booking rules.

use chrono::{Datelike, Days, NaiveDate};
use error::AppError;

use crate::models::TimesheetStatus;

/// Tolerance for float sums of booked hours.
const HOURS_EPSILON: f64 = 1e-6;

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

/// A single line must book more than zero and at most `max_line_hours`.
pub fn check_line_hours(hours: f64, max_line_hours: f64) -> Result<(), AppError> {
    if !hours.is_finite() || hours <= 0.0 || hours > max_line_hours {
        return Err(AppError::Validation(format!(
            "hours booked must be greater than 0 and at most {}",
            max_line_hours
        )));
    }
    Ok(())
}

/// The day's lines, including the new booking, must fit in the available hours.
pub fn check_daily_capacity(
    work_date: NaiveDate,
    already_booked: f64,
    new_hours: f64,
    available: f64,
) -> Result<(), AppError> {
    if already_booked + new_hours > available + HOURS_EPSILON {
        return Err(AppError::Validation(format!(
            "{} has {:.2} available hours, {:.2} already booked, cannot add {:.2}",
            work_date, available, already_booked, new_hours
        )));
    }
    Ok(())
}

pub fn check_editable(status: TimesheetStatus) -> Result<(), AppError> {
    if status.is_editable() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "timesheet is {} and can no longer be changed",
            status.label()
        )))
    }
}

/// Draft is the only state that can be submitted.
pub fn submit(status: TimesheetStatus) -> Result<TimesheetStatus, AppError> {
    match status {
        TimesheetStatus::Draft => Ok(TimesheetStatus::Submitted),
        other => Err(AppError::Validation(format!(
            "only draft timesheets can be submitted, this one is {}",
            other.label()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_start() {
        assert_eq!(week_start(date(2025, 1, 8)), date(2025, 1, 6));
        assert_eq!(week_start(date(2025, 1, 6)), date(2025, 1, 6));
        assert_eq!(week_start(date(2025, 1, 5)), date(2024, 12, 30));
    }

    #[test]
    fn test_line_hours_bounds() {
        assert!(check_line_hours(0.5, 9.0).is_ok());
        assert!(check_line_hours(9.0, 9.0).is_ok());
        assert!(check_line_hours(0.0, 9.0).is_err());
        assert!(check_line_hours(9.25, 9.0).is_err());
        assert!(check_line_hours(f64::NAN, 9.0).is_err());
    }

    #[test]
    fn test_daily_capacity() {
        let d = date(2025, 1, 6);
        assert!(check_daily_capacity(d, 6.0, 2.0, 8.0).is_ok());
        assert!(check_daily_capacity(d, 3.3 + 3.3, 2.4, 9.0).is_ok());
        assert!(check_daily_capacity(d, 6.0, 2.5, 8.0).is_err());
        assert!(check_daily_capacity(d, 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_submit_only_from_draft() {
        assert_eq!(submit(TimesheetStatus::Draft).unwrap(), TimesheetStatus::Submitted);
        assert!(submit(TimesheetStatus::Submitted).is_err());
        assert!(submit(TimesheetStatus::Approved).is_err());
    }

    #[test]
    fn test_editable_states() {
        assert!(check_editable(TimesheetStatus::Submitted).is_ok());
        assert!(matches!(
            check_editable(TimesheetStatus::Approved),
            Err(AppError::Validation(_))
        ));
    }
}
