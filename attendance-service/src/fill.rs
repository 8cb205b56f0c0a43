//! Timesheet fill status.

use crate::models::{FillStatus, TimesheetProgress};

/// Slack for float noise in summed line hours.
const HOURS_EPSILON: f64 = 1e-6;

/// Compare booked hours against the hours expected for the day.
///
/// Status comes from the unrounded ratio; only a sum within float noise of
/// the expected hours counts as complete. Negative inputs are the caller's
/// problem; the percentage is still clamped to `0..=100`.
pub fn compute(total_filled_hours: f64, expected_daily_hours: f64) -> TimesheetProgress {
    if expected_daily_hours <= 0.0 {
        return TimesheetProgress {
            percentage: 0.0,
            status: FillStatus::NotFilled,
        };
    }

    let (percentage, status) = if total_filled_hours + HOURS_EPSILON >= expected_daily_hours {
        (100.0, FillStatus::Completed)
    } else if total_filled_hours > 0.0 {
        let ratio = total_filled_hours / expected_daily_hours * 100.0;
        (ratio.clamp(0.0, 100.0), FillStatus::Partial)
    } else {
        (0.0, FillStatus::NotFilled)
    };

    TimesheetProgress { percentage, status }
}
