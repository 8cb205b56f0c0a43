//! Attendance calendar
//!
//! Reconciles punches, leaves, holidays and timesheet lines into one
//! [`CalendarDay`] per day of a month.
//!
//! Precedence for a single date: approved leave, then weekend, then holiday,
//! then punch presence, otherwise absent. A date carrying both leave and a
//! punch is inconsistent data; the leave is authoritative and the punch is
//! ignored.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::fill;
use crate::models::{
    CalendarDay, DayStatus, FillStatus, Holiday, LeaveRecord, PunchRecord, TimesheetLine,
    TimesheetProgress, WeekendDays,
};

/// Records fetched for one employee and month.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarInputs<'a> {
    pub punches: &'a [PunchRecord],
    pub leaves: &'a [LeaveRecord],
    pub lines: &'a [TimesheetLine],
    pub holidays: &'a [Holiday],
}

/// Calendar rules that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct CalendarPolicy {
    pub weekend: WeekendDays,
    /// Upper bound on hours a single day can make available for timesheets
    pub daily_hour_cap: f64,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self {
            weekend: WeekendDays::saturday_sunday(),
            daily_hour_cap: 9.0,
        }
    }
}

/// Hours a punch makes available for timesheet booking.
pub fn available_hours(punch: Option<&PunchRecord>, daily_hour_cap: f64) -> f64 {
    match punch {
        Some(p) if p.is_presence() => p.total_hours.max(0.0).min(daily_hour_cap),
        _ => 0.0,
    }
}

/// One employee's records indexed by date.
struct DayIndex<'a> {
    punches: HashMap<NaiveDate, &'a PunchRecord>,
    leaves: Vec<&'a LeaveRecord>,
    holidays: HashSet<NaiveDate>,
    booked: HashMap<NaiveDate, f64>,
}

impl<'a> DayIndex<'a> {
    fn new(employee_id: &str, inputs: &CalendarInputs<'a>) -> Self {
        let mut punches: HashMap<NaiveDate, &PunchRecord> = HashMap::new();
        for punch in inputs
            .punches
            .iter()
            .filter(|p| p.employee_id == employee_id && p.is_presence())
        {
            // Keep the earliest first-in when a day was punched twice.
            punches
                .entry(punch.date)
                .and_modify(|kept| {
                    if punch.first_in < kept.first_in {
                        *kept = punch;
                    }
                })
                .or_insert(punch);
        }

        let leaves = inputs
            .leaves
            .iter()
            .filter(|l| l.employee_id == employee_id && l.is_approved())
            .collect();

        let holidays = inputs.holidays.iter().map(|h| h.date).collect();

        let mut booked: HashMap<NaiveDate, f64> = HashMap::new();
        for line in inputs.lines {
            *booked.entry(line.work_date).or_insert(0.0) += line.hours_booked;
        }

        Self {
            punches,
            leaves,
            holidays,
            booked,
        }
    }

    fn day(&self, date: NaiveDate, policy: &CalendarPolicy) -> CalendarDay {
        let leave = self.leaves.iter().find(|l| l.covers(date));
        let punch = self.punches.get(&date).copied();

        let status = if leave.is_some() {
            DayStatus::Leave
        } else if policy.weekend.contains_date(date) {
            DayStatus::Weekend
        } else if self.holidays.contains(&date) {
            DayStatus::Holiday
        } else if punch.is_some() {
            DayStatus::Present
        } else {
            DayStatus::Absent
        };

        let punch = if status == DayStatus::Present { punch } else { None };
        let available = available_hours(punch, policy.daily_hour_cap);
        let timesheet_hours = self.booked.get(&date).copied().unwrap_or(0.0);

        CalendarDay {
            date,
            status,
            leave_type: leave.map(|l| l.leave_type),
            first_punch_in: punch.and_then(|p| p.first_in),
            last_punch_out: punch.and_then(|p| p.last_out),
            total_hours: punch.map_or(0.0, |p| p.total_hours),
            available_hours: available,
            timesheet_hours,
            timesheet_progress: fill::compute(timesheet_hours, available),
        }
    }
}

/// Build the calendar for `employee_id` in `year`/`month`.
///
/// Records belonging to other employees are ignored and only approved leave
/// counts. An impossible month yields an empty calendar.
pub fn build_calendar(
    employee_id: &str,
    year: i32,
    month: u32,
    inputs: &CalendarInputs<'_>,
    policy: &CalendarPolicy,
) -> Vec<CalendarDay> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let index = DayIndex::new(employee_id, inputs);
    first
        .iter_days()
        .take_while(|date| date.month() == month)
        .map(|date| index.day(date, policy))
        .collect()
}

/// Reconcile a single employee-date with the same rules as [`build_calendar`].
///
/// Timesheet writes use this for the hours a day makes available, so a
/// booking can never exceed what the calendar shows.
pub fn reconcile_day(
    employee_id: &str,
    date: NaiveDate,
    inputs: &CalendarInputs<'_>,
    policy: &CalendarPolicy,
) -> CalendarDay {
    DayIndex::new(employee_id, inputs).day(date, policy)
}

/// Placeholder cell for grid positions outside the month.
pub fn padding_day(date: NaiveDate) -> CalendarDay {
    CalendarDay {
        date,
        status: DayStatus::Empty,
        leave_type: None,
        first_punch_in: None,
        last_punch_out: None,
        total_hours: 0.0,
        available_hours: 0.0,
        timesheet_hours: 0.0,
        timesheet_progress: TimesheetProgress {
            percentage: 0.0,
            status: FillStatus::NotFilled,
        },
    }
}

/// Pad a month to whole weeks starting on `week_start`.
pub fn pad_to_weeks(days: &[CalendarDay], week_start: Weekday) -> Vec<CalendarDay> {
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Vec::new();
    };

    let lead = (7 + first.date.weekday().num_days_from_monday()
        - week_start.num_days_from_monday())
        % 7;
    let trail = (7 + week_start.pred().num_days_from_monday()
        - last.date.weekday().num_days_from_monday())
        % 7;

    let mut grid = Vec::with_capacity(days.len() + 12);
    grid.extend(
        (1..=lead)
            .rev()
            .filter_map(|n| first.date.checked_sub_days(chrono::Days::new(u64::from(n))))
            .map(padding_day),
    );
    grid.extend_from_slice(days);
    grid.extend(
        (1..=trail)
            .filter_map(|n| last.date.checked_add_days(chrono::Days::new(u64::from(n))))
            .map(padding_day),
    );
    grid
}

/// Month totals for the calendar header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarSummary {
    pub present_days: u32,
    pub absent_days: u32,
    pub leave_days: u32,
    pub holiday_days: u32,
    pub weekend_days: u32,
    pub total_hours: f64,
    pub timesheet_hours: f64,
    /// Days whose timesheet reached the available hours
    pub completed_days: u32,
}

impl CalendarSummary {
    pub fn from_days(days: &[CalendarDay]) -> Self {
        let mut summary = Self::default();
        for day in days {
            match day.status {
                DayStatus::Present => summary.present_days += 1,
                DayStatus::Absent => summary.absent_days += 1,
                DayStatus::Leave => summary.leave_days += 1,
                DayStatus::Holiday => summary.holiday_days += 1,
                DayStatus::Weekend => summary.weekend_days += 1,
                DayStatus::Empty => {}
            }
            summary.total_hours += day.total_hours;
            summary.timesheet_hours += day.timesheet_hours;
            if day.timesheet_progress.status == FillStatus::Completed {
                summary.completed_days += 1;
            }
        }
        summary
    }
}
