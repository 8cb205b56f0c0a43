//! Attendance Service
//!
//! Attendance calendar, timesheet fill status, regularization requests and
//! their approval workflow. The gateway calls [`AttendanceService`] in-process.

pub mod calendar;
pub mod fill;
pub mod models;
pub mod regularization;
pub mod repository;
pub mod service;
pub mod timesheet;
pub mod workflow;

pub use calendar::{build_calendar, CalendarInputs, CalendarPolicy, CalendarSummary};
pub use models::{CalendarDay, DayStatus, FillStatus, TimesheetProgress, WeekendDays};
pub use regularization::{validate, InvalidReason, RangeValidation};
pub use repository::{AttendanceRepository, Collections};
pub use service::{
    AttendanceService, MonthCalendar, NewRegularization, NewTimesheetLine, WeekTimesheet,
};
pub use workflow::{
    transition, ApprovalAction, ApprovalOutcome, ApprovalSubject, ApprovalWorkflow, LogNotifier,
    Notification, Notifier,
};

/// Service configuration
#[derive(Debug, Clone)]
pub struct AttendanceConfig {
    /// Most hours a single day can make available for booking
    pub daily_hour_cap: f64,
    /// Most hours a single timesheet line may book
    pub max_line_hours: f64,
    pub weekend: WeekendDays,
    pub manager_group: String,
    pub admin_group: String,
    pub collections: Collections,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            daily_hour_cap: 9.0,
            max_line_hours: 9.0,
            weekend: WeekendDays::saturday_sunday(),
            manager_group: String::from("Managers"),
            admin_group: String::from("Administrators"),
            collections: Collections::default(),
        }
    }
}

impl AttendanceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(cap) = std::env::var("DAILY_HOUR_CAP") {
            if let Ok(cap) = cap.parse() {
                config.daily_hour_cap = cap;
            }
        }

        if let Ok(max) = std::env::var("MAX_LINE_HOURS") {
            if let Ok(max) = max.parse() {
                config.max_line_hours = max;
            }
        }

        if let Ok(days) = std::env::var("WEEKEND_DAYS") {
            match WeekendDays::parse(&days) {
                Ok(weekend) => config.weekend = weekend,
                Err(e) => tracing::warn!("Ignoring WEEKEND_DAYS={}: {}", days, e),
            }
        }

        if let Ok(group) = std::env::var("MANAGER_GROUP") {
            config.manager_group = group;
        }

        if let Ok(group) = std::env::var("ADMIN_GROUP") {
            config.admin_group = group;
        }

        override_collections(&mut config.collections, |key| std::env::var(key).ok());

        config
    }

    pub fn calendar_policy(&self) -> CalendarPolicy {
        CalendarPolicy {
            weekend: self.weekend,
            daily_hour_cap: self.daily_hour_cap,
        }
    }
}

/// Apply `*_COLLECTION` overrides found through `lookup`.
fn override_collections(collections: &mut Collections, lookup: impl Fn(&str) -> Option<String>) {
    let targets = [
        ("PUNCH_COLLECTION", &mut collections.punches),
        ("LEAVE_COLLECTION", &mut collections.leaves),
        ("TIMESHEET_HEADER_COLLECTION", &mut collections.timesheet_headers),
        ("TIMESHEET_LINE_COLLECTION", &mut collections.timesheet_lines),
        ("REGULARIZATION_COLLECTION", &mut collections.regularizations),
        ("HOLIDAY_COLLECTION", &mut collections.holidays),
    ];
    for (key, name) in targets {
        if let Some(value) = lookup(key) {
            *name = value;
        }
    }
}
