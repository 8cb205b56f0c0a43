//! Attendance models
//!
//! Stored records use the list column names (PascalCase, integer `Id`).
//! Derived view types such as [`CalendarDay`] serialize in camelCase.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

/// Set of weekdays treated as the weekend.
///
/// Days are numbered from Sunday = 0 to Saturday = 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct WeekendDays(u8);

impl WeekendDays {
    pub const fn none() -> Self {
        Self(0)
    }

    /// Saturday and Sunday.
    pub const fn saturday_sunday() -> Self {
        Self(0b100_0001)
    }

    pub fn from_sunday_indices(days: &[u32]) -> Result<Self, String> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                return Err(format!("weekday index out of range: {}", day));
            }
            mask |= 1 << day;
        }
        Ok(Self(mask))
    }

    /// Parse a comma separated index list such as `"0,6"`.
    pub fn parse(s: &str) -> Result<Self, String> {
        let days = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| format!("invalid weekday index: {}", part))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_sunday_indices(&days)
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn contains_date(self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    pub fn indices(self) -> Vec<u32> {
        (0..7).filter(|day| self.0 & (1 << day) != 0).collect()
    }
}

impl TryFrom<Vec<u32>> for WeekendDays {
    type Error = String;

    fn try_from(days: Vec<u32>) -> Result<Self, Self::Error> {
        Self::from_sunday_indices(&days)
    }
}

impl From<WeekendDays> for Vec<u32> {
    fn from(days: WeekendDays) -> Self {
        days.indices()
    }
}

/// Where a punch record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PunchSource {
    #[default]
    Synced,
    Manual,
    #[serde(other)]
    Other,
}

/// Biometric in/out summary for one employee-day. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PunchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub employee_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub first_in: Option<NaiveTime>,
    #[serde(default)]
    pub last_out: Option<NaiveTime>,
    #[serde(default)]
    pub total_hours: f64,
    #[serde(default)]
    pub source_status: PunchSource,
}

impl PunchRecord {
    pub fn new(employee_id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            employee_id: employee_id.into(),
            date,
            first_in: None,
            last_out: None,
            total_hours: 0.0,
            source_status: PunchSource::Synced,
        }
    }

    /// A punch counts as presence only when a first-in was recorded.
    pub fn is_presence(&self) -> bool {
        self.first_in.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Casual,
    Earned,
}

impl LeaveType {
    pub fn label(self) -> &'static str {
        match self {
            LeaveType::Sick => "Sick Leave",
            LeaveType::Casual => "Casual Leave",
            LeaveType::Earned => "Earned Leave",
        }
    }
}

/// Approval status shared by leave records and regularization requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RequestStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Approved => "Approved",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Leave owned by the leave-management system. Read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LeaveRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub employee_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub leave_type: LeaveType,
    pub status: RequestStatus,
    #[serde(default)]
    pub is_half_day: bool,
}

impl LeaveRecord {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn is_approved(&self) -> bool {
        self.status == RequestStatus::Approved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimesheetStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl TimesheetStatus {
    /// Lines can be added, changed or removed only before a decision.
    pub fn is_editable(self) -> bool {
        match self {
            TimesheetStatus::Draft | TimesheetStatus::Submitted => true,
            TimesheetStatus::Approved | TimesheetStatus::Rejected => false,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimesheetStatus::Draft => "Draft",
            TimesheetStatus::Submitted => "Submitted",
            TimesheetStatus::Approved => "Approved",
            TimesheetStatus::Rejected => "Rejected",
        }
    }
}

/// One timesheet per employee per week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimesheetHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub employee_id: String,
    /// Always a Monday
    pub week_start_date: NaiveDate,
    #[serde(default)]
    pub status: TimesheetStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_comment: Option<String>,
}

impl TimesheetHeader {
    pub fn new(employee_id: impl Into<String>, week_start_date: NaiveDate) -> Self {
        Self {
            id: None,
            employee_id: employee_id.into(),
            week_start_date,
            status: TimesheetStatus::Draft,
            manager_comment: None,
        }
    }
}

/// A project/task/hours entry within a weekly timesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TimesheetLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub header_id: i64,
    pub work_date: NaiveDate,
    pub project_no: String,
    pub task_no: String,
    pub hours_booked: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestType {
    DayBased,
    TimeBased,
}

impl RequestType {
    pub fn label(self) -> &'static str {
        match self {
            RequestType::DayBased => "Day based",
            RequestType::TimeBased => "Time based",
        }
    }
}

/// Employee correction request for a past attendance discrepancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegularizationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub employee_id: String,
    pub request_type: RequestType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_in: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_out: Option<NaiveTime>,
    pub reason: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_comment: Option<String>,
}

/// Public holiday entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Holiday {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub date: NaiveDate,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Present,
    Absent,
    Holiday,
    Leave,
    Weekend,
    /// Grid padding outside the month; never produced for a real day
    Empty,
}

impl DayStatus {
    pub fn label(self) -> &'static str {
        match self {
            DayStatus::Present => "Present",
            DayStatus::Absent => "Absent",
            DayStatus::Holiday => "Holiday",
            DayStatus::Leave => "On Leave",
            DayStatus::Weekend => "Weekend",
            DayStatus::Empty => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FillStatus {
    NotFilled,
    Partial,
    Completed,
}

impl FillStatus {
    pub fn label(self) -> &'static str {
        match self {
            FillStatus::NotFilled => "Not filled",
            FillStatus::Partial => "Partially filled",
            FillStatus::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetProgress {
    /// Always within 0..=100
    pub percentage: f64,
    pub status: FillStatus,
}

/// One reconciled day of an employee's attendance calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leave_type: Option<LeaveType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_punch_in: Option<NaiveTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_punch_out: Option<NaiveTime>,
    pub total_hours: f64,
    pub available_hours: f64,
    pub timesheet_hours: f64,
    pub timesheet_progress: TimesheetProgress,
}
