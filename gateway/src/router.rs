//! Service Router
//!
//! Routes requests to the attendance service via InProcess calls.
//! Parses the string dates that arrive over HTTP and resolves whose data a
//! request is about.

use std::sync::Arc;
use std::time::Duration;

use attendance_service::models::{RegularizationRequest, TimesheetHeader, TimesheetLine};
use attendance_service::{
    ApprovalAction, ApprovalOutcome, ApprovalSubject, AttendanceService, MonthCalendar,
    NewRegularization, NewTimesheetLine, RangeValidation, TimesheetProgress, WeekTimesheet,
};
use chrono::{Local, NaiveDate};
use directory::{Caller, EmployeeCache, UserInfo};
use error::{AppError, Result};
use tokio::sync::Mutex;

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::Validation(format!("invalid date '{}', expected YYYY-MM-DD", value))
    })
}

/// Service router that manages InProcess service calls
pub struct ServiceRouter {
    service: AttendanceService,
    employees: Mutex<EmployeeCache>,
    today: Clock,
}

impl ServiceRouter {
    pub fn new(service: AttendanceService, cache_ttl: Duration) -> Self {
        Self {
            service,
            employees: Mutex::new(EmployeeCache::new(cache_ttl)),
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Pin "today" to a fixed date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Arc::new(move || today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.today)()
    }

    pub fn service(&self) -> &AttendanceService {
        &self.service
    }

    pub async fn me(&self) -> Result<Caller> {
        self.service.caller().await
    }

    /// Month calendar for the caller, or for another employee when the
    /// caller is a manager.
    pub async fn calendar(
        &self,
        year: i32,
        month: u32,
        employee_id: Option<&str>,
    ) -> Result<MonthCalendar> {
        let caller = self.service.caller().await?;
        let employee_id = match employee_id {
            Some(id) if !caller.owns(id) => {
                if !caller.can_approve() {
                    return Err(AppError::Permission(format!(
                        "{} cannot view another employee's calendar",
                        caller.user.display_name
                    )));
                }
                id.to_lowercase()
            }
            _ => caller.user.employee_id(),
        };
        self.service.month_calendar(&employee_id, year, month).await
    }

    pub async fn fill_status(&self, date: &str) -> Result<TimesheetProgress> {
        let date = parse_date(date)?;
        let user = self.service.current_user().await?;
        self.service.fill_status(&user.employee_id(), date).await
    }

    pub async fn validate_regularization(&self, from: &str, to: &str) -> Result<RangeValidation> {
        let (from, to) = (parse_date(from)?, parse_date(to)?);
        let user = self.service.current_user().await?;
        self.service
            .validate_regularization_range(&user.employee_id(), from, to, self.today())
            .await
    }

    pub async fn submit_regularization(
        &self,
        input: NewRegularization,
    ) -> Result<RegularizationRequest> {
        self.service.submit_regularization(input, self.today()).await
    }

    pub async fn my_regularizations(&self) -> Result<Vec<RegularizationRequest>> {
        self.service.my_regularizations().await
    }

    pub async fn pending_regularizations(&self) -> Result<Vec<RegularizationRequest>> {
        self.service.pending_regularizations().await
    }

    pub async fn week_timesheet(&self, date: &str) -> Result<WeekTimesheet> {
        self.service.week_timesheet(parse_date(date)?).await
    }

    pub async fn add_timesheet_line(&self, input: NewTimesheetLine) -> Result<TimesheetLine> {
        self.service.add_timesheet_line(input).await
    }

    pub async fn update_timesheet_line(&self, line_id: i64, hours: f64) -> Result<TimesheetLine> {
        self.service.update_timesheet_line_hours(line_id, hours).await
    }

    pub async fn delete_timesheet_line(&self, line_id: i64) -> Result<()> {
        self.service.delete_timesheet_line(line_id).await
    }

    pub async fn submit_timesheet(&self, header_id: i64) -> Result<TimesheetHeader> {
        self.service.submit_timesheet(header_id).await
    }

    /// Apply an approval action. Recall ignores the comment.
    pub async fn decide(
        &self,
        subject: ApprovalSubject,
        id: i64,
        action: ApprovalAction,
        comment: Option<&str>,
    ) -> Result<ApprovalOutcome> {
        let comment = comment.unwrap_or_default();
        match action {
            ApprovalAction::Approve => self.service.approve(subject, id, comment).await,
            ApprovalAction::Reject => self.service.reject(subject, id, comment).await,
            ApprovalAction::Recall => self.service.recall(subject, id).await,
        }
    }

    /// Employee profile, served from the router's cache when fresh
    pub async fn employee(&self, id: i64) -> Result<UserInfo> {
        let mut cache = self.employees.lock().await;
        self.service.employee_profile(&mut cache, id).await
    }

    pub async fn forget_employee(&self, id: i64) {
        self.employees.lock().await.invalidate(id);
    }
}
