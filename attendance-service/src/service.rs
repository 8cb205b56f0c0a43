//! Attendance service
//!
//! Business operations over the attendance collections.
//! Fetches what the pure calendar, fill and validation code needs, applies
//! ownership checks and delegates approvals to [`ApprovalWorkflow`].

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Months, NaiveDate, NaiveTime};
use directory::{Caller, DirectoryService, EmployeeCache, UserInfo};
use error::{AppError, StoreError};
use serde::{Deserialize, Serialize};
use store::RecordStore;

use crate::calendar::{build_calendar, reconcile_day, CalendarInputs, CalendarSummary};
use crate::fill;
use crate::models::{
    CalendarDay, LeaveRecord, RegularizationRequest, RequestStatus, RequestType, TimesheetHeader,
    TimesheetLine, TimesheetProgress,
};
use crate::regularization::{self, check_request_fields, AuxiliaryChecks, RangeValidation};
use crate::repository::AttendanceRepository;
use crate::timesheet::{self, check_daily_capacity, check_editable, check_line_hours, week_start};
use crate::workflow::{ApprovalOutcome, ApprovalSubject, ApprovalWorkflow, LogNotifier, Notifier};
use crate::AttendanceConfig;

/// One employee's reconciled month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthCalendar {
    pub employee_id: String,
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
    pub summary: CalendarSummary,
}

/// The caller's timesheet for one week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTimesheet {
    pub week_start_date: NaiveDate,
    pub header: Option<TimesheetHeader>,
    pub lines: Vec<TimesheetLine>,
}

/// Input for booking hours against a project task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimesheetLine {
    pub work_date: NaiveDate,
    pub project_no: String,
    pub task_no: String,
    pub hours_booked: f64,
}

/// Input for a regularization request; the owner is always the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRegularization {
    pub request_type: RequestType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    #[serde(default)]
    pub expected_in: Option<NaiveTime>,
    #[serde(default)]
    pub expected_out: Option<NaiveTime>,
    pub reason: String,
}

/// First and last day of a month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((first, last))
}

fn booked_on(lines: &[TimesheetLine], date: NaiveDate, except: Option<i64>) -> f64 {
    lines
        .iter()
        .filter(|l| l.work_date == date && (except.is_none() || l.id != except))
        .map(|l| l.hours_booked)
        .sum()
}

fn ensure_owner(user: &UserInfo, employee_id: &str) -> Result<(), AppError> {
    if user.employee_id() == employee_id.to_lowercase() {
        Ok(())
    } else {
        Err(AppError::Permission(format!(
            "{} does not own this timesheet",
            user.display_name
        )))
    }
}

/// Skip an auxiliary check when its data cannot be fetched right now.
fn fail_open<T>(check: &'static str, result: Result<T, StoreError>) -> Result<Option<T>, AppError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let e = AppError::from(e);
            if e.is_retryable() {
                tracing::warn!(policy = "fail-open", check, "Skipping {} check: {}", check, e);
                Ok(None)
            } else {
                Err(e)
            }
        }
    }
}

/// Attendance service for business operations
pub struct AttendanceService {
    repo: AttendanceRepository,
    directory: Arc<dyn DirectoryService>,
    workflow: ApprovalWorkflow,
    config: AttendanceConfig,
}

impl AttendanceService {
    /// Create a service that logs notifications
    pub fn new(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn DirectoryService>,
        config: AttendanceConfig,
    ) -> Self {
        Self::with_notifier(store, directory, Arc::new(LogNotifier), config)
    }

    pub fn with_notifier(
        store: Arc<dyn RecordStore>,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<dyn Notifier>,
        config: AttendanceConfig,
    ) -> Self {
        let repo = AttendanceRepository::new(store, config.collections.clone());
        let workflow = ApprovalWorkflow::new(
            repo.clone(),
            directory.clone(),
            notifier,
            config.manager_group.clone(),
            config.admin_group.clone(),
        );
        Self {
            repo,
            directory,
            workflow,
            config,
        }
    }

    pub fn config(&self) -> &AttendanceConfig {
        &self.config
    }

    pub fn repository(&self) -> &AttendanceRepository {
        &self.repo
    }

    pub async fn current_user(&self) -> Result<UserInfo, AppError> {
        Ok(self.directory.current_user().await?)
    }

    /// Current user together with their approval role
    pub async fn caller(&self) -> Result<Caller, AppError> {
        self.workflow.caller().await
    }

    /// Build the attendance calendar for an employee's month
    pub async fn month_calendar(
        &self,
        employee_id: &str,
        year: i32,
        month: u32,
    ) -> Result<MonthCalendar, AppError> {
        let (first, last) = month_bounds(year, month)
            .ok_or_else(|| AppError::Validation(format!("invalid month {}-{:02}", year, month)))?;

        let (punches, leaves, holidays, headers) = tokio::join!(
            self.repo.punches_between(employee_id, first, last),
            self.repo.leaves_overlapping(employee_id, first, last),
            self.repo.holidays_between(first, last),
            self.repo
                .headers_between(employee_id, week_start(first), week_start(last)),
        );
        let (punches, leaves, holidays, headers) = (punches?, leaves?, holidays?, headers?);

        let mut lines = Vec::new();
        for id in headers.iter().filter_map(|h| h.id) {
            lines.extend(self.repo.lines_for_header(id).await?);
        }

        let inputs = CalendarInputs {
            punches: &punches,
            leaves: &leaves,
            lines: &lines,
            holidays: &holidays,
        };
        let days = build_calendar(employee_id, year, month, &inputs, &self.config.calendar_policy());
        let summary = CalendarSummary::from_days(&days);

        tracing::debug!(
            employee_id,
            year,
            month,
            punches = punches.len(),
            lines = lines.len(),
            "Month calendar built"
        );

        Ok(MonthCalendar {
            employee_id: employee_id.to_string(),
            year,
            month,
            days,
            summary,
        })
    }

    /// Reconcile one employee-date, counting `lines` booked on it.
    async fn day_on(
        &self,
        employee_id: &str,
        date: NaiveDate,
        lines: &[TimesheetLine],
    ) -> Result<CalendarDay, AppError> {
        let (punches, leaves, holidays) = tokio::join!(
            self.repo.punches_between(employee_id, date, date),
            self.repo.leaves_overlapping(employee_id, date, date),
            self.repo.holidays_between(date, date),
        );
        let (punches, leaves, holidays) = (punches?, leaves?, holidays?);

        let inputs = CalendarInputs {
            punches: &punches,
            leaves: &leaves,
            lines,
            holidays: &holidays,
        };
        Ok(reconcile_day(employee_id, date, &inputs, &self.config.calendar_policy()))
    }

    /// Timesheet fill progress for one employee-day
    pub async fn fill_status(
        &self,
        employee_id: &str,
        date: NaiveDate,
    ) -> Result<TimesheetProgress, AppError> {
        let lines = match self
            .repo
            .header_for_week(employee_id, week_start(date))
            .await?
            .and_then(|h| h.id)
        {
            Some(id) => self.repo.lines_for_header(id).await?,
            None => Vec::new(),
        };
        Ok(self.day_on(employee_id, date, &lines).await?.timesheet_progress)
    }

    /// Validate a regularization range with holiday and leave data.
    ///
    /// Range-level failures are returned before anything is fetched.
    /// Holidays or leave that cannot be fetched are skipped with a warning.
    pub async fn validate_regularization_range(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        today: NaiveDate,
    ) -> Result<RangeValidation, AppError> {
        let weekend = self.config.weekend;
        let bare = regularization::validate(from, to, weekend, today, &AuxiliaryChecks::default());
        if bare.has_range_failure() {
            return Ok(bare);
        }

        let (holidays, leaves) = tokio::join!(
            self.repo.holidays_between(from, to),
            self.repo.leaves_overlapping(employee_id, from, to),
        );
        let holidays: Option<HashSet<NaiveDate>> =
            fail_open("holiday", holidays)?.map(|h| h.into_iter().map(|h| h.date).collect());
        let leaves: Option<Vec<LeaveRecord>> = fail_open("leave-conflict", leaves)?.map(|l| {
            l.into_iter()
                .filter(|l| l.status != RequestStatus::Rejected)
                .collect()
        });

        let is_holiday = |date: NaiveDate| holidays.as_ref().is_some_and(|set| set.contains(&date));
        let has_leave =
            |date: NaiveDate| leaves.as_ref().is_some_and(|ls| ls.iter().any(|l| l.covers(date)));

        let mut checks = AuxiliaryChecks::default();
        if holidays.is_some() {
            checks = checks.with_holidays(&is_holiday);
        }
        if leaves.is_some() {
            checks = checks.with_leave_conflicts(&has_leave);
        }
        Ok(regularization::validate(from, to, weekend, today, &checks))
    }

    /// Submit a regularization request for the caller
    pub async fn submit_regularization(
        &self,
        input: NewRegularization,
        today: NaiveDate,
    ) -> Result<RegularizationRequest, AppError> {
        let user = self.current_user().await?;
        let request = RegularizationRequest {
            id: None,
            employee_id: user.employee_id(),
            request_type: input.request_type,
            from_date: input.from_date,
            to_date: input.to_date,
            expected_in: input.expected_in,
            expected_out: input.expected_out,
            reason: input.reason.trim().to_string(),
            status: RequestStatus::Pending,
            manager_comment: None,
        };
        check_request_fields(&request)?;

        let validation = self
            .validate_regularization_range(
                &request.employee_id,
                request.from_date,
                request.to_date,
                today,
            )
            .await?;
        if !validation.is_valid {
            return Err(AppError::Validation(format!(
                "invalid dates: {}",
                validation.describe()
            )));
        }

        let created = self.repo.create_regularization(&request).await?;
        tracing::info!(
            employee_id = %created.employee_id,
            id = ?created.id,
            from = %created.from_date,
            to = %created.to_date,
            "Regularization submitted"
        );
        Ok(created)
    }

    /// The caller's own regularization requests, newest first
    pub async fn my_regularizations(&self) -> Result<Vec<RegularizationRequest>, AppError> {
        let user = self.current_user().await?;
        Ok(self.repo.regularizations_for(&user.employee_id()).await?)
    }

    /// Requests waiting for a decision; managers and admins only
    pub async fn pending_regularizations(&self) -> Result<Vec<RegularizationRequest>, AppError> {
        let caller = self.workflow.caller().await?;
        if !caller.can_approve() {
            return Err(AppError::Permission(format!(
                "{} cannot review requests",
                caller.user.display_name
            )));
        }
        self.repo.pending_regularizations().await
    }

    /// The caller's timesheet for the week containing `date`
    pub async fn week_timesheet(&self, date: NaiveDate) -> Result<WeekTimesheet, AppError> {
        let user = self.current_user().await?;
        let week = week_start(date);
        let header = self.repo.header_for_week(&user.employee_id(), week).await?;
        let lines = match header.as_ref().and_then(|h| h.id) {
            Some(id) => self.repo.lines_for_header(id).await?,
            None => Vec::new(),
        };
        Ok(WeekTimesheet {
            week_start_date: week,
            header,
            lines,
        })
    }

    /// Book hours for the caller, creating the week's header on first use
    pub async fn add_timesheet_line(&self, input: NewTimesheetLine) -> Result<TimesheetLine, AppError> {
        check_line_hours(input.hours_booked, self.config.max_line_hours)?;
        if input.project_no.trim().is_empty() || input.task_no.trim().is_empty() {
            return Err(AppError::Validation(
                "project and task are required".to_string(),
            ));
        }

        let user = self.current_user().await?;
        let employee_id = user.employee_id();
        let week = week_start(input.work_date);

        let existing = self.repo.header_for_week(&employee_id, week).await?;
        let booked = match &existing {
            Some(header) => {
                check_editable(header.status)?;
                match header.id {
                    Some(id) => booked_on(&self.repo.lines_for_header(id).await?, input.work_date, None),
                    None => 0.0,
                }
            }
            None => 0.0,
        };

        let available = self
            .day_on(&employee_id, input.work_date, &[])
            .await?
            .available_hours;
        check_daily_capacity(input.work_date, booked, input.hours_booked, available)?;

        let header = match existing {
            Some(header) => header,
            None => {
                let created = self
                    .repo
                    .create_header(&TimesheetHeader::new(&employee_id, week))
                    .await?;
                tracing::info!(employee_id = %employee_id, week = %week, "Timesheet header created");
                created
            }
        };
        let header_id = header
            .id
            .ok_or_else(|| AppError::Internal("timesheet header has no id".to_string()))?;

        let line = TimesheetLine {
            id: None,
            header_id,
            work_date: input.work_date,
            project_no: input.project_no.trim().to_string(),
            task_no: input.task_no.trim().to_string(),
            hours_booked: input.hours_booked,
        };
        self.repo.create_line(&line).await
    }

    /// Change the hours on one of the caller's lines
    pub async fn update_timesheet_line_hours(
        &self,
        line_id: i64,
        hours: f64,
    ) -> Result<TimesheetLine, AppError> {
        check_line_hours(hours, self.config.max_line_hours)?;

        let user = self.current_user().await?;
        let mut line = self.repo.get_line(line_id).await?;
        let header = self.repo.get_header(line.header_id).await?;
        ensure_owner(&user, &header.employee_id)?;
        check_editable(header.status)?;

        let (lines, day) = tokio::join!(
            self.repo.lines_for_header(line.header_id),
            self.day_on(&header.employee_id, line.work_date, &[]),
        );
        let booked = booked_on(&lines?, line.work_date, Some(line_id));
        let available = day?.available_hours;
        check_daily_capacity(line.work_date, booked, hours, available)?;

        self.repo.set_line_hours(line_id, hours).await?;
        line.hours_booked = hours;
        Ok(line)
    }

    pub async fn delete_timesheet_line(&self, line_id: i64) -> Result<(), AppError> {
        let user = self.current_user().await?;
        let line = self.repo.get_line(line_id).await?;
        let header = self.repo.get_header(line.header_id).await?;
        ensure_owner(&user, &header.employee_id)?;
        check_editable(header.status)?;

        self.repo.delete_line(line_id).await?;
        Ok(())
    }

    /// Submit the caller's draft timesheet for approval
    pub async fn submit_timesheet(&self, header_id: i64) -> Result<TimesheetHeader, AppError> {
        let user = self.current_user().await?;
        let mut header = self.repo.get_header(header_id).await?;
        ensure_owner(&user, &header.employee_id)?;
        let next = timesheet::submit(header.status)?;

        if self.repo.lines_for_header(header_id).await?.is_empty() {
            return Err(AppError::Validation(
                "cannot submit a timesheet without lines".to_string(),
            ));
        }

        self.repo.set_header_status(header_id, next).await?;
        header.status = next;
        tracing::info!(header_id, employee_id = %header.employee_id, "Timesheet submitted");
        Ok(header)
    }

    pub async fn approve(
        &self,
        subject: ApprovalSubject,
        id: i64,
        comment: &str,
    ) -> Result<ApprovalOutcome, AppError> {
        self.workflow.approve(subject, id, comment).await
    }

    pub async fn reject(
        &self,
        subject: ApprovalSubject,
        id: i64,
        comment: &str,
    ) -> Result<ApprovalOutcome, AppError> {
        self.workflow.reject(subject, id, comment).await
    }

    pub async fn recall(&self, subject: ApprovalSubject, id: i64) -> Result<ApprovalOutcome, AppError> {
        self.workflow.recall(subject, id).await
    }

    /// Look up an employee through the caller's cache
    pub async fn employee_profile(
        &self,
        cache: &mut EmployeeCache,
        id: i64,
    ) -> Result<UserInfo, AppError> {
        cache
            .lookup(self.directory.as_ref(), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {}", id)))
    }
}
