//! Approval workflow
//!
//! Pending → Approved | Rejected, and Approved | Pending → Pending on recall.
//! Rejected is terminal. Timesheet headers take part with Submitted standing
//! in for Pending; a Draft header is outside the workflow.
//!
//! Approve and reject check the comment and the caller's capability before
//! touching the store. Every transition is one single-record update.

use std::sync::Arc;

use async_trait::async_trait;
use directory::{resolve_caller, Caller, DirectoryService};
use error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::Record;
use thiserror::Error;

use crate::models::{RequestStatus, TimesheetStatus};
use crate::repository::AttendanceRepository;

/// What kind of request a transition applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalSubject {
    Regularization,
    Timesheet,
}

impl ApprovalSubject {
    pub fn label(self) -> &'static str {
        match self {
            ApprovalSubject::Regularization => "regularization",
            ApprovalSubject::Timesheet => "timesheet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
    Recall,
}

impl ApprovalAction {
    pub fn label(self) -> &'static str {
        match self {
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject => "reject",
            ApprovalAction::Recall => "recall",
        }
    }
}

impl std::fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("cannot {action} a request that is {from}")]
pub struct TransitionError {
    pub from: RequestStatus,
    pub action: ApprovalAction,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// The approval state machine.
pub fn transition(
    current: RequestStatus,
    action: ApprovalAction,
) -> Result<RequestStatus, TransitionError> {
    match (current, action) {
        (RequestStatus::Pending, ApprovalAction::Approve) => Ok(RequestStatus::Approved),
        (RequestStatus::Pending, ApprovalAction::Reject) => Ok(RequestStatus::Rejected),
        (RequestStatus::Pending | RequestStatus::Approved, ApprovalAction::Recall) => {
            Ok(RequestStatus::Pending)
        }
        (from, action) => Err(TransitionError { from, action }),
    }
}

/// Message sent to the employee after a transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub subject: ApprovalSubject,
    pub record_id: i64,
    pub employee_id: String,
    pub status: RequestStatus,
    pub comment: Option<String>,
    pub actor: String,
}

/// Delivers transition notifications to employees.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError>;
}

/// Notifier that only writes a log event.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), AppError> {
        tracing::info!(
            subject = notification.subject.label(),
            record_id = notification.record_id,
            employee_id = %notification.employee_id,
            status = %notification.status,
            "Notify employee of {} decision",
            notification.subject.label()
        );
        Ok(())
    }
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub subject: ApprovalSubject,
    pub id: i64,
    pub employee_id: String,
    pub previous: RequestStatus,
    pub status: RequestStatus,
    pub manager_comment: Option<String>,
}

struct Snapshot {
    employee_id: String,
    state: RequestStatus,
    manager_comment: Option<String>,
}

/// Drives approve/reject/recall against the store.
pub struct ApprovalWorkflow {
    repo: AttendanceRepository,
    directory: Arc<dyn DirectoryService>,
    notifier: Arc<dyn Notifier>,
    manager_group: String,
    admin_group: String,
}

impl ApprovalWorkflow {
    pub fn new(
        repo: AttendanceRepository,
        directory: Arc<dyn DirectoryService>,
        notifier: Arc<dyn Notifier>,
        manager_group: impl Into<String>,
        admin_group: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            directory,
            notifier,
            manager_group: manager_group.into(),
            admin_group: admin_group.into(),
        }
    }

    /// Resolve the caller and their approval role.
    pub async fn caller(&self) -> Result<Caller, AppError> {
        Ok(resolve_caller(self.directory.as_ref(), &self.manager_group, &self.admin_group).await?)
    }

    pub async fn approve(
        &self,
        subject: ApprovalSubject,
        id: i64,
        comment: &str,
    ) -> Result<ApprovalOutcome, AppError> {
        self.decide(subject, id, ApprovalAction::Approve, comment).await
    }

    pub async fn reject(
        &self,
        subject: ApprovalSubject,
        id: i64,
        comment: &str,
    ) -> Result<ApprovalOutcome, AppError> {
        self.decide(subject, id, ApprovalAction::Reject, comment).await
    }

    /// Move an Approved or Pending request back to Pending.
    ///
    /// The manager comment is kept as history.
    pub async fn recall(&self, subject: ApprovalSubject, id: i64) -> Result<ApprovalOutcome, AppError> {
        let caller = self.caller().await?;
        let snapshot = self.load(subject, id).await?;

        if !caller.owns(&snapshot.employee_id) && !caller.can_approve() {
            return Err(AppError::Permission(format!(
                "only the requester or a manager can recall {} {}",
                subject.label(),
                id
            )));
        }

        let status = transition(snapshot.state, ApprovalAction::Recall)?;
        let mut partial = Record::new();
        partial.insert("Status".to_string(), status_value(subject, status)?);
        self.write(subject, id, partial).await?;

        self.finish(subject, id, &caller, snapshot, status, None).await
    }

    async fn decide(
        &self,
        subject: ApprovalSubject,
        id: i64,
        action: ApprovalAction,
        comment: &str,
    ) -> Result<ApprovalOutcome, AppError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(AppError::Validation(format!(
                "a comment is required to {} a {}",
                action,
                subject.label()
            )));
        }

        let caller = self.caller().await?;
        if !caller.can_approve() {
            tracing::warn!(
                user_id = caller.user.id,
                action = action.label(),
                "Approval attempted without manager capability"
            );
            return Err(AppError::Permission(format!(
                "{} cannot {} requests",
                caller.user.display_name, action
            )));
        }

        let snapshot = self.load(subject, id).await?;
        let status = transition(snapshot.state, action)?;

        let mut partial = Record::new();
        partial.insert("Status".to_string(), status_value(subject, status)?);
        partial.insert("ManagerComment".to_string(), Value::from(comment));
        self.write(subject, id, partial).await?;

        self.finish(subject, id, &caller, snapshot, status, Some(comment.to_string()))
            .await
    }

    async fn load(&self, subject: ApprovalSubject, id: i64) -> Result<Snapshot, AppError> {
        match subject {
            ApprovalSubject::Regularization => {
                let request = self.repo.get_regularization(id).await?;
                Ok(Snapshot {
                    employee_id: request.employee_id,
                    state: request.status,
                    manager_comment: request.manager_comment,
                })
            }
            ApprovalSubject::Timesheet => {
                let header = self.repo.get_header(id).await?;
                let state = match header.status {
                    TimesheetStatus::Draft => {
                        return Err(AppError::Validation(format!(
                            "timesheet {} has not been submitted",
                            id
                        )))
                    }
                    TimesheetStatus::Submitted => RequestStatus::Pending,
                    TimesheetStatus::Approved => RequestStatus::Approved,
                    TimesheetStatus::Rejected => RequestStatus::Rejected,
                };
                Ok(Snapshot {
                    employee_id: header.employee_id,
                    state,
                    manager_comment: header.manager_comment,
                })
            }
        }
    }

    async fn write(&self, subject: ApprovalSubject, id: i64, partial: Record) -> Result<(), AppError> {
        let collections = self.repo.collections();
        let collection = match subject {
            ApprovalSubject::Regularization => &collections.regularizations,
            ApprovalSubject::Timesheet => &collections.timesheet_headers,
        };
        self.repo.store().update(collection, id, partial).await?;
        Ok(())
    }

    async fn finish(
        &self,
        subject: ApprovalSubject,
        id: i64,
        caller: &Caller,
        snapshot: Snapshot,
        status: RequestStatus,
        new_comment: Option<String>,
    ) -> Result<ApprovalOutcome, AppError> {
        tracing::info!(
            subject = subject.label(),
            id,
            from = %snapshot.state,
            to = %status,
            actor = caller.user.id,
            "Approval state changed"
        );

        let manager_comment = new_comment.or(snapshot.manager_comment);
        let notification = Notification {
            subject,
            record_id: id,
            employee_id: snapshot.employee_id.clone(),
            status,
            comment: manager_comment.clone(),
            actor: caller.user.display_name.clone(),
        };
        if let Err(e) = self.notifier.notify(&notification).await {
            tracing::warn!(subject = subject.label(), id, "Notification failed: {}", e);
        }

        Ok(ApprovalOutcome {
            subject,
            id,
            employee_id: snapshot.employee_id,
            previous: snapshot.state,
            status,
            manager_comment,
        })
    }
}

fn status_value(subject: ApprovalSubject, status: RequestStatus) -> Result<Value, AppError> {
    let value = match subject {
        ApprovalSubject::Regularization => serde_json::to_value(status),
        ApprovalSubject::Timesheet => serde_json::to_value(match status {
            RequestStatus::Pending => TimesheetStatus::Submitted,
            RequestStatus::Approved => TimesheetStatus::Approved,
            RequestStatus::Rejected => TimesheetStatus::Rejected,
        }),
    };
    value.map_err(|e| AppError::Internal(e.to_string()))
}
