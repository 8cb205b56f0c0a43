//! Attendance repository
//!
//! Typed access to the attendance collections on top of a [`RecordStore`].

use std::sync::Arc;

use chrono::NaiveDate;
use error::{AppError, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{record_id, Filter, OrderBy, Query, Record, RecordStore};

use crate::models::{
    Holiday, LeaveRecord, PunchRecord, RegularizationRequest, RequestStatus, TimesheetHeader,
    TimesheetLine, TimesheetStatus,
};

/// Names of the backing collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collections {
    pub punches: String,
    pub leaves: String,
    pub timesheet_headers: String,
    pub timesheet_lines: String,
    pub regularizations: String,
    pub holidays: String,
}

impl Default for Collections {
    fn default() -> Self {
        Self {
            punches: "PunchRecords".to_string(),
            leaves: "LeaveRecords".to_string(),
            timesheet_headers: "TimesheetHeaders".to_string(),
            timesheet_lines: "TimesheetLines".to_string(),
            regularizations: "Regularizations".to_string(),
            holidays: "Holidays".to_string(),
        }
    }
}

/// Serialize a model into a store record.
pub fn to_record<T: Serialize>(model: &T) -> Result<Record, AppError> {
    match serde_json::to_value(model) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AppError::Internal("model did not serialize to an object".to_string())),
        Err(e) => Err(AppError::Internal(e.to_string())),
    }
}

/// Deserialize a store record into a model.
pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, StoreError> {
    let id = record_id(&record);
    serde_json::from_value(Value::Object(record))
        .map_err(|e| StoreError::Malformed(format!("record {:?}: {}", id, e)))
}

fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> Result<Vec<T>, StoreError> {
    records.into_iter().map(from_record).collect()
}

fn date_value(date: NaiveDate) -> Value {
    Value::from(date.format("%Y-%m-%d").to_string())
}

fn status_value<T: Serialize>(status: T) -> Result<Value, AppError> {
    serde_json::to_value(status).map_err(|e| AppError::Internal(e.to_string()))
}

/// Repository over the attendance collections.
#[derive(Clone)]
pub struct AttendanceRepository {
    store: Arc<dyn RecordStore>,
    collections: Collections,
}

impl AttendanceRepository {
    pub fn new(store: Arc<dyn RecordStore>, collections: Collections) -> Self {
        Self { store, collections }
    }

    pub fn collections(&self) -> &Collections {
        &self.collections
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Punches for an employee between two dates, inclusive.
    pub async fn punches_between(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PunchRecord>, StoreError> {
        let query = Query::new(
            Filter::new()
                .eq("EmployeeId", employee_id)
                .ge("Date", date_value(from))
                .le("Date", date_value(to)),
        )
        .order_by(OrderBy::asc("Date"));
        from_records(self.store.list(&self.collections.punches, &query).await?)
    }

    /// Leave records of any status overlapping the range.
    pub async fn leaves_overlapping(
        &self,
        employee_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRecord>, StoreError> {
        let query = Query::new(
            Filter::new()
                .eq("EmployeeId", employee_id)
                .le("StartDate", date_value(to))
                .ge("EndDate", date_value(from)),
        );
        from_records(self.store.list(&self.collections.leaves, &query).await?)
    }

    pub async fn holidays_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Holiday>, StoreError> {
        let query = Query::new(
            Filter::new()
                .ge("Date", date_value(from))
                .le("Date", date_value(to)),
        )
        .order_by(OrderBy::asc("Date"));
        from_records(self.store.list(&self.collections.holidays, &query).await?)
    }

    /// Headers whose week starts between two Mondays, inclusive.
    pub async fn headers_between(
        &self,
        employee_id: &str,
        first_week: NaiveDate,
        last_week: NaiveDate,
    ) -> Result<Vec<TimesheetHeader>, StoreError> {
        let query = Query::new(
            Filter::new()
                .eq("EmployeeId", employee_id)
                .ge("WeekStartDate", date_value(first_week))
                .le("WeekStartDate", date_value(last_week)),
        )
        .order_by(OrderBy::asc("WeekStartDate"));
        from_records(
            self.store
                .list(&self.collections.timesheet_headers, &query)
                .await?,
        )
    }

    pub async fn header_for_week(
        &self,
        employee_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<TimesheetHeader>, StoreError> {
        Ok(self
            .headers_between(employee_id, week_start, week_start)
            .await?
            .into_iter()
            .next())
    }

    pub async fn get_header(&self, id: i64) -> Result<TimesheetHeader, StoreError> {
        from_record(self.store.get(&self.collections.timesheet_headers, id).await?)
    }

    pub async fn create_header(&self, header: &TimesheetHeader) -> Result<TimesheetHeader, AppError> {
        let created = self
            .store
            .create(&self.collections.timesheet_headers, to_record(header)?)
            .await?;
        Ok(from_record(created)?)
    }

    pub async fn set_header_status(&self, id: i64, status: TimesheetStatus) -> Result<(), AppError> {
        let mut partial = Record::new();
        partial.insert("Status".to_string(), status_value(status)?);
        self.store
            .update(&self.collections.timesheet_headers, id, partial)
            .await?;
        Ok(())
    }

    pub async fn lines_for_header(&self, header_id: i64) -> Result<Vec<TimesheetLine>, StoreError> {
        let query = Query::new(Filter::new().eq("HeaderId", header_id))
            .order_by(OrderBy::asc("WorkDate"));
        from_records(
            self.store
                .list(&self.collections.timesheet_lines, &query)
                .await?,
        )
    }

    pub async fn get_line(&self, id: i64) -> Result<TimesheetLine, StoreError> {
        from_record(self.store.get(&self.collections.timesheet_lines, id).await?)
    }

    pub async fn create_line(&self, line: &TimesheetLine) -> Result<TimesheetLine, AppError> {
        let created = self
            .store
            .create(&self.collections.timesheet_lines, to_record(line)?)
            .await?;
        Ok(from_record(created)?)
    }

    pub async fn set_line_hours(&self, id: i64, hours: f64) -> Result<(), StoreError> {
        let mut partial = Record::new();
        partial.insert("HoursBooked".to_string(), Value::from(hours));
        self.store
            .update(&self.collections.timesheet_lines, id, partial)
            .await
    }

    pub async fn delete_line(&self, id: i64) -> Result<(), StoreError> {
        self.store
            .delete(&self.collections.timesheet_lines, id)
            .await
    }

    pub async fn regularizations_for(
        &self,
        employee_id: &str,
    ) -> Result<Vec<RegularizationRequest>, StoreError> {
        let query = Query::new(Filter::new().eq("EmployeeId", employee_id))
            .order_by(OrderBy::desc("FromDate"));
        from_records(
            self.store
                .list(&self.collections.regularizations, &query)
                .await?,
        )
    }

    pub async fn pending_regularizations(&self) -> Result<Vec<RegularizationRequest>, AppError> {
        let query = Query::new(Filter::new().eq("Status", status_value(RequestStatus::Pending)?))
            .order_by(OrderBy::asc("FromDate"));
        Ok(from_records(
            self.store
                .list(&self.collections.regularizations, &query)
                .await?,
        )?)
    }

    pub async fn get_regularization(&self, id: i64) -> Result<RegularizationRequest, StoreError> {
        from_record(self.store.get(&self.collections.regularizations, id).await?)
    }

    pub async fn create_regularization(
        &self,
        request: &RegularizationRequest,
    ) -> Result<RegularizationRequest, AppError> {
        let created = self
            .store
            .create(&self.collections.regularizations, to_record(request)?)
            .await?;
        Ok(from_record(created)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LeaveType;
    use store::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repo() -> (Arc<InMemoryStore>, AttendanceRepository) {
        let store = Arc::new(InMemoryStore::new());
        let repo = AttendanceRepository::new(store.clone(), Collections::default());
        (store, repo)
    }

    #[tokio::test]
    async fn test_punches_between_filters_employee_and_range() {
        let (store, repo) = repo();
        let rows = vec![
            to_record(&PunchRecord::new("e1", date(2025, 1, 6))).unwrap(),
            to_record(&PunchRecord::new("e1", date(2025, 2, 3))).unwrap(),
            to_record(&PunchRecord::new("e2", date(2025, 1, 6))).unwrap(),
        ];
        store.seed("PunchRecords", rows).await;

        let punches = repo
            .punches_between("e1", date(2025, 1, 1), date(2025, 1, 31))
            .await
            .unwrap();
        assert_eq!(punches.len(), 1);
        assert_eq!(punches[0].date, date(2025, 1, 6));
        assert!(punches[0].id.is_some());
    }

    #[tokio::test]
    async fn test_leaves_overlapping() {
        let (store, repo) = repo();
        let leave = LeaveRecord {
            id: None,
            employee_id: "e1".to_string(),
            start_date: date(2025, 1, 30),
            end_date: date(2025, 2, 2),
            leave_type: LeaveType::Earned,
            status: RequestStatus::Approved,
            is_half_day: false,
        };
        store.seed("LeaveRecords", vec![to_record(&leave).unwrap()]).await;

        let overlapping = repo
            .leaves_overlapping("e1", date(2025, 2, 1), date(2025, 2, 28))
            .await
            .unwrap();
        assert_eq!(overlapping.len(), 1);

        let disjoint = repo
            .leaves_overlapping("e1", date(2025, 2, 3), date(2025, 2, 28))
            .await
            .unwrap();
        assert!(disjoint.is_empty());
    }

    #[tokio::test]
    async fn test_header_round_trip_through_store() {
        let (_store, repo) = repo();
        let created = repo
            .create_header(&TimesheetHeader::new("e1", date(2025, 1, 6)))
            .await
            .unwrap();
        let id = created.id.unwrap();

        repo.set_header_status(id, TimesheetStatus::Submitted).await.unwrap();
        let header = repo.get_header(id).await.unwrap();
        assert_eq!(header.status, TimesheetStatus::Submitted);

        let found = repo.header_for_week("e1", date(2025, 1, 6)).await.unwrap();
        assert_eq!(found.map(|h| h.id), Some(Some(id)));
    }

    #[tokio::test]
    async fn test_malformed_record() {
        let (store, repo) = repo();
        let mut bad = Record::new();
        bad.insert("EmployeeId".to_string(), Value::from("e1"));
        bad.insert("Date".to_string(), Value::from("2025-01-06"));
        bad.insert("FirstIn".to_string(), Value::from("nine-ish"));
        store.seed("PunchRecords", vec![bad]).await;

        let result = repo
            .punches_between("e1", date(2025, 1, 1), date(2025, 1, 31))
            .await;
        assert!(matches!(result, Err(StoreError::Malformed(_))));

        let result = repo.get_header(12345).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
