//! Integration tests for gateway with attendance-service
//!
//! These tests exercise the InProcess router and the HTTP API against an
//! in-memory store and a static directory.

use std::sync::Arc;
use std::time::Duration;

use attendance_service::models::{
    Holiday, LeaveRecord, LeaveType, PunchRecord, RequestStatus, RequestType,
};
use attendance_service::repository::to_record;
use attendance_service::{
    ApprovalAction, ApprovalSubject, AttendanceConfig, AttendanceService, NewRegularization,
};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, NaiveTime};
use directory::{StaticDirectory, UserInfo};
use error::AppError;
use gateway_lib::{app, AppState, ServiceRouter};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use store::InMemoryStore;
use tower::ServiceExt;

const EMPLOYEE: &str = "asha@contoso.example";

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn employee() -> StaticDirectory {
    StaticDirectory::new(UserInfo::new(1, "Asha Rao", EMPLOYEE))
        .with_user(UserInfo::new(7, "Ravi Iyer", "ravi@contoso.example"))
}

fn manager() -> StaticDirectory {
    StaticDirectory::new(UserInfo::new(2, "Mia Chen", "mia@contoso.example")).with_groups(["Managers"])
}

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let punches = [(6, 8.0), (7, 9.5), (9, 7.0)]
        .into_iter()
        .map(|(day, hours)| {
            let punch = PunchRecord {
                first_in: NaiveTime::from_hms_opt(9, 15, 0),
                last_out: NaiveTime::from_hms_opt(18, 0, 0),
                total_hours: hours,
                ..PunchRecord::new(EMPLOYEE, date(2025, 1, day))
            };
            to_record(&punch).unwrap()
        })
        .collect();
    store.seed("PunchRecords", punches).await;
    store
}

fn router(store: Arc<InMemoryStore>, directory: StaticDirectory) -> ServiceRouter {
    let service = AttendanceService::new(store, Arc::new(directory), AttendanceConfig::default());
    ServiceRouter::new(service, Duration::from_secs(60)).with_today(date(2025, 2, 1))
}

fn http(store: Arc<InMemoryStore>, directory: StaticDirectory) -> Router {
    app(AppState {
        router: Arc::new(router(store, directory)),
        version: "test".to_string(),
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn day_off_request() -> NewRegularization {
    NewRegularization {
        request_type: RequestType::DayBased,
        from_date: date(2025, 1, 10),
        to_date: date(2025, 1, 10),
        expected_in: None,
        expected_out: None,
        reason: "Badge reader offline".to_string(),
    }
}

#[tokio::test]
async fn test_health() {
    let app = http(Arc::new(InMemoryStore::new()), employee());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], "test");
}

#[tokio::test]
async fn test_month_calendar_over_http() {
    let app = http(seeded_store().await, employee());

    let (status, body) = send(&app, "GET", "/api/v1/calendar/2025/1", None).await;
    assert_eq!(status, StatusCode::OK);

    let days = body["days"].as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[5]["date"], "2025-01-06");
    assert_eq!(days[5]["status"], "present");
    assert_eq!(days[5]["firstPunchIn"], "09:15:00");
    assert_eq!(days[6]["availableHours"], 9.0);
    assert_eq!(days[4]["status"], "weekend");
    assert_eq!(days[7]["status"], "absent");
    assert_eq!(days[5]["timesheetProgress"]["status"], "notFilled");
    assert_eq!(body["summary"]["presentDays"], 3);
}

#[tokio::test]
async fn test_invalid_month_is_bad_request() {
    let app = http(seeded_store().await, employee());

    let (status, body) = send(&app, "GET", "/api/v1/calendar/2025/13", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
    assert_eq!(body["retryable"], false);

    let (status, _) = send(&app, "GET", "/api/v1/fill-status/13-01-2025", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_is_retryable() {
    let store = seeded_store().await;
    store.mark_unavailable("PunchRecords").await;
    let app = http(store, employee());

    let (status, body) = send(&app, "GET", "/api/v1/calendar/2025/1", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "TRANSIENT_FETCH");
    assert_eq!(body["retryable"], true);
}

#[tokio::test]
async fn test_other_calendar_needs_manager() {
    let store = seeded_store().await;

    let peer = http(
        store.clone(),
        StaticDirectory::new(UserInfo::new(3, "Sam Doe", "sam@contoso.example")),
    );
    let uri = format!("/api/v1/calendar/2025/1?employeeId={}", EMPLOYEE);
    let (status, body) = send(&peer, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "PERMISSION_DENIED");

    let lead = http(store, manager());
    let (status, body) = send(&lead, "GET", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employeeId"], EMPLOYEE);
    assert_eq!(body["summary"]["presentDays"], 3);
}

#[tokio::test]
async fn test_validate_range_over_http() {
    let app = http(seeded_store().await, employee());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/regularizations/validate",
        Some(json!({ "fromDate": "2025-01-10", "toDate": "2025-01-12" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isValid"], false);
    let invalid = body["invalidDates"].as_array().unwrap();
    assert_eq!(invalid.len(), 2);
    assert_eq!(invalid[0]["date"], "2025-01-11");
    assert_eq!(invalid[0]["reason"], "weekend");

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/regularizations/validate",
        Some(json!({ "fromDate": "2025-02-01", "toDate": "2025-02-01" })),
    )
    .await;
    assert_eq!(body["invalidDates"][0]["reason"], "future-or-today: from");
}

#[tokio::test]
async fn test_regularization_approval_flow() {
    let store = seeded_store().await;
    let asha = router(store.clone(), employee());
    let mia = router(store, manager());

    let created = asha.submit_regularization(day_off_request()).await.unwrap();
    let id = created.id.unwrap();
    assert_eq!(created.status, RequestStatus::Pending);

    // Employees cannot decide, and managers need a comment.
    let result = asha
        .decide(ApprovalSubject::Regularization, id, ApprovalAction::Approve, Some("ok"))
        .await;
    assert!(matches!(result, Err(AppError::Permission(_))));
    let result = mia
        .decide(ApprovalSubject::Regularization, id, ApprovalAction::Approve, None)
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let pending = mia.pending_regularizations().await.unwrap();
    assert_eq!(pending.len(), 1);

    let approved = mia
        .decide(
            ApprovalSubject::Regularization,
            id,
            ApprovalAction::Approve,
            Some("Confirmed with security desk"),
        )
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(mia.pending_regularizations().await.unwrap().is_empty());

    let recalled = asha
        .decide(ApprovalSubject::Regularization, id, ApprovalAction::Recall, None)
        .await
        .unwrap();
    assert_eq!(recalled.status, RequestStatus::Pending);

    let mine = asha.my_regularizations().await.unwrap();
    assert_eq!(mine[0].status, RequestStatus::Pending);
    assert_eq!(
        mine[0].manager_comment.as_deref(),
        Some("Confirmed with security desk")
    );
}

#[tokio::test]
async fn test_approvals_over_http() {
    let store = seeded_store().await;
    let asha = http(store.clone(), employee());
    let mia = http(store, manager());

    let (status, created) = send(
        &asha,
        "POST",
        "/api/v1/regularizations",
        Some(json!({
            "requestType": "TimeBased",
            "fromDate": "2025-01-09",
            "toDate": "2025-01-09",
            "expectedIn": "09:00:00",
            "expectedOut": "18:00:00",
            "reason": "Left early for client visit"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["Id"].as_i64().unwrap();

    let uri = format!("/api/v1/approvals/regularization/{}/reject", id);
    let (status, _) = send(&mia, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&asha, "POST", &uri, Some(json!({ "comment": "no" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&mia, "POST", &uri, Some(json!({ "comment": "Visit not logged" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Rejected");
    assert_eq!(body["managerComment"], "Visit not logged");

    // Rejected is final.
    let recall = format!("/api/v1/approvals/regularization/{}/recall", id);
    let (status, _) = send(&asha, "POST", &recall, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&mia, "POST", "/api/v1/approvals/regularization/999/approve", Some(json!({ "comment": "ok" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_timesheet_over_http() {
    let store = seeded_store().await;
    let asha = http(store.clone(), employee());
    let mia = http(store, manager());

    let (status, line) = send(
        &asha,
        "POST",
        "/api/v1/timesheets/lines",
        Some(json!({ "workDate": "2025-01-06", "projectNo": "PRJ-7", "taskNo": "DEV", "hoursBooked": 5.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let line_id = line["Id"].as_i64().unwrap();
    let header_id = line["HeaderId"].as_i64().unwrap();

    // 5 + 4 exceeds the 8 hours punched on the 6th.
    let (status, _) = send(
        &asha,
        "POST",
        "/api/v1/timesheets/lines",
        Some(json!({ "workDate": "2025-01-06", "projectNo": "PRJ-7", "taskNo": "QA", "hoursBooked": 4.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/timesheets/lines/{}", line_id);
    let (status, body) = send(&asha, "PATCH", &uri, Some(json!({ "hoursBooked": 8.0 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["HoursBooked"], 8.0);

    let (status, body) = send(&asha, "GET", "/api/v1/fill-status/2025-01-06", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, week) = send(&asha, "GET", "/api/v1/timesheets/week/2025-01-08", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["weekStartDate"], "2025-01-06");
    assert_eq!(week["lines"].as_array().unwrap().len(), 1);

    let submit = format!("/api/v1/timesheets/{}/submit", header_id);
    let (status, body) = send(&asha, "POST", &submit, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["Status"], "Submitted");

    let approve = format!("/api/v1/approvals/timesheet/{}/approve", header_id);
    let (status, body) = send(&mia, "POST", &approve, Some(json!({ "comment": "Thanks" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Approved");

    let (status, _) = send(&asha, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Recall reopens the week for edits.
    let recall = format!("/api/v1/approvals/timesheet/{}/recall", header_id);
    let (status, _) = send(&asha, "POST", &recall, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&asha, "DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_employee_lookup_is_cached() {
    let asha = router(Arc::new(InMemoryStore::new()), employee());

    let ravi = asha.employee(7).await.unwrap();
    assert_eq!(ravi.display_name, "Ravi Iyer");
    assert!(matches!(asha.employee(8).await, Err(AppError::NotFound(_))));

    asha.forget_employee(7).await;
    assert_eq!(asha.employee(7).await.unwrap(), ravi);

    let app = http(Arc::new(InMemoryStore::new()), employee());
    let (status, body) = send(&app, "GET", "/api/v1/me", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "employee");
    assert_eq!(body["user"]["display_name"], "Asha Rao");
}

#[tokio::test]
async fn test_bookings_follow_calendar_availability() {
    let store = seeded_store().await;
    // The 7th is punched but on approved leave, the 9th is punched but a
    // holiday, Saturday the 11th is punched.
    let leave = LeaveRecord {
        id: None,
        employee_id: EMPLOYEE.to_string(),
        start_date: date(2025, 1, 7),
        end_date: date(2025, 1, 7),
        leave_type: LeaveType::Casual,
        status: RequestStatus::Approved,
        is_half_day: false,
    };
    store.seed("LeaveRecords", vec![to_record(&leave).unwrap()]).await;
    let holiday = Holiday {
        id: None,
        date: date(2025, 1, 9),
        title: "Founders Day".to_string(),
    };
    store.seed("Holidays", vec![to_record(&holiday).unwrap()]).await;
    let saturday = PunchRecord {
        first_in: NaiveTime::from_hms_opt(10, 0, 0),
        last_out: NaiveTime::from_hms_opt(16, 0, 0),
        total_hours: 6.0,
        ..PunchRecord::new(EMPLOYEE, date(2025, 1, 11))
    };
    store.seed("PunchRecords", vec![to_record(&saturday).unwrap()]).await;
    let app = http(store, employee());

    for work_date in ["2025-01-07", "2025-01-09", "2025-01-11"] {
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/timesheets/lines",
            Some(json!({ "workDate": work_date, "projectNo": "PRJ-7", "taskNo": "DEV", "hoursBooked": 4.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", work_date);
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/timesheets/lines",
        Some(json!({ "workDate": "2025-01-06", "projectNo": "PRJ-7", "taskNo": "DEV", "hoursBooked": 3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, calendar) = send(&app, "GET", "/api/v1/calendar/2025/1", None).await;
    let days = calendar["days"].as_array().unwrap();
    assert_eq!(days[6]["status"], "leave");
    assert_eq!(days[8]["status"], "holiday");
    assert_eq!(days[10]["status"], "weekend");
    for day in days {
        let booked = day["timesheetHours"].as_f64().unwrap();
        let available = day["availableHours"].as_f64().unwrap();
        assert!(booked <= available, "{}", day["date"]);
    }

    for (index, work_date) in [(5, "2025-01-06"), (6, "2025-01-07"), (8, "2025-01-09"), (10, "2025-01-11")] {
        let uri = format!("/api/v1/fill-status/{}", work_date);
        let (status, progress) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(progress, days[index]["timesheetProgress"], "{}", work_date);
    }
}
