use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::{App, test, web};
use chrono::NaiveDate;
use hrm_leave::auth::jwt::{TokenSubject, generate_access_token};
use hrm_leave::auth::middleware::auth_middleware;
use hrm_leave::config::Config;
use hrm_leave::leave::service::LeaveService;
use hrm_leave::model::holiday::Holiday;
use hrm_leave::model::leave_credit::LeaveCredit;
use hrm_leave::model::leave_request::{LeaveRequest, LeaveStatus};
use hrm_leave::model::leave_type::{ApprovalRule, ApproverStep, CountingPolicy, LeaveTypeConfig};
use hrm_leave::routes;
use hrm_leave::store::memory::{
    InMemoryConfigStore, InMemoryCreditStore, InMemoryHolidays, InMemoryRequestStore,
};
use hrm_leave::store::snapshot::SnapshotWriter;
use serde_json::{Value, json};

const SECRET: &str = "test-secret";

fn config(snapshot_dir: &str) -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        rate_protected_per_min: 1000,
        api_prefix: "/api".to_string(),
        snapshot_dir: snapshot_dir.to_string(),
        holiday_cache_ttl_secs: 60,
        log_dir: "logs".to_string(),
    }
}

fn service(snapshot_dir: &str) -> LeaveService {
    let vacation = LeaveTypeConfig::new(
        1,
        "ลาพักผ่อน",
        10,
        CountingPolicy::WorkingDaysOnly,
        vec![ApproverStep::positions(["Head of Department"])],
        vec![ApprovalRule::new(30, vec![0])],
    )
    .unwrap();
    let holiday = Holiday::new(
        NaiveDate::from_ymd_opt(2025, 10, 13).unwrap(),
        "วันคล้ายวันสวรรคต ร.9",
    );
    LeaveService::new(
        Arc::new(InMemoryConfigStore::new([vacation])),
        Arc::new(InMemoryCreditStore::new([LeaveCredit::new(1000, 1, 10.0, 0.0)])),
        Arc::new(InMemoryHolidays::new(vec![holiday])),
        Arc::new(InMemoryRequestStore::default()),
        SnapshotWriter::new(snapshot_dir),
    )
}

fn bearer(user_id: u64, employee_id: u64, position: Option<&str>, role: u8) -> (String, String) {
    let token = generate_access_token(
        &TokenSubject {
            user_id,
            username: "tester",
            role,
            employee_id: Some(employee_id),
            position,
        },
        SECRET,
        600,
    )
    .unwrap();
    ("Authorization".to_string(), format!("Bearer {token}"))
}

fn employee() -> (String, String) {
    bearer(1, 1000, Some("Officer"), 3)
}

fn head() -> (String, String) {
    bearer(2, 2001, Some("Head of Department"), 3)
}

fn colleague() -> (String, String) {
    bearer(3, 1002, Some("Officer"), 3)
}

macro_rules! app {
    ($dir:expr) => {{
        let dir = $dir.path().to_string_lossy().to_string();
        test::init_service(
            App::new()
                .app_data(web::Data::new(config(&dir)))
                .app_data(web::Data::new(service(&dir)))
                .service(
                    web::scope("/api")
                        .wrap(from_fn(auth_middleware))
                        .configure(routes::leave_routes),
                ),
        )
        .await
    }};
}

#[actix_web::test]
async fn requests_without_token_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::post()
        .uri("/api/leave/day-count")
        .set_json(json!({"leave_type_id": 1, "start_date": "2025-10-06", "end_date": "2025-10-07"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn day_count_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::post()
        .uri("/api/leave/day-count")
        .insert_header(employee())
        .set_json(json!({
            "leave_type_id": 1,
            "start_date": "2025-10-10",
            "end_date": "2025-10-14",
            "start_portion": "second_half"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    // Fri half, weekend, Mon holiday, Tue full
    assert_eq!(body["days"], 1.5);

    let req = test::TestRequest::post()
        .uri("/api/leave/day-count")
        .insert_header(employee())
        .set_json(json!({"leave_type_id": 1, "start_date": "2025-10-14", "end_date": "2025-10-10"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn summary_endpoint_reports_projection() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::post()
        .uri("/api/leave/summary")
        .insert_header(employee())
        .set_json(json!({"entries": [
            {"date": "2025-10-06", "leave_type_id": 1},
            {"date": "2025-10-07", "leave_type_id": 1, "portion": "first_half"}
        ]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["blocked"], false);
    assert_eq!(body["data"][0]["total_days"], 1.5);
    assert_eq!(body["data"][0]["remaining"], 8.5);
}

#[actix_web::test]
async fn submit_approve_and_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(employee())
        .set_json(json!({
            "leave_type_id": 1,
            "entries": [
                {"date": "2025-10-06", "leave_type_id": 1},
                {"date": "2025-10-07", "leave_type_id": 1}
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: LeaveRequest = test::read_body_json(resp).await;
    assert_eq!(created.status, LeaveStatus::InApproval { step: 0 });

    // an unrelated employee may not read it
    let req = test::TestRequest::get()
        .uri(&format!("/api/leave/{}", created.id))
        .insert_header(colleague())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    // nor approve it
    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/approve", created.id))
        .insert_header(colleague())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/approve", created.id))
        .insert_header(head())
        .to_request();
    let approved: LeaveRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(approved.status, LeaveStatus::Approved);

    let req = test::TestRequest::get()
        .uri(&format!("/api/leave/{}", created.id))
        .insert_header(employee())
        .to_request();
    let fetched: LeaveRequest = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fetched, approved);

    // cancelling after approval conflicts
    let req = test::TestRequest::put()
        .uri(&format!("/api/leave/{}/cancel", created.id))
        .insert_header(employee())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["message"].as_str().unwrap().contains("approved"));
}

#[actix_web::test]
async fn unknown_request_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::get()
        .uri("/api/leave/LV-2569-99999")
        .insert_header(bearer(9, 9000, None, 2))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn weekend_only_submission_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = app!(dir);

    let req = test::TestRequest::post()
        .uri("/api/leave")
        .insert_header(employee())
        .set_json(json!({
            "leave_type_id": 1,
            "entries": [
                {"date": "2025-10-11", "leave_type_id": 1},
                {"date": "2025-10-12", "leave_type_id": 1}
            ]
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
