// libs/scheduling-cell/tests/windows_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use scheduling_cell::models::{CreateSessionWindowRequest, SchedulingError};
use scheduling_cell::services::windows::SessionWindowService;
use shared_config::AppConfig;
use shared_models::schedule::DayOfWeek;

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        database_rest_url: base_url.to_string(),
        database_api_key: "test-api-key".to_string(),
        api_port: 3000,
    }
}

fn window_row(doctor_id: &Uuid, day: &str, start: &str, end: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "doctor_id": doctor_id,
        "day_of_week": day,
        "start_time": start,
        "end_time": end,
        "room_id": "101",
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": "2024-05-01T08:00:00Z"
    })
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

#[tokio::test]
async fn day_schedule_excludes_booked_slots() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            window_row(&doctor_id, "monday", "08:00", "09:00")
        ])))
        .mount(&server)
        .await;

    // One committed booking at 08:15.
    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "doctor_id": doctor_id,
            "session_date": "2024-06-03",
            "slot_time": "08:15",
            "queue_number": 1,
            "patient_name": "Jane Perera",
            "patient_age": 34,
            "status": "pending",
            "created_at": "2024-06-01T10:00:00Z",
            "updated_at": "2024-06-01T10:00:00Z"
        }])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));
    let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    let schedule = service.day_schedule(doctor_id, monday).await.unwrap();

    assert_eq!(schedule.available_slots, vec!["08:00", "08:30", "08:45"]);
    assert_eq!(schedule.booked_count, 1);
    assert_eq!(schedule.total_count, 4);
}

#[tokio::test]
async fn day_schedule_requires_session_windows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));
    let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

    let result = service.day_schedule(Uuid::new_v4(), monday).await;
    assert_matches!(result, Err(SchedulingError::NoSessionWindows));
}

#[tokio::test]
async fn day_schedule_is_empty_on_days_without_windows() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            window_row(&doctor_id, "monday", "08:00", "09:00")
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));
    let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();

    let schedule = service.day_schedule(doctor_id, tuesday).await.unwrap();
    assert!(schedule.available_slots.is_empty());
    assert_eq!(schedule.total_count, 0);
}

#[tokio::test]
async fn create_window_rejects_inverted_times() {
    // Validation fires before any storage call.
    let service = SessionWindowService::new(&test_config("http://localhost:1"));

    let request = CreateSessionWindowRequest {
        doctor_id: Uuid::new_v4(),
        day_of_week: DayOfWeek::Monday,
        start_time: t(10, 0),
        end_time: t(9, 0),
        room_id: "101".to_string(),
    };

    let result = service.create_window(request).await;
    assert_matches!(result, Err(SchedulingError::InvalidWindow));
}

#[tokio::test]
async fn create_window_rejects_overlap_with_existing() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            window_row(&doctor_id, "monday", "09:00", "12:00")
        ])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));

    let request = CreateSessionWindowRequest {
        doctor_id,
        day_of_week: DayOfWeek::Monday,
        start_time: t(10, 0),
        end_time: t(11, 0),
        room_id: "101".to_string(),
    };

    let result = service.create_window(request).await;
    assert_matches!(result, Err(SchedulingError::WindowOverlap));
}

#[tokio::test]
async fn create_window_persists_and_returns_the_window() {
    let server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            window_row(&doctor_id, "wednesday", "14:00", "17:00")
        ])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));

    let request = CreateSessionWindowRequest {
        doctor_id,
        day_of_week: DayOfWeek::Wednesday,
        start_time: t(14, 0),
        end_time: t(17, 0),
        room_id: "101".to_string(),
    };

    let window = service.create_window(request).await.unwrap();
    assert_eq!(window.doctor_id, doctor_id);
    assert_eq!(window.day_of_week, DayOfWeek::Wednesday);
    assert_eq!(window.start_time, t(14, 0));
}

#[tokio::test]
async fn delete_missing_window_reports_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/session_windows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = SessionWindowService::new(&test_config(&server.uri()));

    let result = service.delete_window(Uuid::new_v4()).await;
    assert_matches!(result, Err(SchedulingError::WindowNotFound));
}
