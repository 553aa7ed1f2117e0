// libs/roster-cell/tests/roster_test.rs
use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roster_cell::models::{AssignStaffRequest, RosterError};
use roster_cell::services::assignment::StaffAssignmentService;
use roster_cell::services::conflict::RosterConflictService;
use shared_config::AppConfig;
use shared_database::postgrest::PostgrestClient;
use shared_models::schedule::DayOfWeek;

fn test_config(base_url: &str) -> AppConfig {
    AppConfig {
        database_rest_url: base_url.to_string(),
        database_api_key: "test-api-key".to_string(),
        api_port: 3000,
    }
}

fn week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
}

fn week_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 9).unwrap()
}

fn nine_am() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap()
}

fn assignment_row(room_id: &str, staff_id: &Uuid) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "room_id": room_id,
        "staff_id": staff_id,
        "day_of_week": "monday",
        "start_time": "09:00",
        "week_start": "2024-06-03",
        "week_end": "2024-06-09",
        "created_at": "2024-06-01T10:00:00Z"
    })
}

fn request(room_id: &str, staff_id: Uuid) -> AssignStaffRequest {
    AssignStaffRequest {
        room_id: room_id.to_string(),
        staff_id,
        day_of_week: DayOfWeek::Monday,
        start_time: nine_am(),
        week_start: week_start(),
        week_end: week_end(),
    }
}

async fn mount_lock_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v1/slot_locks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "lock_key": "roster_test",
            "holder": "scheduler_test",
            "acquired_at": "2024-06-01T10:00:00Z",
            "expires_at": "2099-01-01T00:00:00Z"
        }])))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/slot_locks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn assigning_a_clear_slot_succeeds() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();

    mount_lock_mocks(&server).await;

    // Room slot free.
    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "eq.101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // Staff member not committed elsewhere.
    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "neq.101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!([assignment_row("101", &staff_id)])),
        )
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let assignment = service.assign_staff(request("101", staff_id)).await.unwrap();
    assert_eq!(assignment.room_id, "101");
    assert_eq!(assignment.staff_id, staff_id);
    assert_eq!(assignment.day_of_week, DayOfWeek::Monday);
}

#[tokio::test]
async fn staff_cannot_hold_two_rooms_at_the_same_time_key() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();

    mount_lock_mocks(&server).await;

    // Room 102 itself is free...
    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "eq.102"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // ...but the nurse already holds room 101 at Monday 09:00 this week.
    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "neq.102"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([assignment_row("101", &staff_id)])),
        )
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let result = service.assign_staff(request("102", staff_id)).await;
    assert_matches!(result, Err(RosterError::StaffConflict));
}

#[tokio::test]
async fn occupied_room_slot_rejects_any_assignee() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();
    let other_staff = Uuid::new_v4();

    mount_lock_mocks(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "eq.101"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([assignment_row("101", &other_staff)])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("room_id", "neq.101"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let result = service.assign_staff(request("101", staff_id)).await;
    assert_matches!(result, Err(RosterError::RoomOccupied));
}

#[tokio::test]
async fn losing_the_insert_race_reports_room_occupied() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();

    mount_lock_mocks(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let result = service.assign_staff(request("101", staff_id)).await;
    assert_matches!(result, Err(RosterError::RoomOccupied));
}

#[tokio::test]
async fn inverted_week_range_is_rejected_before_any_lookup() {
    let service = StaffAssignmentService::new(&test_config("http://localhost:1"));

    let mut bad_request = request("101", Uuid::new_v4());
    bad_request.week_start = week_end();
    bad_request.week_end = week_start();

    let result = service.assign_staff(bad_request).await;
    assert_matches!(result, Err(RosterError::Validation(_)));
}

#[tokio::test]
async fn conflict_detector_reports_a_clear_slot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let db = Arc::new(PostgrestClient::new(&test_config(&server.uri())));
    let detector = RosterConflictService::new(db);

    let conflicts = detector
        .find_conflicts("101", week_start(), week_end(), DayOfWeek::Monday, nine_am(), Uuid::new_v4())
        .await
        .unwrap();

    assert!(conflicts.is_clear());
}

#[tokio::test]
async fn removing_an_assignment_frees_the_slot() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([assignment_row("101", &staff_id)])),
        )
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));
    service.unassign_staff(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn removing_a_missing_assignment_reports_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/ward_assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let result = service.unassign_staff(Uuid::new_v4()).await;
    assert_matches!(result, Err(RosterError::NotFound));
}

#[tokio::test]
async fn week_roster_lists_assignments_for_the_range() {
    let server = MockServer::start().await;
    let staff_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/ward_assignments"))
        .and(query_param("week_start", "eq.2024-06-03"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([assignment_row("101", &staff_id)])),
        )
        .mount(&server)
        .await;

    let service = StaffAssignmentService::new(&test_config(&server.uri()));

    let assignments = service.week_roster(week_start(), week_end(), None).await.unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].room_id, "101");
}
