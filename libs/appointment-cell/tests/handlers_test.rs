// libs/appointment-cell/tests/handlers_test.rs
//
// Handler-level tests: error mapping onto AppError and slot formatting.

use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path};

use appointment_cell::handlers::{self, AvailableSlotsQuery};
use appointment_cell::models::{CreateAppointmentRequest, DurationMinutes};
use shared_models::{auth::User, error::AppError};
use shared_utils::test_utils::{TestConfig, TestUser};

fn auth_header() -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer("test_token").unwrap())
}

fn receptionist() -> Extension<User> {
    Extension(TestUser::receptionist("desk@example.com").to_user())
}

fn appointment_row(professional_id: Uuid, start: &str, duration: serde_json::Value) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "professional_id": professional_id,
        "patient_id": Uuid::new_v4(),
        "office_id": null,
        "appointment_date": start,
        "duration": duration,
        "status": "scheduled",
        "notes": null,
        "amount": null,
        "created_by": null,
        "confirmed_at": null,
        "created_at": "2030-01-01T00:00:00Z",
        "updated_at": "2030-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_conflicting_booking_maps_to_conflict_response() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": professional_id }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": patient_id }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(professional_id, "2030-03-04T10:00:00", json!(30))
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let request = CreateAppointmentRequest {
        professional_id,
        patient_id,
        office_id: None,
        appointment_date: "2030-03-04T10:00:00".parse().unwrap(),
        duration: DurationMinutes::new(30).unwrap(),
        notes: None,
        amount: None,
    };

    let result = handlers::create_appointment(
        State(config),
        auth_header(),
        receptionist(),
        Json(request),
    ).await;

    // The rejection is keyed to the date/time field
    let err = result.err().expect("conflicting booking must be rejected");
    assert_matches!(err, AppError::Conflict(msg) if msg.starts_with("appointment_date:"));
}

#[tokio::test]
async fn test_cancel_resolved_appointment_maps_to_bad_request() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    let mut row = appointment_row(Uuid::new_v4(), "2030-03-04T10:00:00", json!(30));
    row["id"] = json!(appointment_id);
    row["status"] = json!("absent");

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let result = handlers::cancel_appointment(
        State(config),
        Path(appointment_id),
        auth_header(),
        receptionist(),
    ).await;

    assert_matches!(result.err(), Some(AppError::BadRequest(_)));
}

#[tokio::test]
async fn test_slots_endpoint_returns_formatted_times() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": professional_id }])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();
    let query = AvailableSlotsQuery {
        professional_id,
        date: "2030-03-04".parse().unwrap(),
        duration: "01:00:00".to_string(),
    };

    let Json(body) = handlers::available_slots(
        State(config),
        auth_header(),
        receptionist(),
        Query(query),
    ).await.unwrap();

    let slots: Vec<String> = serde_json::from_value(body).unwrap();
    assert_eq!(slots.first().map(String::as_str), Some("08:00"));
    // 60-minute bookings can start at 17:00 at the latest
    assert_eq!(slots.last().map(String::as_str), Some("17:00"));
    assert!(slots.contains(&"09:30".to_string()));
}

#[tokio::test]
async fn test_slots_endpoint_rejects_bad_duration() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_arc();

    let query = AvailableSlotsQuery {
        professional_id: Uuid::new_v4(),
        date: "2030-03-04".parse().unwrap(),
        duration: "0".to_string(),
    };

    let result = handlers::available_slots(
        State(config),
        auth_header(),
        receptionist(),
        Query(query),
    ).await;

    assert_matches!(result.err(), Some(AppError::ValidationError(_)));
}
