// libs/appointment-cell/tests/booking_test.rs
//
// Booking writer tests against a mocked PostgREST backend.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use assert_matches::assert_matches;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use appointment_cell::models::{
    AppointmentError, AppointmentStatus, CreateAppointmentRequest, DurationMinutes,
    UpdateAppointmentRequest,
};
use appointment_cell::services::booking::AppointmentBookingService;
use shared_utils::test_utils::TestConfig;

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

// A Monday far enough ahead that "past date" checks never interfere.
const DAY: &str = "2030-03-04";

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 3, 4).unwrap()
}

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    day().and_time(NaiveTime::from_hms_opt(hour, minute, 0).unwrap())
}

async fn service_for(mock_server: &MockServer) -> AppointmentBookingService {
    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    AppointmentBookingService::new(&config)
}

fn appointment_row(
    id: Uuid,
    professional_id: Uuid,
    patient_id: Uuid,
    start: &str,
    duration: Value,
    status: &str,
) -> Value {
    json!({
        "id": id,
        "professional_id": professional_id,
        "patient_id": patient_id,
        "office_id": null,
        "appointment_date": start,
        "duration": duration,
        "status": status,
        "notes": null,
        "amount": null,
        "created_by": null,
        "confirmed_at": if status == "attended" { json!(format!("{}T10:30:00", DAY)) } else { Value::Null },
        "created_at": "2030-01-01T00:00:00Z",
        "updated_at": "2030-01-01T00:00:00Z"
    })
}

async fn mock_professional_exists(mock_server: &MockServer, professional_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": professional_id }
        ])))
        .mount(mock_server)
        .await;
}

async fn mock_patient_exists(mock_server: &MockServer, patient_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": patient_id }
        ])))
        .mount(mock_server)
        .await;
}

/// The day-range fetch always filters to scheduled records server-side;
/// matching on the status param asserts that.
async fn mock_scheduled_for_day(mock_server: &MockServer, professional_id: Uuid, rows: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("professional_id", format!("eq.{}", professional_id)))
        .and(query_param("status", "eq.scheduled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(mock_server)
        .await;
}

async fn mock_get_by_id(mock_server: &MockServer, appointment_id: Uuid, row: Value) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(mock_server)
        .await;
}

fn create_request(professional_id: Uuid, patient_id: Uuid, start: NaiveDateTime, minutes: i64) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        professional_id,
        patient_id,
        office_id: None,
        appointment_date: start,
        duration: DurationMinutes::new(minutes).unwrap(),
        notes: None,
        amount: None,
    }
}

// ==============================================================================
// CREATE
// ==============================================================================

#[tokio::test]
async fn test_create_appointment_on_free_slot() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let stored_id = Uuid::new_v4();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_patient_exists(&mock_server, patient_id).await;
    mock_scheduled_for_day(&mock_server, professional_id, json!([])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(stored_id, professional_id, patient_id,
                            &format!("{}T10:00:00", DAY), json!(30), "scheduled")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let request = create_request(professional_id, patient_id, at(10, 0), 30);

    let appointment = service.create_appointment(request, None, "test_token").await.unwrap();

    assert_eq!(appointment.id, stored_id);
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.duration.minutes(), 30);
}

#[tokio::test]
async fn test_create_appointment_rejects_overlap() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_patient_exists(&mock_server, patient_id).await;

    // Existing 09:30-10:00 booking, duration stored in the legacy string form
    mock_scheduled_for_day(&mock_server, professional_id, json!([
        appointment_row(Uuid::new_v4(), professional_id, patient_id,
                        &format!("{}T09:30:00", DAY), json!("00:30:00"), "scheduled")
    ])).await;

    let service = service_for(&mock_server).await;
    // 09:00-10:00 candidate overlaps 09:30-10:00
    let request = create_request(professional_id, patient_id, at(9, 0), 60);

    let result = service.create_appointment(request, None, "test_token").await;
    assert_matches!(result, Err(AppointmentError::ConflictDetected));
}

#[tokio::test]
async fn test_create_appointment_back_to_back_is_allowed() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_patient_exists(&mock_server, patient_id).await;
    mock_scheduled_for_day(&mock_server, professional_id, json!([
        appointment_row(Uuid::new_v4(), professional_id, patient_id,
                        &format!("{}T09:30:00", DAY), json!(30), "scheduled")
    ])).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            appointment_row(Uuid::new_v4(), professional_id, patient_id,
                            &format!("{}T09:00:00", DAY), json!(30), "scheduled")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    // 09:00-09:30 candidate ends exactly where the existing booking starts
    let request = create_request(professional_id, patient_id, at(9, 0), 30);

    let result = service.create_appointment(request, None, "test_token").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_appointment_unknown_professional() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let request = create_request(professional_id, patient_id, at(10, 0), 30);

    let result = service.create_appointment(request, None, "test_token").await;
    assert_matches!(result, Err(AppointmentError::ProfessionalNotFound));
}

// ==============================================================================
// UPDATE
// ==============================================================================

#[tokio::test]
async fn test_update_without_moving_skips_conflict_check() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, professional_id, patient_id,
                                 &format!("{}T10:00:00", DAY), json!(30), "scheduled");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    // No day-range mock is mounted: if the service re-ran the conflict
    // check here, the fetch would fail and so would the test.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(appointment_id, professional_id, patient_id,
                            &format!("{}T10:00:00", DAY), json!(30), "scheduled")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let request = UpdateAppointmentRequest {
        professional_id,
        patient_id,
        office_id: None,
        appointment_date: at(10, 0),
        duration: DurationMinutes::new(30).unwrap(),
        status: AppointmentStatus::Scheduled,
        notes: Some("patient asked for a reminder call".to_string()),
        amount: None,
    };

    let result = service.update_appointment(appointment_id, request, "test_token").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_update_to_taken_slot_is_rejected() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, professional_id, patient_id,
                                 &format!("{}T10:00:00", DAY), json!(30), "scheduled");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    // Another booking already sits at 11:00-11:30
    mock_scheduled_for_day(&mock_server, professional_id, json!([
        appointment_row(Uuid::new_v4(), professional_id, patient_id,
                        &format!("{}T11:00:00", DAY), json!(30), "scheduled")
    ])).await;

    let service = service_for(&mock_server).await;
    let request = UpdateAppointmentRequest {
        professional_id,
        patient_id,
        office_id: None,
        appointment_date: at(11, 0),
        duration: DurationMinutes::new(30).unwrap(),
        status: AppointmentStatus::Scheduled,
        notes: None,
        amount: None,
    };

    let result = service.update_appointment(appointment_id, request, "test_token").await;
    assert_matches!(result, Err(AppointmentError::ConflictDetected));
}

#[tokio::test]
async fn test_marking_attended_sets_confirmation() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, professional_id, patient_id,
                                 &format!("{}T10:00:00", DAY), json!(30), "scheduled");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(appointment_id, professional_id, patient_id,
                            &format!("{}T10:00:00", DAY), json!(30), "attended")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let appointment = service.update_status(appointment_id, AppointmentStatus::Attended, "test_token")
        .await
        .unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Attended);
    assert!(appointment.confirmed_at.is_some());
}

#[tokio::test]
async fn test_resolved_appointment_cannot_transition_again() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, Uuid::new_v4(), Uuid::new_v4(),
                                 &format!("{}T10:00:00", DAY), json!(30), "cancelled");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    let service = service_for(&mock_server).await;
    let result = service.update_status(appointment_id, AppointmentStatus::Attended, "test_token").await;

    assert_matches!(result, Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Cancelled)));
}

// ==============================================================================
// CANCEL
// ==============================================================================

#[tokio::test]
async fn test_cancel_scheduled_appointment() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let patient_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, professional_id, patient_id,
                                 &format!("{}T10:00:00", DAY), json!(30), "scheduled");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            appointment_row(appointment_id, professional_id, patient_id,
                            &format!("{}T10:00:00", DAY), json!(30), "cancelled")
        ])))
        .mount(&mock_server)
        .await;

    let service = service_for(&mock_server).await;
    let appointment = service.cancel_appointment(appointment_id, "test_token").await.unwrap();

    assert_eq!(appointment.status, AppointmentStatus::Cancelled);
    assert!(appointment.confirmed_at.is_none());
}

#[tokio::test]
async fn test_cancel_attended_appointment_is_rejected() {
    let mock_server = MockServer::start().await;
    let appointment_id = Uuid::new_v4();

    let stored = appointment_row(appointment_id, Uuid::new_v4(), Uuid::new_v4(),
                                 &format!("{}T10:00:00", DAY), json!(30), "attended");
    mock_get_by_id(&mock_server, appointment_id, stored).await;

    // No PATCH mock: a write attempt would fail loudly.
    let service = service_for(&mock_server).await;
    let result = service.cancel_appointment(appointment_id, "test_token").await;

    assert_matches!(result, Err(AppointmentError::InvalidStatusTransition(AppointmentStatus::Attended)));
}

// ==============================================================================
// AVAILABLE SLOTS
// ==============================================================================

#[tokio::test]
async fn test_available_slots_excludes_booked_time() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_scheduled_for_day(&mock_server, professional_id, json!([
        appointment_row(Uuid::new_v4(), professional_id, Uuid::new_v4(),
                        &format!("{}T10:00:00", DAY), json!(30), "scheduled")
    ])).await;

    let service = service_for(&mock_server).await;
    let slots = service.available_slots(
        professional_id,
        day(),
        DurationMinutes::new(30).unwrap(),
        day(),
        "test_token",
    ).await.unwrap();

    let ten = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    let nine_thirty = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    let ten_thirty = NaiveTime::from_hms_opt(10, 30, 0).unwrap();

    assert!(!slots.contains(&ten));
    assert!(slots.contains(&nine_thirty));
    assert!(slots.contains(&ten_thirty));
}

#[tokio::test]
async fn test_available_slots_only_considers_scheduled_records() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();

    mock_professional_exists(&mock_server, professional_id).await;
    // The mock requires status=eq.scheduled in the query; a cancelled
    // booking therefore never reaches the engine, and its old slot is free.
    mock_scheduled_for_day(&mock_server, professional_id, json!([])).await;

    let service = service_for(&mock_server).await;
    let slots = service.available_slots(
        professional_id,
        day(),
        DurationMinutes::new(30).unwrap(),
        day(),
        "test_token",
    ).await.unwrap();

    assert_eq!(slots.len(), 20);
    assert!(slots.contains(&NaiveTime::from_hms_opt(10, 0, 0).unwrap()));
}

#[tokio::test]
async fn test_available_slots_empty_on_weekend() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let saturday = NaiveDate::from_ymd_opt(2030, 3, 9).unwrap();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_scheduled_for_day(&mock_server, professional_id, json!([])).await;

    let service = service_for(&mock_server).await;
    let slots = service.available_slots(
        professional_id,
        saturday,
        DurationMinutes::new(30).unwrap(),
        day(),
        "test_token",
    ).await.unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_available_slots_empty_on_past_date() {
    let mock_server = MockServer::start().await;
    let professional_id = Uuid::new_v4();
    let today = NaiveDate::from_ymd_opt(2030, 3, 5).unwrap();

    mock_professional_exists(&mock_server, professional_id).await;
    mock_scheduled_for_day(&mock_server, professional_id, json!([])).await;

    let service = service_for(&mock_server).await;
    let slots = service.available_slots(
        professional_id,
        day(), // the 4th, one day before "today"
        DurationMinutes::new(30).unwrap(),
        today,
        "test_token",
    ).await.unwrap();

    assert!(slots.is_empty());
}
