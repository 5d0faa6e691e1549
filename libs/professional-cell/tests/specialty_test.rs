// libs/professional-cell/tests/specialty_test.rs
//
// Specialty CRUD rules, notably the guarded delete.

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::{Mock, MockServer, ResponseTemplate};
use wiremock::matchers::{method, path, query_param};

use professional_cell::models::{CreateSpecialtyRequest, ProfessionalError};
use professional_cell::services::SpecialtyService;
use shared_utils::test_utils::TestConfig;

fn specialty_row(id: Uuid, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "General practice",
        "is_active": true,
        "created_at": "2030-01-01T00:00:00Z",
        "updated_at": "2030-01-01T00:00:00Z"
    })
}

#[tokio::test]
async fn test_delete_specialty_in_use_is_refused() {
    let mock_server = MockServer::start().await;
    let specialty_id = Uuid::new_v4();

    // One professional still references the specialty
    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .and(query_param("specialty_id", format!("eq.{}", specialty_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = SpecialtyService::new(&config);

    // No DELETE mock mounted: an attempted delete would fail the test
    let result = service.delete_specialty(&specialty_id.to_string(), "test_token").await;
    assert_matches!(result, Err(ProfessionalError::SpecialtyInUse));
}

#[tokio::test]
async fn test_delete_unused_specialty_succeeds() {
    let mock_server = MockServer::start().await;
    let specialty_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/professionals"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            specialty_row(specialty_id, "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = SpecialtyService::new(&config);

    let result = service.delete_specialty(&specialty_id.to_string(), "test_token").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_create_specialty_with_taken_name_is_refused() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            specialty_row(Uuid::new_v4(), "Cardiology")
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = SpecialtyService::new(&config);

    let request = CreateSpecialtyRequest {
        name: "Cardiology".to_string(),
        description: "Heart specialists".to_string(),
    };

    let result = service.create_specialty(request, "test_token").await;
    assert_matches!(result, Err(ProfessionalError::SpecialtyNameTaken { .. }));
}

#[tokio::test]
async fn test_create_specialty_succeeds() {
    let mock_server = MockServer::start().await;
    let specialty_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/specialties"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            specialty_row(specialty_id, "Dermatology")
        ])))
        .mount(&mock_server)
        .await;

    let config = TestConfig::with_supabase_url(&mock_server.uri()).to_app_config();
    let service = SpecialtyService::new(&config);

    let request = CreateSpecialtyRequest {
        name: "Dermatology".to_string(),
        description: "Skin specialists".to_string(),
    };

    let specialty = service.create_specialty(request, "test_token").await.unwrap();
    assert_eq!(specialty.id, specialty_id);
    assert!(specialty.is_active);
}
