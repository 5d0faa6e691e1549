use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    CreateProfessionalRequest, CreateSpecialtyRequest, ProfessionalError,
    ProfessionalSearchQuery, UpdateProfessionalRequest, UpdateSpecialtyRequest,
};
use crate::services::{ProfessionalService, SpecialtyService};

fn map_error(e: ProfessionalError) -> AppError {
    match e {
        ProfessionalError::NotFound => AppError::NotFound("Professional not found".to_string()),
        ProfessionalError::SpecialtyNotFound => AppError::NotFound("Specialty not found".to_string()),
        ProfessionalError::EmailAlreadyExists { .. }
        | ProfessionalError::LicenseAlreadyExists { .. }
        | ProfessionalError::SpecialtyNameTaken { .. } => AppError::Conflict(e.to_string()),
        ProfessionalError::SpecialtyInUse => AppError::BadRequest(e.to_string()),
        ProfessionalError::ValidationError(msg) => AppError::ValidationError(msg),
        ProfessionalError::DatabaseError(msg) => AppError::Database(msg),
    }
}

// ==============================================================================
// PROFESSIONAL HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_professional(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let professional = service.create_professional(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(professional)))
}

#[axum::debug_handler]
pub async fn get_professional(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(professional_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let professional = service.get_professional(&professional_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(professional)))
}

#[axum::debug_handler]
pub async fn update_professional(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(professional_id): Path<String>,
    Json(request): Json<UpdateProfessionalRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let professional = service.update_professional(&professional_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(professional)))
}

#[axum::debug_handler]
pub async fn list_professionals(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<ProfessionalSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ProfessionalService::new(&config);

    let professionals = service.list_professionals(query, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "professionals": professionals,
        "total": professionals.len()
    })))
}

// ==============================================================================
// SPECIALTY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_specialty(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateSpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let specialty = service.create_specialty(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let specialties = service.list_specialties(auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(specialties)))
}

#[axum::debug_handler]
pub async fn update_specialty(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(specialty_id): Path<String>,
    Json(request): Json<UpdateSpecialtyRequest>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    let specialty = service.update_specialty(&specialty_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(specialty)))
}

#[axum::debug_handler]
pub async fn delete_specialty(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(specialty_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = SpecialtyService::new(&config);

    service.delete_specialty(&specialty_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Specialty deleted successfully"
    })))
}
