use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    ConsultationError, ConsultationSearchQuery, CreateConsultationRequest,
    RecordPaymentRequest, UpdatePaymentStatusRequest,
};
use crate::services::{ConsultationService, PaymentService};

fn map_error(e: ConsultationError) -> AppError {
    match e {
        ConsultationError::NotFound => AppError::NotFound("Consultation not found".to_string()),
        ConsultationError::AppointmentNotFound => AppError::NotFound("Appointment not found".to_string()),
        ConsultationError::AppointmentNotAttended
        | ConsultationError::ConsultationAlreadyExists => AppError::BadRequest(e.to_string()),
        ConsultationError::ValidationError(msg) => AppError::ValidationError(msg),
        ConsultationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_consultation(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let consultation = service.create_consultation(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(config): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let consultation = service.get_consultation(consultation_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(consultation)))
}

#[axum::debug_handler]
pub async fn search_consultations(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<ConsultationSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let consultations = service.search_consultations(query, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "consultations": consultations,
        "total": consultations.len()
    })))
}

#[axum::debug_handler]
pub async fn update_payment_status(
    State(config): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&config);

    let consultation = service.update_payment_status(consultation_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn record_payment(
    State(config): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);
    let registered_by = Uuid::parse_str(&user.id).ok();

    let payment = service.record_payment(consultation_id, request, registered_by, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "payment": payment
    })))
}

#[axum::debug_handler]
pub async fn list_payments(
    State(config): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = PaymentService::new(&config);

    let payments = service.list_payments(consultation_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "payments": payments,
        "total": payments.len()
    })))
}
