use std::sync::Arc;
use axum::{
    extract::{Path, Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreateOfficeRequest, OfficeError, UpdateOfficeRequest};
use crate::services::OfficeService;

#[derive(Debug, Deserialize)]
pub struct OfficeListQuery {
    pub only_active: Option<bool>,
}

fn map_error(e: OfficeError) -> AppError {
    match e {
        OfficeError::NotFound => AppError::NotFound("Office not found".to_string()),
        OfficeError::NumberAlreadyExists { .. } => AppError::Conflict(e.to_string()),
        OfficeError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_office(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Json(request): Json<CreateOfficeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&config);

    let office = service.create_office(request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(office)))
}

#[axum::debug_handler]
pub async fn get_office(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(office_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&config);

    let office = service.get_office(&office_id, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(office)))
}

#[axum::debug_handler]
pub async fn update_office(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Path(office_id): Path<String>,
    Json(request): Json<UpdateOfficeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&config);

    let office = service.update_office(&office_id, request, auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!(office)))
}

#[axum::debug_handler]
pub async fn list_offices(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<OfficeListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&config);

    let offices = service.list_offices(query.only_active.unwrap_or(true), auth.token())
        .await
        .map_err(map_error)?;

    Ok(Json(json!({
        "offices": offices,
        "total": offices.len()
    })))
}
