use std::sync::Arc;
use axum::{
    extract::{Query, State, Extension},
    Json,
};
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use serde::Deserialize;
use serde_json::{json, Value};
use chrono::{NaiveDate, Utc};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::DashboardError;
use crate::services::DashboardService;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub date: Option<NaiveDate>,
}

#[axum::debug_handler]
pub async fn daily_summary(
    State(config): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Value>, AppError> {
    let service = DashboardService::new(&config);
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let summary = service.daily_summary(date, auth.token())
        .await
        .map_err(|e| match e {
            DashboardError::DatabaseError(msg) => AppError::Database(msg),
        })?;

    Ok(Json(json!(summary)))
}
