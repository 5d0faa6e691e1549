use std::sync::Arc;
use axum::{middleware, routing::{get, patch, post}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn consultation_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_consultation))
        .route("/", get(search_consultations))
        .route("/{consultation_id}", get(get_consultation))
        .route("/{consultation_id}/payment-status", patch(update_payment_status))
        .route("/{consultation_id}/payments", post(record_payment))
        .route("/{consultation_id}/payments", get(list_payments))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
