use std::sync::Arc;
use axum::{middleware, routing::{delete, get, post, put}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn professional_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_professional))
        .route("/", get(list_professionals))
        .route("/{id}", get(get_professional))
        .route("/{id}", put(update_professional))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}

pub fn specialty_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_specialty))
        .route("/", get(list_specialties))
        .route("/{id}", put(update_specialty))
        .route("/{id}", delete(delete_specialty))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
