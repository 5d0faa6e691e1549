use std::sync::Arc;
use axum::{middleware, routing::{get, post, put}, Router};
use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::*;

pub fn office_routes(config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(create_office))
        .route("/", get(list_offices))
        .route("/{id}", get(get_office))
        .route("/{id}", put(update_office))
        .layer(middleware::from_fn_with_state(config.clone(), auth_middleware))
        .with_state(config)
}
