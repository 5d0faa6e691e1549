use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use consultation_cell::router::consultation_routes;
use dashboard_cell::router::dashboard_routes;
use office_cell::router::office_routes;
use patient_cell::router::patient_routes;
use professional_cell::router::{professional_routes, specialty_routes};
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic front-desk API is running!" }))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/professionals", professional_routes(state.clone()))
        .nest("/specialties", specialty_routes(state.clone()))
        .nest("/offices", office_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/consultations", consultation_routes(state.clone()))
        .nest("/dashboard", dashboard_routes(state))
}
