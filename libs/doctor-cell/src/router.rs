use std::sync::Arc;

use axum::{routing::get, Router};

use crate::directory::DoctorDirectory;
use crate::handlers;

pub fn doctor_routes(directory: Arc<dyn DoctorDirectory>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .with_state(directory)
}
