// libs/appointment-cell/src/router.rs
use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::{self, AppointmentState};

pub fn appointment_routes(state: AppointmentState) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route(
            "/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .route(
            "/{appointment_id}/status",
            patch(handlers::update_appointment_status),
        )
        .route("/upcoming", get(handlers::get_upcoming_appointments))
        .route("/patients/{patient_id}", get(handlers::get_patient_appointments))
        .route(
            "/availability/{doctor_id}",
            get(handlers::get_available_slots),
        )
        .with_state(state)
}
