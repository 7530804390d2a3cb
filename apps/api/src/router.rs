use std::sync::Arc;

use axum::{routing::get, Router};
use tracing::info;

use appointment_cell::handlers::AppointmentState;
use appointment_cell::router::appointment_routes;
use appointment_cell::store::{AppointmentStore, InMemoryAppointmentStore, RestAppointmentStore};
use appointment_cell::{AvailabilityService, BookingPolicy, BookingService};
use doctor_cell::directory::{
    DoctorDirectory, InMemoryDoctorDirectory, RestDoctorDirectory,
};
use doctor_cell::router::doctor_routes;
use shared_config::{AppConfig, StoreBackend};
use shared_database::RestClient;

pub fn create_router(config: &AppConfig) -> Router {
    let (directory, store): (Arc<dyn DoctorDirectory>, Arc<dyn AppointmentStore>) =
        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory stores with the demo clinic dataset");
                (
                    Arc::new(InMemoryDoctorDirectory::with_demo_doctors()),
                    Arc::new(InMemoryAppointmentStore::new()),
                )
            }
            StoreBackend::Rest => {
                info!("Using REST stores at {}", config.rest_base_url);
                let client = Arc::new(RestClient::new(config));
                (
                    Arc::new(RestDoctorDirectory::new(client.clone())),
                    Arc::new(RestAppointmentStore::new(client)),
                )
            }
        };

    let policy = BookingPolicy::default();
    let availability = Arc::new(AvailabilityService::new(
        directory.clone(),
        store.clone(),
        policy.clone(),
    ));
    let booking = Arc::new(BookingService::new(
        store,
        directory.clone(),
        availability.clone(),
        policy,
    ));
    let state = AppointmentState {
        booking,
        availability,
    };

    Router::new()
        .route("/", get(|| async { "Citas Medicas API is running!" }))
        .nest("/doctors", doctor_routes(directory))
        .nest("/appointments", appointment_routes(state))
}
