pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;

pub use models::{
    Appointment, AppointmentStatus, AvailableSlot, BookingPolicy, CreateAppointmentRequest,
    Guard, SchedulingError,
};
pub use handlers::AppointmentState;
pub use services::availability::AvailabilityService;
pub use services::booking::BookingService;
pub use services::lifecycle::LifecycleService;
pub use store::{AppointmentStore, InMemoryAppointmentStore, RestAppointmentStore, StoreError};
