pub mod directory;
pub mod handlers;
pub mod models;
pub mod router;

pub use directory::{DirectoryError, DoctorDirectory, InMemoryDoctorDirectory, RestDoctorDirectory};
pub use models::{Doctor, ScheduleWindow};
