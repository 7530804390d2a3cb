// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub doctor_name: String,
    pub specialty: String,
    pub date_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Scheduled end instant: `date_time + duration`.
    pub fn end_date_time(&self) -> DateTime<Utc> {
        self.date_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }

    /// Whether this appointment still occupies its slot. Cancelled
    /// appointments free the slot; everything else blocks it.
    pub fn blocks_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }
}

/// Closed status set. Unknown values are a data-integrity error and fail
/// deserialization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
        }
    }
}

/// A bookable time-of-day unit inside a doctor's working window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailableSlot {
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: i32,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Booking input. Required fields are optional here so that missing values
/// surface as `InvalidRequest` from the coordinator rather than as a
/// deserialization failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAppointmentRequest {
    pub doctor_id: Option<Uuid>,
    pub date_time: Option<DateTime<Utc>>,
    pub specialty: Option<String>,
    pub duration_minutes: Option<i32>,
    pub notes: Option<String>,
    pub location: Option<String>,
}

// ==============================================================================
// BOOKING POLICY
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingPolicy {
    /// Cadence at which candidate slots are generated.
    pub slot_minutes: i32,
    /// Minimum separation between two appointments for the same doctor.
    pub buffer_minutes: i32,
    pub cancellation_notice_hours: i64,
    pub reschedule_notice_hours: i64,
    /// Blanket clinic booking hours, layered on top of per-doctor windows.
    pub booking_day_start: NaiveTime,
    pub booking_day_end: NaiveTime,
    /// Weekday on which the clinic never books (0 = Sunday).
    pub closed_day_of_week: i32,
    /// Globally reserved break window, if any; no slots are offered inside it.
    pub break_window: Option<(NaiveTime, NaiveTime)>,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            buffer_minutes: 30,
            cancellation_notice_hours: 2,
            reschedule_notice_hours: 2,
            booking_day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            booking_day_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            closed_day_of_week: 0,
            break_window: None,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Which business-rule guard rejected an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Less than the required notice before the appointment starts.
    TooCloseToStart,
    /// The appointment's current status does not admit the transition.
    InvalidStatus(AppointmentStatus),
    /// Requested start falls outside the clinic's blanket booking hours.
    OutsideBusinessHours,
    /// Requested day is closed or the doctor has no working window on it.
    NonWorkingDay,
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::TooCloseToStart => write!(f, "too close to appointment time"),
            Guard::InvalidStatus(status) => write!(f, "not allowed from status {}", status),
            Guard::OutsideBusinessHours => write!(f, "outside clinic booking hours"),
            Guard::NonWorkingDay => write!(f, "no bookings on this day"),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Appointment belongs to another patient")]
    Forbidden,

    #[error("Guard violation: {0}")]
    GuardViolation(Guard),

    #[error("Requested slot is not available")]
    SlotUnavailable,

    #[error("Appointment store unavailable: {0}")]
    StorageUnavailable(String),
}
