// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::directory::DoctorDirectory;
use doctor_cell::models::Doctor;

use crate::models::{
    Appointment, AppointmentStatus, BookingPolicy, CreateAppointmentRequest, Guard,
    SchedulingError,
};
use crate::services::availability::AvailabilityService;
use crate::services::lifecycle::LifecycleService;
use crate::store::{AppointmentStore, StoreError};

/// Per-doctor mutual exclusion for the availability-recheck + persist pair.
/// Two concurrent bookings for the same doctor serialize here; bookings for
/// different doctors do not contend.
struct DoctorLocks {
    inner: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl DoctorLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn for_doctor(&self, doctor_id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().await;
        map.entry(doctor_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// The booking coordinator: orchestrates slot validation and status
/// transitions atomically for create, cancel, and reschedule.
pub struct BookingService {
    store: Arc<dyn AppointmentStore>,
    directory: Arc<dyn DoctorDirectory>,
    availability: Arc<AvailabilityService>,
    lifecycle: LifecycleService,
    policy: BookingPolicy,
    locks: DoctorLocks,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        directory: Arc<dyn DoctorDirectory>,
        availability: Arc<AvailabilityService>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            availability,
            lifecycle: LifecycleService::new(),
            policy,
            locks: DoctorLocks::new(),
        }
    }

    // ==========================================================================
    // CREATE
    // ==========================================================================

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        patient_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let doctor_id = request
            .doctor_id
            .ok_or_else(|| SchedulingError::InvalidRequest("doctor_id is required".to_string()))?;
        let date_time = request
            .date_time
            .ok_or_else(|| SchedulingError::InvalidRequest("date_time is required".to_string()))?;
        let specialty = request
            .specialty
            .clone()
            .ok_or_else(|| SchedulingError::InvalidRequest("specialty is required".to_string()))?;

        info!(
            "Booking appointment for patient {} with doctor {} at {}",
            patient_id, doctor_id, date_time
        );

        let now = Utc::now();
        if date_time <= now {
            return Err(SchedulingError::InvalidRequest(
                "appointment must be scheduled for a future time".to_string(),
            ));
        }

        // Blanket clinic rules, independent of the doctor's own schedule
        self.validate_clinic_rules(date_time)?;

        let doctor = self.resolve_doctor(doctor_id).await?;
        let day_of_week = date_time.date_naive().weekday().num_days_from_sunday() as i32;
        if doctor.windows_for(day_of_week).is_empty() {
            return Err(SchedulingError::GuardViolation(Guard::NonWorkingDay));
        }

        let duration_minutes = request.duration_minutes.unwrap_or(self.policy.slot_minutes);
        if duration_minutes <= 0 {
            return Err(SchedulingError::InvalidRequest(
                "duration_minutes must be positive".to_string(),
            ));
        }

        // Availability re-check and insert form one atomic unit per doctor.
        let lock = self.locks.for_doctor(doctor_id).await;
        let _guard = lock.lock().await;

        if !self
            .availability
            .is_span_available(doctor_id, date_time, duration_minutes, None)
            .await?
        {
            warn!(
                "Slot {} for doctor {} is not available",
                date_time, doctor_id
            );
            return Err(SchedulingError::SlotUnavailable);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id,
            doctor_name: doctor.full_name(),
            specialty,
            date_time,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            notes: request.notes,
            location: request.location.or(doctor.location),
            created_at: now,
            updated_at: now,
        };

        self.store
            .insert(appointment.clone())
            .await
            .map_err(map_store_error)?;

        info!("Appointment {} booked with doctor {}", appointment.id, doctor_id);
        Ok(appointment)
    }

    // ==========================================================================
    // CANCEL / RESCHEDULE
    // ==========================================================================

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let mut appointment = self.load_owned(appointment_id, patient_id).await?;

        let now = Utc::now();
        self.lifecycle.ensure_patient_mutable(
            &appointment.status,
            appointment.date_time,
            now,
            self.policy.cancellation_notice_hours,
        )?;

        appointment.status = AppointmentStatus::Cancelled;
        appointment.updated_at = now;
        self.store
            .update(appointment.clone())
            .await
            .map_err(map_store_error)?;

        info!("Appointment {} cancelled", appointment_id);
        Ok(appointment)
    }

    pub async fn reschedule_appointment(
        &self,
        appointment_id: Uuid,
        new_date_time: DateTime<Utc>,
        patient_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Rescheduling appointment {} to {}",
            appointment_id, new_date_time
        );

        let mut appointment = self.load_owned(appointment_id, patient_id).await?;

        let now = Utc::now();
        self.lifecycle.ensure_patient_mutable(
            &appointment.status,
            appointment.date_time,
            now,
            self.policy.reschedule_notice_hours,
        )?;

        if new_date_time <= now {
            return Err(SchedulingError::InvalidRequest(
                "new date must be in the future".to_string(),
            ));
        }
        self.validate_clinic_rules(new_date_time)?;

        // The moved appointment must not collide with itself at the old time.
        let lock = self.locks.for_doctor(appointment.doctor_id).await;
        let _guard = lock.lock().await;

        if !self
            .availability
            .is_span_available(
                appointment.doctor_id,
                new_date_time,
                appointment.duration_minutes,
                Some(appointment.id),
            )
            .await?
        {
            return Err(SchedulingError::SlotUnavailable);
        }

        appointment.date_time = new_date_time;
        appointment.status = AppointmentStatus::Rescheduled;
        appointment.updated_at = Utc::now();
        self.store
            .update(appointment.clone())
            .await
            .map_err(map_store_error)?;

        info!(
            "Appointment {} rescheduled to {}",
            appointment_id, new_date_time
        );
        Ok(appointment)
    }

    // ==========================================================================
    // STAFF STATUS UPDATES
    // ==========================================================================

    /// Clinical-workflow transitions (confirm, start, complete). Cancellation
    /// and rescheduling have dedicated operations with their own guards and
    /// are rejected here.
    pub async fn update_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, SchedulingError> {
        if matches!(
            new_status,
            AppointmentStatus::Cancelled | AppointmentStatus::Rescheduled
        ) {
            return Err(SchedulingError::InvalidRequest(
                "use the cancel or reschedule operation".to_string(),
            ));
        }

        let mut appointment = self
            .store
            .get(appointment_id)
            .await
            .map_err(map_store_error)?
            .ok_or(SchedulingError::NotFound)?;

        self.lifecycle
            .validate_transition(&appointment.status, &new_status)?;

        appointment.status = new_status;
        appointment.updated_at = Utc::now();
        self.store
            .update(appointment.clone())
            .await
            .map_err(map_store_error)?;

        Ok(appointment)
    }

    // ==========================================================================
    // QUERIES
    // ==========================================================================

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        self.store
            .get(appointment_id)
            .await
            .map_err(map_store_error)?
            .ok_or(SchedulingError::NotFound)
    }

    /// Non-cancelled appointments starting within the next `days_ahead`
    /// days, soonest first.
    pub async fn get_upcoming_appointments(
        &self,
        patient_id: Uuid,
        days_ahead: i64,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let now = Utc::now();
        let horizon = now + Duration::days(days_ahead);

        let mut appointments = self
            .store
            .list_by_patient(patient_id)
            .await
            .map_err(map_store_error)?;
        appointments.retain(|a| {
            a.status != AppointmentStatus::Cancelled && a.date_time > now && a.date_time <= horizon
        });
        appointments.sort_by_key(|a| a.date_time);
        Ok(appointments)
    }

    /// Every appointment of a patient, most recent first.
    pub async fn get_user_appointments(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let mut appointments = self
            .store
            .list_by_patient(patient_id)
            .await
            .map_err(map_store_error)?;
        appointments.sort_by_key(|a| std::cmp::Reverse(a.date_time));
        Ok(appointments)
    }

    // ==========================================================================
    // HELPERS
    // ==========================================================================

    async fn resolve_doctor(&self, doctor_id: Uuid) -> Result<Doctor, SchedulingError> {
        self.directory
            .get_doctor(doctor_id)
            .await
            .map_err(|e| SchedulingError::StorageUnavailable(e.to_string()))?
            .ok_or(SchedulingError::DoctorNotFound)
    }

    async fn load_owned(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self
            .store
            .get(appointment_id)
            .await
            .map_err(map_store_error)?
            .ok_or(SchedulingError::NotFound)?;

        if appointment.patient_id != patient_id {
            warn!(
                "Patient {} tried to modify appointment {} owned by {}",
                patient_id, appointment_id, appointment.patient_id
            );
            return Err(SchedulingError::Forbidden);
        }

        Ok(appointment)
    }

    /// Blanket clinic rules layered on top of per-doctor schedules: the
    /// clinic-wide closed weekday and booking hours.
    fn validate_clinic_rules(&self, date_time: DateTime<Utc>) -> Result<(), SchedulingError> {
        let day_of_week = date_time.date_naive().weekday().num_days_from_sunday() as i32;
        if day_of_week == self.policy.closed_day_of_week {
            return Err(SchedulingError::GuardViolation(Guard::NonWorkingDay));
        }

        let time = date_time.time();
        if time < self.policy.booking_day_start || time >= self.policy.booking_day_end {
            return Err(SchedulingError::GuardViolation(Guard::OutsideBusinessHours));
        }

        Ok(())
    }
}

fn map_store_error(err: StoreError) -> SchedulingError {
    match err {
        StoreError::MissingRow(_) => SchedulingError::NotFound,
        StoreError::Unavailable(msg) => SchedulingError::StorageUnavailable(msg),
    }
}
