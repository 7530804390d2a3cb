// libs/appointment-cell/src/services/availability.rs
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use doctor_cell::directory::DoctorDirectory;
use doctor_cell::models::ScheduleWindow;

use crate::models::{Appointment, AvailableSlot, BookingPolicy, SchedulingError};
use crate::store::AppointmentStore;

/// Computes the bookable slots for a doctor on a calendar date. Pure query:
/// no side effects, safe to call concurrently.
pub struct AvailabilityService {
    directory: Arc<dyn DoctorDirectory>,
    store: Arc<dyn AppointmentStore>,
    policy: BookingPolicy,
}

impl AvailabilityService {
    pub fn new(
        directory: Arc<dyn DoctorDirectory>,
        store: Arc<dyn AppointmentStore>,
        policy: BookingPolicy,
    ) -> Self {
        Self {
            directory,
            store,
            policy,
        }
    }

    pub async fn get_available_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        self.available_slots_excluding(doctor_id, date, None).await
    }

    /// Slot computation with one appointment ignored; the reschedule path
    /// uses this so an appointment does not collide with itself.
    pub async fn available_slots_excluding(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<AvailableSlot>, SchedulingError> {
        let now = Utc::now();

        if date < now.date_naive() {
            return Err(SchedulingError::InvalidRequest(
                "date must not be in the past".to_string(),
            ));
        }

        let doctor = self
            .directory
            .get_doctor(doctor_id)
            .await
            .map_err(|e| SchedulingError::StorageUnavailable(e.to_string()))?
            .ok_or(SchedulingError::DoctorNotFound)?;

        // Off-duty doctor or a day without working windows is an empty
        // result, not an error.
        if !doctor.is_available {
            return Ok(vec![]);
        }

        let day_of_week = date.weekday().num_days_from_sunday() as i32;
        let windows = doctor.windows_for(day_of_week);
        if windows.is_empty() {
            debug!("Doctor {} has no window on weekday {}", doctor_id, day_of_week);
            return Ok(vec![]);
        }

        let appointments = self
            .store
            .list_by_doctor_and_date(doctor_id, date)
            .await
            .map_err(|e| SchedulingError::StorageUnavailable(e.to_string()))?;

        let slots = compute_slots(&windows, &appointments, date, now, &self.policy, exclude);
        debug!("Found {} available slots for doctor {}", slots.len(), doctor_id);
        Ok(slots)
    }

    /// True iff `date_time` names the start of a currently bookable slot.
    pub async fn is_slot_available(
        &self,
        doctor_id: Uuid,
        date_time: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        self.is_span_available(doctor_id, date_time, self.policy.slot_minutes, exclude)
            .await
    }

    /// True iff every cadence slot covered by
    /// `[date_time, date_time + duration)` is currently bookable. An
    /// appointment longer than one slot must hold its whole span, so its
    /// tail can neither overlap another booking nor run past the doctor's
    /// window end.
    pub async fn is_span_available(
        &self,
        doctor_id: Uuid,
        date_time: DateTime<Utc>,
        duration_minutes: i32,
        exclude: Option<Uuid>,
    ) -> Result<bool, SchedulingError> {
        let slots = self
            .available_slots_excluding(doctor_id, date_time.date_naive(), exclude)
            .await?;

        let cadence = Duration::minutes(self.policy.slot_minutes as i64);
        let end = date_time + Duration::minutes(duration_minutes as i64);
        let mut cursor = date_time;
        while cursor < end {
            if !slots.iter().any(|s| s.start_time == cursor.time()) {
                return Ok(false);
            }
            cursor += cadence;
        }
        Ok(true)
    }
}

/// Candidate generation and filtering, separated from I/O.
///
/// A candidate is dropped when its start lies within the collision buffer of
/// a blocking appointment: `appt.start - buffer <= slot.start < appt.end`.
/// The buffer is a minimum spacing, so the slot landing exactly one buffer
/// before an appointment is already taken.
fn compute_slots(
    windows: &[&ScheduleWindow],
    appointments: &[Appointment],
    date: NaiveDate,
    now: DateTime<Utc>,
    policy: &BookingPolicy,
    exclude: Option<Uuid>,
) -> Vec<AvailableSlot> {
    let slot_duration = Duration::minutes(policy.slot_minutes as i64);
    let buffer = Duration::minutes(policy.buffer_minutes as i64);
    let today = date == now.date_naive();

    let blocking: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| a.blocks_slot() && Some(a.id) != exclude)
        .collect();

    let break_window = policy.break_window.map(|(start, end)| {
        (
            date.and_time(start).and_utc(),
            date.and_time(end).and_utc(),
        )
    });

    let mut slots = Vec::new();

    for window in windows {
        let window_end = date.and_time(window.end_time).and_utc();
        let mut cursor = date.and_time(window.start_time).and_utc();

        while cursor + slot_duration <= window_end {
            let slot_end = cursor + slot_duration;

            let in_break = break_window
                .map(|(bs, be)| cursor < be && slot_end > bs)
                .unwrap_or(false);

            let past = today && cursor <= now;

            let taken = blocking
                .iter()
                .any(|a| a.date_time - buffer <= cursor && cursor < a.end_date_time());

            if !in_break && !past && !taken {
                slots.push(AvailableSlot {
                    start_time: cursor.time(),
                    end_time: slot_end.time(),
                    duration_minutes: policy.slot_minutes,
                });
            }

            cursor += slot_duration;
        }
    }

    slots.sort_by_key(|s| s.start_time);
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{NaiveTime, TimeZone};

    fn policy() -> BookingPolicy {
        BookingPolicy::default()
    }

    fn window(start: &str, end: &str) -> ScheduleWindow {
        ScheduleWindow {
            day_of_week: 1,
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
        }
    }

    fn appointment_at(date: NaiveDate, time: &str, duration: i32) -> Appointment {
        let time: NaiveTime = time.parse().unwrap();
        let start = date.and_time(time).and_utc();
        Appointment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            doctor_id: Uuid::new_v4(),
            doctor_name: "Dr. Maria Gonzalez".into(),
            specialty: "cardiology".into(),
            date_time: start,
            duration_minutes: duration,
            status: AppointmentStatus::Scheduled,
            notes: None,
            location: None,
            created_at: start - Duration::days(1),
            updated_at: start - Duration::days(1),
        }
    }

    // Monday 2026-09-14; "now" kept well before it so no today-filtering.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 14).unwrap()
    }

    fn long_before() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn full_working_day_yields_sixteen_slots() {
        let w = window("09:00:00", "17:00:00");
        let slots = compute_slots(&[&w], &[], monday(), long_before(), &policy(), None);

        assert_eq!(slots.len(), 16);
        assert_eq!(slots[0].start_time, "09:00:00".parse::<NaiveTime>().unwrap());
        assert_eq!(
            slots.last().unwrap().start_time,
            "16:30:00".parse::<NaiveTime>().unwrap()
        );
    }

    #[test]
    fn booking_with_buffer_removes_exactly_two_slots() {
        let w = window("09:00:00", "17:00:00");
        let booked = appointment_at(monday(), "10:00:00", 30);
        let slots = compute_slots(&[&w], &[booked], monday(), long_before(), &policy(), None);

        let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();
        assert_eq!(slots.len(), 14);
        assert!(!starts.contains(&"09:30:00".parse().unwrap()));
        assert!(!starts.contains(&"10:00:00".parse().unwrap()));
        assert!(starts.contains(&"09:00:00".parse().unwrap()));
        assert!(starts.contains(&"10:30:00".parse().unwrap()));
    }

    #[test]
    fn cancelled_appointments_do_not_block() {
        let w = window("09:00:00", "17:00:00");
        let mut booked = appointment_at(monday(), "10:00:00", 30);
        booked.status = AppointmentStatus::Cancelled;
        let slots = compute_slots(&[&w], &[booked], monday(), long_before(), &policy(), None);
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn excluded_appointment_does_not_block_itself() {
        let w = window("09:00:00", "17:00:00");
        let booked = appointment_at(monday(), "10:00:00", 30);
        let slots = compute_slots(
            &[&w],
            &[booked.clone()],
            monday(),
            long_before(),
            &policy(),
            Some(booked.id),
        );
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn break_window_is_carved_out() {
        let mut p = policy();
        p.break_window = Some((
            "14:00:00".parse().unwrap(),
            "15:00:00".parse().unwrap(),
        ));
        let w = window("09:00:00", "17:00:00");
        let slots = compute_slots(&[&w], &[], monday(), long_before(), &p, None);

        let starts: Vec<NaiveTime> = slots.iter().map(|s| s.start_time).collect();
        assert_eq!(slots.len(), 14);
        assert!(!starts.contains(&"14:00:00".parse().unwrap()));
        assert!(!starts.contains(&"14:30:00".parse().unwrap()));
        assert!(starts.contains(&"15:00:00".parse().unwrap()));
    }

    #[test]
    fn today_filters_slots_already_past() {
        let w = window("09:00:00", "17:00:00");
        // 11:00 on the queried day itself
        let now = monday().and_time("11:00:00".parse().unwrap()).and_utc();
        let slots = compute_slots(&[&w], &[], monday(), now, &policy(), None);

        // 09:00 through 11:00 inclusive are gone; 11:30..16:30 remain
        assert_eq!(slots.len(), 11);
        assert_eq!(slots[0].start_time, "11:30:00".parse::<NaiveTime>().unwrap());
    }

    #[test]
    fn short_tail_of_window_is_not_offered() {
        // 45-minute window only fits one 30-minute slot
        let w = window("09:00:00", "09:45:00");
        let slots = compute_slots(&[&w], &[], monday(), long_before(), &policy(), None);
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, "09:00:00".parse::<NaiveTime>().unwrap());
    }
}
