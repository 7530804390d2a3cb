// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::models::{AppointmentStatus, Guard, SchedulingError};

/// The appointment state machine. Pure functions over status and time;
/// callers inject `now` and the coordinator applies the resulting mutation.
pub struct LifecycleService;

impl LifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// All valid next statuses for a given current status.
    ///
    /// `Rescheduled` is a re-entry point and behaves like `Scheduled`: it can
    /// be confirmed, cancelled, or rescheduled again.
    pub fn valid_transitions(&self, current: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::InProgress,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::InProgress => vec![AppointmentStatus::Completed],
            AppointmentStatus::Rescheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => vec![],
            AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Validate that a status transition is allowed by the table above.
    pub fn validate_transition(
        &self,
        current: &AppointmentStatus,
        new: &AppointmentStatus,
    ) -> Result<(), SchedulingError> {
        debug!("Validating status transition {} -> {}", current, new);

        if !self.valid_transitions(current).contains(new) {
            warn!("Invalid status transition attempted: {} -> {}", current, new);
            return Err(SchedulingError::GuardViolation(Guard::InvalidStatus(
                *current,
            )));
        }

        Ok(())
    }

    fn has_notice(&self, start: DateTime<Utc>, now: DateTime<Utc>, notice_hours: i64) -> bool {
        now <= start - Duration::hours(notice_hours)
    }

    fn is_patient_mutable(&self, status: &AppointmentStatus) -> bool {
        matches!(
            status,
            AppointmentStatus::Scheduled
                | AppointmentStatus::Confirmed
                | AppointmentStatus::Rescheduled
        )
    }

    /// True iff the appointment may still be cancelled by its patient:
    /// status permits it and at least `notice_hours` remain before start.
    pub fn can_be_cancelled(
        &self,
        status: &AppointmentStatus,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        notice_hours: i64,
    ) -> bool {
        self.is_patient_mutable(status) && self.has_notice(start, now, notice_hours)
    }

    /// Same rule as cancellation.
    pub fn can_be_rescheduled(
        &self,
        status: &AppointmentStatus,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        notice_hours: i64,
    ) -> bool {
        self.can_be_cancelled(status, start, now, notice_hours)
    }

    /// Guard check with a typed failure reason. Status is checked before the
    /// time window so that a completed appointment one hour before its start
    /// reports the status problem, not the timing one.
    pub fn ensure_patient_mutable(
        &self,
        status: &AppointmentStatus,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
        notice_hours: i64,
    ) -> Result<(), SchedulingError> {
        if !self.is_patient_mutable(status) {
            return Err(SchedulingError::GuardViolation(Guard::InvalidStatus(
                *status,
            )));
        }
        if !self.has_notice(start, now, notice_hours) {
            return Err(SchedulingError::GuardViolation(Guard::TooCloseToStart));
        }
        Ok(())
    }
}

impl Default for LifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 9, 14, hour, 0, 0).unwrap()
    }

    #[test]
    fn scheduled_can_be_confirmed_cancelled_or_rescheduled() {
        let lifecycle = LifecycleService::new();
        for target in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Rescheduled,
        ] {
            assert!(lifecycle
                .validate_transition(&AppointmentStatus::Scheduled, &target)
                .is_ok());
        }
        assert_matches!(
            lifecycle.validate_transition(
                &AppointmentStatus::Scheduled,
                &AppointmentStatus::Completed
            ),
            Err(SchedulingError::GuardViolation(Guard::InvalidStatus(
                AppointmentStatus::Scheduled
            )))
        );
    }

    #[test]
    fn terminal_states_admit_nothing() {
        let lifecycle = LifecycleService::new();
        for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
            assert!(lifecycle.valid_transitions(&terminal).is_empty());
            assert!(terminal.is_terminal());
        }
    }

    #[test]
    fn rescheduled_reenters_like_scheduled() {
        let lifecycle = LifecycleService::new();
        assert_eq!(
            lifecycle.valid_transitions(&AppointmentStatus::Rescheduled),
            lifecycle.valid_transitions(&AppointmentStatus::Scheduled)
        );
    }

    #[test]
    fn cancellation_window_is_inclusive_at_exactly_two_hours() {
        let lifecycle = LifecycleService::new();
        let start = at(12);

        // 3 hours of notice: fine
        assert!(lifecycle.can_be_cancelled(&AppointmentStatus::Scheduled, start, at(9), 2));
        // exactly 2 hours of notice: still fine
        assert!(lifecycle.can_be_cancelled(&AppointmentStatus::Confirmed, start, at(10), 2));
        // 1 hour of notice: rejected
        assert!(!lifecycle.can_be_cancelled(&AppointmentStatus::Scheduled, start, at(11), 2));
    }

    #[test]
    fn guard_reports_status_before_timing() {
        let lifecycle = LifecycleService::new();
        let start = at(12);

        assert_matches!(
            lifecycle.ensure_patient_mutable(&AppointmentStatus::Completed, start, at(11), 2),
            Err(SchedulingError::GuardViolation(Guard::InvalidStatus(
                AppointmentStatus::Completed
            )))
        );
        assert_matches!(
            lifecycle.ensure_patient_mutable(&AppointmentStatus::Scheduled, start, at(11), 2),
            Err(SchedulingError::GuardViolation(Guard::TooCloseToStart))
        );
    }

    #[test]
    fn reschedule_uses_the_same_window_as_cancel() {
        let lifecycle = LifecycleService::new();
        let start = at(12);
        assert_eq!(
            lifecycle.can_be_rescheduled(&AppointmentStatus::Scheduled, start, at(10), 2),
            lifecycle.can_be_cancelled(&AppointmentStatus::Scheduled, start, at(10), 2)
        );
    }
}
