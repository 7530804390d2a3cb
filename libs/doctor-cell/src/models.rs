use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// One recurring weekly working window for a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleWindow {
    pub day_of_week: i32, // 0 = Sunday, 1 = Monday, etc.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub specialty: String,
    pub location: Option<String>,
    pub is_available: bool,
    pub schedule: Vec<ScheduleWindow>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    #[error("day of week must be between 0 (Sunday) and 6 (Saturday)")]
    InvalidDayOfWeek,

    #[error("window start time must be before end time")]
    InvertedWindow,

    #[error("schedule windows overlap on day {0}")]
    OverlappingWindows(i32),
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("Dr. {} {}", self.first_name, self.last_name)
    }

    /// Working windows for a weekday (0 = Sunday), ascending by start time.
    pub fn windows_for(&self, day_of_week: i32) -> Vec<&ScheduleWindow> {
        let mut windows: Vec<&ScheduleWindow> = self
            .schedule
            .iter()
            .filter(|w| w.day_of_week == day_of_week)
            .collect();
        windows.sort_by_key(|w| w.start_time);
        windows
    }

    /// Validate the weekly schedule: sane day numbers, start < end, and no
    /// overlapping windows on the same day.
    pub fn validate_schedule(&self) -> Result<(), ScheduleError> {
        for window in &self.schedule {
            if window.day_of_week < 0 || window.day_of_week > 6 {
                return Err(ScheduleError::InvalidDayOfWeek);
            }
            if window.start_time >= window.end_time {
                return Err(ScheduleError::InvertedWindow);
            }
        }

        for day in 0..7 {
            let windows = self.windows_for(day);
            for pair in windows.windows(2) {
                if pair[1].start_time < pair[0].end_time {
                    return Err(ScheduleError::OverlappingWindows(day));
                }
            }
        }

        Ok(())
    }
}
