use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveTime;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::RestClient;

use crate::models::{Doctor, ScheduleWindow};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("doctor directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only doctor lookup used by the scheduling core.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError>;

    /// Doctors accepting bookings, optionally narrowed to one specialty.
    async fn list_available_doctors(
        &self,
        specialty: Option<&str>,
    ) -> Result<Vec<Doctor>, DirectoryError>;
}

// ==============================================================================
// IN-MEMORY DIRECTORY
// ==============================================================================

pub struct InMemoryDoctorDirectory {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self {
            doctors: RwLock::new(HashMap::new()),
        }
    }

    /// Directory preloaded with the demo clinic roster.
    pub fn with_demo_doctors() -> Self {
        let doctors = demo_doctors().into_iter().map(|d| (d.id, d)).collect();
        Self {
            doctors: RwLock::new(doctors),
        }
    }

    pub async fn insert(&self, doctor: Doctor) -> Result<(), DirectoryError> {
        doctor
            .validate_schedule()
            .map_err(|e| DirectoryError::Unavailable(format!("invalid schedule: {}", e)))?;
        self.doctors.write().await.insert(doctor.id, doctor);
        Ok(())
    }
}

impl Default for InMemoryDoctorDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        Ok(self.doctors.read().await.get(&doctor_id).cloned())
    }

    async fn list_available_doctors(
        &self,
        specialty: Option<&str>,
    ) -> Result<Vec<Doctor>, DirectoryError> {
        let doctors = self.doctors.read().await;
        let mut result: Vec<Doctor> = doctors
            .values()
            .filter(|d| d.is_available)
            .filter(|d| specialty.map_or(true, |s| d.specialty == s))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.last_name.cmp(&b.last_name));
        Ok(result)
    }
}

/// Demo roster: five doctors, Monday through Friday, 09:00-17:00.
pub fn demo_doctors() -> Vec<Doctor> {
    let weekday_schedule = || -> Vec<ScheduleWindow> {
        (1..=5)
            .map(|day| ScheduleWindow {
                day_of_week: day,
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            })
            .collect()
    };

    let roster = [
        ("Maria", "Gonzalez", "cardiology", "Consultorio 101"),
        ("Carlos", "Ramirez", "general_medicine", "Consultorio 205"),
        ("Ana", "Martinez", "dermatology", "Consultorio 310"),
        ("Luis", "Hernandez", "orthopedics", "Consultorio 102"),
        ("Carmen", "Lopez", "gynecology", "Consultorio 401"),
    ];

    roster
        .iter()
        .map(|(first, last, specialty, location)| Doctor {
            id: Uuid::new_v4(),
            first_name: (*first).to_string(),
            last_name: (*last).to_string(),
            specialty: (*specialty).to_string(),
            location: Some((*location).to_string()),
            is_available: true,
            schedule: weekday_schedule(),
        })
        .collect()
}

// ==============================================================================
// REST DIRECTORY
// ==============================================================================

pub struct RestDoctorDirectory {
    client: Arc<RestClient>,
}

impl RestDoctorDirectory {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DoctorDirectory for RestDoctorDirectory {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DirectoryError> {
        debug!("Fetching doctor: {}", doctor_id);

        let path = format!("/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let doctor: Doctor = serde_json::from_value(row)
                    .map_err(|e| DirectoryError::Unavailable(format!("bad doctor row: {}", e)))?;
                Ok(Some(doctor))
            }
            None => Ok(None),
        }
    }

    async fn list_available_doctors(
        &self,
        specialty: Option<&str>,
    ) -> Result<Vec<Doctor>, DirectoryError> {
        let mut path = "/doctors?is_available=eq.true&order=last_name.asc".to_string();
        if let Some(specialty) = specialty {
            path.push_str(&format!("&specialty=eq.{}", specialty));
        }

        let result: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;

        result
            .into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| DirectoryError::Unavailable(format!("bad doctor row: {}", e)))
            })
            .collect()
    }
}
