// libs/appointment-cell/src/store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_database::RestClient;

use crate::models::Appointment;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("appointment store unavailable: {0}")]
    Unavailable(String),

    #[error("no appointment with id {0}")]
    MissingRow(Uuid),
}

/// Persistence seam for appointments. Implementations are expected to be
/// read-your-writes consistent within one logical operation.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// All appointments (any status) for a doctor whose start instant falls
    /// on the given calendar date, ascending by start.
    async fn list_by_doctor_and_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn list_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError>;

    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError>;

    /// Replace the stored row for `appointment.id`.
    async fn update(&self, appointment: Appointment) -> Result<(), StoreError>;
}

// ==============================================================================
// IN-MEMORY STORE
// ==============================================================================

pub struct InMemoryAppointmentStore {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self {
            appointments: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryAppointmentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn list_by_doctor_and_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.doctor_id == doctor_id && a.date_time.date_naive() == date)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.date_time);
        Ok(result)
    }

    async fn list_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        result.sort_by_key(|a| a.date_time);
        Ok(result)
    }

    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError> {
        self.appointments
            .write()
            .await
            .insert(appointment.id, appointment);
        Ok(())
    }

    async fn update(&self, appointment: Appointment) -> Result<(), StoreError> {
        let mut appointments = self.appointments.write().await;
        if !appointments.contains_key(&appointment.id) {
            return Err(StoreError::MissingRow(appointment.id));
        }
        appointments.insert(appointment.id, appointment);
        Ok(())
    }
}

// ==============================================================================
// REST STORE
// ==============================================================================

/// PostgREST-style HTTP backend.
pub struct RestAppointmentStore {
    client: Arc<RestClient>,
}

impl RestAppointmentStore {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Appointment>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Unavailable(format!("bad appointment row: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl AppointmentStore for RestAppointmentStore {
    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        debug!("Fetching appointment: {}", id);

        let path = format!("/appointments?id=eq.{}", id);
        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn list_by_doctor_and_date(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let start_of_day = date.and_hms_opt(0, 0, 0).unwrap().and_utc();
        let next_day = start_of_day + chrono::Duration::days(1);

        let path = format!(
            "/appointments?doctor_id=eq.{}&date_time=gte.{}&date_time=lt.{}&order=date_time.asc",
            doctor_id,
            start_of_day.to_rfc3339(),
            next_day.to_rfc3339()
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::parse_rows(rows)
    }

    async fn list_by_patient(&self, patient_id: Uuid) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/appointments?patient_id=eq.{}&order=date_time.asc",
            patient_id
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Self::parse_rows(rows)
    }

    async fn insert(&self, appointment: Appointment) -> Result<(), StoreError> {
        debug!("Inserting appointment: {}", appointment.id);

        let body = serde_json::to_value(&appointment)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let _rows: Vec<Value> = self
            .client
            .request(Method::POST, "/appointments", Some(body))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn update(&self, appointment: Appointment) -> Result<(), StoreError> {
        debug!("Updating appointment: {}", appointment.id);

        let path = format!("/appointments?id=eq.{}", appointment.id);
        let body = serde_json::to_value(&appointment)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let rows: Vec<Value> = self
            .client
            .request(Method::PATCH, &path, Some(body))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if rows.is_empty() {
            return Err(StoreError::MissingRow(appointment.id));
        }

        Ok(())
    }
}
