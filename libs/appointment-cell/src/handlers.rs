// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::{AppointmentStatus, CreateAppointmentRequest, SchedulingError};
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::InvalidRequest(msg) => AppError::BadRequest(msg),
            SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            SchedulingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
            SchedulingError::Forbidden => {
                AppError::Forbidden("Appointment belongs to another patient".to_string())
            }
            SchedulingError::GuardViolation(guard) => AppError::Unprocessable(guard.to_string()),
            SchedulingError::SlotUnavailable => {
                AppError::Conflict("The requested slot is no longer available".to_string())
            }
            SchedulingError::StorageUnavailable(msg) => AppError::Upstream(msg),
        }
    }
}

#[derive(Clone)]
pub struct AppointmentState {
    pub booking: Arc<BookingService>,
    pub availability: Arc<AvailabilityService>,
}

#[derive(Debug, Deserialize)]
pub struct BookAppointmentPayload {
    pub patient_id: Uuid,
    #[serde(flatten)]
    pub request: CreateAppointmentRequest,
}

#[derive(Debug, Deserialize)]
pub struct CancelPayload {
    pub patient_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReschedulePayload {
    pub patient_id: Uuid,
    pub new_date_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: AppointmentStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub patient_id: Uuid,
    pub days_ahead: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Json(payload): Json<BookAppointmentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .booking
        .create_appointment(payload.request, payload.patient_id)
        .await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn get_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state.booking.get_appointment(appointment_id).await?;
    Ok(Json(appointment))
}

pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<CancelPayload>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .booking
        .cancel_appointment(appointment_id, payload.patient_id)
        .await?;
    Ok(Json(appointment))
}

pub async fn reschedule_appointment(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<ReschedulePayload>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .booking
        .reschedule_appointment(appointment_id, payload.new_date_time, payload.patient_id)
        .await?;
    Ok(Json(appointment))
}

pub async fn update_appointment_status(
    State(state): State<AppointmentState>,
    Path(appointment_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let appointment = state
        .booking
        .update_status(appointment_id, payload.status)
        .await?;
    Ok(Json(appointment))
}

pub async fn get_upcoming_appointments(
    State(state): State<AppointmentState>,
    Query(query): Query<UpcomingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = state
        .booking
        .get_upcoming_appointments(query.patient_id, query.days_ahead.unwrap_or(30))
        .await?;
    let count = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "count": count,
    })))
}

pub async fn get_patient_appointments(
    State(state): State<AppointmentState>,
    Path(patient_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let appointments = state.booking.get_user_appointments(patient_id).await?;
    let count = appointments.len();
    Ok(Json(json!({
        "appointments": appointments,
        "count": count,
    })))
}

pub async fn get_available_slots(
    State(state): State<AppointmentState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let slots = state
        .availability
        .get_available_slots(doctor_id, query.date)
        .await?;
    let count = slots.len();
    Ok(Json(json!({
        "doctor_id": doctor_id,
        "date": query.date,
        "slots": slots,
        "count": count,
    })))
}
