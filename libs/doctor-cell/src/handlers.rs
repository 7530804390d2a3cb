use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::directory::{DirectoryError, DoctorDirectory};

#[derive(Debug, Deserialize)]
pub struct DoctorListQuery {
    pub specialty: Option<String>,
}

impl From<DirectoryError> for AppError {
    fn from(err: DirectoryError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

pub async fn list_doctors(
    State(directory): State<Arc<dyn DoctorDirectory>>,
    Query(query): Query<DoctorListQuery>,
) -> Result<Json<Value>, AppError> {
    let doctors = directory
        .list_available_doctors(query.specialty.as_deref())
        .await?;

    let count = doctors.len();
    Ok(Json(json!({
        "doctors": doctors,
        "count": count
    })))
}

pub async fn get_doctor(
    State(directory): State<Arc<dyn DoctorDirectory>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = directory
        .get_doctor(doctor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(json!({ "doctor": doctor })))
}
