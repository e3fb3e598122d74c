use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::{parse_date, GenerateSlotsRequest, RangeQuery, SlotRequest, UpsertAvailabilityRequest};
use crate::api::extractors::{admin::AdminUser, writable::Writable};
use crate::domain::services::slots::parse_time;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.resolve()?;
    let records = state.inventory.list_range(start, end).await?;
    Ok(Json(records))
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&date)?;
    Ok(Json(state.inventory.get(date).await?))
}

pub async fn upsert_availability(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(date): Path<String>,
    Json(payload): Json<UpsertAvailabilityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&date)?;
    let stored = state.inventory.replace(date, payload.into()).await?;
    Ok(Json(stored))
}

pub async fn generate_slots(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(date): Path<String>,
    Json(payload): Json<GenerateSlotsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&date)?;
    let modality = payload.modality()?;
    let start = parse_time(&payload.start)?;
    let end = parse_time(&payload.end)?;

    let stored = state.inventory.generate(date, &modality, start, end, payload.cadence()).await?;
    Ok(Json(stored))
}

pub async fn add_slot(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(date): Path<String>,
    Json(payload): Json<SlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&date)?;
    let modality = payload.modality()?;
    let stored = state.inventory.add_slot(date, &modality, &payload.slot).await?;
    info!("Admin added {} slot {} on {}", modality, payload.slot, date);
    Ok(Json(stored))
}

pub async fn remove_slot(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(date): Path<String>,
    Json(payload): Json<SlotRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&date)?;
    let modality = payload.modality()?;
    let stored = state.inventory.remove_slot(date, &modality, &payload.slot).await?;
    info!("Admin removed {} slot {} on {}", modality, payload.slot, date);
    Ok(Json(stored))
}
