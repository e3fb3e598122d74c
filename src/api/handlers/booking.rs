use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use crate::api::dtos::requests::{CreateBookingRequest, UpdateBookingRequest};
use crate::api::dtos::responses::{BookingCreatedResponse, StatusResponse};
use crate::api::extractors::{admin::AdminUser, writable::Writable};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    _writable: Writable,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = payload.into_draft()?;
    info!("create_booking: {} at {} {}", draft.email, draft.date, draft.slot);

    let booking = state.lifecycle.create_booking(draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse { id: booking.id, status: booking.status }),
    ))
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.lifecycle.list_bookings().await?))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.lifecycle.get_booking(&booking_id).await?))
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(booking_id): Path<String>,
    Json(payload): Json<UpdateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let stored = state.lifecycle.get_booking(&booking_id).await?;
    let merged = payload.apply_to(stored)?;
    let updated = state.lifecycle.update_booking(merged).await?;
    Ok(Json(updated))
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.lifecycle.delete_booking(&booking_id).await?;
    Ok(Json(StatusResponse { status: "deleted" }))
}
