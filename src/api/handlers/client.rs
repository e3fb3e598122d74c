use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::UpsertClientRequest;
use crate::api::dtos::responses::StatusResponse;
use crate::api::extractors::{admin::AdminUser, writable::Writable};
use crate::domain::models::client::ClientCard;
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, AppError> {
    let mut clients = state.backend.clients.list().await?;
    clients.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(Json(clients))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let client = state.backend.clients.find_by_id(&client_id).await?
        .ok_or(AppError::NotFound("Client not found".into()))?;
    Ok(Json(client))
}

pub async fn upsert_client(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(client_id): Path<String>,
    Json(payload): Json<UpsertClientRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() || !payload.email.contains('@') {
        return Err(AppError::Validation("Client needs a name and a valid email".into()));
    }

    let now = Utc::now();
    let existing = state.backend.clients.find_by_id(&client_id).await?;
    let client = ClientCard {
        id: client_id,
        name: payload.name.trim().to_string(),
        email: payload.email.trim().to_string(),
        phone: payload.phone,
        notes: payload.notes,
        created_at: existing.map_or(now, |c| c.created_at),
        updated_at: now,
    };

    let stored = state.backend.clients.upsert(&client).await?;
    info!("Saved client card: {}", stored.id);
    Ok(Json(stored))
}

pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(client_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.backend.clients.delete(&client_id).await?;
    info!("Deleted client card: {}", client_id);
    Ok(Json(StatusResponse { status: "deleted" }))
}
