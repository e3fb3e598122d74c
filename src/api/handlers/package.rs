use axum::{extract::{Path, State}, response::IntoResponse, Json};
use crate::api::dtos::requests::UpsertPackageRequest;
use crate::api::dtos::responses::StatusResponse;
use crate::api::extractors::{admin::AdminUser, writable::Writable};
use crate::domain::models::package::Package;
use crate::error::AppError;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

pub async fn list_packages(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let mut packages = state.backend.packages.list().await?;
    packages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(Json(packages))
}

pub async fn upsert_package(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(package_id): Path<String>,
    Json(payload): Json<UpsertPackageRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("Package title is required".into()));
    }

    let existing = state.backend.packages.find_by_id(&package_id).await?;
    let package = Package {
        id: package_id,
        title: payload.title.trim().to_string(),
        price: payload.price,
        description: payload.description,
        duration_minutes: payload.duration_minutes,
        active: payload.active.unwrap_or(true),
        created_at: existing.map_or_else(Utc::now, |p| p.created_at),
    };

    let stored = state.backend.packages.upsert(&package).await?;
    info!("Saved package: {} ({})", stored.id, stored.title);
    Ok(Json(stored))
}

pub async fn delete_package(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Path(package_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    state.backend.packages.delete(&package_id).await?;
    info!("Deleted package: {}", package_id);
    Ok(Json(StatusResponse { status: "deleted" }))
}
