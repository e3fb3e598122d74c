use axum::{extract::State, response::IntoResponse, Json};
use crate::api::extractors::{admin::AdminUser, writable::Writable};
use crate::domain::models::site_content::SiteContent;
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;
use tracing::info;

pub async fn get_content(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.backend.content.get().await?))
}

pub async fn save_content(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    _writable: Writable,
    Json(payload): Json<SiteContent>,
) -> Result<impl IntoResponse, AppError> {
    if payload.notification_email.as_deref().is_some_and(|e| !e.is_empty() && !e.contains('@')) {
        return Err(AppError::Validation("Notification email is not a valid address".into()));
    }
    let stored = state.backend.content.save(&payload).await?;
    info!("Site content saved (palette {})", stored.palette_id);
    Ok(Json(stored))
}
