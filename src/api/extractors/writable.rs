use axum::{
    extract::FromRequestParts,
    http::request::Parts,
};
use crate::error::AppError;
use crate::state::AppState;
use std::sync::Arc;

/// Rejects the request up front when the active backend is read-only.
pub struct Writable;

impl FromRequestParts<Arc<AppState>> for Writable {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        if state.backend.is_read_only() {
            return Err(AppError::ReadOnlyMode(format!("the {} backend does not accept writes", state.backend.mode)));
        }
        Ok(Writable)
    }
}
