use axum::{extract::State, response::IntoResponse, Json};
use crate::api::dtos::responses::{BackendResponse, StatusResponse};
use crate::state::AppState;
use std::sync::Arc;

pub async fn health_check() -> impl IntoResponse {
    Json(StatusResponse { status: "ok" })
}

pub async fn backend_info(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(BackendResponse {
        mode: state.backend.mode.as_str().to_string(),
        read_only: state.backend.is_read_only(),
        slot_hold_policy: state.lifecycle.policy().as_str().to_string(),
    })
}
