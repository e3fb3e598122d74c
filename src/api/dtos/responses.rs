use serde::Serialize;

use crate::domain::models::booking::BookingStatus;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCreatedResponse {
    pub id: String,
    pub status: BookingStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendResponse {
    pub mode: String,
    pub read_only: bool,
    pub slot_hold_policy: String,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}
