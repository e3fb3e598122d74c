use serde::de::DeserializeOwned;
use crate::domain::models::availability::Availability;
use crate::error::AppError;

pub const AVAILABILITY: &str = "availability";
pub const BOOKINGS: &str = "bookings";
pub const PACKAGES: &str = "packages";
pub const CLIENTS: &str = "clients";
pub const SITE_CONTENT: &str = "site_content";

pub fn decode<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
    Ok(serde_json::from_str(data)?)
}

/// The version column is authoritative over whatever the document body carries.
pub fn decode_availability(data: &str, version: i64) -> Result<Availability, AppError> {
    let mut availability: Availability = decode(data)?;
    availability.version = version;
    Ok(availability)
}

pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
