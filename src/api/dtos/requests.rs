use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::models::availability::{BookingLocation, SlotModality};
use crate::domain::models::booking::{Booking, BookingDraft, BookingStatus};
use crate::domain::services::inventory::SlotLists;
use crate::domain::services::slots::SlotCadence;
use crate::error::AppError;

/// Default window for availability listings without explicit bounds.
const DEFAULT_RANGE_DAYS: i64 = 30;

pub fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid date '{}' (expected YYYY-MM-DD)", value)))
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl RangeQuery {
    pub fn resolve(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let start = match &self.start {
            Some(s) => parse_date(s)?,
            None => Utc::now().date_naive(),
        };
        let end = match &self.end {
            Some(e) => parse_date(e)?,
            None => start
                .checked_add_signed(Duration::days(DEFAULT_RANGE_DAYS))
                .ok_or_else(|| AppError::Validation(format!("start {} is too far in the future", start)))?,
        };
        Ok((start, end))
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpsertAvailabilityRequest {
    pub online_slots: Vec<String>,
    pub free_consultation_slots: Vec<String>,
    pub in_studio_slots: Vec<String>,
    pub studio_slots: BTreeMap<String, Vec<String>>,
}

impl From<UpsertAvailabilityRequest> for SlotLists {
    fn from(req: UpsertAvailabilityRequest) -> Self {
        SlotLists {
            online_slots: req.online_slots,
            free_consultation_slots: req.free_consultation_slots,
            in_studio_slots: req.in_studio_slots,
            studio_slots: req.studio_slots,
        }
    }
}

fn parse_modality(kind: &str, studio_location: Option<String>) -> Result<SlotModality, AppError> {
    SlotModality::parse(kind, studio_location).ok_or_else(|| {
        AppError::Validation(format!(
            "Unknown modality '{}' (expected online, inStudio, studio with studioLocation, or freeConsultation)",
            kind
        ))
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSlotsRequest {
    pub modality: String,
    pub studio_location: Option<String>,
    pub start: String,
    pub end: String,
    pub interval_minutes: Option<u32>,
    /// Switches to promotional spacing when present.
    pub duration_minutes: Option<u32>,
    pub gap_minutes: Option<u32>,
}

impl GenerateSlotsRequest {
    pub fn modality(&self) -> Result<SlotModality, AppError> {
        parse_modality(&self.modality, self.studio_location.clone())
    }

    pub fn cadence(&self) -> SlotCadence {
        match self.duration_minutes {
            Some(duration_minutes) => SlotCadence::Promotional {
                duration_minutes,
                gap_minutes: self.gap_minutes.unwrap_or(0),
            },
            None => SlotCadence::Interval {
                interval_minutes: self.interval_minutes.unwrap_or(60),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotRequest {
    pub modality: String,
    pub studio_location: Option<String>,
    pub slot: String,
}

impl SlotRequest {
    pub fn modality(&self) -> Result<SlotModality, AppError> {
        parse_modality(&self.modality, self.studio_location.clone())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date: String,
    #[serde(default)]
    pub slot: String,
    pub package_id: Option<String>,
    #[serde(default)]
    pub is_free_consultation: bool,
    pub location: Option<BookingLocation>,
    pub studio_location: Option<String>,
    pub priority: Option<bool>,
    pub channel_preference: Option<String>,
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    pub fn into_draft(self) -> Result<BookingDraft, AppError> {
        Ok(BookingDraft {
            date: parse_date(&self.date)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            slot: self.slot,
            package_id: self.package_id,
            is_free_consultation: self.is_free_consultation,
            location: self.location,
            studio_location: self.studio_location,
            priority: self.priority,
            channel_preference: self.channel_preference,
            notes: self.notes,
        })
    }
}

/// Partial booking edit. Absent fields keep their stored value.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateBookingRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub slot: Option<String>,
    pub package_id: Option<String>,
    pub is_free_consultation: Option<bool>,
    pub location: Option<BookingLocation>,
    pub studio_location: Option<String>,
    pub status: Option<BookingStatus>,
    pub priority: Option<bool>,
    pub channel_preference: Option<String>,
    pub notes: Option<String>,
}

impl UpdateBookingRequest {
    pub fn apply_to(self, mut booking: Booking) -> Result<Booking, AppError> {
        if let Some(date) = &self.date {
            booking.date = parse_date(date)?;
        }
        if let Some(name) = self.name { booking.name = name; }
        if let Some(email) = self.email { booking.email = email; }
        if let Some(slot) = self.slot { booking.slot = slot; }
        if let Some(flag) = self.is_free_consultation { booking.is_free_consultation = flag; }
        if let Some(status) = self.status { booking.status = status; }
        if self.phone.is_some() { booking.phone = self.phone; }
        if self.package_id.is_some() { booking.package_id = self.package_id; }
        if self.location.is_some() { booking.location = self.location; }
        if self.studio_location.is_some() { booking.studio_location = self.studio_location; }
        if self.priority.is_some() { booking.priority = self.priority; }
        if self.channel_preference.is_some() { booking.channel_preference = self.channel_preference; }
        if self.notes.is_some() { booking.notes = self.notes; }
        Ok(booking)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertPackageRequest {
    pub title: String,
    pub price: String,
    #[serde(default)]
    pub description: String,
    pub duration_minutes: Option<u32>,
    pub active: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertClientRequest {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}
