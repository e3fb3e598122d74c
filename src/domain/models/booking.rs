use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};

use super::availability::{BookingLocation, SlotKey, SlotModality};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// pending -> confirmed, confirmed -> cancelled, or no change.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Pending)
                | (BookingStatus::Confirmed, BookingStatus::Confirmed)
                | (BookingStatus::Cancelled, BookingStatus::Cancelled)
                | (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub slot: String,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub is_free_consultation: bool,
    #[serde(default)]
    pub location: Option<BookingLocation>,
    #[serde(default)]
    pub studio_location: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub priority: Option<bool>,
    #[serde(default)]
    pub channel_preference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn modality(&self) -> SlotModality {
        SlotModality::resolve(self.is_free_consultation, self.location, self.studio_location.as_deref())
    }

    /// The inventory entry this booking refers to, if it names a slot at all.
    pub fn slot_key(&self) -> Option<SlotKey> {
        if self.slot.trim().is_empty() {
            return None;
        }
        Some(SlotKey {
            date: self.date,
            modality: self.modality(),
            slot: self.slot.clone(),
        })
    }
}

/// A validated public booking submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDraft {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub date: NaiveDate,
    pub slot: String,
    pub package_id: Option<String>,
    pub is_free_consultation: bool,
    pub location: Option<BookingLocation>,
    pub studio_location: Option<String>,
    pub priority: Option<bool>,
    pub channel_preference: Option<String>,
    pub notes: Option<String>,
}

impl BookingDraft {
    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            date: self.date,
            modality: SlotModality::resolve(self.is_free_consultation, self.location, self.studio_location.as_deref()),
            slot: self.slot.clone(),
        }
    }
}

/// A booking about to be stored; the adapter assigns the id.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub draft: BookingDraft,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn pending(draft: BookingDraft) -> Self {
        Self {
            draft,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn into_booking(self, id: String) -> Booking {
        let d = self.draft;
        Booking {
            id,
            name: d.name,
            email: d.email,
            phone: d.phone,
            date: d.date,
            slot: d.slot,
            package_id: d.package_id,
            is_free_consultation: d.is_free_consultation,
            location: d.location,
            studio_location: d.studio_location,
            status: self.status,
            priority: d.priority,
            channel_preference: d.channel_preference,
            notes: d.notes,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use BookingStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Confirmed));
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Cancelled));
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&BookingStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmed\"");
    }
}
