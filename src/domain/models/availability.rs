use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::services::slots::normalize_slot;

/// Time-of-day strings (`HH:MM`). Lexicographic order is chronological order.
pub type SlotSet = BTreeSet<String>;

/// Which slot list of an [`Availability`] record a booking draws from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SlotModality {
    Online,
    /// Legacy in-person list without a studio name.
    InStudio,
    Studio(String),
    FreeConsultation,
}

impl SlotModality {
    /// Resolves the modality from the booking-side fields.
    ///
    /// The free-consultation flag wins over location; a studio booking without
    /// a studio name falls back to the legacy in-studio list.
    pub fn resolve(is_free_consultation: bool, location: Option<BookingLocation>, studio_location: Option<&str>) -> Self {
        if is_free_consultation {
            return SlotModality::FreeConsultation;
        }
        match location {
            Some(BookingLocation::Studio) => match studio_location.map(str::trim).filter(|s| !s.is_empty()) {
                Some(name) => SlotModality::Studio(name.to_string()),
                None => SlotModality::InStudio,
            },
            _ => SlotModality::Online,
        }
    }

    /// Parses the admin-facing modality name (`online`, `inStudio`, `studio`, `freeConsultation`).
    pub fn parse(kind: &str, studio_location: Option<String>) -> Option<Self> {
        match kind {
            "online" => Some(SlotModality::Online),
            "inStudio" | "in_studio" => Some(SlotModality::InStudio),
            "freeConsultation" | "free_consultation" => Some(SlotModality::FreeConsultation),
            "studio" => studio_location
                .filter(|s| !s.trim().is_empty())
                .map(|s| SlotModality::Studio(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for SlotModality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotModality::Online => write!(f, "online"),
            SlotModality::InStudio => write!(f, "in-studio"),
            SlotModality::Studio(name) => write!(f, "studio:{}", name),
            SlotModality::FreeConsultation => write!(f, "free-consultation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingLocation {
    Online,
    Studio,
}

/// One reservable instant: the unit that is withdrawn from and restored to inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub modality: SlotModality,
    pub slot: String,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.date, self.slot, self.modality)
    }
}

/// Bookable slots for one calendar date.
///
/// `version` is the optimistic concurrency token maintained by the storage
/// adapter; `0` means the record has never been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "AvailabilityRecord")]
pub struct Availability {
    pub date: NaiveDate,
    pub online_slots: SlotSet,
    pub studio_slots: BTreeMap<String, SlotSet>,
    pub in_studio_slots: SlotSet,
    pub free_consultation_slots: SlotSet,
    pub version: i64,
}

impl Availability {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            online_slots: SlotSet::new(),
            studio_slots: BTreeMap::new(),
            in_studio_slots: SlotSet::new(),
            free_consultation_slots: SlotSet::new(),
            version: 0,
        }
    }

    pub fn document_id(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn slots(&self, modality: &SlotModality) -> Option<&SlotSet> {
        match modality {
            SlotModality::Online => Some(&self.online_slots),
            SlotModality::InStudio => Some(&self.in_studio_slots),
            SlotModality::Studio(name) => self.studio_slots.get(name),
            SlotModality::FreeConsultation => Some(&self.free_consultation_slots),
        }
    }

    pub fn slots_mut(&mut self, modality: &SlotModality) -> &mut SlotSet {
        match modality {
            SlotModality::Online => &mut self.online_slots,
            SlotModality::InStudio => &mut self.in_studio_slots,
            SlotModality::Studio(name) => self.studio_slots.entry(name.clone()).or_default(),
            SlotModality::FreeConsultation => &mut self.free_consultation_slots,
        }
    }

    pub fn contains(&self, modality: &SlotModality, slot: &str) -> bool {
        self.slots(modality).is_some_and(|set| set.contains(slot))
    }

    /// Returns `false` when the slot was not present.
    pub fn remove_slot(&mut self, modality: &SlotModality, slot: &str) -> bool {
        match modality {
            // Never create an empty studio entry just to remove from it.
            SlotModality::Studio(name) => self
                .studio_slots
                .get_mut(name)
                .is_some_and(|set| set.remove(slot)),
            _ => self.slots_mut(modality).remove(slot),
        }
    }

    /// Returns `false` when the slot was already present.
    pub fn insert_slot(&mut self, modality: &SlotModality, slot: &str) -> bool {
        self.slots_mut(modality).insert(slot.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.online_slots.is_empty()
            && self.in_studio_slots.is_empty()
            && self.free_consultation_slots.is_empty()
            && self.studio_slots.values().all(|s| s.is_empty())
    }
}

/// On-disk shape accepted when reading. Covers records written before
/// `onlineSlots` existed (`slots`) and tolerates `null` lists.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvailabilityRecord {
    date: NaiveDate,
    #[serde(default)]
    online_slots: Option<Vec<String>>,
    #[serde(default)]
    slots: Option<Vec<String>>,
    #[serde(default)]
    studio_slots: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default)]
    in_studio_slots: Option<Vec<String>>,
    #[serde(default)]
    free_consultation_slots: Option<Vec<String>>,
    #[serde(default)]
    version: i64,
}

/// Normalises stored slot strings to `HH:MM`, dropping entries that do not parse.
fn canonical_slots(date: NaiveDate, field: &str, values: Option<Vec<String>>) -> SlotSet {
    values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| match normalize_slot(&value) {
            Ok(slot) => Some(slot),
            Err(_) => {
                warn!("Dropping unreadable slot '{}' from {} on {}", value, field, date);
                None
            }
        })
        .collect()
}

impl From<AvailabilityRecord> for Availability {
    fn from(record: AvailabilityRecord) -> Self {
        let date = record.date;
        let mut online_slots = canonical_slots(date, "onlineSlots", record.online_slots);
        online_slots.extend(canonical_slots(date, "slots", record.slots));

        let studio_slots = record
            .studio_slots
            .unwrap_or_default()
            .into_iter()
            .map(|(name, slots)| {
                let slots = canonical_slots(date, "studioSlots", slots);
                (name, slots)
            })
            .collect();

        Self {
            date,
            online_slots,
            studio_slots,
            in_studio_slots: canonical_slots(date, "inStudioSlots", record.in_studio_slots),
            free_consultation_slots: canonical_slots(date, "freeConsultationSlots", record.free_consultation_slots),
            version: record.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_legacy_slots_upcast_into_online() {
        let raw = json!({
            "date": "2025-03-01",
            "slots": ["10:00", "09:00"],
            "onlineSlots": ["09:00", "11:00"],
            "inStudioSlots": null
        });

        let availability: Availability = serde_json::from_value(raw).unwrap();

        let online: Vec<&str> = availability.online_slots.iter().map(String::as_str).collect();
        assert_eq!(online, vec!["09:00", "10:00", "11:00"]);
        assert!(availability.in_studio_slots.is_empty());
        assert_eq!(availability.version, 0);

        let written = serde_json::to_value(&availability).unwrap();
        assert!(written.get("slots").is_none(), "canonical shape must not carry the legacy field");
        assert_eq!(written["onlineSlots"], json!(["09:00", "10:00", "11:00"]));
    }

    #[test]
    fn test_upcast_normalises_and_drops_unreadable_slots() {
        let raw = json!({
            "date": "2025-03-01",
            "slots": ["9:00", "lunch"],
            "studioSlots": { "Mitte": ["9:30", "25:00"] },
            "freeConsultationSlots": [" 8:05 "]
        });

        let availability: Availability = serde_json::from_value(raw).unwrap();

        assert!(availability.contains(&SlotModality::Online, "09:00"));
        assert_eq!(availability.online_slots.len(), 1);
        let mitte: Vec<&str> = availability.studio_slots["Mitte"].iter().map(String::as_str).collect();
        assert_eq!(mitte, vec!["09:30"]);
        assert!(availability.contains(&SlotModality::FreeConsultation, "08:05"));
    }

    #[test]
    fn test_modality_resolution() {
        assert_eq!(SlotModality::resolve(true, Some(BookingLocation::Studio), Some("Mitte")), SlotModality::FreeConsultation);
        assert_eq!(SlotModality::resolve(false, Some(BookingLocation::Studio), Some("Mitte")), SlotModality::Studio("Mitte".into()));
        assert_eq!(SlotModality::resolve(false, Some(BookingLocation::Studio), Some("  ")), SlotModality::InStudio);
        assert_eq!(SlotModality::resolve(false, Some(BookingLocation::Online), Some("Mitte")), SlotModality::Online);
        assert_eq!(SlotModality::resolve(false, None, None), SlotModality::Online);
    }

    #[test]
    fn test_insert_is_check_before_insert() {
        let mut availability = Availability::empty(date());
        let studio = SlotModality::Studio("Mitte".into());

        assert!(availability.insert_slot(&studio, "10:00"));
        assert!(!availability.insert_slot(&studio, "10:00"));
        assert_eq!(availability.studio_slots["Mitte"].len(), 1);
        assert!(!availability.contains(&SlotModality::Online, "10:00"));
    }

    #[test]
    fn test_remove_from_unknown_studio_does_not_create_entry() {
        let mut availability = Availability::empty(date());
        assert!(!availability.remove_slot(&SlotModality::Studio("Nowhere".into()), "10:00"));
        assert!(availability.studio_slots.is_empty());
        assert!(availability.is_empty());
    }
}
