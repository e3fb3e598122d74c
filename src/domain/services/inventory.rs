use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use crate::domain::models::availability::{Availability, SlotKey, SlotModality};
use crate::domain::ports::AvailabilityRepository;
use crate::domain::services::slots::{self, SlotCadence};
use crate::error::AppError;

/// Version conflicts tolerated before a withdraw/restore gives up.
const MAX_CAS_ATTEMPTS: usize = 3;

/// Full replacement payload for one date.
#[derive(Debug, Clone, Default)]
pub struct SlotLists {
    pub online_slots: Vec<String>,
    pub free_consultation_slots: Vec<String>,
    pub in_studio_slots: Vec<String>,
    pub studio_slots: BTreeMap<String, Vec<String>>,
}

/// Per-date slot inventory over the active availability adapter.
///
/// Admin edits (`replace`, `generate`, `add_slot`, `remove_slot`) are
/// unconditional last-writer-wins writes. `withdraw` and `restore` are the
/// lifecycle hooks and only ever write through `compare_and_swap`.
#[derive(Clone)]
pub struct SlotInventory {
    repo: Arc<dyn AvailabilityRepository>,
}

impl SlotInventory {
    pub fn new(repo: Arc<dyn AvailabilityRepository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, date: NaiveDate) -> Result<Availability, AppError> {
        Ok(self.repo.find_by_date(date).await?.unwrap_or_else(|| Availability::empty(date)))
    }

    pub async fn list_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError> {
        if start > end {
            return Err(AppError::Validation("start must not be after end".into()));
        }
        let mut records = self.repo.list_by_range(start, end).await?;
        records.sort_by_key(|a| a.date);
        Ok(records)
    }

    pub async fn replace(&self, date: NaiveDate, lists: SlotLists) -> Result<Availability, AppError> {
        let mut availability = Availability::empty(date);
        availability.online_slots = slots::normalize_slots(&lists.online_slots)?.into_iter().collect();
        availability.free_consultation_slots = slots::normalize_slots(&lists.free_consultation_slots)?.into_iter().collect();
        availability.in_studio_slots = slots::normalize_slots(&lists.in_studio_slots)?.into_iter().collect();
        for (studio, studio_slots) in &lists.studio_slots {
            let name = studio.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Studio location name must not be empty".into()));
            }
            let normalized = slots::normalize_slots(studio_slots)?.into_iter().collect();
            if availability.studio_slots.insert(name.to_string(), normalized).is_some() {
                return Err(AppError::Validation(format!("Studio location '{}' is listed more than once", name)));
            }
        }

        let stored = self.repo.upsert(&availability).await?;
        info!("Replaced availability for {} (version {})", date, stored.version);
        Ok(stored)
    }

    /// Merges generated slots into one modality's list, keeping what is already there.
    pub async fn generate(
        &self,
        date: NaiveDate,
        modality: &SlotModality,
        start: NaiveTime,
        end: NaiveTime,
        cadence: SlotCadence,
    ) -> Result<Availability, AppError> {
        let generated = slots::generate(start, end, cadence)?;
        let count = generated.len();
        let mut availability = self.get(date).await?;
        availability.slots_mut(modality).extend(generated);

        let stored = self.repo.upsert(&availability).await?;
        info!("Generated {} {} slots for {} (version {})", count, modality, date, stored.version);
        Ok(stored)
    }

    pub async fn add_slot(&self, date: NaiveDate, modality: &SlotModality, slot: &str) -> Result<Availability, AppError> {
        let slot = slots::normalize_slot(slot)?;
        let mut availability = self.get(date).await?;
        if !availability.insert_slot(modality, &slot) {
            return Ok(availability);
        }
        self.repo.upsert(&availability).await
    }

    pub async fn remove_slot(&self, date: NaiveDate, modality: &SlotModality, slot: &str) -> Result<Availability, AppError> {
        let slot = slots::normalize_slot(slot)?;
        let mut availability = self.get(date).await?;
        if !availability.remove_slot(modality, &slot) {
            return Ok(availability);
        }
        self.repo.upsert(&availability).await
    }

    pub async fn is_available(&self, key: &SlotKey) -> Result<bool, AppError> {
        Ok(self.get(key.date).await?.contains(&key.modality, &key.slot))
    }

    /// Removes the slot if present. `Ok(None)` means the slot was not in inventory.
    ///
    /// A version conflict re-reads and retries; exhausting the attempts is
    /// reported as `SlotUnavailable`.
    pub async fn try_withdraw(&self, key: &SlotKey) -> Result<Option<Availability>, AppError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut current = self.get(key.date).await?;
            let expected = current.version;
            if !current.remove_slot(&key.modality, &key.slot) {
                return Ok(None);
            }

            match self.repo.compare_and_swap(&current, expected).await? {
                Some(stored) => {
                    debug!("Withdrew {} (version {} -> {})", key, expected, stored.version);
                    return Ok(Some(stored));
                }
                None => warn!("Version conflict withdrawing {} (attempt {}/{})", key, attempt, MAX_CAS_ATTEMPTS),
            }
        }
        Err(AppError::SlotUnavailable(format!("{} is being modified concurrently", key)))
    }

    pub async fn withdraw(&self, key: &SlotKey) -> Result<Availability, AppError> {
        self.try_withdraw(key)
            .await?
            .ok_or_else(|| AppError::SlotUnavailable(key.to_string()))
    }

    /// Puts the slot back unless it is already present. Returns whether a write happened.
    pub async fn restore(&self, key: &SlotKey) -> Result<bool, AppError> {
        for attempt in 1..=MAX_CAS_ATTEMPTS {
            let mut current = self.get(key.date).await?;
            let expected = current.version;
            if !current.insert_slot(&key.modality, &key.slot) {
                return Ok(false);
            }

            match self.repo.compare_and_swap(&current, expected).await? {
                Some(_) => return Ok(true),
                None => warn!("Version conflict restoring {} (attempt {}/{})", key, attempt, MAX_CAS_ATTEMPTS),
            }
        }
        Err(AppError::Conflict(format!("Could not restore {} after {} attempts", key, MAX_CAS_ATTEMPTS)))
    }
}
