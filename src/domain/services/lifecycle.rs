use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::SlotHoldPolicy;
use crate::domain::models::availability::SlotKey;
use crate::domain::models::booking::{Booking, BookingDraft, BookingStatus, NewBooking};
use crate::domain::models::site_content::ColorPalette;
use crate::domain::ports::{
    BookingRepository, NotificationReceipt, NotificationService, PackageRepository, SiteContentRepository,
};
use crate::domain::services::inventory::SlotInventory;
use crate::domain::services::slots::normalize_slot;
use crate::error::AppError;

/// Orchestrates booking state changes and the inventory bookkeeping they imply.
///
/// Claims on a slot are taken before the booking is written, through the
/// inventory's conditional write, so a lost race surfaces as
/// `SlotUnavailable` and nothing is stored. Releases happen after the booking
/// write and never fail the operation: a stale inventory entry is preferred
/// over losing a booking.
pub struct BookingLifecycle {
    bookings: Arc<dyn BookingRepository>,
    inventory: SlotInventory,
    packages: Arc<dyn PackageRepository>,
    content: Arc<dyn SiteContentRepository>,
    notifier: Arc<dyn NotificationService>,
    policy: SlotHoldPolicy,
}

impl BookingLifecycle {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        inventory: SlotInventory,
        packages: Arc<dyn PackageRepository>,
        content: Arc<dyn SiteContentRepository>,
        notifier: Arc<dyn NotificationService>,
        policy: SlotHoldPolicy,
    ) -> Self {
        Self { bookings, inventory, packages, content, notifier, policy }
    }

    pub fn policy(&self) -> SlotHoldPolicy {
        self.policy
    }

    fn holds_slot(&self, status: BookingStatus) -> bool {
        match self.policy {
            SlotHoldPolicy::OnCreate => status != BookingStatus::Cancelled,
            SlotHoldPolicy::OnConfirm => status == BookingStatus::Confirmed,
        }
    }

    pub async fn create_booking(&self, draft: BookingDraft) -> Result<Booking, AppError> {
        let draft = validate_draft(draft)?;
        let key = draft.slot_key();
        let new_booking = NewBooking::pending(draft);

        let claimed = if self.holds_slot(new_booking.status) {
            self.inventory.withdraw(&key).await?;
            true
        } else {
            if !self.inventory.is_available(&key).await? {
                return Err(AppError::SlotUnavailable(key.to_string()));
            }
            false
        };

        let created = match self.bookings.create(new_booking).await {
            Ok(created) => created,
            Err(e) => {
                if claimed {
                    self.compensate(&key).await;
                }
                return Err(e);
            }
        };

        info!("Booking created: {} for {}", created.id, key);
        self.spawn_notification(created.clone());
        Ok(created)
    }

    pub async fn get_booking(&self, id: &str) -> Result<Booking, AppError> {
        self.bookings.find_by_id(id).await?
            .ok_or(AppError::NotFound("Booking not found".into()))
    }

    /// Newest first by `createdAt`.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        let mut bookings = self.bookings.list().await?;
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(bookings)
    }

    pub async fn update_booking(&self, booking: Booking) -> Result<Booking, AppError> {
        let stored = self.get_booking(&booking.id).await?;
        let mut next = validate_booking(booking)?;
        next.created_at = stored.created_at;

        if !stored.status.can_transition_to(next.status) {
            return Err(AppError::Validation(format!(
                "Cannot change status from {} to {}",
                stored.status.as_str(),
                next.status.as_str()
            )));
        }

        let old_key = stored.slot_key();
        let new_key = next.slot_key();
        let moved = old_key != new_key;
        let old_holds = old_key.is_some() && self.holds_slot(stored.status);
        let new_holds = new_key.is_some() && self.holds_slot(next.status);

        let mut claimed = None;
        if let Some(key) = &new_key {
            if new_holds && (moved || !old_holds) {
                if self.claim(key, &next.id).await? {
                    claimed = Some(key.clone());
                }
            } else if moved && !self.inventory.is_available(key).await? {
                return Err(AppError::SlotUnavailable(key.to_string()));
            }
        }

        let updated = match self.bookings.update(&next).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(key) = &claimed {
                    self.compensate(key).await;
                }
                return Err(e);
            }
        };

        if old_holds
            && (moved || !new_holds)
            && let Some(key) = &old_key
        {
            self.release(key, &updated.id).await;
        }

        info!("Booking updated: {} ({} -> {})", updated.id, stored.status.as_str(), updated.status.as_str());
        Ok(updated)
    }

    pub async fn delete_booking(&self, id: &str) -> Result<(), AppError> {
        let stored = self.get_booking(id).await?;
        self.bookings.delete(id).await?;

        if self.holds_slot(stored.status)
            && let Some(key) = stored.slot_key()
        {
            self.release(&key, id).await;
        }

        info!("Booking deleted: {}", id);
        Ok(())
    }

    /// Withdraws `key` for `booking_id`. Returns whether inventory was changed.
    async fn claim(&self, key: &SlotKey, booking_id: &str) -> Result<bool, AppError> {
        if self.inventory.try_withdraw(key).await?.is_some() {
            return Ok(true);
        }

        // Under OnConfirm a pending booking never took the slot, so an absent
        // slot is only acceptable if nobody else is holding it.
        if self.policy == SlotHoldPolicy::OnConfirm && !self.held_by_other(key, booking_id).await? {
            debug!("{} already out of inventory, nothing to withdraw for {}", key, booking_id);
            return Ok(false);
        }
        Err(AppError::SlotUnavailable(key.to_string()))
    }

    async fn held_by_other(&self, key: &SlotKey, booking_id: &str) -> Result<bool, AppError> {
        let bookings = self.bookings.list().await?;
        Ok(bookings.iter().any(|b| {
            b.id != booking_id && self.holds_slot(b.status) && b.slot_key().as_ref() == Some(key)
        }))
    }

    async fn release(&self, key: &SlotKey, booking_id: &str) {
        match self.inventory.restore(key).await {
            Ok(true) => info!("Restored {} after change to booking {}", key, booking_id),
            Ok(false) => debug!("{} already in inventory, restore skipped", key),
            Err(e) => error!("Failed to restore {} for booking {}; inventory left stale: {}", key, booking_id, e),
        }
    }

    async fn compensate(&self, key: &SlotKey) {
        if let Err(e) = self.inventory.restore(key).await {
            error!("Failed to give back {} after a failed booking write: {}", key, e);
        }
    }

    fn spawn_notification(&self, booking: Booking) {
        let packages = self.packages.clone();
        let content = self.content.clone();
        let notifier = self.notifier.clone();
        let span = info_span!("booking_notification", booking_id = %booking.id);

        tokio::spawn(
            async move {
                match send_booking_notification(&booking, packages.as_ref(), content.as_ref(), notifier.as_ref()).await {
                    Ok(receipt) if receipt.success => info!("Notification sent: {}", receipt.message),
                    Ok(receipt) => warn!("Notification not sent: {}", receipt.message),
                    Err(e) => error!("Notification failed: {}", e),
                }
            }
            .instrument(span),
        );
    }
}

async fn send_booking_notification(
    booking: &Booking,
    packages: &dyn PackageRepository,
    content: &dyn SiteContentRepository,
    notifier: &dyn NotificationService,
) -> Result<NotificationReceipt, AppError> {
    let site = content.get().await?;
    let Some(recipient) = site.notification_email.as_deref().filter(|e| !e.trim().is_empty()) else {
        return Ok(NotificationReceipt {
            success: false,
            message: "No notification email configured".into(),
        });
    };

    let package_title = match &booking.package_id {
        Some(package_id) => match packages.list().await {
            Ok(all) => all.into_iter().find(|p| &p.id == package_id).map(|p| p.title),
            Err(e) => {
                warn!("Package lookup failed, notifying without title: {}", e);
                None
            }
        },
        None => None,
    };

    let palette = ColorPalette::by_id(&site.palette_id);
    notifier
        .notify(booking, package_title.as_deref(), recipient, &site.business_name, &palette)
        .await
}

fn validate_identity(name: &str, email: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".into()));
    }
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".into()));
    }
    Ok(())
}

fn validate_draft(mut draft: BookingDraft) -> Result<BookingDraft, AppError> {
    validate_identity(&draft.name, &draft.email)?;
    if draft.slot.trim().is_empty() {
        return Err(AppError::SlotUnavailable("No slot selected".into()));
    }
    draft.slot = normalize_slot(&draft.slot)?;
    draft.name = draft.name.trim().to_string();
    draft.email = draft.email.trim().to_string();
    Ok(draft)
}

fn validate_booking(mut booking: Booking) -> Result<Booking, AppError> {
    validate_identity(&booking.name, &booking.email)?;
    if !booking.slot.trim().is_empty() {
        booking.slot = normalize_slot(&booking.slot)?;
    }
    Ok(booking)
}
