mod common;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{discard_notifier, test_config, TestApp, TestBackend, TestOptions};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use studio_booking::{
    config::SlotHoldPolicy,
    domain::models::availability::{Availability, BookingLocation, SlotModality},
    domain::models::booking::{Booking, BookingDraft, BookingStatus, NewBooking},
    domain::ports::{AvailabilityRepository, BookingRepository},
    domain::services::inventory::SlotLists,
    error::AppError,
    infra::factory::build_state,
};

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

fn draft(slot: &str) -> BookingDraft {
    BookingDraft {
        name: "Grace Hopper".into(),
        email: "grace@example.com".into(),
        phone: None,
        date: date(),
        slot: slot.into(),
        package_id: None,
        is_free_consultation: false,
        location: Some(BookingLocation::Online),
        studio_location: None,
        priority: None,
        channel_preference: None,
        notes: None,
    }
}

async fn seed_online(app: &TestApp, slots: &[&str]) {
    let lists = SlotLists {
        online_slots: slots.iter().map(|s| s.to_string()).collect(),
        ..SlotLists::default()
    };
    app.state.inventory.replace(date(), lists).await.unwrap();
}

async fn online(app: &TestApp) -> Vec<String> {
    app.state.inventory.get(date()).await.unwrap().online_slots.into_iter().collect()
}

async fn version(app: &TestApp) -> i64 {
    app.state.inventory.get(date()).await.unwrap().version
}

async fn with_status(app: &TestApp, booking: &Booking, status: BookingStatus) -> Result<Booking, AppError> {
    let mut next = app.state.lifecycle.get_booking(&booking.id).await.unwrap();
    next.status = status;
    app.state.lifecycle.update_booking(next).await
}

async fn each_backend() -> Vec<TestApp> {
    vec![TestApp::new().await, TestApp::local_file().await]
}

#[tokio::test]
async fn test_confirm_twice_withdraws_once_under_on_confirm() {
    for backend in [TestBackend::Sqlite, TestBackend::LocalFile] {
        let app = TestApp::with_options(TestOptions {
            backend,
            policy: SlotHoldPolicy::OnConfirm,
            ..TestOptions::default()
        }).await;
        seed_online(&app, &["10:00", "11:00"]).await;

        let booking = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();
        assert_eq!(online(&app).await, vec!["10:00", "11:00"], "pending does not hold under OnConfirm");
        let before = version(&app).await;

        with_status(&app, &booking, BookingStatus::Confirmed).await.unwrap();
        assert_eq!(online(&app).await, vec!["11:00"]);
        assert_eq!(version(&app).await, before + 1);

        with_status(&app, &booking, BookingStatus::Confirmed).await.unwrap();
        assert_eq!(online(&app).await, vec!["11:00"]);
        assert_eq!(version(&app).await, before + 1, "second confirm must not write inventory");
    }
}

#[tokio::test]
async fn test_on_confirm_rejects_second_confirmation_of_same_slot() {
    let app = TestApp::with_policy(SlotHoldPolicy::OnConfirm).await;
    seed_online(&app, &["10:00"]).await;

    let first = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();
    let second = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();

    with_status(&app, &first, BookingStatus::Confirmed).await.unwrap();
    let err = with_status(&app, &second, BookingStatus::Confirmed).await.unwrap_err();
    assert!(matches!(err, AppError::SlotUnavailable(_)));

    let stored = app.state.lifecycle.get_booking(&second.id).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Pending);
}

#[tokio::test]
async fn test_on_confirm_accepts_slot_removed_by_admin_when_unheld() {
    let app = TestApp::with_policy(SlotHoldPolicy::OnConfirm).await;
    seed_online(&app, &["10:00"]).await;
    let booking = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();

    app.state.inventory.remove_slot(date(), &SlotModality::Online, "10:00").await.unwrap();

    let confirmed = with_status(&app, &booking, BookingStatus::Confirmed).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(online(&app).await.is_empty());
}

#[tokio::test]
async fn test_delete_confirmed_restores_without_duplicate() {
    for app in each_backend().await {
        seed_online(&app, &["10:00"]).await;
        let booking = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();
        with_status(&app, &booking, BookingStatus::Confirmed).await.unwrap();

        // Admin puts the slot back by hand before the booking is deleted.
        app.state.inventory.add_slot(date(), &SlotModality::Online, "10:00").await.unwrap();
        let before = version(&app).await;

        app.state.lifecycle.delete_booking(&booking.id).await.unwrap();

        assert_eq!(online(&app).await, vec!["10:00"]);
        assert_eq!(version(&app).await, before, "restore of a present slot must not write");
        assert!(matches!(
            app.state.lifecycle.get_booking(&booking.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn test_delete_pending_restores_under_on_create() {
    for app in each_backend().await {
        seed_online(&app, &["10:00"]).await;
        let booking = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();
        assert!(online(&app).await.is_empty());

        app.state.lifecycle.delete_booking(&booking.id).await.unwrap();
        assert_eq!(online(&app).await, vec!["10:00"]);
    }
}

#[tokio::test]
async fn test_cancel_restores_and_is_terminal() {
    for app in each_backend().await {
        seed_online(&app, &["10:00"]).await;
        let booking = app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();

        let err = with_status(&app, &booking, BookingStatus::Cancelled).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "pending cannot be cancelled directly");

        with_status(&app, &booking, BookingStatus::Confirmed).await.unwrap();
        with_status(&app, &booking, BookingStatus::Cancelled).await.unwrap();
        assert_eq!(online(&app).await, vec!["10:00"]);

        for status in [BookingStatus::Pending, BookingStatus::Confirmed] {
            let err = with_status(&app, &booking, status).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
        }

        // Deleting a cancelled booking leaves inventory alone.
        app.state.lifecycle.create_booking(draft("10:00")).await.unwrap();
        app.state.lifecycle.delete_booking(&booking.id).await.unwrap();
        assert!(online(&app).await.is_empty());
    }
}

#[tokio::test]
async fn test_move_between_studios() {
    for app in each_backend().await {
        let lists = SlotLists {
            studio_slots: BTreeMap::from([
                ("Mitte".to_string(), vec!["10:00".to_string()]),
                ("Kreuzberg".to_string(), vec!["10:00".to_string()]),
            ]),
            ..SlotLists::default()
        };
        app.state.inventory.replace(date(), lists).await.unwrap();

        let mut studio_draft = draft("10:00");
        studio_draft.location = Some(BookingLocation::Studio);
        studio_draft.studio_location = Some("Mitte".into());
        let booking = app.state.lifecycle.create_booking(studio_draft).await.unwrap();

        let mut moved = booking.clone();
        moved.studio_location = Some("Kreuzberg".into());
        app.state.lifecycle.update_booking(moved).await.unwrap();

        let availability = app.state.inventory.get(date()).await.unwrap();
        assert!(availability.studio_slots["Mitte"].contains("10:00"));
        assert!(availability.studio_slots["Kreuzberg"].is_empty());
    }
}

#[tokio::test]
async fn test_update_keeps_created_at_and_normalises_slot() {
    let app = TestApp::new().await;
    seed_online(&app, &["09:00", "10:00"]).await;
    let booking = app.state.lifecycle.create_booking(draft("9:00")).await.unwrap();
    assert_eq!(booking.slot, "09:00");

    let mut edited = booking.clone();
    edited.created_at = chrono::Utc::now() + chrono::Duration::days(1);
    edited.notes = Some("Prefers window seat".into());
    let updated = app.state.lifecycle.update_booking(edited).await.unwrap();

    assert_eq!(updated.created_at, booking.created_at);
    assert_eq!(updated.notes.as_deref(), Some("Prefers window seat"));
    assert_eq!(online(&app).await, vec!["10:00"]);
}

struct FailingCreates {
    inner: Arc<dyn BookingRepository>,
}

#[async_trait]
impl BookingRepository for FailingCreates {
    async fn create(&self, _booking: NewBooking) -> Result<Booking, AppError> {
        Err(AppError::Storage(std::io::Error::other("disk full")))
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        self.inner.find_by_id(id).await
    }
    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        self.inner.list().await
    }
    async fn update(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.inner.update(booking).await
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn test_failed_booking_write_gives_slot_back() {
    let app = TestApp::new().await;
    seed_online(&app, &["10:00"]).await;

    let mut backend = app.state.backend.clone();
    backend.bookings = Arc::new(FailingCreates { inner: backend.bookings.clone() });
    let state = build_state(&test_config(backend.mode, SlotHoldPolicy::OnCreate), backend, discard_notifier());

    let err = state.lifecycle.create_booking(draft("10:00")).await.unwrap_err();
    assert!(err.is_persistence());
    assert_eq!(online(&app).await, vec!["10:00"]);
    assert!(state.lifecycle.list_bookings().await.unwrap().is_empty());
}

/// Availability store whose conditional writes start failing once `broken` is set.
struct BreakableInventory {
    inner: Arc<dyn AvailabilityRepository>,
    broken: AtomicBool,
}

#[async_trait]
impl AvailabilityRepository for BreakableInventory {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Availability>, AppError> {
        self.inner.find_by_date(date).await
    }
    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError> {
        self.inner.list_by_range(start, end).await
    }
    async fn upsert(&self, availability: &Availability) -> Result<Availability, AppError> {
        self.inner.upsert(availability).await
    }
    async fn compare_and_swap(&self, availability: &Availability, expected_version: i64) -> Result<Option<Availability>, AppError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(AppError::Storage(std::io::Error::other("availability store offline")));
        }
        self.inner.compare_and_swap(availability, expected_version).await
    }
}

#[tokio::test]
async fn test_failed_restore_keeps_booking_change() {
    for app in each_backend().await {
        seed_online(&app, &["10:00", "11:00"]).await;

        let inventory = Arc::new(BreakableInventory {
            inner: app.state.backend.availability.clone(),
            broken: AtomicBool::new(false),
        });
        let mut backend = app.state.backend.clone();
        backend.availability = inventory.clone();
        let state = build_state(&test_config(backend.mode, SlotHoldPolicy::OnCreate), backend, discard_notifier());

        let cancelled = state.lifecycle.create_booking(draft("10:00")).await.unwrap();
        let deleted = state.lifecycle.create_booking(draft("11:00")).await.unwrap();
        let mut confirmed = state.lifecycle.get_booking(&cancelled.id).await.unwrap();
        confirmed.status = BookingStatus::Confirmed;
        state.lifecycle.update_booking(confirmed).await.unwrap();
        assert!(online(&app).await.is_empty());

        inventory.broken.store(true, Ordering::SeqCst);

        let mut next = state.lifecycle.get_booking(&cancelled.id).await.unwrap();
        next.status = BookingStatus::Cancelled;
        let updated = state.lifecycle.update_booking(next).await.unwrap();
        assert_eq!(updated.status, BookingStatus::Cancelled);
        assert_eq!(
            state.lifecycle.get_booking(&cancelled.id).await.unwrap().status,
            BookingStatus::Cancelled
        );

        state.lifecycle.delete_booking(&deleted.id).await.unwrap();
        assert!(matches!(
            state.lifecycle.get_booking(&deleted.id).await,
            Err(AppError::NotFound(_))
        ));

        // Inventory is left stale rather than failing the booking change.
        assert!(online(&app).await.is_empty());
    }
}
