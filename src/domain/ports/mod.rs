use crate::domain::models::{
    availability::Availability, booking::{Booking, NewBooking}, client::ClientCard,
    package::Package, site_content::{ColorPalette, SiteContent},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Availability>, AppError>;
    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError>;
    /// Unconditional whole-record replace. Returns the stored record with its new version.
    async fn upsert(&self, availability: &Availability) -> Result<Availability, AppError>;
    /// Replace only if the stored version still equals `expected_version`
    /// (`0` meaning "no record yet"). `Ok(None)` signals a lost race.
    async fn compare_and_swap(&self, availability: &Availability, expected_version: i64) -> Result<Option<Availability>, AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Stores a new booking under a freshly assigned id.
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list(&self) -> Result<Vec<Booking>, AppError>;
    async fn update(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Package>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError>;
    async fn upsert(&self, package: &Package) -> Result<Package, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<ClientCard>, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<ClientCard>, AppError>;
    async fn upsert(&self, client: &ClientCard) -> Result<ClientCard, AppError>;
    async fn delete(&self, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait SiteContentRepository: Send + Sync {
    /// Falls back to `SiteContent::default()` when nothing is stored.
    async fn get(&self) -> Result<SiteContent, AppError>;
    async fn save(&self, content: &SiteContent) -> Result<SiteContent, AppError>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationReceipt {
    pub success: bool,
    pub message: String,
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify(
        &self,
        booking: &Booking,
        package_title: Option<&str>,
        notification_email: &str,
        business_name: &str,
        palette: &ColorPalette,
    ) -> Result<NotificationReceipt, AppError>;
}
