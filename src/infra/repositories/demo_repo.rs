use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::models::{
    availability::Availability, booking::{Booking, NewBooking}, client::ClientCard,
    package::Package, site_content::SiteContent,
};
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, ClientRepository, PackageRepository, SiteContentRepository,
};
use crate::error::AppError;

const AVAILABILITY_SNAPSHOT: &str = include_str!("../../../demo/availability.json");
const BOOKINGS_SNAPSHOT: &str = include_str!("../../../demo/bookings.json");
const PACKAGES_SNAPSHOT: &str = include_str!("../../../demo/packages.json");
const CLIENTS_SNAPSHOT: &str = include_str!("../../../demo/clients.json");
const SITE_CONTENT_SNAPSHOT: &str = include_str!("../../../demo/site_content.json");

fn read_only<T>(what: &str) -> Result<T, AppError> {
    Err(AppError::ReadOnlyMode(format!("{} cannot be modified in demo mode", what)))
}

/// Static snapshot shipped with the binary. Every write is rejected.
pub struct DemoRepo {
    availability: BTreeMap<NaiveDate, Availability>,
    bookings: Vec<Booking>,
    packages: Vec<Package>,
    clients: Vec<ClientCard>,
    content: SiteContent,
}

impl DemoRepo {
    pub fn load() -> Result<Self, AppError> {
        let availability: Vec<Availability> = serde_json::from_str(AVAILABILITY_SNAPSHOT)?;
        Ok(Self {
            availability: availability
                .into_iter()
                .map(|mut a| {
                    a.version = 1;
                    (a.date, a)
                })
                .collect(),
            bookings: serde_json::from_str(BOOKINGS_SNAPSHOT)?,
            packages: serde_json::from_str(PACKAGES_SNAPSHOT)?,
            clients: serde_json::from_str(CLIENTS_SNAPSHOT)?,
            content: serde_json::from_str(SITE_CONTENT_SNAPSHOT)?,
        })
    }
}

#[async_trait]
impl AvailabilityRepository for DemoRepo {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Availability>, AppError> {
        Ok(self.availability.get(&date).cloned())
    }

    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError> {
        Ok(self.availability.range(start..=end).map(|(_, a)| a.clone()).collect())
    }

    async fn upsert(&self, _availability: &Availability) -> Result<Availability, AppError> {
        read_only("Availability")
    }

    async fn compare_and_swap(&self, _availability: &Availability, _expected_version: i64) -> Result<Option<Availability>, AppError> {
        read_only("Availability")
    }
}

#[async_trait]
impl BookingRepository for DemoRepo {
    async fn create(&self, _booking: NewBooking) -> Result<Booking, AppError> {
        read_only("Bookings")
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings.clone())
    }

    async fn update(&self, _booking: &Booking) -> Result<Booking, AppError> {
        read_only("Bookings")
    }

    async fn delete(&self, _id: &str) -> Result<(), AppError> {
        read_only("Bookings")
    }
}

#[async_trait]
impl PackageRepository for DemoRepo {
    async fn list(&self) -> Result<Vec<Package>, AppError> {
        Ok(self.packages.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self.packages.iter().find(|p| p.id == id).cloned())
    }

    async fn upsert(&self, _package: &Package) -> Result<Package, AppError> {
        read_only("Packages")
    }

    async fn delete(&self, _id: &str) -> Result<(), AppError> {
        read_only("Packages")
    }
}

#[async_trait]
impl ClientRepository for DemoRepo {
    async fn list(&self) -> Result<Vec<ClientCard>, AppError> {
        Ok(self.clients.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClientCard>, AppError> {
        Ok(self.clients.iter().find(|c| c.id == id).cloned())
    }

    async fn upsert(&self, _client: &ClientCard) -> Result<ClientCard, AppError> {
        read_only("Clients")
    }

    async fn delete(&self, _id: &str) -> Result<(), AppError> {
        read_only("Clients")
    }
}

#[async_trait]
impl SiteContentRepository for DemoRepo {
    async fn get(&self) -> Result<SiteContent, AppError> {
        Ok(self.content.clone())
    }

    async fn save(&self, _content: &SiteContent) -> Result<SiteContent, AppError> {
        read_only("Site content")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshots_parse() {
        let repo = DemoRepo::load().unwrap();
        assert_eq!(repo.availability.len(), 3);
        assert_eq!(repo.bookings.len(), 2);
        assert_eq!(repo.content.business_name, "Atelier Demo");

        let legacy = &repo.availability[&NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()];
        assert!(legacy.online_slots.contains("16:00"), "legacy slots must be upcast");
    }
}
