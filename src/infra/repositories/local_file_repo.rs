use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::models::{
    availability::Availability, booking::{Booking, NewBooking}, client::ClientCard,
    package::Package, site_content::{SiteContent, SITE_CONTENT_ID},
};
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, ClientRepository, PackageRepository, SiteContentRepository,
};
use crate::error::AppError;
use crate::infra::repositories::document::{new_document_id, AVAILABILITY, BOOKINGS, CLIENTS, PACKAGES, SITE_CONTENT};

/// One record family stored as a JSON object keyed by record id.
///
/// Reads are served from memory. Every write runs under the family's lock,
/// serialises the whole family to a temporary file and renames it over the
/// previous one; memory is only updated once the rename succeeded. The lock
/// is per process, so two processes sharing a data directory still race.
pub struct JsonFileCollection<T> {
    path: PathBuf,
    key: fn(&T) -> String,
    records: Mutex<BTreeMap<String, T>>,
}

impl<T> JsonFileCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + PartialEq + Send,
{
    pub async fn open(path: PathBuf, key: fn(&T) -> String) -> Result<Self, AppError> {
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => BTreeMap::new(),
            Ok(bytes) => Self::parse(&bytes, key)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(AppError::Storage(e)),
        };
        debug!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self { path, key, records: Mutex::new(records) })
    }

    /// Accepts the keyed-object layout and the older plain-array layout.
    fn parse(bytes: &[u8], key: fn(&T) -> String) -> Result<BTreeMap<String, T>, AppError> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| -> Result<(String, T), AppError> {
                    let record: T = serde_json::from_value(item)?;
                    Ok((key(&record), record))
                })
                .collect(),
            other => Ok(serde_json::from_value(other)?),
        }
    }

    pub async fn get(&self, id: &str) -> Option<T> {
        self.records.lock().await.get(id).cloned()
    }

    pub async fn values(&self) -> Vec<T> {
        self.records.lock().await.values().cloned().collect()
    }

    /// Applies `f` to a copy of the family and persists it if anything changed.
    pub async fn mutate<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, T>) -> Result<R, AppError>,
    ) -> Result<R, AppError> {
        let mut records = self.records.lock().await;
        let mut next = records.clone();
        let result = f(&mut next)?;

        if next != *records {
            self.flush(&next).await?;
            *records = next;
        }
        Ok(result)
    }

    pub async fn put(&self, record: T) -> Result<T, AppError> {
        let id = (self.key)(&record);
        self.mutate(|records| {
            records.insert(id, record.clone());
            Ok(record)
        })
        .await
    }

    /// Returns whether a record was removed.
    pub async fn remove(&self, id: &str) -> Result<bool, AppError> {
        self.mutate(|records| Ok(records.remove(id).is_some())).await
    }

    async fn flush(&self, records: &BTreeMap<String, T>) -> Result<(), AppError> {
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

pub struct LocalFileRepo {
    availability: JsonFileCollection<Availability>,
    bookings: JsonFileCollection<Booking>,
    packages: JsonFileCollection<Package>,
    clients: JsonFileCollection<ClientCard>,
    content: JsonFileCollection<SiteContent>,
}

impl LocalFileRepo {
    pub async fn open(dir: &Path) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir).await?;
        let file = |family: &str| dir.join(format!("{}.json", family));

        let repo = Self {
            availability: JsonFileCollection::open(file(AVAILABILITY), Availability::document_id).await?,
            bookings: JsonFileCollection::open(file(BOOKINGS), |b: &Booking| b.id.clone()).await?,
            packages: JsonFileCollection::open(file(PACKAGES), |p: &Package| p.id.clone()).await?,
            clients: JsonFileCollection::open(file(CLIENTS), |c: &ClientCard| c.id.clone()).await?,
            content: JsonFileCollection::open(file(SITE_CONTENT), |_: &SiteContent| SITE_CONTENT_ID.to_string()).await?,
        };
        info!("Local file store opened at {}", dir.display());
        Ok(repo)
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[async_trait]
impl AvailabilityRepository for LocalFileRepo {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Availability>, AppError> {
        Ok(self.availability.get(&date_key(date)).await)
    }

    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError> {
        Ok(self
            .availability
            .values()
            .await
            .into_iter()
            .filter(|a| a.date >= start && a.date <= end)
            .collect())
    }

    async fn upsert(&self, availability: &Availability) -> Result<Availability, AppError> {
        let mut next = availability.clone();
        self.availability
            .mutate(|records| {
                next.version = records.get(&next.document_id()).map_or(0, |a| a.version) + 1;
                records.insert(next.document_id(), next.clone());
                Ok(next)
            })
            .await
    }

    async fn compare_and_swap(&self, availability: &Availability, expected_version: i64) -> Result<Option<Availability>, AppError> {
        let mut next = availability.clone();
        self.availability
            .mutate(|records| {
                let current = records.get(&next.document_id()).map_or(0, |a| a.version);
                if current != expected_version {
                    return Ok(None);
                }
                next.version = expected_version + 1;
                records.insert(next.document_id(), next.clone());
                Ok(Some(next))
            })
            .await
    }
}

#[async_trait]
impl BookingRepository for LocalFileRepo {
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError> {
        self.bookings.put(booking.into_booking(new_document_id())).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        Ok(self.bookings.get(id).await)
    }

    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.bookings.values().await)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, AppError> {
        self.bookings
            .mutate(|records| match records.get_mut(&booking.id) {
                Some(stored) => {
                    *stored = booking.clone();
                    Ok(booking.clone())
                }
                None => Err(AppError::NotFound("Booking not found".into())),
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.bookings.remove(id).await?;
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for LocalFileRepo {
    async fn list(&self) -> Result<Vec<Package>, AppError> {
        Ok(self.packages.values().await)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        Ok(self.packages.get(id).await)
    }

    async fn upsert(&self, package: &Package) -> Result<Package, AppError> {
        self.packages.put(package.clone()).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.packages.remove(id).await? {
            return Err(AppError::NotFound("Package not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for LocalFileRepo {
    async fn list(&self) -> Result<Vec<ClientCard>, AppError> {
        Ok(self.clients.values().await)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClientCard>, AppError> {
        Ok(self.clients.get(id).await)
    }

    async fn upsert(&self, client: &ClientCard) -> Result<ClientCard, AppError> {
        self.clients.put(client.clone()).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.clients.remove(id).await? {
            return Err(AppError::NotFound("Client not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SiteContentRepository for LocalFileRepo {
    async fn get(&self) -> Result<SiteContent, AppError> {
        Ok(self.content.get(SITE_CONTENT_ID).await.unwrap_or_default())
    }

    async fn save(&self, content: &SiteContent) -> Result<SiteContent, AppError> {
        self.content.put(content.clone()).await
    }
}
