use crate::domain::models::{
    availability::Availability, booking::{Booking, NewBooking}, client::ClientCard,
    package::Package, site_content::{SiteContent, SITE_CONTENT_ID},
};
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, ClientRepository, PackageRepository, SiteContentRepository,
};
use crate::error::AppError;
use crate::infra::repositories::document::{
    decode, decode_availability, new_document_id, AVAILABILITY, BOOKINGS, CLIENTS, PACKAGES, SITE_CONTENT,
};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::SqlitePool;

/// Cloud document store on SQLite. Same document layout as the Postgres
/// driver; merge-writes use `json_patch`.
pub struct SqliteDocumentRepo {
    pool: SqlitePool,
}

impl SqliteDocumentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(collection).bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(|(data,)| decode(&data)).transpose()
    }

    async fn fetch_all<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT data FROM documents WHERE collection = ? ORDER BY id")
            .bind(collection)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.iter().map(|(data,)| decode(data)).collect()
    }

    async fn merge<T: Serialize + DeserializeOwned>(&self, collection: &str, id: &str, doc: &T) -> Result<T, AppError> {
        let data = serde_json::to_string(doc)?;
        let (stored,): (String,) = sqlx::query_as(
            "INSERT INTO documents (collection, id, data, version, updated_at) VALUES (?, ?, ?, 1, ?)
             ON CONFLICT(collection, id) DO UPDATE SET
             data = json_patch(documents.data, excluded.data),
             version = documents.version + 1,
             updated_at = excluded.updated_at
             RETURNING data"
        )
            .bind(collection).bind(id).bind(&data).bind(Utc::now())
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        decode(&stored)
    }

    async fn remove(&self, collection: &str, id: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteDocumentRepo {
    async fn find_by_date(&self, date: NaiveDate) -> Result<Option<Availability>, AppError> {
        let row: Option<(String, i64)> = sqlx::query_as("SELECT data, version FROM documents WHERE collection = ? AND id = ?")
            .bind(AVAILABILITY).bind(date.format("%Y-%m-%d").to_string())
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(|(data, version)| decode_availability(&data, version)).transpose()
    }

    async fn list_by_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Availability>, AppError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT data, version FROM documents WHERE collection = ? AND id >= ? AND id <= ? ORDER BY id"
        )
            .bind(AVAILABILITY)
            .bind(start.format("%Y-%m-%d").to_string())
            .bind(end.format("%Y-%m-%d").to_string())
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.iter().map(|(data, version)| decode_availability(data, *version)).collect()
    }

    async fn upsert(&self, availability: &Availability) -> Result<Availability, AppError> {
        let data = serde_json::to_string(availability)?;
        let (stored, version): (String, i64) = sqlx::query_as(
            "INSERT INTO documents (collection, id, data, version, updated_at) VALUES (?, ?, ?, 1, ?)
             ON CONFLICT(collection, id) DO UPDATE SET
             data = excluded.data,
             version = documents.version + 1,
             updated_at = excluded.updated_at
             RETURNING data, version"
        )
            .bind(AVAILABILITY).bind(availability.document_id()).bind(&data).bind(Utc::now())
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        decode_availability(&stored, version)
    }

    async fn compare_and_swap(&self, availability: &Availability, expected_version: i64) -> Result<Option<Availability>, AppError> {
        let mut doc = availability.clone();
        doc.version = expected_version + 1;
        let data = serde_json::to_string(&doc)?;

        let row: Option<(String, i64)> = if expected_version == 0 {
            sqlx::query_as(
                "INSERT INTO documents (collection, id, data, version, updated_at) VALUES (?, ?, ?, 1, ?)
                 ON CONFLICT(collection, id) DO NOTHING
                 RETURNING data, version"
            )
                .bind(AVAILABILITY).bind(doc.document_id()).bind(&data).bind(Utc::now())
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?
        } else {
            sqlx::query_as(
                "UPDATE documents SET data = ?, version = version + 1, updated_at = ?
                 WHERE collection = ? AND id = ? AND version = ?
                 RETURNING data, version"
            )
                .bind(&data).bind(Utc::now())
                .bind(AVAILABILITY).bind(doc.document_id()).bind(expected_version)
                .fetch_optional(&self.pool).await.map_err(AppError::Database)?
        };

        row.map(|(data, version)| decode_availability(&data, version)).transpose()
    }
}

#[async_trait]
impl BookingRepository for SqliteDocumentRepo {
    async fn create(&self, booking: NewBooking) -> Result<Booking, AppError> {
        let booking = booking.into_booking(new_document_id());
        let data = serde_json::to_string(&booking)?;
        sqlx::query("INSERT INTO documents (collection, id, data, version, updated_at) VALUES (?, ?, ?, 1, ?)")
            .bind(BOOKINGS).bind(&booking.id).bind(&data).bind(Utc::now())
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(booking)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        self.fetch(BOOKINGS, id).await
    }

    async fn list(&self) -> Result<Vec<Booking>, AppError> {
        self.fetch_all(BOOKINGS).await
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, AppError> {
        let data = serde_json::to_string(booking)?;
        let row: Option<(String,)> = sqlx::query_as(
            "UPDATE documents SET data = json_patch(data, ?), version = version + 1, updated_at = ?
             WHERE collection = ? AND id = ?
             RETURNING data"
        )
            .bind(&data).bind(Utc::now()).bind(BOOKINGS).bind(&booking.id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;

        match row {
            Some((stored,)) => decode(&stored),
            None => Err(AppError::NotFound("Booking not found".into())),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.remove(BOOKINGS, id).await?;
        Ok(())
    }
}

#[async_trait]
impl PackageRepository for SqliteDocumentRepo {
    async fn list(&self) -> Result<Vec<Package>, AppError> {
        self.fetch_all(PACKAGES).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Package>, AppError> {
        self.fetch(PACKAGES, id).await
    }

    async fn upsert(&self, package: &Package) -> Result<Package, AppError> {
        self.merge(PACKAGES, &package.id, package).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.remove(PACKAGES, id).await? == 0 {
            return Err(AppError::NotFound("Package not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for SqliteDocumentRepo {
    async fn list(&self) -> Result<Vec<ClientCard>, AppError> {
        self.fetch_all(CLIENTS).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<ClientCard>, AppError> {
        self.fetch(CLIENTS, id).await
    }

    async fn upsert(&self, client: &ClientCard) -> Result<ClientCard, AppError> {
        self.merge(CLIENTS, &client.id, client).await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        if self.remove(CLIENTS, id).await? == 0 {
            return Err(AppError::NotFound("Client not found".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SiteContentRepository for SqliteDocumentRepo {
    async fn get(&self) -> Result<SiteContent, AppError> {
        Ok(self.fetch(SITE_CONTENT, SITE_CONTENT_ID).await?.unwrap_or_default())
    }

    async fn save(&self, content: &SiteContent) -> Result<SiteContent, AppError> {
        self.merge(SITE_CONTENT, SITE_CONTENT_ID, content).await
    }
}
