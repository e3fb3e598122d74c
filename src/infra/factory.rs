use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::{BackendMode, Config};
use crate::state::AppState;
use crate::domain::ports::{
    AvailabilityRepository, BookingRepository, ClientRepository, NotificationService,
    PackageRepository, SiteContentRepository,
};
use crate::domain::services::inventory::SlotInventory;
use crate::domain::services::lifecycle::BookingLifecycle;
use crate::infra::email::http_notification_service::{HttpNotificationService, NOTIFICATION_TEMPLATE};
use crate::infra::repositories::{
    demo_repo::DemoRepo, local_file_repo::LocalFileRepo,
    postgres_document_repo::PostgresDocumentRepo, sqlite_document_repo::SqliteDocumentRepo,
};

/// The capability set of one persistence adapter, chosen once at startup.
#[derive(Clone)]
pub struct Backend {
    pub mode: BackendMode,
    pub availability: Arc<dyn AvailabilityRepository>,
    pub bookings: Arc<dyn BookingRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub content: Arc<dyn SiteContentRepository>,
}

impl Backend {
    pub fn from_adapter<A>(mode: BackendMode, adapter: Arc<A>) -> Self
    where
        A: AvailabilityRepository + BookingRepository + PackageRepository
            + ClientRepository + SiteContentRepository + 'static,
    {
        Self {
            mode,
            availability: adapter.clone(),
            bookings: adapter.clone(),
            packages: adapter.clone(),
            clients: adapter.clone(),
            content: adapter,
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.mode.is_read_only()
    }
}

pub async fn select_backend(config: &Config) -> Backend {
    match config.backend_mode {
        BackendMode::Cloud => {
            let database_url = config.database_url.as_deref()
                .expect("DATABASE_URL must be set when BACKEND_MODE=cloud");

            if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
                info!("Initializing PostgreSQL document store...");
                let pool = connect_postgres(database_url).await;
                run_postgres_migrations(&pool).await;
                Backend::from_adapter(BackendMode::Cloud, Arc::new(PostgresDocumentRepo::new(pool)))
            } else {
                info!("Initializing SQLite document store with WAL Mode...");
                let pool = connect_sqlite(database_url).await;
                run_sqlite_migrations(&pool).await;
                Backend::from_adapter(BackendMode::Cloud, Arc::new(SqliteDocumentRepo::new(pool)))
            }
        }
        BackendMode::LocalFile => {
            info!("Opening local file store in {}", config.data_dir.display());
            let repo = LocalFileRepo::open(&config.data_dir)
                .await
                .expect("Failed to open local data directory");
            Backend::from_adapter(BackendMode::LocalFile, Arc::new(repo))
        }
        BackendMode::Demo => {
            info!("Loading read-only demo snapshot");
            let repo = DemoRepo::load().expect("Demo snapshot is malformed");
            Backend::from_adapter(BackendMode::Demo, Arc::new(repo))
        }
    }
}

pub fn load_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_template(NOTIFICATION_TEMPLATE, include_str!("../../templates/booking_notification.html"))
        .expect("Failed to load notification template");
    Arc::new(tera)
}

/// Wires inventory and lifecycle over an already selected backend.
pub fn build_state(config: &Config, backend: Backend, notifier: Arc<dyn NotificationService>) -> AppState {
    let inventory = SlotInventory::new(backend.availability.clone());
    let lifecycle = BookingLifecycle::new(
        backend.bookings.clone(),
        inventory.clone(),
        backend.packages.clone(),
        backend.content.clone(),
        notifier,
        config.slot_hold_policy,
    );

    AppState {
        config: config.clone(),
        backend,
        inventory,
        lifecycle: Arc::new(lifecycle),
    }
}

pub async fn bootstrap_state(config: &Config) -> AppState {
    let notifier = Arc::new(HttpNotificationService::new(
        config.mail_service_url.clone(),
        config.mail_service_token.clone(),
        load_templates(),
    ));

    let backend = select_backend(config).await;
    info!("Backend selected: {} (read-only: {})", backend.mode, backend.is_read_only());
    build_state(config, backend, notifier)
}

async fn connect_postgres(database_url: &str) -> PgPool {
    let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
    opts = opts.log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(opts)
        .await
        .expect("Failed to connect to Postgres")
}

async fn connect_sqlite(database_url: &str) -> SqlitePool {
    let opts = SqliteConnectOptions::from_str(database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite")
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
