#![allow(dead_code)]

use studio_booking::{
    api::router::create_router,
    config::{BackendMode, Config, SlotHoldPolicy},
    domain::models::{booking::Booking, site_content::ColorPalette},
    domain::ports::{NotificationReceipt, NotificationService},
    error::AppError,
    infra::factory::{build_state, Backend},
    infra::repositories::{
        demo_repo::DemoRepo, local_file_repo::LocalFileRepo, sqlite_document_repo::SqliteDocumentRepo,
    },
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// What the lifecycle handed to the notifier.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub booking: Booking,
    pub package_title: Option<String>,
    pub notification_email: String,
    pub business_name: String,
    pub palette_id: String,
}

pub struct RecordingNotifier {
    tx: mpsc::UnboundedSender<SentNotification>,
    fail: bool,
}

#[async_trait]
impl NotificationService for RecordingNotifier {
    async fn notify(
        &self,
        booking: &Booking,
        package_title: Option<&str>,
        notification_email: &str,
        business_name: &str,
        palette: &ColorPalette,
    ) -> Result<NotificationReceipt, AppError> {
        let _ = self.tx.send(SentNotification {
            booking: booking.clone(),
            package_title: package_title.map(str::to_string),
            notification_email: notification_email.to_string(),
            business_name: business_name.to_string(),
            palette_id: palette.id.to_string(),
        });

        if self.fail {
            return Err(AppError::Notification("relay unreachable".into()));
        }
        Ok(NotificationReceipt { success: true, message: "recorded".into() })
    }
}

/// A notifier whose deliveries go nowhere.
pub fn discard_notifier() -> Arc<RecordingNotifier> {
    let (tx, _rx) = mpsc::unbounded_channel();
    Arc::new(RecordingNotifier { tx, fail: false })
}

pub enum TestBackend {
    Sqlite,
    LocalFile,
    Demo,
}

pub struct TestOptions {
    pub backend: TestBackend,
    pub policy: SlotHoldPolicy,
    pub failing_notifier: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self { backend: TestBackend::Sqlite, policy: SlotHoldPolicy::OnCreate, failing_notifier: false }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub pool: Option<Pool<Sqlite>>,
    pub db_filename: Option<String>,
    pub data_dir: Option<TempDir>,
    notifications: mpsc::UnboundedReceiver<SentNotification>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_policy(policy: SlotHoldPolicy) -> Self {
        Self::with_options(TestOptions { policy, ..TestOptions::default() }).await
    }

    pub async fn local_file() -> Self {
        Self::with_options(TestOptions { backend: TestBackend::LocalFile, ..TestOptions::default() }).await
    }

    pub async fn demo() -> Self {
        Self::with_options(TestOptions { backend: TestBackend::Demo, ..TestOptions::default() }).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let mut pool = None;
        let mut db_filename = None;
        let mut data_dir = None;

        let backend = match options.backend {
            TestBackend::Sqlite => {
                let filename = format!("test_{}.db", Uuid::new_v4());
                let sqlite = connect_test_sqlite(&filename).await;
                let backend = Backend::from_adapter(BackendMode::Cloud, Arc::new(SqliteDocumentRepo::new(sqlite.clone())));
                pool = Some(sqlite);
                db_filename = Some(filename);
                backend
            }
            TestBackend::LocalFile => {
                let dir = TempDir::new().expect("Failed to create temp dir");
                let repo = LocalFileRepo::open(dir.path()).await.expect("Failed to open local store");
                data_dir = Some(dir);
                Backend::from_adapter(BackendMode::LocalFile, Arc::new(repo))
            }
            TestBackend::Demo => {
                Backend::from_adapter(BackendMode::Demo, Arc::new(DemoRepo::load().expect("Demo snapshot")))
            }
        };

        let config = test_config(backend.mode, options.policy);
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(RecordingNotifier { tx, fail: options.failing_notifier });

        let state = Arc::new(build_state(&config, backend, notifier));
        let router = create_router(state.clone());

        Self { router, state, pool, db_filename, data_dir, notifications: rx }
    }

    /// Waits for the next notification dispatched by the background task.
    pub async fn next_notification(&mut self) -> Option<SentNotification> {
        tokio::time::timeout(Duration::from_secs(2), self.notifications.recv())
            .await
            .ok()
            .flatten()
    }

    pub async fn no_notification(&mut self) -> bool {
        tokio::time::timeout(Duration::from_millis(300), self.notifications.recv())
            .await
            .is_err()
    }

    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        self.send(method, uri, body, None).await
    }

    pub async fn admin_request(&self, method: &str, uri: &str, body: Option<Value>) -> Response {
        self.send(method, uri, body, Some(ADMIN_TOKEN)).await
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        self.router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(filename) = &self.db_filename {
            let _ = std::fs::remove_file(filename);
            let _ = std::fs::remove_file(format!("{}-wal", filename));
            let _ = std::fs::remove_file(format!("{}-shm", filename));
        }
    }
}

pub fn test_config(mode: BackendMode, policy: SlotHoldPolicy) -> Config {
    Config {
        backend_mode: mode,
        database_url: None,
        data_dir: "./data".into(),
        port: 0,
        admin_api_token: Some(ADMIN_TOKEN.to_string()),
        mail_service_url: "http://localhost".to_string(),
        mail_service_token: "token".to_string(),
        slot_hold_policy: policy,
    }
}

pub async fn connect_test_sqlite(filename: &str) -> Pool<Sqlite> {
    let db_url = format!("sqlite://{}?mode=rwc", filename);
    let connection_options = SqliteConnectOptions::from_str(&db_url)
        .unwrap()
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connection_options)
        .await
        .expect("Failed to connect to test db");

    sqlx::migrate!("./migrations/sqlite")
        .run(&pool)
        .await
        .expect("Failed to migrate test db");

    pool
}

pub async fn parse_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn expect_status(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let body = parse_body(response).await;
    assert_eq!(actual, status, "unexpected status, body: {}", body);
    body
}

pub fn booking_payload(date: &str, slot: &str) -> Value {
    serde_json::json!({
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "date": date,
        "slot": slot,
    })
}
