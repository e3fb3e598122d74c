use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which persistence adapter backs the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Cloud,
    LocalFile,
    Demo,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Cloud => "cloud",
            BackendMode::LocalFile => "local",
            BackendMode::Demo => "demo",
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, BackendMode::Demo)
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" => Ok(BackendMode::Cloud),
            "local" | "file" | "local-file" => Ok(BackendMode::LocalFile),
            "demo" | "readonly" => Ok(BackendMode::Demo),
            other => Err(format!("unknown backend mode '{}'", other)),
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which booking statuses keep a slot out of inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotHoldPolicy {
    /// Pending and confirmed bookings both hold their slot.
    #[default]
    OnCreate,
    /// Only confirmed bookings hold their slot; pending bookings may overlap.
    OnConfirm,
}

impl SlotHoldPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotHoldPolicy::OnCreate => "on_create",
            SlotHoldPolicy::OnConfirm => "on_confirm",
        }
    }
}

impl FromStr for SlotHoldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_create" | "on-create" | "create" => Ok(SlotHoldPolicy::OnCreate),
            "on_confirm" | "on-confirm" | "confirm" => Ok(SlotHoldPolicy::OnConfirm),
            other => Err(format!("unknown slot hold policy '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub backend_mode: BackendMode,
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub port: u16,
    pub admin_api_token: Option<String>,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub slot_hold_policy: SlotHoldPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let backend_mode: BackendMode = env::var("BACKEND_MODE")
            .unwrap_or_else(|_| "local".to_string())
            .parse()
            .expect("BACKEND_MODE must be one of cloud, local, demo");

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.is_empty());
        if backend_mode == BackendMode::Cloud && database_url.is_none() {
            panic!("DATABASE_URL must be set when BACKEND_MODE=cloud");
        }

        Self {
            backend_mode,
            database_url,
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()).into(),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            admin_api_token: env::var("ADMIN_API_TOKEN").ok().filter(|s| !s.is_empty()),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            slot_hold_policy: env::var("SLOT_HOLD_POLICY")
                .unwrap_or_else(|_| "on_create".to_string())
                .parse()
                .expect("SLOT_HOLD_POLICY must be on_create or on_confirm"),
        }
    }
}
