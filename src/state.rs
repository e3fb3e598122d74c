use std::sync::Arc;
use crate::config::Config;
use crate::domain::services::inventory::SlotInventory;
use crate::domain::services::lifecycle::BookingLifecycle;
use crate::infra::factory::Backend;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub backend: Backend,
    pub inventory: SlotInventory,
    pub lifecycle: Arc<BookingLifecycle>,
}
