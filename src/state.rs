use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mockable::Clock;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub clock: Arc<dyn Clock>,
    /// Held across the availability check and the insert of a new
    /// appointment so overlapping requests are decided one at a time.
    pub booking_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            clock,
            booking_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn now_local(&self) -> NaiveDateTime {
        self.clock.local().naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now_local().date()
    }
}
