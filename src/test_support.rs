//! Fixtures shared by the unit tests of several modules.

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use mockable::Clock;
use sqlx::SqlitePool;

use crate::{config::AppConfig, db, state::AppState};

/// A clock frozen at a local wall-clock instant.
pub struct FixtureClock {
    local_now: NaiveDateTime,
}

impl FixtureClock {
    pub fn at(raw: &str) -> Self {
        Self {
            local_now: NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M")
                .expect("valid fixture timestamp"),
        }
    }
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        Local
            .from_local_datetime(&self.local_now)
            .earliest()
            .expect("representable local time")
    }

    fn utc(&self) -> DateTime<Utc> {
        self.local().with_timezone(&Utc)
    }
}

pub fn fixture_clock(raw: &str) -> Arc<dyn Clock> {
    Arc::new(FixtureClock::at(raw))
}

pub fn day(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid date")
}

/// Seeded in-memory state whose clock reads `now` (`YYYY-MM-DD HH:MM`).
pub async fn state_at(now: &str) -> AppState {
    let pool = db::testing::memory_pool().await;
    db::seed_defaults(&pool, "hunter2").await.expect("seed");
    let config = AppConfig::from_lookup(|_| None).expect("default config");
    AppState::new(pool, config, fixture_clock(now))
}

pub async fn service_id(pool: &SqlitePool, name: &str) -> String {
    sqlx::query_scalar::<_, String>("SELECT id FROM services WHERE name = ?")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("seeded service")
}
