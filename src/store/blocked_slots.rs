use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::AppError,
    models::{non_blank, BlockedSlot, NewBlockedSlot},
    schedule::{Interval, WallTime},
};

const SELECT_BLOCKED: &str =
    "SELECT id, start_date, end_date, start_time, end_time, reason, created_at FROM blocked_slots";

pub async fn list_blocked_slots(
    pool: &SqlitePool,
    date: Option<NaiveDate>,
) -> Result<Vec<BlockedSlot>, AppError> {
    let slots = match date {
        Some(date) => covering(pool, date).await?,
        None => {
            sqlx::query_as::<_, BlockedSlot>(&format!(
                "{SELECT_BLOCKED} ORDER BY start_date, start_time"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(slots)
}

/// Blocked ranges whose date span includes `date`.
pub async fn covering(pool: &SqlitePool, date: NaiveDate) -> Result<Vec<BlockedSlot>, AppError> {
    let slots = sqlx::query_as::<_, BlockedSlot>(&format!(
        "{SELECT_BLOCKED} WHERE start_date <= ? AND end_date >= ? ORDER BY start_time"
    ))
    .bind(date)
    .bind(date)
    .fetch_all(pool)
    .await?;
    Ok(slots)
}

/// Daily intervals of the given ranges. Rows whose times no longer parse are
/// skipped with a warning rather than blocking the whole day.
pub fn intervals(slots: &[BlockedSlot]) -> Vec<Interval> {
    slots
        .iter()
        .filter_map(|slot| {
            match (WallTime::parse_24h(&slot.start_time), WallTime::parse_24h(&slot.end_time)) {
                (Some(start), Some(end)) => Some(Interval::new(start.minutes(), end.minutes())),
                _ => {
                    log::warn!("Ignoring blocked slot {} with unreadable times", slot.id);
                    None
                }
            }
        })
        .collect()
}

pub async fn create_blocked_slot(
    pool: &SqlitePool,
    request: NewBlockedSlot,
) -> Result<BlockedSlot, AppError> {
    let parse_date = |value: &str| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::validation("Invalid date format. Use YYYY-MM-DD."))
    };
    let start_date = parse_date(&request.start_date)?;
    let end_date = parse_date(&request.end_date)?;
    if start_date > end_date {
        return Err(AppError::validation("Start date cannot be after end date."));
    }

    let parse_time = |value: &str| {
        WallTime::parse_24h(value).ok_or_else(|| AppError::validation("Invalid time format. Use HH:MM."))
    };
    let start_time = parse_time(&request.start_time)?;
    let end_time = parse_time(&request.end_time)?;
    if start_time >= end_time {
        return Err(AppError::validation("Start time must be before end time."));
    }

    let slot = BlockedSlot {
        id: new_id(),
        start_date,
        end_date,
        start_time: start_time.to_24h(),
        end_time: end_time.to_24h(),
        reason: non_blank(request.reason),
        created_at: Utc::now().to_rfc3339(),
    };

    sqlx::query(
        r#"INSERT INTO blocked_slots (id, start_date, end_date, start_time, end_time, reason, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&slot.id)
    .bind(slot.start_date)
    .bind(slot.end_date)
    .bind(&slot.start_time)
    .bind(&slot.end_time)
    .bind(&slot.reason)
    .bind(&slot.created_at)
    .execute(pool)
    .await?;

    let days = (end_date - start_date).num_days() + 1;
    log::info!(
        "Blocked {}-{} for {days} day(s) starting {start_date}",
        slot.start_time,
        slot.end_time
    );
    Ok(slot)
}

pub async fn delete_blocked_slot(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM blocked_slots WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Blocked slot not found"));
    }
    Ok(())
}
