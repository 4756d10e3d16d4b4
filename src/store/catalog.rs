use sqlx::SqlitePool;

use crate::{error::AppError, models::Service};

pub async fn list_services(pool: &SqlitePool) -> Result<Vec<Service>, AppError> {
    let services = sqlx::query_as::<_, Service>(
        "SELECT id, name, price, duration_minutes, description FROM services ORDER BY position, name",
    )
    .fetch_all(pool)
    .await?;
    Ok(services)
}

pub async fn find_service(pool: &SqlitePool, id: &str) -> Result<Service, AppError> {
    sqlx::query_as::<_, Service>(
        "SELECT id, name, price, duration_minutes, description FROM services WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("Service not found"))
}
