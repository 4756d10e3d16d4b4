use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    auth::new_id,
    error::AppError,
    models::{non_blank, Customer, CustomerUpdate},
};

const SELECT_CUSTOMER: &str =
    "SELECT id, full_name, phone, email, total_appointments, last_visit FROM customers";

/// Visible customers, most recent visit first.
pub async fn list_customers(pool: &SqlitePool) -> Result<Vec<Customer>, AppError> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "{SELECT_CUSTOMER} WHERE hidden = 0 ORDER BY last_visit IS NULL, last_visit DESC, full_name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(customers)
}

pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> Result<Customer, AppError> {
    sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE phone = ? AND hidden = 0"))
        .bind(phone.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))
}

async fn find_customer(pool: &SqlitePool, id: &str) -> Result<Customer, AppError> {
    sqlx::query_as::<_, Customer>(&format!("{SELECT_CUSTOMER} WHERE id = ? AND hidden = 0"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Customer not found"))
}

/// Corrects a customer's contact details. The correction is carried onto
/// every appointment booked under their previous phone, so history and
/// directory keep agreeing. A later booking under the old number is a new
/// customer.
pub async fn update_customer(
    pool: &SqlitePool,
    id: &str,
    update: CustomerUpdate,
) -> Result<Customer, AppError> {
    let full_name = update.full_name.trim();
    let phone = update.phone.trim();
    if full_name.is_empty() || phone.is_empty() {
        return Err(AppError::validation("Name and phone are required"));
    }
    let email = non_blank(update.email);

    let mut tx = pool.begin().await?;
    let previous_phone =
        sqlx::query_scalar::<_, String>("SELECT phone FROM customers WHERE id = ? AND hidden = 0")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::not_found("Customer not found"))?;

    sqlx::query("UPDATE customers SET full_name = ?, phone = ?, email = ? WHERE id = ?")
        .bind(full_name)
        .bind(phone)
        .bind(email.as_deref())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Another customer already uses this phone number")
            }
            other => AppError::from(other),
        })?;

    let moved = sqlx::query(
        "UPDATE appointments SET customer_name = ?, customer_phone = ?, customer_email = ? WHERE customer_phone = ?",
    )
    .bind(full_name)
    .bind(phone)
    .bind(email.as_deref())
    .bind(&previous_phone)
    .execute(&mut *tx)
    .await?
    .rows_affected();
    tx.commit().await?;

    if previous_phone != phone {
        log::info!("Customer {id} changed phone; {moved} appointments follow");
    }
    find_customer(pool, id).await
}

/// Hides a customer from the directory. Their appointments stay untouched.
pub async fn hide_customer(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE customers SET hidden = 1 WHERE id = ? AND hidden = 0")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }
    log::info!("Customer {id} hidden from the directory");
    Ok(())
}

/// Counts a booking against the customer with this phone, creating the
/// record on first contact. Booking again makes a hidden customer visible.
pub async fn record_visit(
    conn: &mut SqliteConnection,
    full_name: &str,
    phone: &str,
    email: Option<&str>,
    visit: NaiveDate,
) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO customers (id, full_name, phone, email, total_appointments, last_visit, hidden, created_at)
           VALUES (?, ?, ?, ?, 1, ?, 0, ?)
           ON CONFLICT(phone) DO UPDATE SET
               full_name = excluded.full_name,
               email = COALESCE(excluded.email, customers.email),
               total_appointments = customers.total_appointments + 1,
               last_visit = CASE
                   WHEN customers.last_visit IS NULL OR excluded.last_visit > customers.last_visit
                   THEN excluded.last_visit
                   ELSE customers.last_visit
               END,
               hidden = 0"#,
    )
    .bind(new_id())
    .bind(full_name)
    .bind(phone)
    .bind(email)
    .bind(visit)
    .bind(Utc::now().to_rfc3339())
    .execute(conn)
    .await?;
    Ok(())
}
