use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;

use crate::{
    auth::new_id,
    error::AppError,
    models::{non_blank, Appointment, AppointmentQuery, AvailableSlots, NewAppointment},
    schedule::{open_slots, AppointmentStatus, Interval, WallTime},
    state::AppState,
};

use super::{blocked_slots, catalog, customers};

const SELECT_APPOINTMENT: &str = r#"SELECT id, service_id, service_name, customer_name, customer_phone,
       customer_email, date, time, duration_minutes, status, created_at, language
  FROM appointments"#;

/// What keeps the chair busy on one day.
struct DayLoad {
    booked: Vec<Interval>,
    blocked: Vec<Interval>,
}

impl DayLoad {
    fn busy(&self) -> Vec<Interval> {
        self.booked.iter().chain(&self.blocked).copied().collect()
    }
}

async fn day_load(pool: &SqlitePool, date: NaiveDate) -> Result<DayLoad, AppError> {
    let rows = sqlx::query_as::<_, (i64, i64, AppointmentStatus)>(
        "SELECT start_minute, duration_minutes, status FROM appointments WHERE date = ?",
    )
    .bind(date)
    .fetch_all(pool)
    .await?;

    let booked = rows
        .into_iter()
        .filter(|(_, _, status)| status.occupies_chair())
        .filter_map(|(start, duration, _)| {
            let start = u32::try_from(start).ok()?;
            let duration = u32::try_from(duration).ok()?;
            Some(Interval::new(start, start + duration))
        })
        .collect();
    let blocked = blocked_slots::intervals(&blocked_slots::covering(pool, date).await?);

    Ok(DayLoad { booked, blocked })
}

pub async fn available_slots(
    state: &AppState,
    date: NaiveDate,
    service_id: &str,
) -> Result<AvailableSlots, AppError> {
    let service = catalog::find_service(&state.db, service_id).await?;
    let load = day_load(&state.db, date).await?;
    let slots = open_slots(&state.config.hours, date, service.duration(), &load.busy());

    Ok(AvailableSlots {
        available_slots: slots.into_iter().map(WallTime::to_meridiem).collect(),
    })
}

/// Books a slot after re-checking it against the day's load.
///
/// The booking lock is held from the availability check until the insert
/// commits, so two requests for overlapping intervals are decided in turn
/// and the second one sees the first.
pub async fn create_appointment(
    state: &AppState,
    request: NewAppointment,
) -> Result<Appointment, AppError> {
    let customer_name = request.customer_name.trim().to_string();
    let customer_phone = request.customer_phone.trim().to_string();
    if customer_name.is_empty() {
        return Err(AppError::validation("Customer name is required"));
    }
    if customer_phone.is_empty() {
        return Err(AppError::validation("Customer phone is required"));
    }

    let now = state.now_local();
    if request.date < now.date() {
        return Err(AppError::validation("Cannot book an appointment in the past"));
    }
    let start = WallTime::parse(&request.time)
        .ok_or_else(|| AppError::validation("Invalid time format. Use hh:mm AM/PM."))?;
    if request.date == now.date() && start <= WallTime::from(now.time()) {
        return Err(AppError::validation("That time has already passed"));
    }

    let service = catalog::find_service(&state.db, &request.service_id).await?;
    let hours = &state.config.hours;
    if hours.is_closed_on(request.date) {
        return Err(AppError::validation("The shop is closed on that day"));
    }
    if !hours.candidate_starts(service.duration()).contains(&start) {
        return Err(AppError::validation(
            "Time is outside business hours or off the booking grid",
        ));
    }

    let _guard = state.booking_lock.lock().await;

    let wanted = Interval::starting_at(start, service.duration());
    let load = day_load(&state.db, request.date).await?;
    if load.booked.iter().any(|taken| taken.overlaps(&wanted)) {
        return Err(AppError::conflict("Time slot already booked"));
    }
    if load.blocked.iter().any(|blocked| blocked.overlaps(&wanted)) {
        return Err(AppError::conflict("Time slot is blocked"));
    }

    let appointment = Appointment {
        id: new_id(),
        service_id: service.id,
        service_name: service.name,
        customer_name,
        customer_phone,
        customer_email: non_blank(request.customer_email),
        date: request.date,
        time: start.to_meridiem(),
        duration_minutes: service.duration_minutes,
        status: AppointmentStatus::Scheduled,
        created_at: Utc::now().to_rfc3339(),
        language: request.language,
    };

    let mut tx = state.db.begin().await?;
    sqlx::query(
        r#"INSERT INTO appointments (id, service_id, service_name, customer_name, customer_phone,
               customer_email, date, time, start_minute, duration_minutes, status, language, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&appointment.id)
    .bind(&appointment.service_id)
    .bind(&appointment.service_name)
    .bind(&appointment.customer_name)
    .bind(&appointment.customer_phone)
    .bind(&appointment.customer_email)
    .bind(appointment.date)
    .bind(&appointment.time)
    .bind(i64::from(start.minutes()))
    .bind(appointment.duration_minutes)
    .bind(appointment.status)
    .bind(appointment.language)
    .bind(&appointment.created_at)
    .execute(&mut *tx)
    .await?;
    customers::record_visit(
        &mut *tx,
        &appointment.customer_name,
        &appointment.customer_phone,
        appointment.customer_email.as_deref(),
        appointment.date,
    )
    .await?;
    tx.commit().await?;

    log::info!(
        "Booked {} for {} on {} at {} ({})",
        appointment.service_name,
        appointment.customer_name,
        appointment.date,
        appointment.time,
        appointment.language.as_str()
    );
    Ok(appointment)
}

pub async fn list_appointments(
    pool: &SqlitePool,
    query: &AppointmentQuery,
) -> Result<Vec<Appointment>, AppError> {
    let appointments = sqlx::query_as::<_, Appointment>(&format!(
        "{SELECT_APPOINTMENT} WHERE (? IS NULL OR date = ?) AND (? IS NULL OR status = ?) \
         ORDER BY date, start_minute"
    ))
    .bind(query.date)
    .bind(query.date)
    .bind(query.status)
    .bind(query.status)
    .fetch_all(pool)
    .await?;
    Ok(appointments)
}

pub async fn find_appointment(pool: &SqlitePool, id: &str) -> Result<Appointment, AppError> {
    sqlx::query_as::<_, Appointment>(&format!("{SELECT_APPOINTMENT} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("Appointment not found"))
}

pub async fn update_status(
    pool: &SqlitePool,
    id: &str,
    next: AppointmentStatus,
) -> Result<Appointment, AppError> {
    let mut appointment = find_appointment(pool, id).await?;
    if !appointment.status.can_transition_to(next) {
        return Err(AppError::conflict(format!(
            "Cannot change a {} appointment to {}",
            appointment.status, next
        )));
    }

    let result = sqlx::query("UPDATE appointments SET status = ? WHERE id = ? AND status = ?")
        .bind(next)
        .bind(id)
        .bind(appointment.status)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::conflict("Appointment was changed by another request"));
    }

    log::info!("Appointment {id} moved from {} to {next}", appointment.status);
    appointment.status = next;
    Ok(appointment)
}

pub async fn delete_appointment(pool: &SqlitePool, id: &str) -> Result<(), AppError> {
    let appointment = find_appointment(pool, id).await?;
    if !appointment.status.can_purge() {
        return Err(AppError::conflict(
            "Active appointments cannot be deleted; cancel the appointment instead",
        ));
    }

    sqlx::query("DELETE FROM appointments WHERE id = ? AND status = ?")
        .bind(id)
        .bind(appointment.status)
        .execute(pool)
        .await?;
    log::info!("Purged {} appointment {id}", appointment.status);
    Ok(())
}
