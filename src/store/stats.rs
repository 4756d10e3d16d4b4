use crate::{error::AppError, models::DashboardStats, schedule::AppointmentStatus, state::AppState};

/// Dashboard aggregates, computed fresh on every call.
///
/// Monthly figures count completed appointments in the current calendar
/// month, priced at their service's current price.
pub async fn dashboard_stats(state: &AppState) -> Result<DashboardStats, AppError> {
    let today = state.today();
    let month = format!("{}%", today.format("%Y-%m-"));

    let today_appointments =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM appointments WHERE date = ? AND status = ?")
            .bind(today)
            .bind(AppointmentStatus::Scheduled)
            .fetch_one(&state.db)
            .await?;

    let total_customers =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE hidden = 0")
            .fetch_one(&state.db)
            .await?;

    let (total_appointments, monthly_revenue) = sqlx::query_as::<_, (i64, f64)>(
        r#"SELECT COUNT(*), COALESCE(SUM(s.price), 0.0)
             FROM appointments a
             LEFT JOIN services s ON s.id = a.service_id
            WHERE a.date LIKE ? AND a.status = ?"#,
    )
    .bind(month)
    .bind(AppointmentStatus::Completed)
    .fetch_one(&state.db)
    .await?;

    Ok(DashboardStats {
        today_appointments,
        total_customers,
        monthly_revenue,
        total_appointments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Language, NewAppointment},
        store::appointments::{create_appointment, update_status},
        test_support::{day, service_id, state_at},
    };

    async fn book(state: &AppState, service: &str, date: &str, time: &str, phone: &str) -> String {
        let service_id = service_id(&state.db, service).await;
        create_appointment(
            state,
            NewAppointment {
                service_id,
                customer_name: "Jo".into(),
                customer_phone: phone.into(),
                customer_email: None,
                date: day(date),
                time: time.into(),
                language: Language::Pt,
            },
        )
        .await
        .expect("booked")
        .id
    }

    #[tokio::test]
    async fn empty_shop_reports_zeroes() {
        let state = state_at("2025-06-02 08:00").await;
        assert_eq!(dashboard_stats(&state).await.expect("stats"), DashboardStats::default());
    }

    #[tokio::test]
    async fn completed_work_this_month_counts_as_revenue() {
        let state = state_at("2025-06-02 08:00").await;
        let highlights = book(&state, "Highlights", "2025-06-02", "09:00 AM", "555-1000").await;
        let beard = book(&state, "Beard", "2025-06-02", "01:00 PM", "555-2000").await;
        book(&state, "Beard", "2025-06-02", "03:00 PM", "555-3000").await;
        let next_month = book(&state, "Beard", "2025-07-01", "10:00 AM", "555-1000").await;

        for id in [&highlights, &beard, &next_month] {
            update_status(&state.db, id, AppointmentStatus::Completed)
                .await
                .expect("completed");
        }

        let stats = dashboard_stats(&state).await.expect("stats");
        assert_eq!(stats.today_appointments, 1);
        assert_eq!(stats.total_customers, 3);
        assert_eq!(stats.total_appointments, 2);
        assert!((stats.monthly_revenue - 85.0).abs() < f64::EPSILON);
    }
}
