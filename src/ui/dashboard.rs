//! Admin dashboard view model and the appointment lifecycle actions on it.
//!
//! Writes never patch local state optimistically: after a successful status
//! change the stats and the filtered list are fetched again, and after a
//! failure the view stays as it was.

use super::{
    api::{ApiError, BookingApi},
    blocked::BlockedSlotManager,
    directory::CustomerDirectory,
    notice::{Notice, Notices},
};
use crate::{
    models::{Appointment, AppointmentQuery, DashboardStats, NewBlockedSlot},
    schedule::AppointmentStatus,
};

#[derive(Debug, Default, Clone)]
pub struct AdminDashboard {
    pub stats: DashboardStats,
    pub appointments: Vec<Appointment>,
    pub filter: AppointmentQuery,
    pub customers: CustomerDirectory,
    pub blocked: BlockedSlotManager,
}

impl AdminDashboard {
    /// The four dashboard reads, issued concurrently. Each one that fails
    /// leaves its previous data in place.
    pub async fn load(&mut self, api: &dyn BookingApi, notices: &mut Notices) {
        let (stats, appointments, customers, blocked) = tokio::join!(
            api.dashboard_stats(),
            api.list_appointments(&self.filter),
            api.list_customers(),
            api.list_blocked_slots(),
        );
        self.apply_stats(stats, notices);
        self.apply_appointments(appointments, notices);
        self.customers.apply(customers, notices);
        self.blocked.apply(blocked, notices);
    }

    pub async fn set_filter(
        &mut self,
        api: &dyn BookingApi,
        filter: AppointmentQuery,
        notices: &mut Notices,
    ) {
        self.filter = filter;
        let appointments = api.list_appointments(&self.filter).await;
        self.apply_appointments(appointments, notices);
    }

    async fn refresh_appointments(&mut self, api: &dyn BookingApi, notices: &mut Notices) {
        let (stats, appointments) =
            tokio::join!(api.dashboard_stats(), api.list_appointments(&self.filter));
        self.apply_stats(stats, notices);
        self.apply_appointments(appointments, notices);
    }

    fn apply_stats(&mut self, result: Result<DashboardStats, ApiError>, notices: &mut Notices) {
        match result {
            Ok(stats) => self.stats = stats,
            Err(err) => notices.push(Notice::from_api(&err, "Could not load statistics")),
        }
    }

    fn apply_appointments(
        &mut self,
        result: Result<Vec<Appointment>, ApiError>,
        notices: &mut Notices,
    ) {
        match result {
            Ok(appointments) => self.appointments = appointments,
            Err(err) => notices.push(Notice::from_api(&err, "Could not load appointments")),
        }
    }

    fn find(&self, id: &str) -> Option<&Appointment> {
        self.appointments.iter().find(|apt| apt.id == id)
    }

    /// Status buttons to render for an appointment. Terminal appointments
    /// get none.
    pub fn status_actions(appointment: &Appointment) -> &'static [AppointmentStatus] {
        appointment.status.transitions()
    }

    pub fn can_purge(appointment: &Appointment) -> bool {
        appointment.status.can_purge()
    }

    /// Returns whether the change went through. Appointments not shown with
    /// a matching action are left alone without calling the server.
    pub async fn update_status(
        &mut self,
        api: &dyn BookingApi,
        id: &str,
        next: AppointmentStatus,
        notices: &mut Notices,
    ) -> bool {
        let offered = self
            .find(id)
            .is_some_and(|apt| Self::status_actions(apt).contains(&next));
        if !offered {
            return false;
        }

        match api.update_appointment_status(id, next).await {
            Ok(_) => {
                notices.push(Notice::success(format!("Appointment marked {}", next.label())));
                self.refresh_appointments(api, notices).await;
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not update the appointment"));
                false
            }
        }
    }

    /// Removes a terminal appointment after the admin confirmed it. An
    /// active one is never sent to the server; the admin is told to cancel
    /// it instead.
    pub async fn purge(
        &mut self,
        api: &dyn BookingApi,
        id: &str,
        confirmed: bool,
        notices: &mut Notices,
    ) -> bool {
        if !confirmed {
            return false;
        }
        let Some(purgeable) = self.find(id).map(Self::can_purge) else {
            return false;
        };
        if !purgeable {
            notices.push(Notice::info(CANCEL_INSTEAD));
            return false;
        }

        match api.delete_appointment(id).await {
            Ok(()) => {
                self.appointments.retain(|apt| apt.id != id);
                notices.push(Notice::success("Appointment removed"));
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, CANCEL_INSTEAD));
                false
            }
        }
    }

    /// Creates a blocked range. The manager refreshes the blocked list
    /// itself; only stats and appointments are fetched again here.
    pub async fn block(
        &mut self,
        api: &dyn BookingApi,
        request: &NewBlockedSlot,
        notices: &mut Notices,
    ) -> bool {
        if !self.blocked.create(api, request, notices).await {
            return false;
        }
        self.refresh_appointments(api, notices).await;
        true
    }
}

const CANCEL_INSTEAD: &str =
    "Active appointments cannot be deleted. Cancel the appointment instead.";
