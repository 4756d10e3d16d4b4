//! In-process adapter: serves the port straight from the store, for the
//! server-rendered pages.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::api::{ApiError, BookingApi};
use crate::{
    auth,
    error::AppError,
    models::{
        Appointment, AppointmentQuery, BlockedSlot, Customer, CustomerUpdate, DashboardStats,
        LoginResponse, NewAppointment, NewBlockedSlot, Service,
    },
    schedule::AppointmentStatus,
    state::AppState,
    store,
};

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Validation(detail) => Self::Validation(detail),
            AppError::NotFound(detail) => Self::NotFound(detail),
            AppError::Conflict(detail) => Self::Conflict(detail),
            AppError::Unauthorized => Self::Unauthorized,
            other => {
                log::error!("Store call failed: {other}");
                Self::Server(other.detail())
            }
        }
    }
}

#[derive(Clone)]
pub struct LocalBookingApi {
    state: AppState,
}

impl LocalBookingApi {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl BookingApi for LocalBookingApi {
    async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        Ok(store::list_services(&self.state.db).await?)
    }

    async fn available_slots(
        &self,
        date: NaiveDate,
        service_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        Ok(store::available_slots(&self.state, date, service_id)
            .await?
            .available_slots)
    }

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError> {
        Ok(store::create_appointment(&self.state, request.clone()).await?)
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, ApiError> {
        Ok(store::list_appointments(&self.state.db, query).await?)
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        Ok(store::update_status(&self.state.db, id, status).await?)
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), ApiError> {
        Ok(store::delete_appointment(&self.state.db, id).await?)
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        Ok(store::list_customers(&self.state.db).await?)
    }

    async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Customer, ApiError> {
        Ok(store::update_customer(&self.state.db, id, update.clone()).await?)
    }

    async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        Ok(store::hide_customer(&self.state.db, id).await?)
    }

    async fn list_blocked_slots(&self) -> Result<Vec<BlockedSlot>, ApiError> {
        Ok(store::list_blocked_slots(&self.state.db, None).await?)
    }

    async fn create_blocked_slot(&self, request: &NewBlockedSlot) -> Result<BlockedSlot, ApiError> {
        Ok(store::create_blocked_slot(&self.state.db, request.clone()).await?)
    }

    async fn delete_blocked_slot(&self, id: &str) -> Result<(), ApiError> {
        Ok(store::delete_blocked_slot(&self.state.db, id).await?)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(store::dashboard_stats(&self.state).await?)
    }

    async fn login(&self, password: &str) -> Result<LoginResponse, ApiError> {
        Ok(auth::login(&self.state, password).await?)
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        Ok(auth::logout(&self.state.db, token).await?)
    }
}
