//! Port the booking and admin components use to reach the REST contract.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    models::{
        Appointment, AppointmentQuery, BlockedSlot, Customer, CustomerUpdate, DashboardStats,
        LoginResponse, NewAppointment, NewBlockedSlot, Service,
    },
    schedule::AppointmentStatus,
};

/// Failures a component can see from the API, grouped the way they are
/// reported to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),
    /// The server rejected the input.
    #[error("{0}")]
    Validation(String),
    /// The request broke a business rule, such as a slot taken meanwhile.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Not authenticated")]
    Unauthorized,
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    /// Maps an HTTP status and its `detail` message to a category.
    pub fn from_status(status: u16, detail: String) -> Self {
        match status {
            400 | 422 => Self::Validation(detail),
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound(detail),
            409 => Self::Conflict(detail),
            _ => Self::Server(detail),
        }
    }

    /// The server's own explanation, when it gave one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation(detail)
            | Self::Conflict(detail)
            | Self::NotFound(detail)
            | Self::Server(detail) => Some(detail.as_str()).filter(|detail| !detail.is_empty()),
            Self::Network(_) | Self::Unauthorized => None,
        }
    }
}

#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, ApiError>;

    /// Raw slots as the server computes them, in server order.
    async fn available_slots(&self, date: NaiveDate, service_id: &str)
        -> Result<Vec<String>, ApiError>;

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError>;

    async fn list_appointments(&self, query: &AppointmentQuery)
        -> Result<Vec<Appointment>, ApiError>;

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError>;

    async fn delete_appointment(&self, id: &str) -> Result<(), ApiError>;

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError>;

    async fn update_customer(&self, id: &str, update: &CustomerUpdate)
        -> Result<Customer, ApiError>;

    /// Soft removal: the customer leaves the directory, history stays.
    async fn delete_customer(&self, id: &str) -> Result<(), ApiError>;

    async fn list_blocked_slots(&self) -> Result<Vec<BlockedSlot>, ApiError>;

    async fn create_blocked_slot(&self, request: &NewBlockedSlot) -> Result<BlockedSlot, ApiError>;

    async fn delete_blocked_slot(&self, id: &str) -> Result<(), ApiError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError>;

    async fn login(&self, password: &str) -> Result<LoginResponse, ApiError>;

    /// Revokes `token` on the server.
    async fn logout(&self, token: &str) -> Result<(), ApiError>;
}
