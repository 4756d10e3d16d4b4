//! SQLite persistence for services, appointments, blocked ranges and
//! customers. Every function returns [`AppError`](crate::error::AppError) so
//! handlers can pass failures straight through.

pub mod appointments;
pub mod blocked_slots;
pub mod catalog;
pub mod customers;
pub mod stats;

pub use appointments::{
    available_slots, create_appointment, delete_appointment, find_appointment, list_appointments,
    update_status,
};
pub use blocked_slots::{create_blocked_slot, delete_blocked_slot, list_blocked_slots};
pub use catalog::list_services;
pub use customers::{find_by_phone, hide_customer, list_customers, update_customer};
pub use stats::dashboard_stats;
