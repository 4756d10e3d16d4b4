//! Calendar arithmetic shared by the API and the booking pages: wall-clock
//! parsing, slot generation against business hours, and the appointment
//! status transition table.

pub mod availability;
pub mod status;
pub mod wallclock;

pub use availability::{open_slots, remaining_today, BusinessHours, Interval};
pub use status::AppointmentStatus;
pub use wallclock::WallTime;
