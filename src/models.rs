use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::schedule::AppointmentStatus;

/// UI language the customer booked in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Pt,
    Es,
}

impl Language {
    pub const ALL: [Language; 3] = [Self::En, Self::Pt, Self::Es];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Pt => "pt",
            Self::Es => "es",
        }
    }

    /// Name shown in the language picker, in the language itself.
    pub fn label(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Pt => "Português",
            Self::Es => "Español",
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pt" => Self::Pt,
            "es" => Self::Es,
            _ => Self::En,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub duration_minutes: i64,
    pub description: Option<String>,
}

impl Service {
    pub fn duration(&self) -> u32 {
        u32::try_from(self.duration_minutes).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: String,
    pub service_id: String,
    pub service_name: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    pub duration_minutes: i64,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BlockedSlot {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: String,
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub total_appointments: i64,
    pub last_visit: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub today_appointments: i64,
    pub total_customers: i64,
    pub monthly_revenue: f64,
    pub total_appointments: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub service_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBlockedSlot {
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentQuery {
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub available_slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: Option<String>,
}

/// Trims an optional form value, mapping blank input to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
