//! Scriptable in-memory `BookingApi` for component tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::api::{ApiError, BookingApi};
use crate::{
    models::{
        Appointment, AppointmentQuery, BlockedSlot, Customer, CustomerUpdate, DashboardStats,
        Language, LoginResponse, NewAppointment, NewBlockedSlot, Service,
    },
    schedule::AppointmentStatus,
};

#[derive(Default)]
struct Inner {
    services: Vec<Service>,
    slots: HashMap<NaiveDate, Vec<String>>,
    appointments: Vec<Appointment>,
    customers: Vec<Customer>,
    blocked: Vec<BlockedSlot>,
    stats: DashboardStats,
    password: Option<String>,
    failing: HashSet<String>,
    rejections: HashMap<String, ApiError>,
    calls: Vec<String>,
    created: Vec<NewAppointment>,
    revoked: Vec<String>,
}

#[derive(Default)]
pub struct FakeApi {
    inner: Mutex<Inner>,
}

pub fn service(id: &str, duration_minutes: i64, price: f64) -> Service {
    Service {
        id: id.to_string(),
        name: format!("Service {id}"),
        price,
        duration_minutes,
        description: None,
    }
}

pub fn appointment(id: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: id.to_string(),
        service_id: "cut".into(),
        service_name: "Service cut".into(),
        customer_name: "Jo".into(),
        customer_phone: "555-1000".into(),
        customer_email: None,
        date: NaiveDate::from_ymd_opt(2025, 6, 3).expect("date"),
        time: "09:00 AM".into(),
        duration_minutes: 30,
        status,
        created_at: "2025-06-01T10:00:00+00:00".into(),
        language: Language::En,
    }
}

pub fn customer(id: &str, full_name: &str, phone: &str) -> Customer {
    Customer {
        id: id.to_string(),
        full_name: full_name.to_string(),
        phone: phone.to_string(),
        email: None,
        total_appointments: 1,
        last_visit: None,
    }
}

impl FakeApi {
    fn with(self, apply: impl FnOnce(&mut Inner)) -> Self {
        apply(&mut self.inner.lock().expect("fake lock"));
        self
    }

    pub fn with_services(self, services: Vec<Service>) -> Self {
        self.with(|inner| inner.services = services)
    }

    pub fn with_slots(self, date: NaiveDate, slots: Vec<String>) -> Self {
        self.with(|inner| {
            inner.slots.insert(date, slots);
        })
    }

    pub fn with_appointments(self, appointments: Vec<Appointment>) -> Self {
        self.with(|inner| inner.appointments = appointments)
    }

    pub fn with_customers(self, customers: Vec<Customer>) -> Self {
        self.with(|inner| inner.customers = customers)
    }

    pub fn with_password(self, password: &str) -> Self {
        self.with(|inner| inner.password = Some(password.to_string()))
    }

    /// Makes `method` fail as if the network were down.
    pub fn fail(&self, method: &str) {
        self.lock().failing.insert(method.to_string());
    }

    /// Makes `method` answer with `err`.
    pub fn reject(&self, method: &str, err: ApiError) {
        self.lock().rejections.insert(method.to_string(), err);
    }

    pub fn set_stats(&self, stats: DashboardStats) {
        self.lock().stats = stats;
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn created(&self) -> Vec<NewAppointment> {
        self.lock().created.clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.lock().revoked.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("fake lock")
    }

    fn record(&self, method: &str) -> Result<std::sync::MutexGuard<'_, Inner>, ApiError> {
        let mut inner = self.lock();
        inner.calls.push(method.to_string());
        if inner.failing.contains(method) {
            return Err(ApiError::Network("connection refused".into()));
        }
        if let Some(err) = inner.rejections.get(method) {
            return Err(err.clone());
        }
        Ok(inner)
    }
}

#[async_trait]
impl BookingApi for FakeApi {
    async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        Ok(self.record("list_services")?.services.clone())
    }

    async fn available_slots(
        &self,
        date: NaiveDate,
        _service_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let inner = self.record("available_slots")?;
        Ok(inner.slots.get(&date).cloned().unwrap_or_default())
    }

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError> {
        let mut inner = self.record("create_appointment")?;
        inner.created.push(request.clone());
        let service = inner
            .services
            .iter()
            .find(|service| service.id == request.service_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Service not found".into()))?;
        let booked = Appointment {
            id: format!("apt{}", inner.created.len()),
            service_id: service.id,
            service_name: service.name,
            customer_name: request.customer_name.clone(),
            customer_phone: request.customer_phone.clone(),
            customer_email: request.customer_email.clone(),
            date: request.date,
            time: request.time.clone(),
            duration_minutes: service.duration_minutes,
            status: AppointmentStatus::Scheduled,
            created_at: "2025-06-01T10:00:00+00:00".into(),
            language: request.language,
        };
        inner.appointments.push(booked.clone());
        Ok(booked)
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, ApiError> {
        let inner = self.record("list_appointments")?;
        Ok(inner
            .appointments
            .iter()
            .filter(|apt| query.date.map_or(true, |date| apt.date == date))
            .filter(|apt| query.status.map_or(true, |status| apt.status == status))
            .cloned()
            .collect())
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        let mut inner = self.record("update_appointment_status")?;
        let apt = inner
            .appointments
            .iter_mut()
            .find(|apt| apt.id == id)
            .ok_or_else(|| ApiError::NotFound("Appointment not found".into()))?;
        apt.status = status;
        Ok(apt.clone())
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), ApiError> {
        let mut inner = self.record("delete_appointment")?;
        inner.appointments.retain(|apt| apt.id != id);
        Ok(())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        Ok(self.record("list_customers")?.customers.clone())
    }

    async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Customer, ApiError> {
        let mut inner = self.record("update_customer")?;
        let customer = inner
            .customers
            .iter_mut()
            .find(|customer| customer.id == id)
            .ok_or_else(|| ApiError::NotFound("Customer not found".into()))?;
        customer.full_name = update.full_name.clone();
        customer.phone = update.phone.clone();
        customer.email = update.email.clone();
        Ok(customer.clone())
    }

    async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        let mut inner = self.record("delete_customer")?;
        inner.customers.retain(|customer| customer.id != id);
        Ok(())
    }

    async fn list_blocked_slots(&self) -> Result<Vec<BlockedSlot>, ApiError> {
        Ok(self.record("list_blocked_slots")?.blocked.clone())
    }

    async fn create_blocked_slot(&self, request: &NewBlockedSlot) -> Result<BlockedSlot, ApiError> {
        let mut inner = self.record("create_blocked_slot")?;
        let parse = |raw: &str| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| ApiError::Validation("Invalid date format. Use YYYY-MM-DD.".into()))
        };
        let slot = BlockedSlot {
            id: format!("block{}", inner.blocked.len() + 1),
            start_date: parse(&request.start_date)?,
            end_date: parse(&request.end_date)?,
            start_time: request.start_time.clone(),
            end_time: request.end_time.clone(),
            reason: request.reason.clone(),
            created_at: "2025-06-01T10:00:00+00:00".into(),
        };
        inner.blocked.push(slot.clone());
        Ok(slot)
    }

    async fn delete_blocked_slot(&self, id: &str) -> Result<(), ApiError> {
        let mut inner = self.record("delete_blocked_slot")?;
        inner.blocked.retain(|slot| slot.id != id);
        Ok(())
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Ok(self.record("dashboard_stats")?.stats.clone())
    }

    async fn login(&self, password: &str) -> Result<LoginResponse, ApiError> {
        let inner = self.record("login")?;
        let success = inner.password.as_deref() == Some(password);
        Ok(LoginResponse {
            success,
            token: success.then(|| "token-1".to_string()),
        })
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        self.record("logout")?.revoked.push(token.to_string());
        Ok(())
    }
}
