//! Reqwest-backed adapter for a remote `/api`.
//!
//! Owns transport details only: URL building, bearer headers, status
//! mapping and JSON decoding.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use super::api::{ApiError, BookingApi};
use crate::{
    models::{
        Appointment, AppointmentQuery, AvailableSlots, BlockedSlot, Customer, CustomerUpdate,
        DashboardStats, LoginResponse, NewAppointment, NewBlockedSlot, Service,
    },
    schedule::AppointmentStatus,
};

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

pub struct HttpBookingApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpBookingApi {
    /// `base` points at the API root, e.g. `http://localhost:8080/api`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(mut base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base,
            token: None,
        })
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        self.request_as(method, path, self.token.as_deref())
    }

    fn request_as(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base
            .join(path)
            .map_err(|err| ApiError::Network(format!("invalid url `{path}`: {err}")))?;
        let builder = self.client.request(method, url);
        Ok(match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send_raw(builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|parsed| parsed.detail)
            .unwrap_or(body);
        Err(ApiError::from_status(status.as_u16(), detail))
    }

    async fn send<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
        Self::send_raw(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|err| ApiError::Server(format!("unreadable response: {err}")))
    }

    async fn send_empty(builder: RequestBuilder) -> Result<(), ApiError> {
        Self::send_raw(builder).await.map(|_| ())
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        Self::send(self.request(Method::GET, "services")?).await
    }

    async fn available_slots(
        &self,
        date: NaiveDate,
        service_id: &str,
    ) -> Result<Vec<String>, ApiError> {
        let request = self
            .request(Method::GET, "available-slots")?
            .query(&[("date", date.to_string().as_str()), ("service_id", service_id)]);
        let slots: AvailableSlots = Self::send(request).await?;
        Ok(slots.available_slots)
    }

    async fn create_appointment(&self, request: &NewAppointment) -> Result<Appointment, ApiError> {
        Self::send(self.request(Method::POST, "appointments")?.json(request)).await
    }

    async fn list_appointments(
        &self,
        query: &AppointmentQuery,
    ) -> Result<Vec<Appointment>, ApiError> {
        let mut params = Vec::new();
        if let Some(date) = query.date {
            params.push(("date", date.to_string()));
        }
        if let Some(status) = query.status {
            params.push(("status", status.as_str().to_string()));
        }
        Self::send(self.request(Method::GET, "appointments")?.query(&params)).await
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<Appointment, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("appointments/{id}"))?
            .json(&json!({ "status": status }));
        Self::send(request).await
    }

    async fn delete_appointment(&self, id: &str) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::DELETE, &format!("appointments/{id}"))?).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        Self::send(self.request(Method::GET, "customers")?).await
    }

    async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Customer, ApiError> {
        Self::send(self.request(Method::PUT, &format!("customers/{id}"))?.json(update)).await
    }

    async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::DELETE, &format!("customers/{id}"))?).await
    }

    async fn list_blocked_slots(&self) -> Result<Vec<BlockedSlot>, ApiError> {
        Self::send(self.request(Method::GET, "blocked-slots")?).await
    }

    async fn create_blocked_slot(&self, request: &NewBlockedSlot) -> Result<BlockedSlot, ApiError> {
        Self::send(self.request(Method::POST, "blocked-slots")?.json(request)).await
    }

    async fn delete_blocked_slot(&self, id: &str) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::DELETE, &format!("blocked-slots/{id}"))?).await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, ApiError> {
        Self::send(self.request(Method::GET, "dashboard/stats")?).await
    }

    async fn login(&self, password: &str) -> Result<LoginResponse, ApiError> {
        let request = self
            .request(Method::POST, "auth/login")?
            .json(&json!({ "password": password }));
        Self::send(request).await
    }

    async fn logout(&self, token: &str) -> Result<(), ApiError> {
        Self::send_empty(self.request_as(Method::POST, "auth/logout", Some(token))?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        routes,
        test_support::{service_id, state_at},
    };
    use actix_web::{web, App, HttpServer};

    fn client(base: &str) -> HttpBookingApi {
        HttpBookingApi::new(Url::parse(base).expect("url"), Duration::from_secs(5)).expect("client")
    }

    #[test]
    fn base_without_trailing_slash_keeps_its_path() {
        let api = client("http://localhost:8080/api");
        let request = api
            .request(Method::GET, "dashboard/stats")
            .expect("request")
            .build()
            .expect("built");
        assert_eq!(request.url().as_str(), "http://localhost:8080/api/dashboard/stats");
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn token_is_sent_as_bearer() {
        let api = client("http://localhost:8080/api/").with_token("abc");
        let request = api
            .request(Method::GET, "customers")
            .expect("request")
            .build()
            .expect("built");
        assert_eq!(
            request.headers().get("authorization").and_then(|v| v.to_str().ok()),
            Some("Bearer abc")
        );
    }

    #[actix_web::test]
    async fn talks_to_the_real_router() {
        let state = state_at("2025-05-30 10:00").await;
        let haircut = service_id(&state.db, "Men's Haircut").await;
        let data = web::Data::new(state);
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .configure(routes::api::configure)
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .expect("bind");
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let public = client(&format!("http://{addr}/api"));
        let services = public.list_services().await.expect("services");
        assert_eq!(services.len(), 13);

        let date = NaiveDate::from_ymd_opt(2025, 6, 3).expect("date");
        let slots = public.available_slots(date, &haircut).await.expect("slots");
        assert_eq!(slots.first().map(String::as_str), Some("09:00 AM"));

        assert_eq!(
            public.dashboard_stats().await.expect_err("guarded"),
            ApiError::Unauthorized
        );
        let token = public
            .login("hunter2")
            .await
            .expect("login")
            .token
            .expect("token");

        let admin = client(&format!("http://{addr}/api")).with_token(token.clone());
        let err = admin
            .create_blocked_slot(&NewBlockedSlot {
                start_date: "2025-06-03".into(),
                end_date: "2025-06-02".into(),
                start_time: "09:00".into(),
                end_time: "12:00".into(),
                reason: None,
            })
            .await
            .expect_err("reversed range");
        assert_eq!(
            err,
            ApiError::Validation("Start date cannot be after end date.".into())
        );
        assert_eq!(admin.dashboard_stats().await.expect("stats"), DashboardStats::default());

        public.logout(&token).await.expect("logout");
        assert_eq!(
            admin.dashboard_stats().await.expect_err("revoked"),
            ApiError::Unauthorized
        );

        handle.stop(true).await;
    }
}
