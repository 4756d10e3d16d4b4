use actix_web::{web, HttpResponse, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{self, AdminToken},
    error::AppError,
    models::{
        AppointmentQuery, CustomerUpdate, LoginRequest, NewAppointment, NewBlockedSlot,
        StatusUpdate,
    },
    state::AppState,
    store,
};

#[derive(Deserialize)]
struct SlotQuery {
    date: NaiveDate,
    service_id: String,
}

#[derive(Deserialize)]
struct BlockedQuery {
    date: Option<NaiveDate>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ping")
            .route(web::get().to(ping))
            .route(web::head().to(ping)),
    )
    .service(
        web::scope("/api")
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::validation(format!("Invalid request body: {err}")).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::validation(format!("Invalid query: {err}")).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                AppError::validation(format!("Invalid path: {err}")).into()
            }))
            .service(web::resource("/").route(web::get().to(banner)))
            .service(web::resource("/services").route(web::get().to(list_services)))
            .service(web::resource("/available-slots").route(web::get().to(available_slots)))
            .service(
                web::resource("/appointments")
                    .route(web::get().to(list_appointments))
                    .route(web::post().to(create_appointment)),
            )
            .service(
                web::resource("/appointments/{id}")
                    .route(web::patch().to(update_appointment))
                    .route(web::delete().to(delete_appointment)),
            )
            .service(web::resource("/customers").route(web::get().to(list_customers)))
            .service(
                web::resource("/customers/{key}")
                    .route(web::get().to(customer_by_phone))
                    .route(web::put().to(update_customer))
                    .route(web::delete().to(delete_customer)),
            )
            .service(
                web::resource("/blocked-slots")
                    .route(web::get().to(list_blocked_slots))
                    .route(web::post().to(create_blocked_slot)),
            )
            .service(
                web::resource("/blocked-slots/{id}").route(web::delete().to(delete_blocked_slot)),
            )
            .service(web::resource("/dashboard/stats").route(web::get().to(dashboard_stats)))
            .service(web::resource("/auth/login").route(web::post().to(login)))
            .service(web::resource("/auth/logout").route(web::post().to(logout))),
    );
}

async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn banner() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": "Barbershop booking API" }))
}

async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let services = store::list_services(&state.db).await?;
    Ok(HttpResponse::Ok().json(services))
}

async fn available_slots(
    state: web::Data<AppState>,
    query: web::Query<SlotQuery>,
) -> Result<HttpResponse, AppError> {
    let slots = store::available_slots(&state, query.date, &query.service_id).await?;
    Ok(HttpResponse::Ok().json(slots))
}

async fn create_appointment(
    state: web::Data<AppState>,
    body: web::Json<NewAppointment>,
) -> Result<HttpResponse, AppError> {
    let appointment = store::create_appointment(&state, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(appointment))
}

async fn list_appointments(
    _admin: AdminToken,
    state: web::Data<AppState>,
    query: web::Query<AppointmentQuery>,
) -> Result<HttpResponse, AppError> {
    let appointments = store::list_appointments(&state.db, &query).await?;
    Ok(HttpResponse::Ok().json(appointments))
}

async fn update_appointment(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, AppError> {
    let appointment = store::update_status(&state.db, &path, body.status).await?;
    Ok(HttpResponse::Ok().json(appointment))
}

async fn delete_appointment(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    store::delete_appointment(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "deleted" })))
}

async fn list_customers(
    _admin: AdminToken,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let customers = store::list_customers(&state.db).await?;
    Ok(HttpResponse::Ok().json(customers))
}

async fn customer_by_phone(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer = store::find_by_phone(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(customer))
}

async fn update_customer(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CustomerUpdate>,
) -> Result<HttpResponse, AppError> {
    let customer = store::update_customer(&state.db, &path, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(customer))
}

async fn delete_customer(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    store::hide_customer(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "deleted" })))
}

async fn list_blocked_slots(
    _admin: AdminToken,
    state: web::Data<AppState>,
    query: web::Query<BlockedQuery>,
) -> Result<HttpResponse, AppError> {
    let slots = store::list_blocked_slots(&state.db, query.date).await?;
    Ok(HttpResponse::Ok().json(slots))
}

async fn create_blocked_slot(
    _admin: AdminToken,
    state: web::Data<AppState>,
    body: web::Json<NewBlockedSlot>,
) -> Result<HttpResponse, AppError> {
    let slot = store::create_blocked_slot(&state.db, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(slot))
}

async fn delete_blocked_slot(
    _admin: AdminToken,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    store::delete_blocked_slot(&state.db, &path).await?;
    Ok(HttpResponse::Ok().json(json!({ "status": "deleted" })))
}

async fn dashboard_stats(
    _admin: AdminToken,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let stats = store::dashboard_stats(&state).await?;
    Ok(HttpResponse::Ok().json(stats))
}

async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let response = auth::login(&state, &body.password).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn logout(admin: AdminToken, state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    auth::logout(&state.db, &admin.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{service_id, state_at};
    use actix_web::{
        http::{header, StatusCode},
        test, App,
    };
    use serde_json::Value;

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure),
            )
            .await
        };
    }

    async fn token(state: &AppState) -> String {
        auth::login(state, "hunter2")
            .await
            .expect("login")
            .token
            .expect("token")
    }

    #[actix_web::test]
    async fn admin_routes_need_a_bearer_token() {
        let state = state_at("2025-05-30 10:00").await;
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/dashboard/stats").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Not authenticated");

        let req = test::TestRequest::get()
            .uri("/api/dashboard/stats")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", token(&state).await)))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn logout_revokes_the_token() {
        let state = state_at("2025-05-30 10:00").await;
        let app = app!(state);
        let bearer = format!("Bearer {}", token(&state).await);

        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/customers")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn wrong_password_is_not_an_http_error() {
        let state = state_at("2025-05-30 10:00").await;
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "password": "nope" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "success": false, "token": null }));
    }

    #[actix_web::test]
    async fn booking_flow_over_http() {
        let state = state_at("2025-05-30 10:00").await;
        let haircut = service_id(&state.db, "Men's Haircut").await;
        let app = app!(state);
        let bearer = format!("Bearer {}", token(&state).await);

        let req = test::TestRequest::post()
            .uri("/api/blocked-slots")
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({
                "start_date": "2025-06-02",
                "end_date": "2025-06-02",
                "start_time": "09:00",
                "end_time": "12:00",
            }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/available-slots?date=2025-06-02&service_id={haircut}"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["available_slots"][0], "12:00 PM");

        let booking = json!({
            "service_id": haircut,
            "customer_name": "Jo",
            "customer_phone": "555-1000",
            "customer_email": null,
            "date": "2025-06-02",
            "time": "12:00 PM",
            "language": "es",
        });
        let req = test::TestRequest::post()
            .uri("/api/appointments")
            .set_json(&booking)
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["status"], "scheduled");
        assert_eq!(created["language"], "es");

        let req = test::TestRequest::post()
            .uri("/api/appointments")
            .set_json(&booking)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Time slot already booked");

        let id = created["id"].as_str().expect("id").to_string();
        let req = test::TestRequest::delete()
            .uri(&format!("/api/appointments/{id}"))
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::patch()
            .uri(&format!("/api/appointments/{id}"))
            .insert_header((header::AUTHORIZATION, bearer.clone()))
            .set_json(json!({ "status": "cancelled" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["status"], "cancelled");

        let req = test::TestRequest::get()
            .uri("/api/customers/555-1000")
            .insert_header((header::AUTHORIZATION, bearer))
            .to_request();
        let customer: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(customer["total_appointments"], 1);
    }

    #[actix_web::test]
    async fn malformed_input_answers_with_a_detail() {
        let state = state_at("2025-05-30 10:00").await;
        let app = app!(state);

        let req = test::TestRequest::get()
            .uri("/api/available-slots?date=06/02/2025&service_id=x")
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert!(body["detail"].as_str().is_some_and(|d| d.starts_with("Invalid query")));

        let req = test::TestRequest::post()
            .uri("/api/appointments")
            .set_json(json!({ "service_id": "x" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn ping_answers_get_and_head() {
        let state = state_at("2025-05-30 10:00").await;
        let app = app!(state);
        for req in [
            test::TestRequest::get().uri("/ping").to_request(),
            test::TestRequest::default()
                .method(actix_web::http::Method::HEAD)
                .uri("/ping")
                .to_request(),
        ] {
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }
    }
}
