use actix_web::{http::header, middleware::from_fn, web, HttpRequest, HttpResponse, Result};
use askama::Template;
use chrono::NaiveDate;
use serde::Deserialize;

use super::public::{notice_views, NoticeView};
use crate::{
    auth::{self, clear_session_cookie, session_cookie, session_guard, session_token},
    models::{non_blank, Appointment, AppointmentQuery, CustomerUpdate, NewBlockedSlot},
    schedule::AppointmentStatus,
    state::AppState,
    templates::{render, render_private},
    ui::{AdminDashboard, LocalBookingApi, Notice, Notices},
};

#[derive(Clone, Debug)]
struct StatCard {
    label: &'static str,
    value: String,
}

#[derive(Clone, Debug)]
struct StatusAction {
    value: &'static str,
    label: &'static str,
}

#[derive(Clone, Debug)]
struct AppointmentView {
    id: String,
    date: String,
    time: String,
    service_name: String,
    customer_name: String,
    customer_phone: String,
    customer_email: String,
    status: &'static str,
    status_label: &'static str,
    actions: Vec<StatusAction>,
    can_purge: bool,
}

impl From<&Appointment> for AppointmentView {
    fn from(apt: &Appointment) -> Self {
        Self {
            id: apt.id.clone(),
            date: apt.date.to_string(),
            time: apt.time.clone(),
            service_name: apt.service_name.clone(),
            customer_name: apt.customer_name.clone(),
            customer_phone: apt.customer_phone.clone(),
            customer_email: apt.customer_email.clone().unwrap_or_default(),
            status: apt.status.as_str(),
            status_label: apt.status.label(),
            actions: AdminDashboard::status_actions(apt)
                .iter()
                .map(|next| StatusAction {
                    value: next.as_str(),
                    label: next.label(),
                })
                .collect(),
            can_purge: AdminDashboard::can_purge(apt),
        }
    }
}

#[derive(Clone, Debug)]
struct CustomerView {
    id: String,
    full_name: String,
    phone: String,
    email: String,
    total_appointments: i64,
    last_visit: String,
}

#[derive(Clone, Debug)]
struct BlockedView {
    id: String,
    start_date: String,
    end_date: String,
    start_time: String,
    end_time: String,
    reason: String,
}

#[derive(Clone, Debug)]
struct StatusOption {
    value: &'static str,
    label: &'static str,
    selected: bool,
}

#[derive(Template)]
#[template(path = "admin_login.html")]
struct AdminLoginTemplate {
    notices: Vec<NoticeView>,
}

#[derive(Template)]
#[template(path = "admin_dashboard.html")]
struct AdminDashboardTemplate {
    stats: Vec<StatCard>,
    appointments: Vec<AppointmentView>,
    customers: Vec<CustomerView>,
    blocked: Vec<BlockedView>,
    statuses: Vec<StatusOption>,
    filter_date: String,
    search: String,
    filter_query: String,
    notices: Vec<NoticeView>,
}

/// Filter and search state, carried in the query string of every dashboard
/// URL so form actions land back on the same view.
#[derive(Deserialize, Default)]
struct DashboardQuery {
    date: Option<String>,
    status: Option<String>,
    q: Option<String>,
}

impl DashboardQuery {
    fn filter(&self, notices: &mut Notices) -> AppointmentQuery {
        let date = non_blank(self.date.clone()).and_then(|raw| {
            NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|_| notices.push(Notice::error("Invalid date filter")))
                .ok()
        });
        let status = non_blank(self.status.clone()).and_then(|raw| {
            raw.parse::<AppointmentStatus>()
                .map_err(|err| notices.push(Notice::error(err.to_string())))
                .ok()
        });
        AppointmentQuery { date, status }
    }

    fn search(&self) -> String {
        self.q.clone().unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct LoginForm {
    password: String,
}

#[derive(Deserialize)]
struct StatusForm {
    status: AppointmentStatus,
}

#[derive(Deserialize)]
struct ConfirmForm {
    confirm: Option<String>,
}

impl ConfirmForm {
    fn confirmed(&self) -> bool {
        self.confirm.is_some()
    }
}

#[derive(Deserialize)]
struct CustomerForm {
    full_name: String,
    phone: String,
    email: Option<String>,
}

#[derive(Deserialize)]
struct BlockForm {
    start_date: String,
    end_date: String,
    start_time: String,
    end_time: String,
    reason: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/admin/login")
            .route(web::get().to(login_page))
            .route(web::post().to(login)),
    )
    .service(web::resource("/admin/logout").route(web::post().to(logout)))
    .service(
        web::scope("/admin")
            .wrap(from_fn(session_guard))
            .service(web::resource("").route(web::get().to(dashboard)))
            .service(web::resource("/").route(web::get().to(dashboard)))
            .service(
                web::resource("/appointments/{id}/status").route(web::post().to(update_status)),
            )
            .service(web::resource("/appointments/{id}/delete").route(web::post().to(purge)))
            .service(web::resource("/customers/{id}").route(web::post().to(update_customer)))
            .service(web::resource("/customers/{id}/delete").route(web::post().to(hide_customer)))
            .service(web::resource("/blocked-slots").route(web::post().to(block_range)))
            .service(
                web::resource("/blocked-slots/{id}/delete").route(web::post().to(unblock_range)),
            ),
    );
}

async fn login_page() -> HttpResponse {
    render(AdminLoginTemplate {
        notices: Vec::new(),
    })
}

async fn login(
    state: web::Data<AppState>,
    req: HttpRequest,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let response = auth::login(&state, &form.password).await?;
    match response.token.filter(|_| response.success) {
        Some(token) => Ok(HttpResponse::SeeOther()
            .append_header((header::LOCATION, "/admin"))
            .cookie(session_cookie(&req, &token))
            .finish()),
        None => {
            let mut notices = Notices::default();
            notices.push(Notice::error("Invalid password"));
            Ok(render(AdminLoginTemplate {
                notices: notice_views(notices),
            }))
        }
    }
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> Result<HttpResponse> {
    if let Some(token) = session_token(&req) {
        auth::logout(&state.db, &token).await?;
    }
    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/admin/login"))
        .cookie(clear_session_cookie(&req))
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .finish())
}

/// A dashboard loaded for the filter in the URL, ready for one action.
struct DashboardPage {
    api: LocalBookingApi,
    dashboard: AdminDashboard,
    notices: Notices,
    search: String,
}

impl DashboardPage {
    async fn open(state: &AppState, query: &DashboardQuery) -> Self {
        let api = LocalBookingApi::new(state.clone());
        let mut notices = Notices::default();
        let mut dashboard = AdminDashboard {
            filter: query.filter(&mut notices),
            ..AdminDashboard::default()
        };
        dashboard.load(&api, &mut notices).await;
        Self {
            api,
            dashboard,
            notices,
            search: query.search(),
        }
    }

    fn into_response(self) -> HttpResponse {
        let Self {
            dashboard,
            notices,
            search,
            ..
        } = self;
        let stats = &dashboard.stats;
        let filter = &dashboard.filter;
        let filter_date = filter.date.map(|date| date.to_string()).unwrap_or_default();
        let mut filter_query = Vec::new();
        if let Some(date) = filter.date {
            filter_query.push(format!("date={date}"));
        }
        if let Some(status) = filter.status {
            filter_query.push(format!("status={status}"));
        }

        render_private(AdminDashboardTemplate {
            stats: vec![
                StatCard {
                    label: "Today's appointments",
                    value: stats.today_appointments.to_string(),
                },
                StatCard {
                    label: "Customers",
                    value: stats.total_customers.to_string(),
                },
                StatCard {
                    label: "Revenue this month",
                    value: format!("{:.2}", stats.monthly_revenue),
                },
                StatCard {
                    label: "Completed this month",
                    value: stats.total_appointments.to_string(),
                },
            ],
            appointments: dashboard.appointments.iter().map(AppointmentView::from).collect(),
            customers: dashboard
                .customers
                .search(&search)
                .into_iter()
                .map(|customer| CustomerView {
                    id: customer.id.clone(),
                    full_name: customer.full_name.clone(),
                    phone: customer.phone.clone(),
                    email: customer.email.clone().unwrap_or_default(),
                    total_appointments: customer.total_appointments,
                    last_visit: customer
                        .last_visit
                        .map(|date| date.to_string())
                        .unwrap_or_default(),
                })
                .collect(),
            blocked: dashboard
                .blocked
                .slots()
                .iter()
                .map(|slot| BlockedView {
                    id: slot.id.clone(),
                    start_date: slot.start_date.to_string(),
                    end_date: slot.end_date.to_string(),
                    start_time: slot.start_time.clone(),
                    end_time: slot.end_time.clone(),
                    reason: slot.reason.clone().unwrap_or_default(),
                })
                .collect(),
            statuses: AppointmentStatus::ALL
                .into_iter()
                .map(|status| StatusOption {
                    value: status.as_str(),
                    label: status.label(),
                    selected: filter.status == Some(status),
                })
                .collect(),
            filter_date,
            search,
            filter_query: filter_query.join("&"),
            notices: notice_views(notices),
        })
    }
}

async fn dashboard(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
) -> HttpResponse {
    DashboardPage::open(&state, &query).await.into_response()
}

async fn update_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DashboardQuery>,
    form: web::Form<StatusForm>,
) -> HttpResponse {
    let mut page = DashboardPage::open(&state, &query).await;
    page.dashboard
        .update_status(&page.api, &path, form.status, &mut page.notices)
        .await;
    page.into_response()
}

async fn purge(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DashboardQuery>,
    form: web::Form<ConfirmForm>,
) -> HttpResponse {
    let mut page = DashboardPage::open(&state, &query).await;
    if !form.confirmed() {
        page.notices.push(Notice::info("Tick the confirmation box to delete"));
    }
    page.dashboard
        .purge(&page.api, &path, form.confirmed(), &mut page.notices)
        .await;
    page.into_response()
}

async fn update_customer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DashboardQuery>,
    form: web::Form<CustomerForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let update = CustomerUpdate {
        full_name: form.full_name,
        phone: form.phone,
        email: non_blank(form.email),
    };
    let mut page = DashboardPage::open(&state, &query).await;
    page.dashboard
        .customers
        .update(&page.api, &path, &update, &mut page.notices)
        .await;
    page.into_response()
}

async fn hide_customer(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DashboardQuery>,
    form: web::Form<ConfirmForm>,
) -> HttpResponse {
    let mut page = DashboardPage::open(&state, &query).await;
    if !form.confirmed() {
        page.notices.push(Notice::info("Tick the confirmation box to delete"));
    }
    let removed = page
        .dashboard
        .customers
        .soft_delete(&page.api, &path, form.confirmed(), &mut page.notices)
        .await;
    if removed {
        page.notices.push(Notice::success("Customer removed"));
    }
    page.into_response()
}

async fn block_range(
    state: web::Data<AppState>,
    query: web::Query<DashboardQuery>,
    form: web::Form<BlockForm>,
) -> HttpResponse {
    let form = form.into_inner();
    let request = NewBlockedSlot {
        start_date: form.start_date,
        end_date: form.end_date,
        start_time: form.start_time,
        end_time: form.end_time,
        reason: non_blank(form.reason),
    };
    let mut page = DashboardPage::open(&state, &query).await;
    page.dashboard
        .block(&page.api, &request, &mut page.notices)
        .await;
    page.into_response()
}

async fn unblock_range(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<DashboardQuery>,
) -> HttpResponse {
    let mut page = DashboardPage::open(&state, &query).await;
    let removed = page
        .dashboard
        .blocked
        .delete(&page.api, &path, &mut page.notices)
        .await;
    if removed {
        page.notices.push(Notice::success("Blocked range removed"));
    }
    page.into_response()
}
