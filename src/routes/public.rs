use actix_web::{web, HttpResponse, Result};
use askama::Template;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    models::{Language, Service},
    state::AppState,
    templates::render,
    ui::{
        AvailabilityResolver, BookingWizard, CatalogLoader, ContactInfo, LocalBookingApi, Notice,
        Notices, SlotList, WizardError, WizardStep,
    },
};

#[derive(Clone, Debug)]
pub(crate) struct NoticeView {
    pub(crate) css_class: &'static str,
    pub(crate) message: String,
}

pub(crate) fn notice_views(mut notices: Notices) -> Vec<NoticeView> {
    notices
        .take()
        .into_iter()
        .map(|notice| NoticeView {
            css_class: notice.level.css_class(),
            message: notice.message,
        })
        .collect()
}

#[derive(Clone, Debug)]
struct ServiceCard {
    id: String,
    name: String,
    price: String,
    duration: String,
    description: String,
    selected: bool,
}

impl ServiceCard {
    fn new(service: &Service, selected: Option<&str>) -> Self {
        Self {
            id: service.id.clone(),
            name: service.name.clone(),
            price: format!("{:.2}", service.price),
            duration: format!("{} min", service.duration_minutes),
            description: service.description.clone().unwrap_or_default(),
            selected: selected == Some(service.id.as_str()),
        }
    }
}

#[derive(Clone, Debug)]
struct LanguageOption {
    tag: &'static str,
    label: &'static str,
    selected: bool,
}

fn language_options(current: Language) -> Vec<LanguageOption> {
    Language::ALL
        .iter()
        .map(|&language| LanguageOption {
            tag: language.as_str(),
            label: language.label(),
            selected: language == current,
        })
        .collect()
}

fn requested_language(lang: Option<&str>) -> Language {
    lang.map(Language::from_tag).unwrap_or_default()
}

#[derive(Clone, Debug)]
struct SlotView {
    value: String,
    selected: bool,
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate {
    lang: &'static str,
    languages: Vec<LanguageOption>,
    picker_path: &'static str,
    services: Vec<ServiceCard>,
    notices: Vec<NoticeView>,
}

#[derive(Template)]
#[template(path = "book.html")]
struct BookTemplate {
    step: &'static str,
    lang: &'static str,
    languages: Vec<LanguageOption>,
    picker_path: &'static str,
    services: Vec<ServiceCard>,
    service_id: String,
    service_name: String,
    date: String,
    min_date: String,
    time: String,
    slot_state: &'static str,
    slots: Vec<SlotView>,
    can_proceed: bool,
    name: String,
    phone: String,
    email: String,
    confirmed_service: String,
    confirmed_date: String,
    confirmed_time: String,
    confirmed_price: String,
    notices: Vec<NoticeView>,
}

#[derive(Deserialize, Default)]
struct WizardQuery {
    service_id: Option<String>,
    date: Option<String>,
    time: Option<String>,
    step: Option<String>,
    lang: Option<String>,
}

#[derive(Deserialize)]
struct LanguageQuery {
    lang: Option<String>,
}

#[derive(Deserialize)]
struct ContactForm {
    service_id: String,
    date: String,
    time: String,
    lang: Option<String>,
    name: String,
    phone: String,
    email: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)))
        .service(
            web::resource("/book")
                .route(web::get().to(show_booking))
                .route(web::post().to(submit_booking)),
        );
}

async fn home(
    state: web::Data<AppState>,
    query: web::Query<LanguageQuery>,
) -> Result<HttpResponse> {
    let language = requested_language(query.lang.as_deref());
    let api = LocalBookingApi::new(state.get_ref().clone());
    let mut notices = Notices::default();
    let mut catalog = CatalogLoader::default();
    let services = catalog
        .load(&api, &mut notices)
        .await
        .iter()
        .map(|service| ServiceCard::new(service, None))
        .collect();

    Ok(render(HomeTemplate {
        lang: language.as_str(),
        languages: language_options(language),
        picker_path: "/",
        services,
        notices: notice_views(notices),
    }))
}

async fn show_booking(
    state: web::Data<AppState>,
    query: web::Query<WizardQuery>,
) -> Result<HttpResponse> {
    let api = LocalBookingApi::new(state.get_ref().clone());
    let mut notices = Notices::default();
    let mut catalog = CatalogLoader::default();
    catalog.load(&api, &mut notices).await;

    let wizard = restore_wizard(&state, &api, &catalog, &query, &mut notices).await;
    Ok(render(book_page(&wizard, &catalog, state.today(), notices)))
}

async fn submit_booking(
    state: web::Data<AppState>,
    form: web::Form<ContactForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let api = LocalBookingApi::new(state.get_ref().clone());
    let mut notices = Notices::default();
    let mut catalog = CatalogLoader::default();
    catalog.load(&api, &mut notices).await;

    let mut wizard = BookingWizard::new(requested_language(form.lang.as_deref()));
    let resumed = match catalog.find(&form.service_id) {
        None => Err("That service is no longer offered".to_string()),
        Some(service) => match NaiveDate::parse_from_str(&form.date, "%Y-%m-%d") {
            Ok(date) => wizard
                .resume_contact(service.clone(), date, &form.time, state.today())
                .map_err(|err| wizard_message(&err)),
            Err(_) => Err("Please choose a valid date".to_string()),
        },
    };
    wizard.set_contact(ContactInfo {
        name: form.name,
        phone: form.phone,
        email: form.email.unwrap_or_default(),
    });
    if let Err(message) = resumed {
        notices.push(Notice::error(message));
        return Ok(render(book_page(&wizard, &catalog, state.today(), notices)));
    }

    if let Err(err) = wizard.submit(&api, &mut notices).await {
        notices.push(Notice::error(wizard_message(&err)));
    }
    Ok(render(book_page(&wizard, &catalog, state.today(), notices)))
}

/// Replays the selections carried in the URL onto a fresh wizard. A step that
/// fails leaves the wizard where it stopped, with a notice saying why.
async fn restore_wizard(
    state: &AppState,
    api: &LocalBookingApi,
    catalog: &CatalogLoader,
    query: &WizardQuery,
    notices: &mut Notices,
) -> BookingWizard {
    let mut wizard = BookingWizard::new(requested_language(query.lang.as_deref()));

    let Some(service_id) = query.service_id.as_deref().filter(|id| !id.is_empty()) else {
        return wizard;
    };
    let Some(service) = catalog.find(service_id) else {
        notices.push(Notice::error("That service is no longer offered"));
        return wizard;
    };
    if wizard.select_service(service.clone()).is_err() {
        return wizard;
    }

    let Some(raw_date) = query.date.as_deref().filter(|date| !date.is_empty()) else {
        return wizard;
    };
    let Ok(date) = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") else {
        notices.push(Notice::error("Please choose a valid date"));
        return wizard;
    };
    let resolver = AvailabilityResolver::new(state.clock.clone());
    if let Err(err) = wizard.select_date(api, &resolver, date, notices).await {
        notices.push(Notice::error(wizard_message(&err)));
        return wizard;
    }

    let Some(time) = query.time.as_deref().filter(|time| !time.is_empty()) else {
        return wizard;
    };
    if let Err(err) = wizard.select_time(time) {
        notices.push(Notice::error(wizard_message(&err)));
        return wizard;
    }

    if query.step.as_deref() == Some(WizardStep::EnterContactInfo.as_str()) {
        if let Err(err) = wizard.proceed() {
            notices.push(Notice::error(wizard_message(&err)));
        }
    }
    wizard
}

fn wizard_message(err: &WizardError) -> String {
    let message = err.to_string();
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => message,
    }
}

fn book_page(
    wizard: &BookingWizard,
    catalog: &CatalogLoader,
    today: NaiveDate,
    notices: Notices,
) -> BookTemplate {
    let service = wizard.service();
    let selected_id = service.map(|service| service.id.as_str());
    let selected_time = wizard.time();
    let slot_state = match wizard.slots() {
        SlotList::Idle => "idle",
        SlotList::Loading => "loading",
        SlotList::Available(_) => "available",
        SlotList::NoAvailability => "none",
    };
    let slots = wizard
        .slots()
        .slots()
        .iter()
        .map(|slot| SlotView {
            value: slot.clone(),
            selected: selected_time == Some(slot.as_str()),
        })
        .collect();
    let confirmation = wizard.confirmation();

    BookTemplate {
        step: wizard.step().as_str(),
        lang: wizard.language().as_str(),
        languages: language_options(wizard.language()),
        picker_path: "/book",
        services: catalog
            .services()
            .iter()
            .map(|service| ServiceCard::new(service, selected_id))
            .collect(),
        service_id: selected_id.unwrap_or_default().to_string(),
        service_name: service.map(|service| service.name.clone()).unwrap_or_default(),
        date: wizard.date().map(|date| date.to_string()).unwrap_or_default(),
        min_date: today.to_string(),
        time: selected_time.unwrap_or_default().to_string(),
        slot_state,
        slots,
        can_proceed: wizard.can_proceed(),
        name: wizard.contact().name.clone(),
        phone: wizard.contact().phone.clone(),
        email: wizard.contact().email.clone(),
        confirmed_service: confirmation
            .map(|done| done.service_name.clone())
            .unwrap_or_default(),
        confirmed_date: confirmation
            .map(|done| done.date.format("%A, %B %-d, %Y").to_string())
            .unwrap_or_default(),
        confirmed_time: confirmation
            .map(|done| done.time.clone())
            .unwrap_or_default(),
        confirmed_price: confirmation
            .map(|done| format!("{:.2}", done.price))
            .unwrap_or_default(),
        notices: notice_views(notices),
    }
}
