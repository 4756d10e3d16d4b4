//! The customer-facing booking flow.
//!
//! `SelectService → SelectDateTime → EnterContactInfo → Confirmed`, with
//! back steps from the contact form to the date picker and from the date
//! picker out to the landing page. The wizard owns all of its selection
//! state; nothing is shared between two flows.

use chrono::NaiveDate;

use super::{
    api::{ApiError, BookingApi},
    notice::{Notice, Notices},
    resolver::{AvailabilityResolver, SlotList},
};
use crate::models::{non_blank, Appointment, Language, NewAppointment, Service};

const BOOKING_FAILED: &str = "Could not book the appointment. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    SelectService,
    SelectDateTime,
    EnterContactInfo,
    Confirmed,
}

impl WizardStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SelectService => "service",
            Self::SelectDateTime => "datetime",
            Self::EnterContactInfo => "contact",
            Self::Confirmed => "confirmed",
        }
    }
}

/// Where a back action leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTo {
    Step(WizardStep),
    Landing,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error("this action is not available on the {0} step")]
    WrongStep(&'static str),
    #[error("please choose a date from today onwards")]
    PastDate,
    #[error("that time is not available")]
    SlotUnavailable,
    #[error("choose a date and a time first")]
    MissingDateTime,
    #[error("name and phone are required")]
    MissingContact,
    #[error("a booking request is already in flight")]
    InFlight,
    #[error("there is no previous step")]
    NoPriorStep,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    pub email: String,
}

impl ContactInfo {
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.phone.trim().is_empty()
    }
}

/// What the confirmation screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub service_name: String,
    pub date: NaiveDate,
    pub time: String,
    pub price: f64,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: WizardStep,
    language: Language,
    service: Option<Service>,
    date: Option<NaiveDate>,
    time: Option<String>,
    slots: SlotList,
    contact: ContactInfo,
    submitting: bool,
    confirmation: Option<Confirmation>,
}

impl BookingWizard {
    pub fn new(language: Language) -> Self {
        Self {
            step: WizardStep::SelectService,
            language,
            service: None,
            date: None,
            time: None,
            slots: SlotList::Idle,
            contact: ContactInfo::default(),
            submitting: false,
            confirmation: None,
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn slots(&self) -> &SlotList {
        &self.slots
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn confirmation(&self) -> Option<&Confirmation> {
        self.confirmation.as_ref()
    }

    fn expect_step(&self, step: WizardStep) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::WrongStep(self.step.as_str()))
        }
    }

    /// Picking a service starts the date step from scratch.
    pub fn select_service(&mut self, service: Service) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectService)?;
        self.service = Some(service);
        self.date = None;
        self.time = None;
        self.slots = SlotList::Idle;
        self.step = WizardStep::SelectDateTime;
        Ok(())
    }

    /// First half of a date change: validates the day and drops the old time
    /// and slot list before any request goes out.
    pub fn begin_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectDateTime)?;
        if date < today {
            return Err(WizardError::PastDate);
        }
        self.date = Some(date);
        self.time = None;
        self.slots = SlotList::Loading;
        Ok(())
    }

    /// Second half of a date change. Answers for a date that is no longer
    /// selected are ignored.
    pub fn apply_slots(&mut self, date: NaiveDate, slots: SlotList) {
        if self.date == Some(date) {
            self.slots = slots;
        }
    }

    pub async fn select_date(
        &mut self,
        api: &dyn BookingApi,
        resolver: &AvailabilityResolver,
        date: NaiveDate,
        notices: &mut Notices,
    ) -> Result<(), WizardError> {
        self.begin_date(date, resolver.today())?;
        let service_id = self.service.as_ref().map(|service| service.id.as_str());
        let slots = resolver.resolve(api, Some(date), service_id, notices).await;
        self.apply_slots(date, slots);
        Ok(())
    }

    pub fn select_time(&mut self, time: &str) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectDateTime)?;
        if !self.slots.contains(time) {
            return Err(WizardError::SlotUnavailable);
        }
        self.time = Some(time.to_string());
        Ok(())
    }

    pub fn can_proceed(&self) -> bool {
        self.step == WizardStep::SelectDateTime && self.date.is_some() && self.time.is_some()
    }

    pub fn proceed(&mut self) -> Result<(), WizardError> {
        self.expect_step(WizardStep::SelectDateTime)?;
        if !self.can_proceed() {
            return Err(WizardError::MissingDateTime);
        }
        self.step = WizardStep::EnterContactInfo;
        Ok(())
    }

    /// Re-enters the contact step for a selection posted back from a form.
    /// The time is not checked against a fresh slot list; the server has the
    /// last word when the booking is sent.
    pub fn resume_contact(
        &mut self,
        service: Service,
        date: NaiveDate,
        time: &str,
        today: NaiveDate,
    ) -> Result<(), WizardError> {
        self.select_service(service)?;
        self.begin_date(date, today)?;
        self.slots = SlotList::Idle;
        let time = time.trim();
        if time.is_empty() {
            return Err(WizardError::MissingDateTime);
        }
        self.time = Some(time.to_string());
        self.step = WizardStep::EnterContactInfo;
        Ok(())
    }

    pub fn back(&mut self) -> Result<BackTo, WizardError> {
        match self.step {
            WizardStep::SelectService => Err(WizardError::NoPriorStep),
            WizardStep::SelectDateTime | WizardStep::Confirmed => Ok(BackTo::Landing),
            WizardStep::EnterContactInfo => {
                self.step = WizardStep::SelectDateTime;
                Ok(BackTo::Step(self.step))
            }
        }
    }

    pub fn set_contact(&mut self, contact: ContactInfo) {
        self.contact = contact;
    }

    pub fn can_submit(&self) -> bool {
        self.step == WizardStep::EnterContactInfo && !self.submitting && self.contact.is_complete()
    }

    /// Builds the create request and marks the wizard busy until
    /// [`finish_submit`](Self::finish_submit) is called.
    pub fn begin_submit(&mut self) -> Result<NewAppointment, WizardError> {
        self.expect_step(WizardStep::EnterContactInfo)?;
        if self.submitting {
            return Err(WizardError::InFlight);
        }
        if !self.contact.is_complete() {
            return Err(WizardError::MissingContact);
        }
        let (Some(service), Some(date), Some(time)) = (&self.service, self.date, &self.time) else {
            return Err(WizardError::MissingDateTime);
        };

        let request = NewAppointment {
            service_id: service.id.clone(),
            customer_name: self.contact.name.trim().to_string(),
            customer_phone: self.contact.phone.trim().to_string(),
            customer_email: non_blank(Some(self.contact.email.clone())),
            date,
            time: time.clone(),
            language: self.language,
        };
        self.submitting = true;
        Ok(request)
    }

    /// Contact details survive a failed submission.
    pub fn finish_submit(&mut self, result: Result<Appointment, ApiError>, notices: &mut Notices) {
        self.submitting = false;
        match result {
            Ok(appointment) => {
                let price = self.service.as_ref().map_or(0.0, |service| service.price);
                self.confirmation = Some(Confirmation {
                    service_name: appointment.service_name,
                    date: appointment.date,
                    time: appointment.time,
                    price,
                });
                self.step = WizardStep::Confirmed;
            }
            Err(err) => {
                log::warn!("Booking rejected: {err}");
                notices.push(Notice::from_api(&err, BOOKING_FAILED));
            }
        }
    }

    pub async fn submit(
        &mut self,
        api: &dyn BookingApi,
        notices: &mut Notices,
    ) -> Result<(), WizardError> {
        let request = self.begin_submit()?;
        let result = api.create_appointment(&request).await;
        self.finish_submit(result, notices);
        Ok(())
    }
}
