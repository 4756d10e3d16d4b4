use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use mockable::Clock;

use super::{
    api::BookingApi,
    notice::{Notice, Notices},
};
use crate::schedule::remaining_today;

/// What the time picker shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotList {
    /// Nothing requested yet, or the last request failed.
    #[default]
    Idle,
    Loading,
    Available(Vec<String>),
    /// The server answered and nothing is bookable.
    NoAvailability,
}

impl SlotList {
    pub fn slots(&self) -> &[String] {
        match self {
            Self::Available(slots) => slots,
            _ => &[],
        }
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots().iter().any(|candidate| candidate == slot)
    }
}

/// Turns the server's raw slots into what a customer may still pick.
#[derive(Clone)]
pub struct AvailabilityResolver {
    clock: Arc<dyn Clock>,
}

impl AvailabilityResolver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.clock.local().naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.now().date()
    }

    /// Both a date and a service are needed; without them nothing is
    /// requested and the list is cleared. Errors also clear the list.
    pub async fn resolve(
        &self,
        api: &dyn BookingApi,
        date: Option<NaiveDate>,
        service_id: Option<&str>,
        notices: &mut Notices,
    ) -> SlotList {
        let (Some(date), Some(service_id)) = (date, service_id) else {
            return SlotList::Idle;
        };

        match api.available_slots(date, service_id).await {
            Ok(raw) => {
                let slots = remaining_today(raw, date, self.now());
                if slots.is_empty() {
                    SlotList::NoAvailability
                } else {
                    SlotList::Available(slots)
                }
            }
            Err(err) => {
                log::warn!("Could not load slots for {date}: {err}");
                notices.push(Notice::from_api(&err, "Could not load available times"));
                SlotList::Idle
            }
        }
    }
}
