use super::{
    api::{ApiError, BookingApi},
    notice::{Notice, Notices},
};
use crate::models::{BlockedSlot, NewBlockedSlot};

/// Admin list of blocked ranges.
///
/// Range checks are the server's job; a rejected range comes back as a
/// validation notice and is never adjusted here.
#[derive(Debug, Default, Clone)]
pub struct BlockedSlotManager {
    slots: Vec<BlockedSlot>,
}

impl BlockedSlotManager {
    pub fn slots(&self) -> &[BlockedSlot] {
        &self.slots
    }

    pub(crate) fn apply(&mut self, result: Result<Vec<BlockedSlot>, ApiError>, notices: &mut Notices) {
        match result {
            Ok(slots) => self.slots = slots,
            Err(err) => notices.push(Notice::from_api(&err, "Could not load blocked times")),
        }
    }

    pub async fn refresh(&mut self, api: &dyn BookingApi, notices: &mut Notices) {
        let result = api.list_blocked_slots().await;
        self.apply(result, notices);
    }

    pub async fn create(
        &mut self,
        api: &dyn BookingApi,
        request: &NewBlockedSlot,
        notices: &mut Notices,
    ) -> bool {
        match api.create_blocked_slot(request).await {
            Ok(slot) => {
                notices.push(Notice::success(format!(
                    "Blocked {}-{} from {} to {}",
                    slot.start_time, slot.end_time, slot.start_date, slot.end_date
                )));
                self.refresh(api, notices).await;
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not block the time range"));
                false
            }
        }
    }

    /// No confirmation: a deleted range can simply be created again.
    pub async fn delete(&mut self, api: &dyn BookingApi, id: &str, notices: &mut Notices) -> bool {
        match api.delete_blocked_slot(id).await {
            Ok(()) => {
                self.slots.retain(|slot| slot.id != id);
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not remove the blocked range"));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fake::FakeApi;

    fn range(start_date: &str, end_date: &str) -> NewBlockedSlot {
        NewBlockedSlot {
            start_date: start_date.into(),
            end_date: end_date.into(),
            start_time: "09:00".into(),
            end_time: "12:00".into(),
            reason: Some("Holiday".into()),
        }
    }

    #[tokio::test]
    async fn server_rejection_is_reported_verbatim() {
        let api = FakeApi::default();
        api.reject(
            "create_blocked_slot",
            ApiError::Validation("Start date cannot be after end date.".into()),
        );
        let mut notices = Notices::default();
        let mut manager = BlockedSlotManager::default();

        assert!(!manager.create(&api, &range("2025-06-02", "2025-06-01"), &mut notices).await);
        assert!(manager.slots().is_empty());
        assert_eq!(
            notices.last(),
            Some(&Notice::error("Start date cannot be after end date."))
        );
    }

    #[tokio::test]
    async fn created_ranges_can_be_deleted() {
        let api = FakeApi::default();
        let mut notices = Notices::default();
        let mut manager = BlockedSlotManager::default();

        assert!(manager.create(&api, &range("2025-06-01", "2025-06-03"), &mut notices).await);
        let id = manager.slots()[0].id.clone();
        assert!(manager.delete(&api, &id, &mut notices).await);
        assert!(manager.slots().is_empty());
    }
}
