use super::{
    api::{ApiError, BookingApi},
    notice::{Notice, Notices},
};
use crate::models::{Customer, CustomerUpdate};

#[derive(Debug, Default, Clone)]
pub struct CustomerDirectory {
    customers: Vec<Customer>,
}

impl CustomerDirectory {
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub(crate) fn apply(&mut self, result: Result<Vec<Customer>, ApiError>, notices: &mut Notices) {
        match result {
            Ok(customers) => self.customers = customers,
            Err(err) => notices.push(Notice::from_api(&err, "Could not load customers")),
        }
    }

    pub async fn refresh(&mut self, api: &dyn BookingApi, notices: &mut Notices) {
        let result = api.list_customers().await;
        self.apply(result, notices);
    }

    /// Case-insensitive match on the name, or a plain substring match on the
    /// phone as typed. Phone formatting is not normalised, so "5551000"
    /// does not find "555-1000".
    pub fn search(&self, term: &str) -> Vec<&Customer> {
        if term.trim().is_empty() {
            return self.customers.iter().collect();
        }
        let needle = term.to_lowercase();
        self.customers
            .iter()
            .filter(|customer| {
                customer.full_name.to_lowercase().contains(&needle) || customer.phone.contains(term)
            })
            .collect()
    }

    pub async fn update(
        &mut self,
        api: &dyn BookingApi,
        id: &str,
        update: &CustomerUpdate,
        notices: &mut Notices,
    ) -> bool {
        match api.update_customer(id, update).await {
            Ok(updated) => {
                if let Some(slot) = self.customers.iter_mut().find(|customer| customer.id == id) {
                    *slot = updated;
                }
                notices.push(Notice::success("Customer updated"));
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not update the customer"));
                false
            }
        }
    }

    /// Hides the customer after confirmation; their appointments remain.
    pub async fn soft_delete(
        &mut self,
        api: &dyn BookingApi,
        id: &str,
        confirmed: bool,
        notices: &mut Notices,
    ) -> bool {
        if !confirmed {
            return false;
        }
        match api.delete_customer(id).await {
            Ok(()) => {
                self.customers.retain(|customer| customer.id != id);
                true
            }
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not remove the customer"));
                false
            }
        }
    }
}
