use super::{
    api::BookingApi,
    notice::{Notice, Notices},
};
use crate::models::Service;

/// Bookable services as last fetched. A failed fetch keeps the previous
/// list, which starts out empty.
#[derive(Debug, Default, Clone)]
pub struct CatalogLoader {
    services: Vec<Service>,
}

impl CatalogLoader {
    pub async fn load(&mut self, api: &dyn BookingApi, notices: &mut Notices) -> &[Service] {
        match api.list_services().await {
            Ok(services) => self.services = services,
            Err(err) => {
                log::warn!("Could not load services: {err}");
                notices.push(Notice::from_api(&err, "Could not load services"));
            }
        }
        &self.services
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn find(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::fake::{service, FakeApi};

    #[tokio::test]
    async fn failed_reload_keeps_the_previous_list() {
        let api = FakeApi::default().with_services(vec![service("cut", 30, 25.0)]);
        let mut notices = Notices::default();
        let mut catalog = CatalogLoader::default();

        assert_eq!(catalog.load(&api, &mut notices).await.len(), 1);
        api.fail("list_services");
        assert_eq!(catalog.load(&api, &mut notices).await.len(), 1);
        assert!(catalog.find("cut").is_some());
        assert_eq!(notices.last(), Some(&Notice::error("Could not load services")));
    }

    #[tokio::test]
    async fn first_failure_leaves_the_catalog_empty() {
        let api = FakeApi::default();
        api.fail("list_services");
        let mut notices = Notices::default();
        let mut catalog = CatalogLoader::default();

        catalog.load(&api, &mut notices).await;
        assert!(catalog.is_empty());
        assert!(!notices.is_empty());
    }
}
