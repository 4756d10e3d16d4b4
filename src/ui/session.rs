use std::sync::Mutex;

use super::{
    api::{ApiError, BookingApi},
    notice::{Notice, Notices},
};

/// Where the admin token lives between visits.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok().and_then(|token| token.clone())
    }

    fn save(&self, token: &str) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = Some(token.to_string());
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.lock() {
            *slot = None;
        }
    }
}

/// Password in, token out. The dashboard is only entered while a token is
/// stored.
pub struct AdminSession<S: TokenStore> {
    store: S,
}

impl<S: TokenStore> AdminSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn token(&self) -> Option<String> {
        self.store.load()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.load().is_some()
    }

    pub async fn login(&self, api: &dyn BookingApi, password: &str, notices: &mut Notices) -> bool {
        match api.login(password).await {
            Ok(response) => match response.token.filter(|_| response.success) {
                Some(token) => {
                    self.store.save(&token);
                    true
                }
                None => {
                    notices.push(Notice::error("Invalid password"));
                    false
                }
            },
            Err(err) => {
                notices.push(Notice::from_api(&err, "Could not reach the server"));
                false
            }
        }
    }

    /// Revokes the token on the server, then forgets it. The local token is
    /// dropped even when the server cannot be reached.
    pub async fn logout(&self, api: &dyn BookingApi) {
        if let Some(token) = self.store.load() {
            if let Err(err) = api.logout(&token).await {
                log::warn!("Could not revoke the admin session: {err}");
            }
        }
        self.store.clear();
    }

    /// Drops the stored token once the server stops accepting it.
    pub fn observe(&self, err: &ApiError) {
        if matches!(err, ApiError::Unauthorized) {
            self.store.clear();
        }
    }
}
