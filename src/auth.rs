use std::{future::Future, pin::Pin};

use actix_web::{
    body::BoxBody,
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::header::{self, Header},
    middleware::Next,
    web, Error, FromRequest, HttpRequest, HttpResponse,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use rand_core::OsRng;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{error::AppError, models::LoginResponse, state::AppState};

pub const SESSION_COOKIE: &str = "admin_token";

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = PasswordHash::new(password_hash);
    match parsed_hash {
        Ok(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Checks the admin password and issues a session token on success.
///
/// A wrong password is not an error: it answers `success: false` so the
/// login form can say so without treating it as a transport failure.
pub async fn login(state: &AppState, password: &str) -> Result<LoginResponse, AppError> {
    let stored = sqlx::query_scalar::<_, String>("SELECT password_hash FROM admin_credentials LIMIT 1")
        .fetch_optional(&state.db)
        .await?;

    let accepted = stored
        .as_deref()
        .is_some_and(|hash| verify_password(password, hash));
    if !accepted {
        log::warn!("Rejected admin login attempt");
        return Ok(LoginResponse {
            success: false,
            token: None,
        });
    }

    let token = new_id();
    sqlx::query("INSERT INTO admin_sessions (token, created_at) VALUES (?, ?)")
        .bind(&token)
        .bind(Utc::now().to_rfc3339())
        .execute(&state.db)
        .await?;
    log::info!("Admin session opened");

    Ok(LoginResponse {
        success: true,
        token: Some(token),
    })
}

pub async fn logout(pool: &SqlitePool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM admin_sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

/// True when `token` was issued by [`login`] and has not outlived the
/// configured session lifetime. Expired tokens are removed on sight.
pub async fn session_is_valid(state: &AppState, token: &str) -> Result<bool, AppError> {
    let created_at = sqlx::query_scalar::<_, String>("SELECT created_at FROM admin_sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(&state.db)
        .await?;

    let Some(created_at) = created_at else {
        return Ok(false);
    };

    let fresh = DateTime::parse_from_rfc3339(&created_at)
        .map(|issued| Utc::now() - issued.with_timezone(&Utc) < state.config.session_ttl)
        .unwrap_or(false);
    if !fresh {
        logout(&state.db, token).await?;
    }
    Ok(fresh)
}

/// Extractor for admin API handlers: succeeds only when the request carries
/// `Authorization: Bearer <token>` for a live session.
pub struct AdminToken(pub String);

impl FromRequest for AdminToken {
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<AppState>>().cloned();
        let token = Authorization::<Bearer>::parse(req)
            .ok()
            .map(|auth| auth.into_scheme().token().to_string());

        Box::pin(async move {
            let (Some(state), Some(token)) = (state, token) else {
                return Err(AppError::Unauthorized);
            };
            if session_is_valid(&state, &token).await? {
                Ok(AdminToken(token))
            } else {
                Err(AppError::Unauthorized)
            }
        })
    }
}

pub fn session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(req: &HttpRequest, token: &str) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

pub fn clear_session_cookie(req: &HttpRequest) -> Cookie<'static> {
    let mut builder = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(0));
    if req.connection_info().scheme() == "https" {
        builder = builder.secure(true);
    }
    builder.finish()
}

/// Sends visitors without a live session cookie to the login page.
pub async fn session_guard<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<BoxBody>, Error>
where
    B: actix_web::body::MessageBody + 'static,
{
    let valid = match (
        req.app_data::<web::Data<AppState>>().cloned(),
        session_token(req.request()),
    ) {
        (Some(state), Some(token)) => session_is_valid(&state, &token).await?,
        _ => false,
    };

    if !valid {
        let response = HttpResponse::SeeOther()
            .append_header((header::LOCATION, "/admin/login"))
            .cookie(clear_session_cookie(req.request()))
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .finish();
        return Ok(req.into_response(response));
    }

    let res = next.call(req).await?;
    Ok(res.map_into_boxed_body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, db};
    use std::sync::Arc;

    async fn seeded_state(ttl_hours: i64) -> AppState {
        let pool = db::testing::memory_pool().await;
        db::seed_defaults(&pool, "hunter2").await.expect("seed");
        let mut config = AppConfig::from_lookup(|_| None).expect("config");
        config.session_ttl = chrono::Duration::hours(ttl_hours);
        AppState::new(pool, config, Arc::new(mockable::DefaultClock))
    }

    #[test]
    fn password_hashes_verify() {
        let hash = hash_password("hunter2").expect("hash");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-hash"));
    }

    #[tokio::test]
    async fn login_issues_a_token_only_for_the_right_password() {
        let state = seeded_state(12).await;

        let rejected = login(&state, "wrong").await.expect("login");
        assert_eq!(rejected, LoginResponse { success: false, token: None });

        let accepted = login(&state, "hunter2").await.expect("login");
        assert!(accepted.success);
        let token = accepted.token.expect("token");
        assert!(session_is_valid(&state, &token).await.expect("check"));

        logout(&state.db, &token).await.expect("logout");
        assert!(!session_is_valid(&state, &token).await.expect("check"));
    }

    #[tokio::test]
    async fn expired_sessions_are_rejected_and_removed() {
        let state = seeded_state(0).await;
        let token = login(&state, "hunter2").await.expect("login").token.expect("token");

        assert!(!session_is_valid(&state, &token).await.expect("check"));
        let remaining = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_sessions")
            .fetch_one(&state.db)
            .await
            .expect("count");
        assert_eq!(remaining, 0);
    }
}
