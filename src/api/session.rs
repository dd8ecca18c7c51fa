//! Per-request session resolution. Replaces hidden process-wide state with
//! an explicit context value handlers receive: demo, or an authenticated
//! user plus their tenant.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{get, web, HttpMessage, HttpRequest, HttpResponse};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::backend::models::{Tenant, User, UserRole};
use crate::errors::AppError;
use crate::queries::profile;
use crate::services::auth::AuthUser;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";
pub const DEMO_COOKIE: &str = "demo_mode";

const DEMO_TTL_HOURS: i64 = 24;
const REFRESH_TTL_DAYS: i64 = 30;

/// Set by the gate when it refreshed the session mid-request, so downstream
/// resolution uses the new access token instead of the stale cookie.
#[derive(Clone)]
pub struct RefreshedTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

pub struct AuthedSession {
    pub access_token: String,
    pub auth_user: AuthUser,
    pub user: User,
    pub tenant: Tenant,
}

impl AuthedSession {
    pub fn is_admin(&self) -> bool {
        self.user.role == UserRole::Admin
    }

    pub fn can_manage_team(&self) -> bool {
        matches!(
            self.user.role,
            UserRole::Admin | UserRole::Manager | UserRole::TeamLead
        )
    }
}

pub enum SessionContext {
    Demo,
    Authenticated(Box<AuthedSession>),
}

impl SessionContext {
    pub fn is_demo(&self) -> bool {
        matches!(self, SessionContext::Demo)
    }

    /// Bearer for data-API calls: the anon key in demo mode, the session
    /// token otherwise.
    pub fn token<'a>(&'a self, anon_key: &'a str) -> &'a str {
        match self {
            SessionContext::Demo => anon_key,
            SessionContext::Authenticated(session) => &session.access_token,
        }
    }

    /// Demo sessions have no tenant; the nil scope matches no rows, which
    /// the degrade-to-empty read contract renders harmlessly.
    pub fn tenant_id(&self) -> Uuid {
        match self {
            SessionContext::Demo => Uuid::nil(),
            SessionContext::Authenticated(session) => session.user.tenant_id,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            SessionContext::Demo => None,
            SessionContext::Authenticated(session) => Some(session.user.id),
        }
    }

    pub fn authenticated(&self) -> Result<&AuthedSession, AppError> {
        match self {
            SessionContext::Demo => Err(AppError::Forbidden(
                "Demo mode is read-only".to_string(),
            )),
            SessionContext::Authenticated(session) => Ok(session),
        }
    }
}

/// What `GET /api/session` reports.
#[derive(Serialize, ToSchema)]
pub struct SessionView {
    #[serde(rename = "isDemoMode")]
    pub is_demo_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

impl From<&SessionContext> for SessionView {
    fn from(session: &SessionContext) -> Self {
        match session {
            SessionContext::Demo => SessionView {
                is_demo_mode: true,
                user: None,
                tenant: None,
            },
            SessionContext::Authenticated(authed) => SessionView {
                is_demo_mode: false,
                user: Some(authed.user.clone()),
                tenant: Some(authed.tenant.clone()),
            },
        }
    }
}

pub async fn resolve_session(
    req: &HttpRequest,
    state: &AppState,
) -> Result<SessionContext, AppError> {
    if req.cookie(DEMO_COOKIE).is_some() {
        return Ok(SessionContext::Demo);
    }

    let backend = state.backend()?;

    let access_token = req
        .extensions()
        .get::<RefreshedTokens>()
        .map(|tokens| tokens.access_token.clone())
        .or_else(|| req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| AppError::Unauthorized("Missing session cookie".to_string()))?;

    let auth_user = backend.auth.get_user(&access_token).await?;

    let user = profile::get_by_auth_id(backend, &access_token, auth_user.id)
        .await
        .ok_or_else(|| AppError::Unauthorized("No profile for this session".to_string()))?;

    let tenant = profile::get_tenant(backend, &access_token, user.tenant_id)
        .await
        .ok_or_else(|| AppError::Unauthorized("Tenant not found for this session".to_string()))?;

    Ok(SessionContext::Authenticated(Box::new(AuthedSession {
        access_token,
        auth_user,
        user,
        tenant,
    })))
}

#[utoipa::path(
    get,
    path = "/api/session",
    tag = "Session",
    responses(
        (status = 200, description = "Current session context", body = SessionView),
        (status = 401, description = "No valid session"),
        (status = 503, description = "Backend not configured")
    )
)]
#[get("")]
pub async fn get_session(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    Ok(HttpResponse::Ok().json(SessionView::from(&session)))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/session").service(get_session));
}

/// Expiry claim of a JWT, without verifying the signature. The gate only
/// needs it to decide whether a refresh is due; the backend re-checks the
/// token on every call anyway.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?.as_i64()?;
    DateTime::from_timestamp(exp, 0)
}

/// Unparsable tokens count as expired so the gate falls back to a refresh.
pub fn token_is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(expiry) => expiry <= now,
        None => true,
    }
}

pub fn demo_cookie() -> Cookie<'static> {
    Cookie::build(DEMO_COOKIE, "1")
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::hours(DEMO_TTL_HOURS))
        .finish()
}

pub fn access_cookie(token: &str, expires_in: i64) -> Cookie<'static> {
    Cookie::build(ACCESS_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(expires_in))
        .finish()
}

pub fn refresh_cookie(token: &str) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(REFRESH_TTL_DAYS))
        .finish()
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name, "")
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{},"sub":"x"}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn expiry_is_read_from_the_payload() {
        let exp = 1_900_000_000;
        let token = jwt_with_exp(exp);
        assert_eq!(
            token_expiry(&token),
            DateTime::from_timestamp(exp, 0)
        );
    }

    #[test]
    fn expired_and_garbage_tokens_are_both_expired() {
        let now = Utc::now();
        let stale = jwt_with_exp(now.timestamp() - 10);
        let fresh = jwt_with_exp(now.timestamp() + 3600);
        assert!(token_is_expired(&stale, now));
        assert!(!token_is_expired(&fresh, now));
        assert!(token_is_expired("not-a-jwt", now));
    }

    #[test]
    fn demo_cookie_lives_a_day_and_session_cookies_are_http_only() {
        let demo = demo_cookie();
        assert_eq!(demo.max_age(), Some(CookieDuration::hours(24)));
        assert_ne!(demo.http_only(), Some(true));

        let access = access_cookie("tok", 3600);
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.max_age(), Some(CookieDuration::seconds(3600)));
    }
}
