//! Request-id correlation and the auth/session gate.
//!
//! The gate decides demo / authenticated / unauthenticated per request and
//! only ever mutates cookies: it strips `?demo=true` into a redirect with the
//! demo flag set, lets everything through while the backend is unconfigured
//! (explicitly Degraded, decided at startup), and otherwise routes on cookie
//! session state, refreshing an expired access token when it can.

use actix_web::body::EitherBody;
use actix_web::{
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpMessage, HttpResponse,
};
use chrono::Utc;
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use url::form_urlencoded;
use uuid::Uuid;

use crate::api::session::{
    access_cookie, demo_cookie, refresh_cookie, token_is_expired, RefreshedTokens, ACCESS_COOKIE,
    DEMO_COOKIE, REFRESH_COOKIE,
};
use crate::app_state::AppState;

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const HOME_PATH: &str = "/";
pub const DASHBOARD_PATH: &str = "/dashboard";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach a request id for log correlation, reusing the caller's when given.
pub struct RequestId;

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        req.extensions_mut().insert(id.clone());
        log::debug!("request_id={} path={}", id, req.path());

        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let mut resp = service.call(req).await?;
            if let Ok(value) = header::HeaderValue::from_str(&id) {
                resp.headers_mut()
                    .insert(header::HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            Ok(resp)
        })
    }
}

/// Where the gate sends a request, given path and session presence.
#[derive(Debug, PartialEq, Eq)]
enum GateDecision {
    Pass,
    RedirectLogin,
    RedirectDashboard,
}

fn is_auth_page(path: &str) -> bool {
    path == LOGIN_PATH || path == SIGNUP_PATH
}

/// Static assets, the auth API itself, presentation preferences (the login
/// page resolves theme and language too), health and the API docs never
/// redirect.
fn is_exempt_path(path: &str) -> bool {
    path.starts_with("/api/auth/")
        || path.starts_with("/api/preferences/")
        || path == "/api/logout"
        || path == "/api/health"
        || path.starts_with("/swagger-ui")
        || path.starts_with("/api-docs")
        || path
            .rsplit('/')
            .next()
            .is_some_and(|segment| segment.contains('.'))
}

fn decide(path: &str, has_session: bool) -> GateDecision {
    if has_session {
        if is_auth_page(path) {
            GateDecision::RedirectDashboard
        } else {
            GateDecision::Pass
        }
    } else if is_auth_page(path) || path == HOME_PATH {
        GateDecision::Pass
    } else {
        GateDecision::RedirectLogin
    }
}

/// When the query carries `demo=true`, return the same URL without it.
fn strip_demo_param(path: &str, query: &str) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let pairs: Vec<(String, String)> = form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect();
    if !pairs
        .iter()
        .any(|(key, value)| key == "demo" && value == "true")
    {
        return None;
    }
    let remaining: Vec<&(String, String)> =
        pairs.iter().filter(|(key, _)| key != "demo").collect();
    if remaining.is_empty() {
        Some(path.to_string())
    } else {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in remaining {
            serializer.append_pair(key, value);
        }
        Some(format!("{}?{}", path, serializer.finish()))
    }
}

pub struct AuthGate;

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    fn redirect(req: ServiceRequest, location: &str) -> ServiceResponse<EitherBody<B>> {
        let response = HttpResponse::Found()
            .insert_header((header::LOCATION, location))
            .finish();
        req.into_response(response).map_into_right_body()
    }
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let path = req.path().to_string();

            if is_exempt_path(&path) {
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            if let Some(clean_url) = strip_demo_param(&path, req.query_string()) {
                let response = HttpResponse::Found()
                    .insert_header((header::LOCATION, clean_url))
                    .cookie(demo_cookie())
                    .finish();
                return Ok(req.into_response(response).map_into_right_body());
            }

            if req.cookie(DEMO_COOKIE).is_some() {
                if is_auth_page(&path) {
                    return Ok(Self::redirect(req, DASHBOARD_PATH));
                }
                return service.call(req).await.map(|res| res.map_into_left_body());
            }

            let backend = req
                .app_data::<web::Data<AppState>>()
                .and_then(|state| state.backend().ok().cloned());
            let Some(backend) = backend else {
                // Degraded: credentials are absent, every route passes.
                return service.call(req).await.map(|res| res.map_into_left_body());
            };

            let access = req.cookie(ACCESS_COOKIE).map(|c| c.value().to_string());
            let refresh = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

            let mut refreshed: Option<RefreshedTokens> = None;
            let has_session = match access {
                Some(token) if !token_is_expired(&token, Utc::now()) => true,
                _ => match refresh {
                    Some(refresh_token) => match backend.auth.refresh(&refresh_token).await {
                        Ok(tokens) => {
                            let renewed = RefreshedTokens {
                                access_token: tokens.access_token,
                                refresh_token: tokens.refresh_token,
                                expires_in: tokens.expires_in,
                            };
                            req.extensions_mut().insert(renewed.clone());
                            refreshed = Some(renewed);
                            true
                        }
                        Err(err) => {
                            log::debug!("session refresh failed: {}", err);
                            false
                        }
                    },
                    None => false,
                },
            };

            match decide(&path, has_session) {
                GateDecision::RedirectLogin => return Ok(Self::redirect(req, LOGIN_PATH)),
                GateDecision::RedirectDashboard => {
                    return Ok(Self::redirect(req, DASHBOARD_PATH))
                }
                GateDecision::Pass => {}
            }

            let res = service.call(req).await?;
            let mut res = res.map_into_left_body();
            if let Some(tokens) = refreshed {
                for cookie in [
                    access_cookie(&tokens.access_token, tokens.expires_in),
                    refresh_cookie(&tokens.refresh_token),
                ] {
                    if let Err(err) = res.response_mut().add_cookie(&cookie) {
                        log::warn!("failed to propagate refreshed session cookie: {}", err);
                    }
                }
            }
            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_dashboard_goes_to_login() {
        assert_eq!(decide("/dashboard", false), GateDecision::RedirectLogin);
        assert_eq!(decide("/dashboard/leads", false), GateDecision::RedirectLogin);
    }

    #[test]
    fn auth_pages_and_home_stay_reachable_without_a_session() {
        assert_eq!(decide("/login", false), GateDecision::Pass);
        assert_eq!(decide("/signup", false), GateDecision::Pass);
        assert_eq!(decide("/", false), GateDecision::Pass);
    }

    #[test]
    fn a_session_bounces_off_auth_pages() {
        assert_eq!(decide("/login", true), GateDecision::RedirectDashboard);
        assert_eq!(decide("/dashboard", true), GateDecision::Pass);
    }

    #[test]
    fn demo_param_is_stripped_preserving_the_rest_of_the_query() {
        assert_eq!(
            strip_demo_param("/dashboard", "demo=true"),
            Some("/dashboard".to_string())
        );
        assert_eq!(
            strip_demo_param("/dashboard", "tab=pipeline&demo=true"),
            Some("/dashboard?tab=pipeline".to_string())
        );
        assert_eq!(strip_demo_param("/dashboard", "demo=false"), None);
        assert_eq!(strip_demo_param("/dashboard", ""), None);
    }

    #[test]
    fn exempt_paths_cover_auth_api_docs_and_assets() {
        assert!(is_exempt_path("/api/auth/status"));
        assert!(is_exempt_path("/api/preferences/theme"));
        assert!(is_exempt_path("/api/logout"));
        assert!(is_exempt_path("/api/health"));
        assert!(is_exempt_path("/swagger-ui/index.html"));
        assert!(is_exempt_path("/assets/logo.svg"));
        assert!(!is_exempt_path("/dashboard"));
        assert!(!is_exempt_path("/api/leads"));
    }
}
