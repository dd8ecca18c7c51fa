use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::middleware::LOGIN_PATH;
use crate::api::session::{
    access_cookie, refresh_cookie, removal_cookie, ACCESS_COOKIE, DEMO_COOKIE, REFRESH_COOKIE,
};
use crate::api::validation::is_valid_email;
use crate::app_state::AppState;
use crate::errors::AppError;
use crate::services::auth::AuthUser;

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema)]
pub struct LoginDto {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthStatusResponse {
    #[serde(rename = "isDemoMode")]
    pub is_demo_mode: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: AuthUser,
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/auth/status",
    tag = "Auth",
    responses(
        (status = 200, description = "Whether the current session is in demo mode", body = AuthStatusResponse)
    )
)]
#[get("/status")]
pub async fn auth_status(req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().json(AuthStatusResponse {
        is_demo_mode: req.cookie(DEMO_COOKIE).is_some(),
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Signed in, session cookies set", body = LoginResponse),
        (status = 401, description = "Rejected by the auth backend, message passed through"),
        (status = 503, description = "Backend not configured")
    )
)]
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginDto>,
) -> Result<HttpResponse, AppError> {
    let email = body.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::InvalidInput("Invalid email address".to_string()));
    }

    let backend = state.backend()?;
    let tokens = backend.auth.sign_in(email, &body.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(access_cookie(&tokens.access_token, tokens.expires_in))
        .cookie(refresh_cookie(&tokens.refresh_token))
        .json(LoginResponse { user: tokens.user }))
}

#[utoipa::path(
    get,
    path = "/api/logout",
    tag = "Auth",
    responses(
        (status = 302, description = "Session and demo flags cleared, redirected to the login page")
    )
)]
#[get("/logout")]
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    // Best-effort server-side revocation; cookies are cleared regardless.
    if let (Ok(backend), Some(cookie)) = (state.backend(), req.cookie(ACCESS_COOKIE)) {
        if let Err(err) = backend.auth.sign_out(cookie.value()).await {
            log::warn!("sign-out against the auth backend failed: {}", err);
        }
    }

    HttpResponse::Found()
        .insert_header((actix_web::http::header::LOCATION, LOGIN_PATH))
        .cookie(removal_cookie(ACCESS_COOKIE))
        .cookie(removal_cookie(REFRESH_COOKIE))
        .cookie(removal_cookie(DEMO_COOKIE))
        .finish()
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(auth_status)
            .service(login),
    )
    .service(logout);
}
