use actix_web::{get, patch, web, HttpRequest, HttpResponse};

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::backend::models::User;
use crate::errors::AppError;
use crate::queries::profile::{self, ProfilePatch};
use crate::queries::MutationOutcome;

#[utoipa::path(
    get,
    path = "/api/profile",
    tag = "Profile",
    responses(
        (status = 200, description = "Profile of the signed-in user", body = User),
        (status = 401, description = "No authenticated session")
    )
)]
#[get("")]
pub async fn get_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    Ok(HttpResponse::Ok().json(&authed.user))
}

#[utoipa::path(
    patch,
    path = "/api/profile",
    tag = "Profile",
    request_body = ProfilePatch,
    responses(
        (status = 200, description = "Outcome of the profile update", body = MutationOutcome)
    )
)]
#[patch("")]
pub async fn update_profile(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ProfilePatch>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = profile::update(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        authed.user.id,
        &body,
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/profile")
            .service(get_profile)
            .service(update_profile),
    );
}
