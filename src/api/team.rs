use actix_web::{get, patch, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::backend::models::User;
use crate::errors::AppError;
use crate::queries::team::{self, TeamFilter, TeamMemberPatch};
use crate::queries::MutationOutcome;

#[utoipa::path(
    get,
    path = "/api/team",
    tag = "Team",
    params(TeamFilter),
    responses(
        (status = 200, description = "Team members of the current tenant, by name; empty on read failure", body = [User])
    )
)]
#[get("")]
pub async fn list_team(
    state: web::Data<AppState>,
    req: HttpRequest,
    filter: web::Query<TeamFilter>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let rows = team::list(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        &filter,
    )
    .await
    .into_rows();
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    patch,
    path = "/api/team/{id}",
    tag = "Team",
    params(("id" = Uuid, Path, description = "Team member ID")),
    request_body = TeamMemberPatch,
    responses(
        (status = 200, description = "Outcome of the member update", body = MutationOutcome),
        (status = 403, description = "Caller cannot manage the team")
    )
)]
#[patch("/{id}")]
pub async fn update_team_member(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<TeamMemberPatch>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    if !authed.can_manage_team() {
        return Err(AppError::Forbidden(
            "Team management requires an admin, manager or team lead role".to_string(),
        ));
    }
    let backend = state.backend()?;

    let outcome = team::update_member(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
        &body,
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/team")
            .service(list_team)
            .service(update_team_member),
    );
}
