use actix_web::{get, post, web, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::backend::models::Activity;
use crate::errors::AppError;
use crate::queries::activities::{self, ActivityFilter, NewActivity};
use crate::queries::MutationOutcome;

// Registered under the /leads scope, see api::leads::init_routes.

#[utoipa::path(
    get,
    path = "/api/leads/{lead_id}/activities",
    tag = "Activities",
    params(
        ("lead_id" = Uuid, Path, description = "Lead ID"),
        ActivityFilter
    ),
    responses(
        (status = 200, description = "Timeline for the lead, newest first; empty on read failure", body = [Activity])
    )
)]
#[get("/{lead_id}/activities")]
pub async fn list_activities(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    filter: web::Query<ActivityFilter>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let rows = activities::list_for_lead(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        path.into_inner(),
        &filter,
    )
    .await
    .into_rows();
    Ok(HttpResponse::Ok().json(rows))
}

#[utoipa::path(
    post,
    path = "/api/leads/{lead_id}/activities",
    tag = "Activities",
    params(("lead_id" = Uuid, Path, description = "Lead ID")),
    request_body = NewActivity,
    responses(
        (status = 201, description = "Timeline entry recorded", body = MutationOutcome),
        (status = 200, description = "Backend rejected the mutation", body = MutationOutcome)
    )
)]
#[post("/{lead_id}/activities")]
pub async fn create_activity(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<NewActivity>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = activities::record(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
        Some(authed.user.id),
        &body,
    )
    .await;

    if outcome.success {
        Ok(HttpResponse::Created().json(outcome))
    } else {
        Ok(HttpResponse::Ok().json(outcome))
    }
}
