use actix_web::{get, web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::errors::AppError;
use crate::queries::notifications::{self, Notification};

#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses(
        (status = 200, description = "Cards derived from the last 24h of audit entries, newest first; empty on read failure", body = [Notification])
    )
)]
#[get("")]
pub async fn list_notifications(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let cards = notifications::list(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        Utc::now(),
    )
    .await
    .into_rows();
    Ok(HttpResponse::Ok().json(cards))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/notifications").service(list_notifications));
}
