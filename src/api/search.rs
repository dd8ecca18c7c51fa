use actix_web::{get, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::errors::AppError;
use crate::queries::search::{self, SearchHit};

#[derive(Deserialize, IntoParams)]
pub struct SearchParams {
    /// Free text; queries under 2 characters return empty without touching
    /// the backend.
    #[serde(default)]
    pub q: String,
}

#[utoipa::path(
    get,
    path = "/api/search",
    tag = "Search",
    params(SearchParams),
    responses(
        (status = 200, description = "Merged hits in lead, property, task order", body = [SearchHit])
    )
)]
#[get("")]
pub async fn global_search(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let hits: Vec<SearchHit> = search::global_search(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        &params.q,
    )
    .await;
    Ok(HttpResponse::Ok().json(hits))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/search").service(global_search));
}
