use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::backend::SelectQuery;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: bool,
}

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health; `degraded` when the backend is unconfigured or unreachable", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let Ok(backend) = state.backend() else {
        return HttpResponse::Ok().json(HealthResponse {
            status: "degraded",
            backend: false,
        });
    };

    let probe = SelectQuery::new("healthcheck").limit(1);
    let reachable = backend
        .data
        .select::<serde_json::Value>(&backend.anon_key, &probe)
        .await
        .is_ok();

    HttpResponse::Ok().json(HealthResponse {
        status: if reachable { "ok" } else { "degraded" },
        backend: reachable,
    })
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health);
}
