use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::session::resolve_session;
use crate::api::validation::{ensure_max_len, is_valid_email, sanitize_phone};
use crate::app_state::AppState;
use crate::backend::models::Lead;
use crate::errors::AppError;
use crate::queries::leads::{self, LeadFilter, LeadPatch, NewLead};
use crate::queries::MutationOutcome;

// --- DTOs (Data Transfer Objects) ---

#[derive(Deserialize, ToSchema)]
pub struct SetStatusDto {
    pub status: String,
}

fn validate_contact(email: Option<&str>, full_name: &str) -> Result<(), AppError> {
    if !ensure_max_len(full_name, 200) || full_name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Lead name must be 1-200 characters".to_string(),
        ));
    }
    if let Some(email) = email {
        if !email.is_empty() && !is_valid_email(email) {
            return Err(AppError::InvalidInput("Invalid email address".to_string()));
        }
    }
    Ok(())
}

// --- Route Handlers ---

#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(LeadFilter),
    responses(
        (status = 200, description = "Leads of the current tenant, newest first; empty on read failure", body = [Lead])
    )
)]
#[get("")]
pub async fn list_leads(
    state: web::Data<AppState>,
    req: HttpRequest,
    filter: web::Query<LeadFilter>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let rows = leads::list(
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
    get,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Lead with expanded assignee and property of interest", body = Lead),
        (status = 404, description = "Lead not found")
    )
)]
#[get("/{id}")]
pub async fn get_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let id = path.into_inner();
    let lead = leads::get(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        id,
    )
    .await
    .ok_or_else(|| AppError::NotFound(format!("Lead with id {} not found", id)))?;
    Ok(HttpResponse::Ok().json(lead))
}

#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = NewLead,
    responses(
        (status = 201, description = "Lead created, auto-assigned when no assignee was given", body = MutationOutcome),
        (status = 200, description = "Backend rejected the mutation", body = MutationOutcome)
    )
)]
#[post("")]
pub async fn create_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewLead>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let mut payload = body.into_inner();
    validate_contact(payload.email.as_deref(), &payload.full_name)?;
    if let Some(phone) = payload.phone.as_deref() {
        payload.phone = Some(
            sanitize_phone(phone)
                .ok_or_else(|| AppError::InvalidInput("Invalid phone number".to_string()))?,
        );
    }

    let outcome = leads::create(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        Some(authed.user.id),
        &payload,
    )
    .await;

    if outcome.success {
        Ok(HttpResponse::Created().json(outcome))
    } else {
        Ok(HttpResponse::Ok().json(outcome))
    }
}

#[utoipa::path(
    patch,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = LeadPatch,
    responses(
        (status = 200, description = "Outcome of the update", body = MutationOutcome)
    )
)]
#[patch("/{id}")]
pub async fn update_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<LeadPatch>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = leads::update(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
        &body,
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    patch,
    path = "/api/leads/{id}/status",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    request_body = SetStatusDto,
    responses(
        (status = 200, description = "Outcome of the pipeline move; the transition is recorded on the timeline", body = MutationOutcome)
    )
)]
#[patch("/{id}/status")]
pub async fn set_lead_status(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<SetStatusDto>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = leads::set_status(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
        &body.status,
        Some(authed.user.id),
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = Uuid, Path, description = "Lead ID")),
    responses(
        (status = 200, description = "Outcome of the delete", body = MutationOutcome)
    )
)]
#[delete("/{id}")]
pub async fn delete_lead(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = leads::remove(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leads")
            .service(list_leads)
            .service(create_lead)
            .service(crate::api::activities::list_activities)
            .service(crate::api::activities::create_activity)
            .service(set_lead_status)
            .service(get_lead)
            .service(update_lead)
            .service(delete_lead),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_validation_rejects_bad_email_and_blank_name() {
        assert!(validate_contact(Some("ana@inmo.es"), "Ana Torres").is_ok());
        assert!(validate_contact(Some("nope"), "Ana Torres").is_err());
        assert!(validate_contact(None, "   ").is_err());
    }
}
