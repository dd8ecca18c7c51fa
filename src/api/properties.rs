use actix_web::{delete, get, patch, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::api::session::resolve_session;
use crate::app_state::AppState;
use crate::backend::models::Property;
use crate::errors::AppError;
use crate::queries::properties::{self, NewProperty, PropertyFilter, PropertyPatch};
use crate::queries::MutationOutcome;

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Deserialize, IntoParams)]
pub struct UploadParams {
    /// Original filename, used only for its extension.
    pub filename: String,
}

#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    params(PropertyFilter),
    responses(
        (status = 200, description = "Properties of the current tenant, newest first; empty on read failure", body = [Property])
    )
)]
#[get("")]
pub async fn list_properties(
    state: web::Data<AppState>,
    req: HttpRequest,
    filter: web::Query<PropertyFilter>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let rows = properties::list(
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
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Property found", body = Property),
        (status = 404, description = "Property not found")
    )
)]
#[get("/{id}")]
pub async fn get_property(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let backend = state.backend()?;
    let id = path.into_inner();
    let property = properties::get(
        backend,
        session.token(&backend.anon_key),
        session.tenant_id(),
        id,
    )
    .await
    .ok_or_else(|| AppError::NotFound(format!("Property with id {} not found", id)))?;
    Ok(HttpResponse::Ok().json(property))
}

#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    request_body = NewProperty,
    responses(
        (status = 201, description = "Property created", body = MutationOutcome),
        (status = 200, description = "Backend rejected the mutation", body = MutationOutcome)
    )
)]
#[post("")]
pub async fn create_property(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<NewProperty>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    if body.code.trim().is_empty() || body.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Property code and title are required".to_string(),
        ));
    }

    let outcome = properties::create(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        &body,
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
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "Property ID")),
    request_body = PropertyPatch,
    responses(
        (status = 200, description = "Outcome of the update", body = MutationOutcome)
    )
)]
#[patch("/{id}")]
pub async fn update_property(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<PropertyPatch>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = properties::update(
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
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    params(("id" = Uuid, Path, description = "Property ID")),
    responses(
        (status = 200, description = "Outcome of the delete", body = MutationOutcome)
    )
)]
#[delete("/{id}")]
pub async fn delete_property(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    let outcome = properties::remove(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    post,
    path = "/api/properties/{id}/images",
    tag = "Properties",
    params(
        ("id" = Uuid, Path, description = "Property ID"),
        UploadParams
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Outcome of the upload; on success the public URL was appended to the property's images", body = MutationOutcome)
    )
)]
#[post("/{id}/images")]
pub async fn upload_property_image(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    params: web::Query<UploadParams>,
    bytes: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let session = resolve_session(&req, &state).await?;
    let authed = session.authenticated()?;
    let backend = state.backend()?;

    if bytes.is_empty() {
        return Err(AppError::InvalidInput("Empty upload".to_string()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::InvalidInput(format!(
            "Image exceeds the {} byte limit",
            MAX_IMAGE_BYTES
        )));
    }

    let content_type = req
        .headers()
        .get(actix_web::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let outcome = properties::upload_image(
        backend,
        &authed.access_token,
        authed.user.tenant_id,
        path.into_inner(),
        &params.filename,
        &content_type,
        bytes.to_vec(),
    )
    .await;
    Ok(HttpResponse::Ok().json(outcome))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .service(list_properties)
            .service(create_property)
            .service(upload_property_image)
            .service(get_property)
            .service(update_property)
            .service(delete_property),
    );
}
