use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::Property;
use crate::backend::SelectQuery;
use crate::errors::AppError;
use crate::queries::{optional, Listing, MutationOutcome};

const IMAGE_BUCKET: &str = "property-images";

/// Closed filter set for property lists; `"all"`/absent fields are skipped,
/// `q` is a case-insensitive substring match over code, title and zone.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct PropertyFilter {
    pub status: Option<String>,
    pub operation: Option<String>,
    pub property_type: Option<String>,
    pub market: Option<String>,
    pub zone: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<i32>,
    pub q: Option<String>,
}

impl PropertyFilter {
    pub fn apply(&self, query: SelectQuery) -> SelectQuery {
        let mut query = query
            .eq_opt("status", self.status.as_deref())
            .eq_opt("operation", self.operation.as_deref())
            .eq_opt("property_type", self.property_type.as_deref())
            .eq_opt("market", self.market.as_deref())
            .eq_opt("zone", self.zone.as_deref());
        if let Some(min_price) = self.min_price {
            query = query.gte("price", min_price);
        }
        if let Some(max_price) = self.max_price {
            query = query.lte("price", max_price);
        }
        if let Some(bedrooms) = self.bedrooms {
            query = query.eq("bedrooms", &bedrooms.to_string());
        }
        if let Some(q) = self.q.as_deref() {
            if !q.trim().is_empty() {
                query = query.ilike_any(&["code", "title", "zone"], q);
            }
        }
        query
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct NewProperty {
    pub code: String,
    pub title: String,
    pub property_type: Option<String>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub area_m2: Option<f64>,
    pub price: Option<f64>,
    pub currency: Option<String>,
    pub status: Option<String>,
    pub operation: Option<String>,
    pub market: Option<String>,
    pub zone: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct PropertyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_m2: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Serialize)]
struct PropertyInsert<'a> {
    tenant_id: Uuid,
    #[serde(flatten)]
    payload: &'a NewProperty,
    images: Vec<String>,
}

pub fn base_query(tenant_id: Uuid) -> SelectQuery {
    SelectQuery::new("properties")
        .eq_uuid("tenant_id", tenant_id)
        .order_desc("created_at")
}

pub async fn list(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    filter: &PropertyFilter,
) -> Listing<Property> {
    let query = filter.apply(base_query(tenant_id));
    Listing::from_result("properties", backend.data.select(token, &query).await)
}

pub async fn get(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
) -> Option<Property> {
    let query = base_query(tenant_id).eq_uuid("id", id);
    optional("property", backend.data.select_one(token, &query).await)
}

pub async fn create(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    payload: &NewProperty,
) -> MutationOutcome {
    let insert = PropertyInsert {
        tenant_id,
        payload,
        images: Vec::new(),
    };
    match backend
        .data
        .insert::<_, Property>(token, "properties", &insert)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("property create", err),
    }
}

pub async fn update(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
    patch: &PropertyPatch,
) -> MutationOutcome {
    match backend
        .data
        .update::<_, Property>(token, "properties", id, tenant_id, patch)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("property update", err),
    }
}

pub async fn remove(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
) -> MutationOutcome {
    match backend.data.delete(token, "properties", id, tenant_id).await {
        Ok(()) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("property delete", err),
    }
}

/// Upload one image and append its public URL to the property's ordered
/// `images` list. Object keys are `properties/{id}/{uuid}.{ext}`.
pub async fn upload_image(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    property_id: Uuid,
    filename: &str,
    content_type: &str,
    bytes: Vec<u8>,
) -> MutationOutcome {
    let property = match get(backend, token, tenant_id, property_id).await {
        Some(property) => property,
        None => {
            return MutationOutcome::failed(
                "property image",
                AppError::NotFound(format!("Property {} not found", property_id)),
            )
        }
    };

    let ext = image_extension(filename);
    let object_path = format!("properties/{}/{}.{}", property_id, Uuid::new_v4(), ext);

    let public_url = match backend
        .storage
        .upload(token, IMAGE_BUCKET, &object_path, content_type, bytes)
        .await
    {
        Ok(url) => url,
        Err(err) => return MutationOutcome::failed("property image", err),
    };

    let mut images = property.images;
    images.push(public_url);

    #[derive(Serialize)]
    struct ImagesPatch {
        images: Vec<String>,
    }

    match backend
        .data
        .update::<_, Property>(token, "properties", property_id, tenant_id, &ImagesPatch { images })
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("property image", err),
    }
}

/// Lowercased alphanumeric extension, `bin` when the name has none.
fn image_extension(filename: &str) -> String {
    filename
        .rsplit('.')
        .next()
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= 8
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
                && filename.contains('.')
        })
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_scope_and_order_only() {
        let tenant = Uuid::nil();
        assert_eq!(
            PropertyFilter::default().apply(base_query(tenant)).to_query(),
            base_query(tenant).to_query()
        );
    }

    #[test]
    fn price_range_and_bedrooms_render_range_operators() {
        let filter = PropertyFilter {
            min_price: Some(120_000.0),
            max_price: Some(300_000.0),
            bedrooms: Some(3),
            ..PropertyFilter::default()
        };
        let pairs = filter.apply(base_query(Uuid::nil())).to_query();
        assert!(pairs.contains(&("price".to_string(), "gte.120000".to_string())));
        assert!(pairs.contains(&("price".to_string(), "lte.300000".to_string())));
        assert!(pairs.contains(&("bedrooms".to_string(), "eq.3".to_string())));
    }

    #[test]
    fn free_text_search_spans_code_title_zone() {
        let filter = PropertyFilter {
            q: Some("marina".to_string()),
            ..PropertyFilter::default()
        };
        let pairs = filter.apply(base_query(Uuid::nil())).to_query();
        assert!(pairs.contains(&(
            "or".to_string(),
            "(code.ilike.*marina*,title.ilike.*marina*,zone.ilike.*marina*)".to_string()
        )));
    }

    #[test]
    fn blank_search_text_is_ignored() {
        let filter = PropertyFilter {
            q: Some("   ".to_string()),
            ..PropertyFilter::default()
        };
        assert_eq!(
            filter.apply(base_query(Uuid::nil())).to_query(),
            base_query(Uuid::nil()).to_query()
        );
    }

    #[test]
    fn image_extension_is_sanitized() {
        assert_eq!(image_extension("photo.JPG"), "jpg");
        assert_eq!(image_extension("archive.tar.gz"), "gz");
        assert_eq!(image_extension("no-extension"), "bin");
        assert_eq!(image_extension("weird.j*pg"), "bin");
    }
}
