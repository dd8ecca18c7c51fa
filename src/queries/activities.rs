use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::{Activity, ActivityType};
use crate::backend::SelectQuery;
use crate::queries::{Listing, MutationOutcome};

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct ActivityFilter {
    /// `"all"` or absent lists every type.
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

#[derive(Serialize)]
struct ActivityInsert<'a> {
    tenant_id: Uuid,
    lead_id: Uuid,
    user_id: Option<Uuid>,
    #[serde(rename = "type")]
    activity_type: ActivityType,
    title: &'a str,
    description: Option<&'a str>,
    metadata: &'a serde_json::Value,
}

/// Timeline for one lead, newest first. Rows are immutable once written.
pub async fn list_for_lead(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    lead_id: Uuid,
    filter: &ActivityFilter,
) -> Listing<Activity> {
    let query = SelectQuery::new("activities")
        .eq_uuid("tenant_id", tenant_id)
        .eq_uuid("lead_id", lead_id)
        .eq_opt("type", filter.activity_type.as_deref())
        .order_desc("created_at");
    Listing::from_result("activities", backend.data.select(token, &query).await)
}

pub async fn record(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    lead_id: Uuid,
    user_id: Option<Uuid>,
    payload: &NewActivity,
) -> MutationOutcome {
    let insert = ActivityInsert {
        tenant_id,
        lead_id,
        user_id,
        activity_type: payload.activity_type,
        title: &payload.title,
        description: payload.description.as_deref(),
        metadata: &payload.metadata,
    };
    match backend
        .data
        .insert::<_, Activity>(token, "activities", &insert)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("activity create", err),
    }
}

/// Timeline entry written as a side effect of another mutation (assignment,
/// status change). Best effort: a failure is logged and never blocks the
/// primary operation.
pub async fn record_system(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    lead_id: Uuid,
    user_id: Option<Uuid>,
    activity_type: ActivityType,
    title: &str,
    metadata: serde_json::Value,
) {
    let payload = NewActivity {
        activity_type,
        title: title.to_string(),
        description: None,
        metadata,
    };
    let outcome = record(backend, token, tenant_id, lead_id, user_id, &payload).await;
    if !outcome.success {
        log::warn!(
            "system activity ({:?}) for lead {} was not recorded",
            activity_type,
            lead_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_query_is_lead_scoped_and_newest_first() {
        let tenant = Uuid::new_v4();
        let lead = Uuid::new_v4();
        let query = SelectQuery::new("activities")
            .eq_uuid("tenant_id", tenant)
            .eq_uuid("lead_id", lead)
            .order_desc("created_at");
        let pairs = query.to_query();
        assert!(pairs.contains(&("lead_id".to_string(), format!("eq.{}", lead))));
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
    }

    #[test]
    fn new_activity_accepts_the_wire_type_field() {
        let payload: NewActivity = serde_json::from_str(
            r#"{"type":"call","title":"Llamada de seguimiento"}"#,
        )
        .unwrap();
        assert_eq!(payload.activity_type, ActivityType::Call);
        assert!(payload.metadata.is_null());
    }
}
