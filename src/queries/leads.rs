use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::{Lead, LeadIntent, PIPELINE_STAGES};
use crate::backend::SelectQuery;
use crate::errors::AppError;
use crate::queries::{activities, optional, team, Listing, MutationOutcome};

/// Embedded-resource select list shared by every lead read.
const LEAD_SELECT: &str = "*, assigned_user:users!assigned_user_id(id,full_name,avatar_url), \
                           interest_property:properties!interest_property_id(id,code,title)";

/// Closed filter set for lead lists. Any field set to `"all"` (or absent)
/// is not applied.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct LeadFilter {
    pub status: Option<String>,
    pub market: Option<String>,
    pub channel: Option<String>,
    pub intent: Option<String>,
    pub assigned_to: Option<Uuid>,
}

impl LeadFilter {
    pub fn apply(&self, query: SelectQuery) -> SelectQuery {
        let mut query = query
            .eq_opt("status", self.status.as_deref())
            .eq_opt("market", self.market.as_deref())
            .eq_opt("channel", self.channel.as_deref())
            .eq_opt("intent", self.intent.as_deref());
        if let Some(assigned_to) = self.assigned_to {
            query = query.eq_uuid("assigned_user_id", assigned_to);
        }
        query
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewLead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: Option<String>,
    pub source: Option<String>,
    pub market: Option<String>,
    pub segment: Option<String>,
    pub status: Option<String>,
    pub intent: Option<LeadIntent>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub timing: Option<String>,
    pub assigned_user_id: Option<Uuid>,
    pub interest_property_id: Option<Uuid>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct LeadPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<LeadIntent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_property_id: Option<Uuid>,
}

#[derive(Serialize)]
struct LeadInsert<'a> {
    tenant_id: Uuid,
    full_name: &'a str,
    email: Option<&'a str>,
    phone: Option<&'a str>,
    channel: Option<&'a str>,
    source: Option<&'a str>,
    market: Option<&'a str>,
    segment: Option<&'a str>,
    status: &'a str,
    intent: Option<LeadIntent>,
    budget_min: Option<f64>,
    budget_max: Option<f64>,
    timing: Option<&'a str>,
    assigned_user_id: Option<Uuid>,
    interest_property_id: Option<Uuid>,
}

pub fn base_query(tenant_id: Uuid) -> SelectQuery {
    SelectQuery::new("leads")
        .select(LEAD_SELECT)
        .eq_uuid("tenant_id", tenant_id)
        .order_desc("created_at")
}

pub async fn list(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    filter: &LeadFilter,
) -> Listing<Lead> {
    let query = filter.apply(base_query(tenant_id));
    Listing::from_result("leads", backend.data.select(token, &query).await)
}

pub async fn get(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
) -> Option<Lead> {
    let query = base_query(tenant_id).eq_uuid("id", id);
    optional("lead", backend.data.select_one(token, &query).await)
}

/// Create a lead. When no assignee is given, a random active agent of the
/// tenant picks it up and an `assignment` activity is recorded.
pub async fn create(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    actor_id: Option<Uuid>,
    payload: &NewLead,
) -> MutationOutcome {
    let mut auto_assigned = false;
    let assigned_user_id = match payload.assigned_user_id {
        Some(id) => Some(id),
        None => {
            let agent = team::pick_random_agent(backend, token, tenant_id).await;
            auto_assigned = agent.is_some();
            agent.map(|a| a.id)
        }
    };

    let status = payload
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(PIPELINE_STAGES[0]);

    let insert = LeadInsert {
        tenant_id,
        full_name: &payload.full_name,
        email: payload.email.as_deref(),
        phone: payload.phone.as_deref(),
        channel: payload.channel.as_deref(),
        source: payload.source.as_deref(),
        market: payload.market.as_deref(),
        segment: payload.segment.as_deref(),
        status,
        intent: payload.intent,
        budget_min: payload.budget_min,
        budget_max: payload.budget_max,
        timing: payload.timing.as_deref(),
        assigned_user_id,
        interest_property_id: payload.interest_property_id,
    };

    let created: Lead = match backend.data.insert(token, "leads", &insert).await {
        Ok(lead) => lead,
        Err(err) => return MutationOutcome::failed("lead create", err),
    };

    if auto_assigned {
        if let Some(assignee) = assigned_user_id {
            activities::record_system(
                backend,
                token,
                tenant_id,
                created.id,
                actor_id,
                crate::backend::models::ActivityType::Assignment,
                "Lead asignado",
                serde_json::json!({ "assigned_user_id": assignee }),
            )
            .await;
        }
    }

    MutationOutcome::ok()
}

pub async fn update(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
    patch: &LeadPatch,
) -> MutationOutcome {
    #[derive(Serialize)]
    struct Stamped<'a> {
        #[serde(flatten)]
        patch: &'a LeadPatch,
        updated_at: chrono::DateTime<Utc>,
    }

    let body = Stamped {
        patch,
        updated_at: Utc::now(),
    };

    match backend
        .data
        .update::<_, Lead>(token, "leads", id, tenant_id, &body)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("lead update", err),
    }
}

/// Move a lead through the pipeline. Any status string is accepted; the
/// transition is recorded as a `status_change` activity.
pub async fn set_status(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
    new_status: &str,
    actor_id: Option<Uuid>,
) -> MutationOutcome {
    let new_status = new_status.trim();
    if new_status.is_empty() {
        return MutationOutcome::failed("lead status", AppError::InvalidInput(
            "Status must not be empty".to_string(),
        ));
    }

    let current = match get(backend, token, tenant_id, id).await {
        Some(lead) => lead,
        None => {
            return MutationOutcome::failed(
                "lead status",
                AppError::NotFound(format!("Lead {} not found", id)),
            )
        }
    };

    #[derive(Serialize)]
    struct StatusPatch<'a> {
        status: &'a str,
        updated_at: chrono::DateTime<Utc>,
    }

    let body = StatusPatch {
        status: new_status,
        updated_at: Utc::now(),
    };

    if let Err(err) = backend
        .data
        .update::<_, Lead>(token, "leads", id, tenant_id, &body)
        .await
    {
        return MutationOutcome::failed("lead status", err);
    }

    activities::record_system(
        backend,
        token,
        tenant_id,
        id,
        actor_id,
        crate::backend::models::ActivityType::StatusChange,
        "Cambio de etapa",
        serde_json::json!({ "from": current.status, "to": new_status }),
    )
    .await;

    MutationOutcome::ok()
}

pub async fn remove(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
) -> MutationOutcome {
    match backend.data.delete(token, "leads", id, tenant_id).await {
        Ok(()) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("lead delete", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_renders_only_scope_and_order() {
        let tenant = Uuid::nil();
        let filtered = LeadFilter::default().apply(base_query(tenant));
        assert_eq!(filtered.to_query(), base_query(tenant).to_query());
    }

    #[test]
    fn all_valued_filter_is_equivalent_to_default() {
        let tenant = Uuid::nil();
        let filter = LeadFilter {
            status: Some("all".to_string()),
            market: Some("all".to_string()),
            channel: None,
            intent: Some("ALL".to_string()),
            assigned_to: None,
        };
        assert_eq!(
            filter.apply(base_query(tenant)).to_query(),
            base_query(tenant).to_query()
        );
    }

    #[test]
    fn concrete_filters_narrow_the_query() {
        let tenant = Uuid::nil();
        let assignee = Uuid::new_v4();
        let filter = LeadFilter {
            status: Some("negociacion".to_string()),
            market: None,
            channel: Some("web".to_string()),
            intent: Some("alta".to_string()),
            assigned_to: Some(assignee),
        };
        let pairs = filter.apply(base_query(tenant)).to_query();
        assert!(pairs.contains(&("status".to_string(), "eq.negociacion".to_string())));
        assert!(pairs.contains(&("channel".to_string(), "eq.web".to_string())));
        assert!(pairs.contains(&("intent".to_string(), "eq.alta".to_string())));
        assert!(pairs.contains(&(
            "assigned_user_id".to_string(),
            format!("eq.{}", assignee)
        )));
    }

    #[test]
    fn lead_patch_serializes_only_present_fields() {
        let patch = LeadPatch {
            segment: Some("inversor".to_string()),
            ..LeadPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "segment": "inversor" }));
    }

    #[test]
    fn default_order_is_created_at_descending() {
        let pairs = base_query(Uuid::nil()).to_query();
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
    }
}
