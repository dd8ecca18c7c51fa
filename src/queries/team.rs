use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::{User, UserRole};
use crate::backend::SelectQuery;
use crate::queries::{Listing, MutationOutcome};

/// Closed filter set for the team list; `"all"`/absent fields are skipped.
#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
pub struct TeamFilter {
    pub role: Option<String>,
    pub market: Option<String>,
    pub team: Option<String>,
    pub active: Option<bool>,
}

impl TeamFilter {
    pub fn apply(&self, query: SelectQuery) -> SelectQuery {
        let mut query = query
            .eq_opt("role", self.role.as_deref())
            .eq_opt("market", self.market.as_deref())
            .eq_opt("team", self.team.as_deref());
        match self.active {
            Some(true) => query = query.is_true("is_active"),
            Some(false) => query = query.is_false("is_active"),
            None => {}
        }
        query
    }
}

/// Admin-side member update: role, team, market, soft enable/disable.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct TeamMemberPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Team is the one list ordered by name, not recency.
pub fn base_query(tenant_id: Uuid) -> SelectQuery {
    SelectQuery::new("users")
        .eq_uuid("tenant_id", tenant_id)
        .order_asc("full_name")
}

pub async fn list(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    filter: &TeamFilter,
) -> Listing<User> {
    let query = filter.apply(base_query(tenant_id));
    Listing::from_result("team", backend.data.select(token, &query).await)
}

pub async fn update_member(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    id: Uuid,
    patch: &TeamMemberPatch,
) -> MutationOutcome {
    match backend
        .data
        .update::<_, User>(token, "users", id, tenant_id, patch)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("team update", err),
    }
}

/// Pick a random active agent for lead auto-assignment. `None` when the
/// tenant has no active agents (the lead then stays unassigned).
pub async fn pick_random_agent(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
) -> Option<User> {
    let query = base_query(tenant_id).eq("role", "agent").is_true("is_active");
    let agents = Listing::from_result("agents", backend.data.select::<User>(token, &query).await)
        .into_rows();
    if agents.is_empty() {
        return None;
    }
    let index = fastrand::usize(..agents.len());
    Some(agents[index].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_defaults_to_name_ascending() {
        let pairs = base_query(Uuid::nil()).to_query();
        assert!(pairs.contains(&("order".to_string(), "full_name.asc".to_string())));
    }

    #[test]
    fn active_filter_uses_is_operator() {
        let filter = TeamFilter {
            active: Some(false),
            ..TeamFilter::default()
        };
        let pairs = filter.apply(base_query(Uuid::nil())).to_query();
        assert!(pairs.contains(&("is_active".to_string(), "is.false".to_string())));
    }

    #[test]
    fn all_role_is_equivalent_to_no_role_filter() {
        let filter = TeamFilter {
            role: Some("all".to_string()),
            ..TeamFilter::default()
        };
        assert_eq!(
            filter.apply(base_query(Uuid::nil())).to_query(),
            base_query(Uuid::nil()).to_query()
        );
    }

    #[test]
    fn member_patch_serializes_role_in_wire_casing() {
        let patch = TeamMemberPatch {
            role: Some(UserRole::TeamLead),
            is_active: Some(false),
            ..TeamMemberPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "role": "team_lead", "is_active": false })
        );
    }
}
