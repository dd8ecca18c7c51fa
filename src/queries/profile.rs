use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::{Tenant, User};
use crate::backend::SelectQuery;
use crate::queries::{optional, MutationOutcome};

/// Resolve the CRM profile row behind an auth identity.
pub async fn get_by_auth_id(
    backend: &BackendServices,
    token: &str,
    auth_id: Uuid,
) -> Option<User> {
    let query = SelectQuery::new("users").eq_uuid("auth_id", auth_id);
    optional("profile", backend.data.select_one(token, &query).await)
}

pub async fn get_tenant(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
) -> Option<Tenant> {
    let query = SelectQuery::new("tenants").eq_uuid("id", tenant_id);
    optional("tenant", backend.data.select_one(token, &query).await)
}

/// Self-service profile edit; role and activation are team-admin territory.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct ProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

pub async fn update(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    user_id: Uuid,
    patch: &ProfilePatch,
) -> MutationOutcome {
    match backend
        .data
        .update::<_, User>(token, "users", user_id, tenant_id, patch)
        .await
    {
        Ok(_) => MutationOutcome::ok(),
        Err(err) => MutationOutcome::failed("profile update", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_patch_never_carries_role_or_activation() {
        let patch = ProfilePatch {
            full_name: Some("Ana Torres".to_string()),
            ..ProfilePatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "full_name": "Ana Torres" }));
    }
}
