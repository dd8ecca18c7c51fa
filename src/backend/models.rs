//! Record types returned by the hosted data API.
//!
//! Every business row carries a `tenant_id`; isolation is enforced by
//! row-level security on the service side, and every query built here scopes
//! by tenant anyway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The ten pipeline stages, in board order. Lead status is stored as a free
/// string (writes are not validated against this list); the constant exists
/// for pipeline ordering only.
pub const PIPELINE_STAGES: [&str; 10] = [
    "nuevo",
    "contactado",
    "calificado",
    "visita_agendada",
    "visita_realizada",
    "negociacion",
    "reservado",
    "contrato",
    "ganado",
    "perdido",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    TeamLead,
    Agent,
    Backoffice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeadIntent {
    Alta,
    Media,
    Baja,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Note,
    Call,
    Whatsapp,
    Email,
    Meeting,
    StatusChange,
    Assignment,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TenantBranding {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub logo_url: Option<String>,
    pub font: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TenantSettings {
    pub sla_minutes: Option<i32>,
    pub timezone: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub branding: TenantBranding,
    #[serde(default)]
    pub settings: TenantSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub auth_id: Option<Uuid>,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub team: Option<String>,
    pub market: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
}

/// Embedded shape used when a lead expands its assignee.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
}

/// Embedded shape used when a lead expands its property of interest.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PropertySummary {
    pub id: Uuid,
    pub code: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub channel: Option<String>,
    pub source: Option<String>,
    pub market: Option<String>,
    pub segment: Option<String>,
    /// Free string; see [`PIPELINE_STAGES`].
    pub status: String,
    pub intent: Option<LeadIntent>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub timing: Option<String>,
    /// Weak reference, expanded by the data API when requested.
    pub assigned_user: Option<UserSummary>,
    /// Weak reference, expanded by the data API when requested.
    pub interest_property: Option<PropertySummary>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: Uuid,
    pub tenant_id: Uuid,
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
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub lead_id: Uuid,
    /// None for system-generated entries.
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: String,
    pub resource: String,
    pub resource_name: Option<String>,
    pub user_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_wire_casing() {
        assert_eq!(
            serde_json::to_string(&UserRole::TeamLead).unwrap(),
            "\"team_lead\""
        );
        assert_eq!(
            serde_json::to_string(&ActivityType::StatusChange).unwrap(),
            "\"status_change\""
        );
        assert_eq!(serde_json::to_string(&LeadIntent::Alta).unwrap(), "\"alta\"");
    }

    #[test]
    fn activity_type_round_trips_through_the_type_column() {
        let json = r#"{
            "id": "6f1e1a40-0000-0000-0000-000000000001",
            "tenant_id": "6f1e1a40-0000-0000-0000-000000000002",
            "lead_id": "6f1e1a40-0000-0000-0000-000000000003",
            "user_id": null,
            "type": "assignment",
            "title": "Lead asignado",
            "description": null,
            "created_at": "2026-08-01T12:00:00Z"
        }"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Assignment);
        assert!(activity.user_id.is_none());
        assert!(activity.metadata.is_null());
    }

    #[test]
    fn pipeline_has_ten_ordered_stages() {
        assert_eq!(PIPELINE_STAGES.len(), 10);
        assert_eq!(PIPELINE_STAGES[0], "nuevo");
        assert_eq!(PIPELINE_STAGES[9], "perdido");
    }
}
