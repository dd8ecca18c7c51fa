//! Notification feed derived from the audit log: a bounded window of rows
//! (last 24 hours, most recent 20) turned into user-facing cards.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::models::AuditLog;
use crate::backend::SelectQuery;
use crate::queries::Listing;

const WINDOW_HOURS: i64 = 24;
const WINDOW_LIMIT: u32 = 20;
const UNREAD_MINUTES: i64 = 60;

lazy_static::lazy_static! {
    static ref RESOURCE_LABELS: HashMap<&'static str, &'static str> = HashMap::from([
        ("lead", "Lead"),
        ("property", "Property"),
        ("user", "Team member"),
        ("task", "Task"),
        ("activity", "Activity"),
    ]);

    static ref ACTION_LABELS: HashMap<&'static str, &'static str> = HashMap::from([
        ("create", "created"),
        ("update", "updated"),
        ("delete", "deleted"),
        ("assign", "assigned"),
        ("status_change", "moved"),
    ]);
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub time_label: String,
    pub unread: bool,
    pub resource: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

/// Fixed relative-time buckets. Everything older than a day collapses to
/// "1d ago" on purpose; the fetch window is a day wide anyway.
pub fn relative_age_label(age: Duration) -> String {
    let minutes = age.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else {
        "1d ago".to_string()
    }
}

/// Unmapped resources/actions pass through verbatim.
fn label_for<'a>(table: &HashMap<&'static str, &'static str>, key: &'a str) -> &'a str {
    table.get(key).copied().unwrap_or(key)
}

pub fn derive(rows: Vec<AuditLog>, now: DateTime<Utc>) -> Vec<Notification> {
    rows.into_iter()
        .map(|row| {
            let age = now.signed_duration_since(row.created_at);
            let resource_label = label_for(&RESOURCE_LABELS, &row.resource);
            let action_label = label_for(&ACTION_LABELS, &row.action);
            let actor = row.user_name.as_deref().unwrap_or("Someone");
            let subject = row.resource_name.as_deref().unwrap_or("");
            let message = if subject.is_empty() {
                format!("{} {} {}", actor, action_label, resource_label.to_lowercase())
            } else {
                format!(
                    "{} {} {} \u{201c}{}\u{201d}",
                    actor,
                    action_label,
                    resource_label.to_lowercase(),
                    subject
                )
            };
            Notification {
                id: row.id,
                title: format!("{} {}", resource_label, action_label),
                message,
                time_label: relative_age_label(age),
                unread: age.num_minutes() < UNREAD_MINUTES,
                resource: row.resource,
                action: row.action,
                created_at: row.created_at,
            }
        })
        .collect()
}

pub async fn list(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    now: DateTime<Utc>,
) -> Listing<Notification> {
    let since = now - Duration::hours(WINDOW_HOURS);
    let query = SelectQuery::new("audit_logs")
        .eq_uuid("tenant_id", tenant_id)
        .gte("created_at", since.to_rfc3339())
        .order_desc("created_at")
        .limit(WINDOW_LIMIT);

    match Listing::from_result(
        "notifications",
        backend.data.select::<AuditLog>(token, &query).await,
    ) {
        Listing::Rows(rows) => Listing::Rows(derive(rows, now)),
        Listing::Degraded => Listing::Degraded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(age: Duration, now: DateTime<Utc>) -> AuditLog {
        AuditLog {
            id: Uuid::new_v4(),
            action: "create".to_string(),
            resource: "lead".to_string(),
            resource_name: Some("Ana Torres".to_string()),
            user_name: Some("Marta".to_string()),
            created_at: now - age,
        }
    }

    #[test]
    fn relative_labels_use_the_fixed_breakpoints() {
        assert_eq!(relative_age_label(Duration::seconds(30)), "just now");
        assert_eq!(relative_age_label(Duration::minutes(5)), "5m ago");
        assert_eq!(relative_age_label(Duration::hours(3)), "3h ago");
        assert_eq!(relative_age_label(Duration::hours(30)), "1d ago");
    }

    #[test]
    fn unread_threshold_is_one_hour() {
        let now = Utc::now();
        let cards = derive(
            vec![row(Duration::minutes(59), now), row(Duration::minutes(61), now)],
            now,
        );
        assert!(cards[0].unread);
        assert!(!cards[1].unread);
    }

    #[test]
    fn mapped_labels_compose_title_and_message() {
        let now = Utc::now();
        let cards = derive(vec![row(Duration::minutes(5), now)], now);
        assert_eq!(cards[0].title, "Lead created");
        assert_eq!(cards[0].message, "Marta created lead \u{201c}Ana Torres\u{201d}");
        assert_eq!(cards[0].time_label, "5m ago");
    }

    #[test]
    fn unmapped_resource_and_action_pass_through() {
        let now = Utc::now();
        let mut audit = row(Duration::minutes(2), now);
        audit.resource = "valuation".to_string();
        audit.action = "archived".to_string();
        let cards = derive(vec![audit], now);
        assert_eq!(cards[0].title, "valuation archived");
        assert_eq!(cards[0].resource, "valuation");
        assert_eq!(cards[0].action, "archived");
    }

    #[test]
    fn missing_actor_and_subject_fall_back() {
        let now = Utc::now();
        let mut audit = row(Duration::minutes(2), now);
        audit.user_name = None;
        audit.resource_name = None;
        let cards = derive(vec![audit], now);
        assert_eq!(cards[0].message, "Someone created lead");
    }
}
