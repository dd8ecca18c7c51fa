//! Global search: three concurrent sub-queries (leads, properties, tasks),
//! each capped at 5 rows and degrading independently, merged in
//! lead → property → task order. No ranking beyond the backend's substring
//! match.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::app_state::BackendServices;
use crate::backend::SelectQuery;
use crate::queries::Listing;

const PER_TYPE_LIMIT: u32 = 5;
const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    Lead,
    Property,
    Task,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchHit {
    pub kind: SearchKind,
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

/// Slim projections: search only pulls the columns the result list shows.
#[derive(Debug, Deserialize)]
pub struct LeadHit {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PropertyHit {
    pub id: Uuid,
    pub code: String,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskHit {
    pub id: Uuid,
    pub title: String,
    pub status: Option<String>,
}

/// True when the query is long enough to hit the network at all.
pub fn is_searchable(raw: &str) -> bool {
    raw.trim().chars().count() >= MIN_QUERY_CHARS
}

pub async fn global_search(
    backend: &BackendServices,
    token: &str,
    tenant_id: Uuid,
    raw: &str,
) -> Vec<SearchHit> {
    if !is_searchable(raw) {
        return Vec::new();
    }
    let needle = raw.trim();

    let leads_query = SelectQuery::new("leads")
        .select("id,full_name,email")
        .eq_uuid("tenant_id", tenant_id)
        .ilike_any(&["full_name", "email", "phone"], needle)
        .order_desc("created_at")
        .limit(PER_TYPE_LIMIT);
    let properties_query = SelectQuery::new("properties")
        .select("id,code,title")
        .eq_uuid("tenant_id", tenant_id)
        .ilike_any(&["code", "title", "zone"], needle)
        .order_desc("created_at")
        .limit(PER_TYPE_LIMIT);
    let tasks_query = SelectQuery::new("tasks")
        .select("id,title,status")
        .eq_uuid("tenant_id", tenant_id)
        .ilike("title", needle)
        .limit(PER_TYPE_LIMIT);

    // Awaited jointly; a failing branch yields no rows for that type only.
    let (leads, properties, tasks) = tokio::join!(
        backend.data.select::<LeadHit>(token, &leads_query),
        backend.data.select::<PropertyHit>(token, &properties_query),
        backend.data.select::<TaskHit>(token, &tasks_query),
    );

    let leads = Listing::from_result("search:leads", leads).into_rows();
    let properties = Listing::from_result("search:properties", properties).into_rows();
    let tasks = Listing::from_result("search:tasks", tasks).into_rows();

    merge(leads, properties, tasks)
}

/// Per-type order is whatever the backend returned; types always merge as
/// lead, then property, then task.
pub fn merge(
    leads: Vec<LeadHit>,
    properties: Vec<PropertyHit>,
    tasks: Vec<TaskHit>,
) -> Vec<SearchHit> {
    let mut hits = Vec::with_capacity(leads.len() + properties.len() + tasks.len());
    hits.extend(leads.into_iter().map(|lead| SearchHit {
        kind: SearchKind::Lead,
        id: lead.id,
        title: lead.full_name,
        subtitle: lead.email,
    }));
    hits.extend(properties.into_iter().map(|property| SearchHit {
        kind: SearchKind::Property,
        id: property.id,
        title: property.title,
        subtitle: Some(property.code),
    }));
    hits.extend(tasks.into_iter().map(|task| SearchHit {
        kind: SearchKind::Task,
        id: task.id,
        title: task.title,
        subtitle: task.status,
    }));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queries_below_two_characters_are_not_searchable() {
        assert!(!is_searchable(""));
        assert!(!is_searchable("a"));
        assert!(!is_searchable("  a  "));
        assert!(is_searchable("ab"));
        assert!(is_searchable(" ab "));
    }

    fn lead(name: &str) -> LeadHit {
        LeadHit {
            id: Uuid::new_v4(),
            full_name: name.to_string(),
            email: None,
        }
    }

    fn property(title: &str) -> PropertyHit {
        PropertyHit {
            id: Uuid::new_v4(),
            code: "PROP-1".to_string(),
            title: title.to_string(),
        }
    }

    fn task(title: &str) -> TaskHit {
        TaskHit {
            id: Uuid::new_v4(),
            title: title.to_string(),
            status: None,
        }
    }

    #[test]
    fn merge_preserves_lead_property_task_order() {
        let hits = merge(
            vec![lead("Ana"), lead("Bruno")],
            vec![property("Ático centro")],
            vec![task("Llamar a Ana")],
        );
        let kinds: Vec<SearchKind> = hits.iter().map(|hit| hit.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SearchKind::Lead,
                SearchKind::Lead,
                SearchKind::Property,
                SearchKind::Task
            ]
        );
        assert_eq!(hits[0].title, "Ana");
        assert_eq!(hits[2].subtitle.as_deref(), Some("PROP-1"));
    }

    #[test]
    fn one_empty_branch_does_not_disturb_the_others() {
        let hits = merge(Vec::new(), vec![property("Chalet")], Vec::new());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].kind, SearchKind::Property);
    }

    #[test]
    fn sub_queries_are_capped_at_five_rows() {
        let query = SelectQuery::new("tasks")
            .select("id,title,status")
            .ilike("title", "ab")
            .limit(5);
        assert!(query
            .to_query()
            .contains(&("limit".to_string(), "5".to_string())));
    }
}
