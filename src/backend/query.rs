//! Builder for the data API's query-string grammar (PostgREST operators).
//!
//! Handlers never concatenate filter strings by hand; they go through this
//! builder so that "all"/absent filter semantics and pattern sanitizing stay
//! in one place.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gte,
    Lte,
    Ilike,
    Is,
}

impl Op {
    fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Gte => "gte",
            Op::Lte => "lte",
            Op::Ilike => "ilike",
            Op::Is => "is",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    select: String,
    filters: Vec<(String, Op, String)>,
    /// Rendered `or=(...)` disjunction groups, already sanitized.
    ors: Vec<String>,
    order: Option<(String, bool)>,
    limit: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            ors: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Column list, may include embedded resources
    /// (`assigned_user:users(id,full_name)`).
    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push((column.to_string(), Op::Eq, value.to_string()));
        self
    }

    pub fn eq_uuid(self, column: &str, value: Uuid) -> Self {
        self.eq(column, &value.to_string())
    }

    /// Apply an equality filter unless the value is absent or the sentinel
    /// `"all"`, which callers treat as "do not filter".
    pub fn eq_opt(mut self, column: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            let value = value.trim();
            if !value.is_empty() && !value.eq_ignore_ascii_case("all") {
                self.filters
                    .push((column.to_string(), Op::Eq, value.to_string()));
            }
        }
        self
    }

    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), Op::Gte, value.to_string()));
        self
    }

    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), Op::Lte, value.to_string()));
        self
    }

    pub fn is_true(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), Op::Is, "true".to_string()));
        self
    }

    pub fn is_false(mut self, column: &str) -> Self {
        self.filters
            .push((column.to_string(), Op::Is, "false".to_string()));
        self
    }

    pub fn ilike(mut self, column: &str, needle: &str) -> Self {
        self.filters.push((
            column.to_string(),
            Op::Ilike,
            format!("*{}*", sanitize_pattern(needle)),
        ));
        self
    }

    /// Case-insensitive substring match over several columns at once,
    /// rendered as one `or=(a.ilike.*x*,b.ilike.*x*)` group.
    pub fn ilike_any(mut self, columns: &[&str], needle: &str) -> Self {
        let needle = sanitize_pattern(needle);
        if needle.is_empty() || columns.is_empty() {
            return self;
        }
        let group = columns
            .iter()
            .map(|col| format!("{}.ilike.*{}*", col, needle))
            .collect::<Vec<_>>()
            .join(",");
        self.ors.push(format!("({})", group));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), true));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), false));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render to key/value pairs for the HTTP client. Percent-encoding is
    /// the client's job.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.filters.len() + 3);
        pairs.push(("select".to_string(), self.select.clone()));
        for (column, op, value) in &self.filters {
            pairs.push((column.clone(), format!("{}.{}", op.as_str(), value)));
        }
        for group in &self.ors {
            pairs.push(("or".to_string(), group.clone()));
        }
        if let Some((column, desc)) = &self.order {
            let direction = if *desc { "desc" } else { "asc" };
            pairs.push(("order".to_string(), format!("{}.{}", column, direction)));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

/// Strip characters that would break the filter grammar (`,`, `(`, `)`) and
/// the wildcard metacharacters. Substring search needs none of them.
fn sanitize_pattern(needle: &str) -> String {
    needle
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '%'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(query: &SelectQuery) -> Vec<(String, String)> {
        query.to_query()
    }

    #[test]
    fn default_query_renders_select_star_only() {
        let pairs = rendered(&SelectQuery::new("leads"));
        assert_eq!(pairs, vec![("select".to_string(), "*".to_string())]);
    }

    #[test]
    fn all_sentinel_is_equivalent_to_absent() {
        let with_all = SelectQuery::new("leads")
            .eq_opt("status", Some("all"))
            .eq_opt("market", Some("ALL"))
            .eq_opt("channel", None);
        let without = SelectQuery::new("leads");
        assert_eq!(rendered(&with_all), rendered(&without));
    }

    #[test]
    fn filters_render_postgrest_operators() {
        let query = SelectQuery::new("properties")
            .eq("operation", "venta")
            .gte("price", 100_000)
            .lte("price", 250_000)
            .order_desc("created_at")
            .limit(5);
        let pairs = rendered(&query);
        assert!(pairs.contains(&("operation".to_string(), "eq.venta".to_string())));
        assert!(pairs.contains(&("price".to_string(), "gte.100000".to_string())));
        assert!(pairs.contains(&("price".to_string(), "lte.250000".to_string())));
        assert!(pairs.contains(&("order".to_string(), "created_at.desc".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "5".to_string())));
    }

    #[test]
    fn ilike_any_renders_one_or_group() {
        let query = SelectQuery::new("properties").ilike_any(&["code", "title", "zone"], "playa");
        let pairs = rendered(&query);
        assert!(pairs.contains(&(
            "or".to_string(),
            "(code.ilike.*playa*,title.ilike.*playa*,zone.ilike.*playa*)".to_string()
        )));
    }

    #[test]
    fn patterns_are_sanitized_against_the_grammar() {
        assert_eq!(sanitize_pattern("pla,y(a)*%"), "playa");
        let query = SelectQuery::new("leads").ilike("full_name", "an(a),*");
        let pairs = rendered(&query);
        assert!(pairs.contains(&("full_name".to_string(), "ilike.*ana*".to_string())));
    }

    #[test]
    fn boolean_filters_use_is() {
        let pairs = rendered(&SelectQuery::new("users").is_true("is_active"));
        assert!(pairs.contains(&("is_active".to_string(), "is.true".to_string())));
    }
}
