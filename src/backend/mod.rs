pub mod models;
pub mod query;

pub use query::SelectQuery;
