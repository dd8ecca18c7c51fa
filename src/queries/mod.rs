//! Data-access layer. One module per resource, three uniform contracts:
//!
//! - list reads return [`Listing`]: rows, or an explicitly degraded empty
//!   result after the failure was logged; callers can tell the two apart,
//!   the HTTP layer renders both as an empty collection;
//! - single-record lookups return `Option` and log on failure;
//! - mutations return [`MutationOutcome`] and never panic or bubble an Err.

use std::fmt::Display;

use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;

pub mod activities;
pub mod leads;
pub mod notifications;
pub mod profile;
pub mod properties;
pub mod search;
pub mod team;

/// Result of a list read. `Degraded` means the query failed and was logged;
/// it still renders as zero rows, by contract.
#[derive(Debug)]
pub enum Listing<T> {
    Rows(Vec<T>),
    Degraded,
}

impl<T> Listing<T> {
    pub fn from_result(what: &str, result: Result<Vec<T>, AppError>) -> Self {
        match result {
            Ok(rows) => Listing::Rows(rows),
            Err(err) => {
                log::error!("{} query failed, degrading to empty: {}", what, err);
                Listing::Degraded
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Listing::Degraded)
    }

    pub fn into_rows(self) -> Vec<T> {
        match self {
            Listing::Rows(rows) => rows,
            Listing::Degraded => Vec::new(),
        }
    }
}

/// Collapse a single-record lookup to `Option`, logging the failure path.
pub fn optional<T>(what: &str, result: Result<Option<T>, AppError>) -> Option<T> {
    match result {
        Ok(row) => row,
        Err(err) => {
            log::error!("{} lookup failed, returning none: {}", what, err);
            None
        }
    }
}

/// Explicit success/error pair for mutations; the caller decides the
/// user-facing messaging.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MutationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(what: &str, err: impl Display) -> Self {
        let message = err.to_string();
        log::error!("{} mutation failed: {}", what, message);
        Self {
            success: false,
            error: Some(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degraded_listing_renders_as_empty_rows() {
        let listing: Listing<u32> =
            Listing::from_result("unit", Err(AppError::Backend("offline".into())));
        assert!(listing.is_degraded());
        assert!(listing.into_rows().is_empty());
    }

    #[test]
    fn successful_listing_keeps_rows_and_is_not_degraded() {
        let listing = Listing::from_result("unit", Ok(vec![1, 2, 3]));
        assert!(!listing.is_degraded());
        assert_eq!(listing.into_rows(), vec![1, 2, 3]);
    }

    #[test]
    fn optional_swallows_errors_into_none() {
        let row: Option<u32> = optional("unit", Err(AppError::Internal));
        assert!(row.is_none());
        assert_eq!(optional("unit", Ok(Some(7))), Some(7));
    }

    #[test]
    fn failed_outcome_carries_the_message() {
        let outcome = MutationOutcome::failed("unit", "row is gone");
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("row is gone"));
        assert!(MutationOutcome::ok().success);
    }

    #[test]
    fn outcome_serializes_without_null_error() {
        let json = serde_json::to_string(&MutationOutcome::ok()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }
}
