//! Errors crossing the store boundary

use std::time::Duration;
use thiserror::Error;

/// Failure reported by an [`AttendanceStore`](crate::store::AttendanceStore)
/// or [`RosterStore`](crate::store::RosterStore) implementation.
///
/// Constraint races on `(member_id, session_id)` are not errors; stores turn
/// them into [`InsertOutcome::AlreadyExists`](crate::store::InsertOutcome).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Referenced entity does not exist in the organization
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A uniqueness rule other than the attendance pair was violated
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backing store could not be reached
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within the request timeout
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// Any other backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
