//! Errors reported by the user engine

use thiserror::Error;

use crate::repository::RepositoryError;

/// Which deletion state an id was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupState {
    Active,
    Deleted,
}

impl std::fmt::Display for LookupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// Failure of a user operation
#[derive(Debug, Error)]
pub enum UserError {
    /// The id is not a well-formed user id. Raised before the store is touched.
    #[error("invalid user id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    #[error("no {state} user with id '{id}'")]
    NotFound { id: String, state: LookupState },

    #[error("email '{email}' already exists")]
    DuplicateEmail { email: String },

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("record store unavailable")]
    StoreUnavailable(#[source] RepositoryError),

    /// The batch insert was rejected by the store
    #[error("bulk insert failed")]
    BulkInsert(#[source] RepositoryError),

    #[error("record store failure")]
    Storage(#[source] RepositoryError),
}

impl UserError {
    pub fn not_found(id: impl Into<String>, state: LookupState) -> Self {
        Self::NotFound {
            id: id.into(),
            state,
        }
    }

    /// Classify a store failure. `email` is the value being written, used
    /// when the store cannot name the duplicated value itself.
    pub fn from_store(error: RepositoryError, email: Option<&str>) -> Self {
        if error.is_duplicate_of("email") {
            let email = error
                .value
                .clone()
                .or_else(|| email.map(str::to_string))
                .unwrap_or_default();
            Self::DuplicateEmail { email }
        } else if error.is_unavailable() {
            Self::StoreUnavailable(error)
        } else {
            Self::Storage(error)
        }
    }
}

impl From<RepositoryError> for UserError {
    fn from(error: RepositoryError) -> Self {
        Self::from_store(error, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::RepositoryOperation;

    #[test]
    fn test_duplicate_key_maps_to_duplicate_email() {
        let err = UserError::from(RepositoryError::duplicate_key(
            RepositoryOperation::InsertOne,
            "email",
            "a@x.com",
        ));
        match err {
            UserError::DuplicateEmail { email } => assert_eq!(email, "a@x.com"),
            other => panic!("expected DuplicateEmail, got {other:?}"),
        }
    }

    #[test]
    fn test_unavailable_maps_to_store_unavailable() {
        let err = UserError::from(RepositoryError::timeout(
            RepositoryOperation::FindMany,
            "slow",
        ));
        assert!(matches!(err, UserError::StoreUnavailable(_)));
    }

    #[test]
    fn test_other_failures_map_to_storage() {
        let err = UserError::from(RepositoryError::database_error(
            RepositoryOperation::Count,
            "boom",
        ));
        assert!(matches!(err, UserError::Storage(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display() {
        let err = UserError::not_found("user_x", LookupState::Deleted);
        assert_eq!(err.to_string(), "no deleted user with id 'user_x'");
    }
}
