//! Record store error types
//!
//! Every [`UserStore`](super::UserStore) call reports failures as a
//! [`RepositoryError`] carrying the operation, a kind, and (for uniqueness
//! violations) the offending field and value.
//!
//! ```rust
//! use user_registry::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::duplicate_key(RepositoryOperation::InsertOne, "email", "a@x.com");
//! assert!(matches!(error.kind, RepositoryErrorKind::DuplicateKey));
//! assert_eq!(error.field.as_deref(), Some("email"));
//! ```

use std::fmt;

/// Store operation being performed when the error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Fetching a sorted, paginated set of documents
    FindMany,
    /// Counting documents matching a predicate
    Count,
    /// Fetching the first document matching a predicate
    FindOne,
    /// Inserting a single document
    InsertOne,
    /// Inserting a batch of documents
    InsertMany,
    /// Conditional match-and-set of a single document
    FindOneAndUpdate,
    /// Availability probe
    Ping,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FindMany => write!(f, "find_many"),
            Self::Count => write!(f, "count"),
            Self::FindOne => write!(f, "find_one"),
            Self::InsertOne => write!(f, "insert_one"),
            Self::InsertMany => write!(f, "insert_many"),
            Self::FindOneAndUpdate => write!(f, "find_one_and_update"),
            Self::Ping => write!(f, "ping"),
        }
    }
}

/// Category of store error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// A unique index rejected the write
    DuplicateKey,
    /// The backend could not be reached
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// The backend failed while executing the operation
    DatabaseError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey => write!(f, "duplicate_key"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

/// Structured store error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The field involved, when the backend can tell (e.g. the violated index)
    pub field: Option<String>,
    /// The value involved, when the backend can tell
    pub value: Option<String>,
}

impl RepositoryError {
    /// Create a new store error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            field: None,
            value: None,
        }
    }

    /// Create a unique-index violation naming the field and the duplicated value
    pub fn duplicate_key(
        operation: RepositoryOperation,
        field: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::new(
            operation,
            RepositoryErrorKind::DuplicateKey,
            "Duplicate key violates unique index",
        )
        .with_key(field, value)
    }

    /// Create a connection failed error
    pub fn connection_failed(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::ConnectionFailed, message)
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Create a backend execution error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Attach the field/value pair the error is about
    #[must_use]
    pub fn with_key(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self.value = Some(value.into());
        self
    }

    /// Transient errors that may succeed on retry
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }

    /// Whether the backend was unreachable rather than rejecting the request
    pub fn is_unavailable(&self) -> bool {
        self.is_retriable()
    }

    /// Whether this is a unique-index violation on `field`
    pub fn is_duplicate_of(&self, field: &str) -> bool {
        self.kind == RepositoryErrorKind::DuplicateKey && self.field.as_deref() == Some(field)
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(field), Some(value)) = (&self.field, &self.value) {
            write!(f, " [{}: {}]", field, value)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}
