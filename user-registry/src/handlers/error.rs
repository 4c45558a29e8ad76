//! API error type with HTTP status mapping
//!
//! Every failure leaving the HTTP layer is an [`ApiError`]. Its response body is
//! `{ success: false, message, code, statusCode, timestamp }`.
//!
//! ```rust
//! use user_registry::handlers::{ApiError, ApiErrorKind};
//!
//! let error = ApiError::not_found("user_01h455vb4pex5vsknk084sn02q");
//! assert!(matches!(error.kind, ApiErrorKind::NotFound));
//! assert_eq!(error.kind.status_code().as_u16(), 404);
//! ```

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::users::{LookupState, UserError};

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    List,
    Get,
    Create,
    Update,
    SoftDelete,
    Restore,
    BulkCreate,
    /// Readiness probe
    Ready,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::SoftDelete => write!(f, "soft_delete"),
            Self::Restore => write!(f, "restore"),
            Self::BulkCreate => write!(f, "bulk_create"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed id, contradictory filter, unparseable request
    BadRequest,
    /// Request body or query failed validation
    ValidationFailed,
    NotFound,
    /// Uniqueness conflict
    Conflict,
    InternalError,
    /// Record store unreachable
    ServiceUnavailable,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::InternalError => write!(f, "internal_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest | Self::ValidationFailed => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code string for this error kind
    #[must_use]
    pub fn error_code(&self) -> String {
        self.to_string().to_uppercase()
    }

    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::InternalError | Self::ServiceUnavailable)
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Message sent to the client
    pub message: String,
    /// Id of the user involved, if any
    pub entity_id: Option<String>,
    /// Internal detail, logged but never sent
    pub detail: Option<String>,
}

impl ApiError {
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_id: None,
            detail: None,
        }
    }

    /// No active user with this id
    pub fn not_found(entity_id: impl Into<String>) -> Self {
        let entity_id = entity_id.into();
        Self {
            operation: ApiOperation::Get,
            kind: ApiErrorKind::NotFound,
            message: format!("User with id '{entity_id}' not found"),
            entity_id: Some(entity_id),
            detail: None,
        }
    }

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Create, ApiErrorKind::ValidationFailed, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::List, ApiErrorKind::BadRequest, message)
    }

    pub fn conflict(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ApiOperation::Get, ApiErrorKind::ServiceUnavailable, message)
    }

    /// Map an engine failure raised during `operation`.
    ///
    /// Server-side failures get a generic message; the underlying error is kept
    /// in `detail` for the log.
    pub fn from_user_error(operation: ApiOperation, error: UserError) -> Self {
        let detail = Some(error_chain(&error));
        match error {
            UserError::InvalidId { id, .. } => {
                Self::new(operation, ApiErrorKind::BadRequest, "Invalid ID format").with_entity(id)
            }
            UserError::NotFound {
                id,
                state: LookupState::Active,
            } => Self::not_found(id).with_operation(operation),
            UserError::NotFound {
                id,
                state: LookupState::Deleted,
            } => Self::new(operation, ApiErrorKind::NotFound, "Deleted user not found").with_entity(id),
            UserError::DuplicateEmail { email } => {
                Self::conflict(operation, "email already exists").with_detail(format!("email: {email}"))
            }
            UserError::InvalidFilter(message) => {
                Self::new(operation, ApiErrorKind::BadRequest, message)
            }
            UserError::StoreUnavailable(_) => Self {
                detail,
                ..Self::service_unavailable("Service temporarily unavailable")
                    .with_operation(operation)
            },
            UserError::BulkInsert(_) => Self {
                detail,
                ..Self::internal("Bulk insert failed").with_operation(operation)
            },
            UserError::Storage(_) => Self {
                detail,
                ..Self::internal("An internal error occurred").with_operation(operation)
            },
        }
    }

    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn with_operation(mut self, operation: ApiOperation) -> Self {
        self.operation = operation;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(self.kind, ApiErrorKind::ServiceUnavailable)
    }
}

/// `error: source: source...`
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(entity_id) = &self.entity_id {
            write!(f, " [user: {}]", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    pub success: bool,
    pub message: String,
    pub code: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if self.kind.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                entity_id = ?self.entity_id,
                detail = ?self.detail,
                retriable = self.is_retriable(),
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                entity_id = ?self.entity_id,
                "API error: {}", self.message
            );
        }

        let body = ApiErrorBody {
            success: false,
            message: self.message,
            code: self.kind.error_code(),
            status_code: status.as_u16(),
            timestamp: Utc::now(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RepositoryError, RepositoryOperation};

    #[test]
    fn test_api_error_kind_status_codes() {
        assert_eq!(ApiErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiErrorKind::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiErrorKind::InternalError.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiErrorKind::ServiceUnavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_code() {
        assert_eq!(ApiErrorKind::NotFound.error_code(), "NOT_FOUND");
        assert_eq!(ApiErrorKind::ValidationFailed.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_from_user_error_mapping() {
        let cases = [
            (
                UserError::InvalidId {
                    id: "x".into(),
                    reason: "bad".into(),
                },
                ApiErrorKind::BadRequest,
            ),
            (
                UserError::not_found("user_1", LookupState::Active),
                ApiErrorKind::NotFound,
            ),
            (
                UserError::DuplicateEmail {
                    email: "a@x.com".into(),
                },
                ApiErrorKind::Conflict,
            ),
            (
                UserError::InvalidFilter("minAge > maxAge".into()),
                ApiErrorKind::BadRequest,
            ),
            (
                UserError::StoreUnavailable(RepositoryError::connection_failed(
                    RepositoryOperation::Count,
                    "refused",
                )),
                ApiErrorKind::ServiceUnavailable,
            ),
            (
                UserError::BulkInsert(RepositoryError::duplicate_key(
                    RepositoryOperation::InsertMany,
                    "email",
                    "a@x.com",
                )),
                ApiErrorKind::InternalError,
            ),
            (
                UserError::Storage(RepositoryError::database_error(
                    RepositoryOperation::FindOne,
                    "boom",
                )),
                ApiErrorKind::InternalError,
            ),
        ];
        for (error, kind) in cases {
            let api = ApiError::from_user_error(ApiOperation::Update, error);
            assert_eq!(api.kind, kind);
            assert_eq!(api.operation, ApiOperation::Update);
        }
    }

    #[test]
    fn test_restore_miss_names_the_deleted_user() {
        let api = ApiError::from_user_error(
            ApiOperation::Restore,
            UserError::not_found("user_1", LookupState::Deleted),
        );
        assert_eq!(api.kind, ApiErrorKind::NotFound);
        assert_eq!(api.message, "Deleted user not found");
        assert_eq!(api.entity_id.as_deref(), Some("user_1"));

        let api = ApiError::from_user_error(
            ApiOperation::Get,
            UserError::not_found("user_1", LookupState::Active),
        );
        assert_eq!(api.message, "User with id 'user_1' not found");
    }

    #[test]
    fn test_duplicate_email_names_the_field() {
        let api = ApiError::from_user_error(
            ApiOperation::Create,
            UserError::DuplicateEmail {
                email: "a@x.com".into(),
            },
        );
        assert_eq!(api.message, "email already exists");
    }

    #[test]
    fn test_server_errors_hide_detail_from_message() {
        let api = ApiError::from_user_error(
            ApiOperation::List,
            UserError::StoreUnavailable(RepositoryError::connection_failed(
                RepositoryOperation::FindMany,
                "secret host 10.0.0.1 refused",
            )),
        );
        assert!(!api.message.contains("10.0.0.1"));
        assert!(api.detail.as_deref().unwrap_or_default().contains("10.0.0.1"));
        assert!(api.is_retriable());
    }

    #[test]
    fn test_display() {
        let error = ApiError::not_found("user_1").with_operation(ApiOperation::Restore);
        assert_eq!(
            error.to_string(),
            "API not_found error during restore: User with id 'user_1' not found [user: user_1]"
        );
    }

    #[tokio::test]
    async fn test_into_response_body() {
        let response = ApiError::not_found("user_1").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["statusCode"], 404);
        assert!(body["timestamp"].is_string());
    }
}
