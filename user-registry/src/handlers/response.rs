//! Success envelope for API responses
//!
//! Every successful response is `{ success: true, message, data, meta? }`.
//!
//! ```rust
//! use user_registry::handlers::ApiResponse;
//!
//! let response = ApiResponse::created("user");
//! assert_eq!(response.message, "Created successfully");
//! assert_eq!(response.status.as_u16(), 201);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::users::{PaginationMeta, User, UserPage};

/// Message for 200 responses
pub const SUCCESS: &str = "Success";

/// Message for 201 responses
pub const CREATED: &str = "Created successfully";

#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    /// 200 with `data`
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 with `data`
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status,
            success: true,
            message: message_for(status).to_string(),
            data,
            meta: None,
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: PaginationMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Envelope message for a success status
pub fn message_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::OK => SUCCESS,
        StatusCode::CREATED => CREATED,
        StatusCode::NO_CONTENT => "Updated successfully",
        _ => "Operation completed",
    }
}

impl From<UserPage> for ApiResponse<Vec<User>> {
    fn from(page: UserPage) -> Self {
        Self::ok(page.data).with_meta(page.meta)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
