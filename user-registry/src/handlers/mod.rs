//! HTTP boundary for user records
//!
//! - [`validation`]: request bodies and their shape checks
//! - [`extract`]: JSON and query extractors that reject with [`ApiError`]
//! - [`response`]: the `{ success, message, data, meta? }` envelope
//! - [`error`]: [`ApiError`] and its status mapping
//! - [`users`]: the endpoints and [`routes`]

pub mod error;
pub mod extract;
pub mod response;
pub mod users;
pub mod validation;

pub use error::{ApiError, ApiErrorBody, ApiErrorKind, ApiOperation};
pub use extract::{ApiJson, ApiQuery};
pub use response::{ApiResponse, CREATED, SUCCESS};
pub use users::routes;
pub use validation::{
    validate_query, BulkCreateRequest, CreateUserRequest, UpdateUserRequest,
};
