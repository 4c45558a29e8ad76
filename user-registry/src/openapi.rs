//! OpenAPI document for the `/users` endpoints and its Swagger UI
//!
//! The document is served at [`SPEC_PATH`] and browsable at [`DOCS_PATH`].

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{ApiErrorBody, BulkCreateRequest, CreateUserRequest, UpdateUserRequest};
use crate::users::{BulkCreateResult, PaginationMeta, SkippedUser, SortField, SortOrder, User};

/// Swagger UI mount point
pub const DOCS_PATH: &str = "/swagger-ui";

/// JSON document location
pub const SPEC_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "user-registry",
        description = "User records: filtered listing, soft delete, restore and bulk insert"
    ),
    paths(
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::restore_user,
        crate::handlers::users::bulk_create_users,
    ),
    components(schemas(
        User,
        PaginationMeta,
        BulkCreateResult,
        SkippedUser,
        SortField,
        SortOrder,
        CreateUserRequest,
        UpdateUserRequest,
        BulkCreateRequest,
        ApiErrorBody,
    )),
    tags((name = "users", description = "User record management"))
)]
pub struct ApiDoc;

/// Swagger UI plus the JSON document
pub fn swagger_ui() -> Router {
    SwaggerUi::new(DOCS_PATH)
        .url(SPEC_PATH, ApiDoc::openapi())
        .into()
}
