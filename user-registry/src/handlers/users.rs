//! `/users` endpoints
//!
//! Each handler validates its input, calls the engine and wraps the outcome
//! in the response envelope. Engine failures go through
//! [`ApiError::from_user_error`] tagged with the endpoint's operation.
//!
//! Response bodies in the `#[utoipa::path]` annotations name the `data`
//! payload; on the wire it sits inside the success envelope.

use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Router,
};
use tracing::instrument;

use crate::health::{health, readiness};
use crate::openapi;
use crate::repository::UserStore;
use crate::state::AppState;
use crate::users::{BulkCreateResult, User, UserQuery};

use super::error::{ApiError, ApiErrorBody, ApiOperation};
use super::extract::{ApiJson, ApiQuery};
use super::response::ApiResponse;
use super::validation::{validate_query, BulkCreateRequest, CreateUserRequest, UpdateUserRequest};

type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Router with every user endpoint, `/health`, `/ready` and the API docs
pub fn routes<S: UserStore>(state: AppState<S>) -> Router {
    Router::new()
        .route("/users", post(create_user::<S>).get(list_users::<S>))
        .route("/users/bulk", post(bulk_create_users::<S>))
        .route(
            "/users/{id}",
            get(get_user::<S>)
                .patch(update_user::<S>)
                .delete(delete_user::<S>),
        )
        .route("/users/{id}/restore", patch(restore_user::<S>))
        .route("/health", get(health::<S>))
        .route("/ready", get(readiness::<S>))
        .with_state(state)
        .merge(openapi::swagger_ui())
}

/// `POST /users`
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create a new user",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created successfully", body = User),
        (status = 400, description = "Invalid body", body = ApiErrorBody),
        (status = 409, description = "Email already exists", body = ApiErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn create_user<S: UserStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> ApiResult<User> {
    let input = body
        .validate()
        .map_err(|e| e.with_operation(ApiOperation::Create))?;
    let user = state
        .users()
        .create(input)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::Create, e))?;
    Ok(ApiResponse::created(user))
}

/// `GET /users`
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "Get all users with filters, pagination and sorting",
    params(UserQuery),
    responses(
        (status = 200, description = "Users retrieved successfully, with `meta`", body = Vec<User>),
        (status = 400, description = "Invalid query parameters", body = ApiErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn list_users<S: UserStore>(
    State(state): State<AppState<S>>,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> ApiResult<Vec<User>> {
    let query = validate_query(query, &state.config().query)?;
    let page = state
        .users()
        .find_all(&query)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::List, e))?;
    Ok(ApiResponse::from(page))
}

/// `GET /users/{id}`
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user by id",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 400, description = "Invalid ID format", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn get_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let user = state
        .users()
        .find_one(&id)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::Get, e))?;
    Ok(ApiResponse::ok(user))
}

/// `PATCH /users/{id}`
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user by id",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = User),
        (status = 400, description = "Invalid id or body", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody),
        (status = 409, description = "Email already exists", body = ApiErrorBody)
    )
)]
#[instrument(skip(state, body))]
pub async fn update_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> ApiResult<User> {
    let changes = body
        .validate()
        .map_err(|e| e.with_operation(ApiOperation::Update).with_entity(id.clone()))?;
    let user = state
        .users()
        .update(&id, changes)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::Update, e))?;
    Ok(ApiResponse::ok(user))
}

/// `DELETE /users/{id}`: soft delete, answers with `data: null`
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Soft delete user by id",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 400, description = "Invalid ID format", body = ApiErrorBody),
        (status = 404, description = "User not found", body = ApiErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn delete_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state
        .users()
        .remove(&id)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::SoftDelete, e))?;
    Ok(ApiResponse::ok(()))
}

/// `PATCH /users/{id}/restore`
#[utoipa::path(
    patch,
    path = "/users/{id}/restore",
    tag = "users",
    summary = "Restore soft deleted user",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User restored successfully", body = User),
        (status = 400, description = "Invalid ID format", body = ApiErrorBody),
        (status = 404, description = "Deleted user not found", body = ApiErrorBody)
    )
)]
#[instrument(skip(state))]
pub async fn restore_user<S: UserStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> ApiResult<User> {
    let user = state
        .users()
        .restore(&id)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::Restore, e))?;
    Ok(ApiResponse::ok(user))
}

/// `POST /users/bulk`
#[utoipa::path(
    post,
    path = "/users/bulk",
    tag = "users",
    summary = "Create multiple users, skipping taken emails",
    request_body = BulkCreateRequest,
    responses(
        (status = 201, description = "Bulk create completed", body = BulkCreateResult),
        (status = 400, description = "Invalid item in the list", body = ApiErrorBody),
        (status = 500, description = "Bulk insert failed", body = ApiErrorBody)
    )
)]
#[instrument(skip_all)]
pub async fn bulk_create_users<S: UserStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<BulkCreateRequest>,
) -> ApiResult<BulkCreateResult> {
    let candidates = body
        .validate()
        .map_err(|e| e.with_operation(ApiOperation::BulkCreate))?;
    let result = state
        .users()
        .bulk_create(candidates)
        .await
        .map_err(|e| ApiError::from_user_error(ApiOperation::BulkCreate, e))?;
    Ok(ApiResponse::created(result))
}
