//! # user-registry
//!
//! User record service: create, filtered and paginated listing, partial
//! update, soft delete with restore, and bulk insert that skips emails
//! already taken.
//!
//! ## Layout
//!
//! - [`users`]: the engine ([`users::UserService`]) and its domain types
//! - [`repository`]: the [`repository::UserStore`] seam and an in-memory store
//! - [`handlers`]: the HTTP boundary (validation, envelopes, error mapping)
//! - [`server`], [`middleware`], [`health`]: serving concerns
//! - [`openapi`]: the OpenAPI document, served with Swagger UI
//!
//! ## Example
//!
//! ```rust,no_run
//! use user_registry::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = Arc::new(InMemoryUserStore::default());
//!     let state = AppState::new(config.clone(), store, Arc::new(SystemClock));
//!
//!     Server::new(config).serve(app(state)).await
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod ids;
pub mod middleware;
pub mod observability;
pub mod openapi;
pub mod repository;
pub mod server;
pub mod state;
pub mod users;

use axum::Router;

use crate::repository::UserStore;
use crate::state::AppState;

/// The full route table over `state`, without the middleware stack
pub fn app<S: UserStore>(state: AppState<S>) -> Router {
    handlers::routes(state)
}

pub mod prelude {
    pub use crate::app;
    pub use crate::config::{Config, MiddlewareConfig, QueryConfig, ServiceConfig};
    pub use crate::error::{Error, Result};
    pub use crate::handlers::{ApiError, ApiErrorKind, ApiOperation, ApiResponse};
    pub use crate::health::{health, readiness};
    pub use crate::ids::{RequestId, UserId};
    pub use crate::observability::{init_tracing, shutdown_tracing};
    pub use crate::repository::{InMemoryUserStore, UserStore};
    pub use crate::server::Server;
    pub use crate::state::AppState;
    pub use crate::users::{
        BulkCreateResult, Clock, ManualClock, NewUser, SystemClock, User, UserChanges, UserError,
        UserQuery, UserService,
    };

    pub use axum::Router;
}
