//! User records and the engine that queries and mutates them
//!
//! - [`UserService`]: create, list, fetch, update, soft-delete, restore, bulk insert
//! - [`UserQuery`] / [`build_filter`]: list requests and their store predicates
//! - [`PaginationMeta`]: page arithmetic
//! - [`Clock`]: injected time source

mod bulk;
mod clock;
mod error;
mod filter;
mod model;
mod pagination;
mod query;
mod service;

pub use bulk::{BulkCreateResult, SkippedUser, DUPLICATE_IN_BATCH, EMAIL_EXISTS};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{LookupState, UserError};
pub use filter::build_filter;
pub use model::{normalize_email, Lifecycle, NewUser, User, UserChanges, UserDocument, UserPatch};
pub use pagination::PaginationMeta;
pub use query::{SortField, SortOrder, UserQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use service::{UserPage, UserService};
