//! Record store abstraction
//!
//! - [`UserStore`]: the operations the user engine needs from a document store
//! - [`Predicate`], [`SortSpec`], [`Pagination`]: backend-agnostic query description
//! - [`RepositoryError`]: typed store failures
//! - [`InMemoryUserStore`]: the bundled implementation

mod error;
mod memory;
mod predicate;
mod traits;

pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use memory::InMemoryUserStore;
pub use predicate::{
    Field, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination, Predicate,
    SortSpec,
};
pub use traits::{RepositoryResult, UpdateOptions, UserStore};
