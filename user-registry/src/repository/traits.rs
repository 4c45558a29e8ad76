//! Record store trait
//!
//! Uses RPITIT (Return Position Impl Trait In Traits) so implementations can be
//! written with plain `async fn`, without `async_trait`.

use std::future::Future;

use super::error::RepositoryError;
use super::predicate::{Pagination, Predicate, SortSpec};
use crate::users::{NewUser, UserDocument, UserPatch};

/// Result type for store operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// Options for [`UserStore::find_one_and_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Return the document as it is after the update (`true`) or before it (`false`)
    pub return_updated: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            return_updated: true,
        }
    }
}

impl UpdateOptions {
    /// Return the post-update document
    #[must_use]
    pub const fn after() -> Self {
        Self {
            return_updated: true,
        }
    }

    /// Return the pre-update document
    #[must_use]
    pub const fn before() -> Self {
        Self {
            return_updated: false,
        }
    }
}

/// Document store holding user records.
///
/// Implementations must enforce a unique index on the normalized `email`
/// across the whole collection (deleted records included), assign ids and
/// timestamps on insert, and apply [`find_one_and_update`](Self::find_one_and_update)
/// atomically per document.
///
/// # Example
///
/// ```rust,ignore
/// use user_registry::repository::{FilterCondition, Field, Predicate, UserStore};
///
/// let active = Predicate::from(FilterCondition::eq(Field::IsDeleted, false));
/// let total = store.count(&active).await?;
/// ```
pub trait UserStore: Send + Sync + 'static {
    /// Documents matching `predicate`, sorted then windowed.
    ///
    /// Without a sort the store's natural order is kept. Ties under a sort also
    /// keep the natural order.
    fn find_many(
        &self,
        predicate: &Predicate,
        sort: Option<SortSpec>,
        window: Option<Pagination>,
    ) -> impl Future<Output = RepositoryResult<Vec<UserDocument>>> + Send;

    /// Number of documents matching `predicate`
    fn count(&self, predicate: &Predicate) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// First document (natural order) matching `predicate`
    fn find_one(
        &self,
        predicate: &Predicate,
    ) -> impl Future<Output = RepositoryResult<Option<UserDocument>>> + Send;

    /// Insert one active document.
    ///
    /// Fails with a `DuplicateKey` error on `email` when the email is taken.
    fn insert_one(
        &self,
        user: NewUser,
    ) -> impl Future<Output = RepositoryResult<UserDocument>> + Send;

    /// Insert a batch of active documents, preserving input order.
    ///
    /// A uniqueness violation anywhere in the batch rejects the call.
    fn insert_many(
        &self,
        users: Vec<NewUser>,
    ) -> impl Future<Output = RepositoryResult<Vec<UserDocument>>> + Send;

    /// Atomically apply `patch` to the first document matching `predicate`.
    ///
    /// Returns `Ok(None)` when nothing matched.
    fn find_one_and_update(
        &self,
        predicate: &Predicate,
        patch: UserPatch,
        options: UpdateOptions,
    ) -> impl Future<Output = RepositoryResult<Option<UserDocument>>> + Send;

    /// Cheap availability probe used by readiness checks
    fn ping(&self) -> impl Future<Output = RepositoryResult<()>> + Send;
}
