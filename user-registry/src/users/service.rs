//! User engine: listing, lifecycle transitions and bulk insert over a [`UserStore`]

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::ids::UserId;
use crate::repository::{Pagination, UpdateOptions, UserStore};

use super::bulk::{distinct_emails, partition, BulkCreateResult};
use super::clock::Clock;
use super::error::{LookupState, UserError};
use super::filter::{build_filter, by_emails, by_id_in_state};
use super::model::{NewUser, User, UserChanges, UserPatch};
use super::pagination::{skip, PaginationMeta};
use super::query::UserQuery;

/// One page of a user listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPage {
    pub data: Vec<User>,
    pub meta: PaginationMeta,
}

/// Operations on user records.
///
/// Every mutation is a single conditional update issued to the store, so the
/// engine itself holds no locks.
pub struct UserService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Insert a new active user. The email is trimmed and lowercased first.
    #[instrument(skip_all)]
    pub async fn create(&self, input: NewUser) -> Result<User, UserError> {
        let input = input.normalized();
        let email = input.email.clone();

        let doc = self
            .store
            .insert_one(input)
            .await
            .map_err(|e| UserError::from_store(e, Some(&email)))?;

        info!(user_id = %doc.id, "user created");
        Ok(doc.into())
    }

    /// Filtered, sorted, paginated listing.
    ///
    /// The page fetch and the count run concurrently under the same filter.
    #[instrument(skip_all, fields(page = query.page_number(), page_size = query.items_per_page()))]
    pub async fn find_all(&self, query: &UserQuery) -> Result<UserPage, UserError> {
        let predicate = build_filter(query)?;
        let sort = query.sort_spec();
        let (page, page_size) = (query.page_number(), query.items_per_page());
        let window = Pagination::new(skip(page, page_size), u64::from(page_size));

        let (docs, total) = futures::future::try_join(
            self.store.find_many(&predicate, Some(sort), Some(window)),
            self.store.count(&predicate),
        )
        .await?;

        debug!(returned = docs.len(), total, "users listed");
        Ok(UserPage {
            data: docs.into_iter().map(User::from).collect(),
            meta: PaginationMeta::new(page, page_size, total),
        })
    }

    /// The active user with `id`. Deleted users are not found.
    #[instrument(skip(self))]
    pub async fn find_one(&self, id: &str) -> Result<User, UserError> {
        let user_id = parse_id(id)?;
        self.store
            .find_one(&by_id_in_state(&user_id, false))
            .await?
            .map(User::from)
            .ok_or_else(|| UserError::not_found(id, LookupState::Active))
    }

    /// Apply `changes` to the active user with `id`
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: &str, changes: UserChanges) -> Result<User, UserError> {
        let user_id = parse_id(id)?;
        let changes = changes.normalized();
        let email = changes.email.clone();

        let doc = self
            .store
            .find_one_and_update(
                &by_id_in_state(&user_id, false),
                UserPatch::changes(changes),
                UpdateOptions::after(),
            )
            .await
            .map_err(|e| UserError::from_store(e, email.as_deref()))?
            .ok_or_else(|| UserError::not_found(id, LookupState::Active))?;

        info!(user_id = %doc.id, "user updated");
        Ok(doc.into())
    }

    /// Soft-delete the active user with `id`, stamping the deletion time
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Result<(), UserError> {
        let user_id = parse_id(id)?;
        let at = self.clock.now();

        self.store
            .find_one_and_update(
                &by_id_in_state(&user_id, false),
                UserPatch::soft_delete(at),
                UpdateOptions::after(),
            )
            .await?
            .ok_or_else(|| UserError::not_found(id, LookupState::Active))?;

        info!(user_id = %user_id, deleted_at = %at, "user soft-deleted");
        Ok(())
    }

    /// Bring the deleted user with `id` back to active
    #[instrument(skip(self))]
    pub async fn restore(&self, id: &str) -> Result<User, UserError> {
        let user_id = parse_id(id)?;

        let doc = self
            .store
            .find_one_and_update(
                &by_id_in_state(&user_id, true),
                UserPatch::restore(),
                UpdateOptions::after(),
            )
            .await?
            .ok_or_else(|| UserError::not_found(id, LookupState::Deleted))?;

        info!(user_id = %doc.id, "user restored");
        Ok(doc.into())
    }

    /// Insert every candidate whose email is not already taken.
    ///
    /// One existence query covers the whole batch, then the accepted
    /// candidates go to the store in a single batch insert. A store rejection
    /// at that point (for instance a concurrent insert of the same email)
    /// fails the whole call with [`UserError::BulkInsert`].
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub async fn bulk_create(
        &self,
        candidates: Vec<NewUser>,
    ) -> Result<BulkCreateResult, UserError> {
        let candidates: Vec<NewUser> = candidates.into_iter().map(NewUser::normalized).collect();
        if candidates.is_empty() {
            return Ok(BulkCreateResult::default());
        }

        let existing: HashSet<String> = self
            .store
            .find_many(&by_emails(distinct_emails(&candidates)), None, None)
            .await?
            .into_iter()
            .map(|doc| doc.email)
            .collect();

        let plan = partition(candidates, &existing);
        let inserted_count = if plan.accepted.is_empty() {
            0
        } else {
            let inserted = self
                .store
                .insert_many(plan.accepted)
                .await
                .map_err(UserError::BulkInsert)?;
            inserted.len() as u64
        };

        info!(inserted_count, skipped = plan.skipped.len(), "bulk insert finished");
        Ok(BulkCreateResult {
            inserted_count,
            skipped: plan.skipped,
        })
    }

    /// Whether the store answers
    pub async fn ping(&self) -> Result<(), UserError> {
        self.store.ping().await.map_err(UserError::from)
    }
}

fn parse_id(raw: &str) -> Result<UserId, UserError> {
    UserId::from_str(raw).map_err(|e| UserError::InvalidId {
        id: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        Field, FilterCondition, InMemoryUserStore, Predicate, RepositoryResult, SortSpec,
    };
    use crate::users::bulk::{SkippedUser, DUPLICATE_IN_BATCH, EMAIL_EXISTS};
    use crate::users::{ManualClock, SortField, SortOrder, UserDocument};
    use chrono::{Duration, TimeZone, Utc};

    struct Harness {
        clock: Arc<ManualClock>,
        store: Arc<InMemoryUserStore>,
        service: UserService<InMemoryUserStore>,
    }

    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryUserStore::new(clock.clone()));
        let service = UserService::new(Arc::clone(&store), clock.clone());
        Harness {
            clock,
            store,
            service,
        }
    }

    fn new_user(name: &str, email: &str, age: u8) -> NewUser {
        NewUser::new(name, email, age)
    }

    async fn stored(store: &InMemoryUserStore, id: &UserId) -> UserDocument {
        store
            .find_one(&FilterCondition::eq(Field::Id, id.as_str()).into())
            .await
            .unwrap()
            .unwrap()
    }

    async fn seed(h: &Harness, users: &[(&str, &str, u8)]) -> Vec<User> {
        let mut created = Vec::new();
        for (name, email, age) in users {
            created.push(h.service.create(new_user(name, email, *age)).await.unwrap());
            h.clock.advance(Duration::seconds(1));
        }
        created
    }

    #[tokio::test]
    async fn test_create_normalizes_input() {
        let h = harness();
        let user = h
            .service
            .create(new_user("  John Smith ", " John@Example.COM ", 30))
            .await
            .unwrap();
        assert_eq!(user.name, "John Smith");
        assert_eq!(user.email, "john@example.com");
        assert_eq!(user.created_at, h.clock.now());
    }

    #[tokio::test]
    async fn test_create_rejects_email_differing_only_by_case() {
        let h = harness();
        h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        let err = h
            .service
            .create(new_user("Ann Two", "ANN@X.com", 31))
            .await
            .unwrap_err();
        match err {
            UserError::DuplicateEmail { email } => assert_eq!(email, "ann@x.com"),
            other => panic!("expected DuplicateEmail, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_email_of_deleted_user() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        h.service.remove(ann.id.as_str()).await.unwrap();
        let err = h
            .service
            .create(new_user("Ann", "ann@x.com", 30))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn test_default_listing_returns_active_only() {
        let h = harness();
        let users = seed(&h, &[("Ann", "ann@x.com", 30), ("Bob", "bob@x.com", 40)]).await;
        h.service.remove(users[0].id.as_str()).await.unwrap();

        let active = h.service.find_all(&UserQuery::default()).await.unwrap();
        assert_eq!(active.meta.total, 1);
        assert_eq!(active.data[0].email, "bob@x.com");

        let deleted = h
            .service
            .find_all(&UserQuery::default().with_deleted(true))
            .await
            .unwrap();
        assert_eq!(deleted.meta.total, 1);
        assert_eq!(deleted.data[0].email, "ann@x.com");
    }

    #[tokio::test]
    async fn test_search_matches_name_or_email_case_insensitively() {
        let h = harness();
        seed(
            &h,
            &[
                ("John Smith", "smith@x.com", 30),
                ("Info Desk", "info@johnstone.com", 40),
                ("Jane Doe", "jane@x.com", 50),
            ],
        )
        .await;

        let page = h
            .service
            .find_all(
                &UserQuery::default()
                    .with_search("john")
                    .with_sort(SortField::Name, SortOrder::Asc),
            )
            .await
            .unwrap();
        let names: Vec<_> = page.data.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Info Desk", "John Smith"]);
        assert_eq!(page.meta.total, 2);
    }

    #[tokio::test]
    async fn test_age_bounds_are_inclusive() {
        let h = harness();
        seed(
            &h,
            &[("A", "a@x.com", 17), ("B", "b@x.com", 18), ("C", "c@x.com", 65), ("D", "d@x.com", 66)],
        )
        .await;

        let page = h
            .service
            .find_all(
                &UserQuery::default()
                    .with_age_range(Some(18), Some(65))
                    .with_sort(SortField::Age, SortOrder::Asc),
            )
            .await
            .unwrap();
        let ages: Vec<_> = page.data.iter().map(|u| u.age).collect();
        assert_eq!(ages, [18, 65]);
    }

    #[tokio::test]
    async fn test_contradictory_age_bounds_fail_without_querying() {
        let h = harness();
        h.store.set_available(false);
        let err = h
            .service
            .find_all(&UserQuery::default().with_age_range(Some(18), Some(17)))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::InvalidFilter(_)));
    }

    #[tokio::test]
    async fn test_pagination_meta_and_pages_past_end() {
        let h = harness();
        let rows: Vec<(String, String)> = (0..25)
            .map(|i| (format!("User {i:02}"), format!("u{i}@x.com")))
            .collect();
        for (name, email) in &rows {
            h.service.create(new_user(name, email, 30)).await.unwrap();
            h.clock.advance(Duration::seconds(1));
        }

        let query = UserQuery::default()
            .with_page(3)
            .with_page_size(10)
            .with_sort(SortField::Name, SortOrder::Asc);
        let page = h.service.find_all(&query).await.unwrap();
        assert_eq!(page.data.len(), 5);
        assert_eq!(page.data[0].name, "User 20");
        assert_eq!(
            page.meta,
            PaginationMeta {
                total: 25,
                page: 3,
                page_size: 10,
                total_pages: 3
            }
        );

        let past_end = h.service.find_all(&query.with_page(7)).await.unwrap();
        assert!(past_end.data.is_empty());
        assert_eq!(past_end.meta.total, 25);
        assert_eq!(past_end.meta.total_pages, 3);
    }

    #[tokio::test]
    async fn test_default_sort_is_newest_first() {
        let h = harness();
        seed(&h, &[("Old", "old@x.com", 30), ("New", "new@x.com", 30)]).await;
        let page = h.service.find_all(&UserQuery::default()).await.unwrap();
        assert_eq!(page.data[0].name, "New");
        assert_eq!(page.data[1].name, "Old");
    }

    #[tokio::test]
    async fn test_sort_ties_keep_insertion_order() {
        let h = harness();
        for email in ["a@x.com", "b@x.com", "c@x.com"] {
            h.service.create(new_user("Same", email, 30)).await.unwrap();
        }
        let page = h.service.find_all(&UserQuery::default()).await.unwrap();
        let emails: Vec<_> = page.data.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, ["a@x.com", "b@x.com", "c@x.com"]);
    }

    #[tokio::test]
    async fn test_unavailable_store_surfaces_as_store_unavailable() {
        let h = harness();
        h.store.set_available(false);
        let err = h.service.find_all(&UserQuery::default()).await.unwrap_err();
        assert!(matches!(err, UserError::StoreUnavailable(_)));
        assert!(h.service.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_id_rejected_before_store_access() {
        let h = harness();
        h.store.set_available(false);
        for result in [
            h.service.find_one("not-an-id").await.map(|_| ()),
            h.service.remove("user_123").await,
            h.service.restore("req_01h455vb4pex5vsknk084sn02q").await.map(|_| ()),
            h.service
                .update("", UserChanges::default().with_age(3))
                .await
                .map(|_| ()),
        ] {
            assert!(matches!(result, Err(UserError::InvalidId { .. })));
        }
    }

    #[tokio::test]
    async fn test_find_one_hides_deleted_users() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        assert_eq!(h.service.find_one(ann.id.as_str()).await.unwrap(), ann);

        h.service.remove(ann.id.as_str()).await.unwrap();
        let err = h.service.find_one(ann.id.as_str()).await.unwrap_err();
        assert!(matches!(
            err,
            UserError::NotFound {
                state: LookupState::Active,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_applies_only_provided_fields() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        h.clock.advance(Duration::minutes(1));

        let updated = h
            .service
            .update(ann.id.as_str(), UserChanges::default().with_name(" Anne "))
            .await
            .unwrap();
        assert_eq!(updated.name, "Anne");
        assert_eq!(updated.email, "ann@x.com");
        assert_eq!(updated.age, 30);
        assert_eq!(updated.created_at, ann.created_at);
        assert_eq!(updated.updated_at, h.clock.now());
    }

    #[tokio::test]
    async fn test_update_email_collision_and_missing_user() {
        let h = harness();
        let users = seed(&h, &[("Ann", "ann@x.com", 30), ("Bob", "bob@x.com", 40)]).await;

        let err = h
            .service
            .update(users[0].id.as_str(), UserChanges::default().with_email("BOB@x.com"))
            .await
            .unwrap_err();
        match err {
            UserError::DuplicateEmail { email } => assert_eq!(email, "bob@x.com"),
            other => panic!("expected DuplicateEmail, got {other:?}"),
        }

        h.service.remove(users[1].id.as_str()).await.unwrap();
        let err = h
            .service
            .update(users[1].id.as_str(), UserChanges::default().with_age(41))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::NotFound { .. }));

        let err = h
            .service
            .update(UserId::new().as_str(), UserChanges::default().with_age(41))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_remove_stamps_deletion_time() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        h.clock.advance(Duration::hours(2));
        h.service.remove(ann.id.as_str()).await.unwrap();

        let doc = stored(&h.store, &ann.id).await;
        assert!(doc.is_deleted());
        assert_eq!(doc.deleted_at(), Some(h.clock.now()));
        assert_eq!(doc.is_deleted(), doc.deleted_at().is_some());
    }

    #[tokio::test]
    async fn test_remove_twice_and_restore_active_are_not_found() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();

        let err = h.service.restore(ann.id.as_str()).await.unwrap_err();
        assert!(matches!(
            err,
            UserError::NotFound {
                state: LookupState::Deleted,
                ..
            }
        ));

        h.service.remove(ann.id.as_str()).await.unwrap();
        let err = h.service.remove(ann.id.as_str()).await.unwrap_err();
        assert!(matches!(
            err,
            UserError::NotFound {
                state: LookupState::Active,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_remove_then_restore_round_trip() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "ann@x.com", 30)).await.unwrap();
        h.clock.advance(Duration::minutes(5));
        h.service.remove(ann.id.as_str()).await.unwrap();
        h.clock.advance(Duration::minutes(5));

        let restored = h.service.restore(ann.id.as_str()).await.unwrap();
        assert_eq!(restored.id, ann.id);
        assert_eq!(restored.name, ann.name);
        assert_eq!(restored.email, ann.email);
        assert_eq!(restored.age, ann.age);
        assert_eq!(restored.created_at, ann.created_at);
        assert_eq!(restored.updated_at, h.clock.now());

        let doc = stored(&h.store, &ann.id).await;
        assert!(!doc.is_deleted());
        assert_eq!(doc.deleted_at(), None);

        // may be removed again
        h.service.remove(ann.id.as_str()).await.unwrap();
    }

    #[tokio::test]
    async fn test_bulk_skips_existing_emails() {
        let h = harness();
        h.service.create(new_user("Ann", "a@x.com", 30)).await.unwrap();

        let result = h
            .service
            .bulk_create(vec![new_user("A", "a@x.com", 20), new_user("B", "b@x.com", 21)])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 1);
        assert_eq!(result.skipped, vec![SkippedUser::new("a@x.com", EMAIL_EXISTS)]);

        let b = h
            .store
            .find_one(&FilterCondition::eq(Field::Email, "b@x.com").into())
            .await
            .unwrap();
        assert!(b.is_some());
        assert_eq!(h.store.len().await, 2);
    }

    #[tokio::test]
    async fn test_bulk_matches_existing_case_insensitively_and_deleted() {
        let h = harness();
        let ann = h.service.create(new_user("Ann", "a@x.com", 30)).await.unwrap();
        h.service.remove(ann.id.as_str()).await.unwrap();

        let result = h
            .service
            .bulk_create(vec![new_user("A", " A@X.COM", 20)])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 0);
        assert_eq!(result.skipped, vec![SkippedUser::new("a@x.com", EMAIL_EXISTS)]);
    }

    #[tokio::test]
    async fn test_bulk_deduplicates_within_batch() {
        let h = harness();
        let result = h
            .service
            .bulk_create(vec![
                new_user("First", "dup@x.com", 20),
                new_user("Other", "other@x.com", 21),
                new_user("Second", "DUP@x.com", 22),
            ])
            .await
            .unwrap();
        assert_eq!(result.inserted_count, 2);
        assert_eq!(
            result.skipped,
            vec![SkippedUser::new("dup@x.com", DUPLICATE_IN_BATCH)]
        );

        let kept = h
            .store
            .find_one(&FilterCondition::eq(Field::Email, "dup@x.com").into())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.name, "First");
    }

    #[tokio::test]
    async fn test_bulk_empty_batch() {
        let h = harness();
        let result = h.service.bulk_create(Vec::new()).await.unwrap();
        assert_eq!(result, BulkCreateResult::default());
    }

    /// Store whose existence check never sees anything, as if a concurrent
    /// writer slipped in between the check and the insert.
    struct BlindStore(InMemoryUserStore);

    impl UserStore for BlindStore {
        async fn find_many(
            &self,
            _predicate: &Predicate,
            _sort: Option<SortSpec>,
            _window: Option<Pagination>,
        ) -> RepositoryResult<Vec<UserDocument>> {
            Ok(Vec::new())
        }

        async fn count(&self, predicate: &Predicate) -> RepositoryResult<u64> {
            self.0.count(predicate).await
        }

        async fn find_one(&self, predicate: &Predicate) -> RepositoryResult<Option<UserDocument>> {
            self.0.find_one(predicate).await
        }

        async fn insert_one(&self, user: NewUser) -> RepositoryResult<UserDocument> {
            self.0.insert_one(user).await
        }

        async fn insert_many(&self, users: Vec<NewUser>) -> RepositoryResult<Vec<UserDocument>> {
            self.0.insert_many(users).await
        }

        async fn find_one_and_update(
            &self,
            predicate: &Predicate,
            patch: UserPatch,
            options: UpdateOptions,
        ) -> RepositoryResult<Option<UserDocument>> {
            self.0.find_one_and_update(predicate, patch, options).await
        }

        async fn ping(&self) -> RepositoryResult<()> {
            self.0.ping().await
        }
    }

    #[tokio::test]
    async fn test_bulk_insert_race_fails_whole_call() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = Arc::new(BlindStore(InMemoryUserStore::new(clock.clone())));
        let service = UserService::new(Arc::clone(&store), clock);

        service.create(new_user("Ann", "a@x.com", 30)).await.unwrap();
        let err = service
            .bulk_create(vec![new_user("B", "b@x.com", 20), new_user("A", "a@x.com", 21)])
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::BulkInsert(_)));
        assert_eq!(store.0.len().await, 1);
    }
}
