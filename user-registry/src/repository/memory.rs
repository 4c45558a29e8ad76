//! In-process [`UserStore`] backed by a vector of documents
//!
//! Natural order is insertion order. All writes go through one
//! `tokio::sync::RwLock`, which makes every conditional update and every batch
//! insert atomic. A secondary map from normalized email to id acts as the
//! unique index.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::error::{RepositoryError, RepositoryOperation};
use super::predicate::{
    Field, FilterCondition, FilterOperator, FilterValue, OrderDirection, Pagination, Predicate,
    SortSpec,
};
use super::traits::{RepositoryResult, UpdateOptions, UserStore};
use crate::ids::UserId;
use crate::users::{Clock, Lifecycle, NewUser, SystemClock, UserDocument, UserPatch};

const EMAIL_INDEX: &str = "email";

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<UserDocument>,
    emails: HashMap<String, UserId>,
}

impl Collection {
    fn position(&self, predicate: &Predicate) -> Option<usize> {
        self.documents.iter().position(|doc| matches(predicate, doc))
    }
}

/// In-memory user store
pub struct InMemoryUserStore {
    collection: RwLock<Collection>,
    clock: Arc<dyn Clock>,
    available: AtomicBool,
}

impl InMemoryUserStore {
    /// Create an empty store stamping documents with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            collection: RwLock::new(Collection::default()),
            clock,
            available: AtomicBool::new(true),
        }
    }

    /// Toggle simulated availability. While unavailable every call fails
    /// with a `ConnectionFailed` error.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, AtomicOrdering::SeqCst);
    }

    /// Number of stored documents in any deletion state
    pub async fn len(&self) -> usize {
        self.collection.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_available(&self, operation: RepositoryOperation) -> RepositoryResult<()> {
        if self.available.load(AtomicOrdering::SeqCst) {
            Ok(())
        } else {
            Err(RepositoryError::connection_failed(
                operation,
                "in-memory store is unavailable",
            ))
        }
    }

    fn document(&self, user: NewUser, now: DateTime<Utc>) -> UserDocument {
        UserDocument {
            id: UserId::new(),
            name: user.name,
            email: user.email,
            age: user.age,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl std::fmt::Debug for InMemoryUserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryUserStore")
            .field("available", &self.available.load(AtomicOrdering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl UserStore for InMemoryUserStore {
    async fn find_many(
        &self,
        predicate: &Predicate,
        sort: Option<SortSpec>,
        window: Option<Pagination>,
    ) -> RepositoryResult<Vec<UserDocument>> {
        self.ensure_available(RepositoryOperation::FindMany)?;
        let collection = self.collection.read().await;

        let mut found: Vec<&UserDocument> = collection
            .documents
            .iter()
            .filter(|doc| matches(predicate, doc))
            .collect();

        if let Some(sort) = sort {
            // stable: ties keep insertion order
            found.sort_by(|a, b| match sort.direction {
                OrderDirection::Ascending => compare_field(sort.field, a, b),
                OrderDirection::Descending => compare_field(sort.field, b, a),
            });
        }

        let (skip, take) = match window {
            Some(w) => (
                usize::try_from(w.offset).unwrap_or(usize::MAX),
                usize::try_from(w.limit).unwrap_or(usize::MAX),
            ),
            None => (0, usize::MAX),
        };

        Ok(found.into_iter().skip(skip).take(take).cloned().collect())
    }

    async fn count(&self, predicate: &Predicate) -> RepositoryResult<u64> {
        self.ensure_available(RepositoryOperation::Count)?;
        let collection = self.collection.read().await;
        let count = collection
            .documents
            .iter()
            .filter(|doc| matches(predicate, doc))
            .count();
        Ok(count as u64)
    }

    async fn find_one(&self, predicate: &Predicate) -> RepositoryResult<Option<UserDocument>> {
        self.ensure_available(RepositoryOperation::FindOne)?;
        let collection = self.collection.read().await;
        Ok(collection
            .position(predicate)
            .map(|i| collection.documents[i].clone()))
    }

    async fn insert_one(&self, user: NewUser) -> RepositoryResult<UserDocument> {
        self.ensure_available(RepositoryOperation::InsertOne)?;
        let mut collection = self.collection.write().await;

        if collection.emails.contains_key(&user.email) {
            return Err(RepositoryError::duplicate_key(
                RepositoryOperation::InsertOne,
                EMAIL_INDEX,
                user.email,
            ));
        }

        let doc = self.document(user, self.clock.now());
        collection.emails.insert(doc.email.clone(), doc.id.clone());
        collection.documents.push(doc.clone());
        Ok(doc)
    }

    async fn insert_many(&self, users: Vec<NewUser>) -> RepositoryResult<Vec<UserDocument>> {
        self.ensure_available(RepositoryOperation::InsertMany)?;
        let mut collection = self.collection.write().await;

        let mut batch = HashSet::with_capacity(users.len());
        for user in &users {
            if collection.emails.contains_key(&user.email) || !batch.insert(user.email.as_str()) {
                return Err(RepositoryError::duplicate_key(
                    RepositoryOperation::InsertMany,
                    EMAIL_INDEX,
                    user.email.clone(),
                ));
            }
        }

        let now = self.clock.now();
        let inserted: Vec<UserDocument> = users
            .into_iter()
            .map(|user| self.document(user, now))
            .collect();

        for doc in &inserted {
            collection.emails.insert(doc.email.clone(), doc.id.clone());
            collection.documents.push(doc.clone());
        }
        Ok(inserted)
    }

    async fn find_one_and_update(
        &self,
        predicate: &Predicate,
        patch: UserPatch,
        options: UpdateOptions,
    ) -> RepositoryResult<Option<UserDocument>> {
        self.ensure_available(RepositoryOperation::FindOneAndUpdate)?;
        let mut collection = self.collection.write().await;

        let Some(index) = collection.position(predicate) else {
            return Ok(None);
        };

        let id = collection.documents[index].id.clone();
        let old_email = collection.documents[index].email.clone();

        if let Some(email) = &patch.changes.email {
            if collection.emails.get(email).is_some_and(|owner| *owner != id) {
                return Err(RepositoryError::duplicate_key(
                    RepositoryOperation::FindOneAndUpdate,
                    EMAIL_INDEX,
                    email.clone(),
                ));
            }
        }

        let now = self.clock.now();
        let doc = &mut collection.documents[index];
        let before = doc.clone();
        patch.apply_to(doc);
        doc.updated_at = now;
        let after = doc.clone();

        if after.email != old_email {
            collection.emails.remove(&old_email);
            collection.emails.insert(after.email.clone(), id);
        }

        Ok(Some(if options.return_updated { after } else { before }))
    }

    async fn ping(&self) -> RepositoryResult<()> {
        self.ensure_available(RepositoryOperation::Ping)
    }
}

/// A document field lifted into a comparable value
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum FieldValue<'a> {
    Text(&'a str),
    Integer(i64),
    Boolean(bool),
    Time(DateTime<Utc>),
}

fn field_value(field: Field, doc: &UserDocument) -> FieldValue<'_> {
    match field {
        Field::Id => FieldValue::Text(doc.id.as_str()),
        Field::Name => FieldValue::Text(&doc.name),
        Field::Email => FieldValue::Text(&doc.email),
        Field::Age => FieldValue::Integer(i64::from(doc.age)),
        Field::IsDeleted => FieldValue::Boolean(doc.is_deleted()),
        Field::CreatedAt => FieldValue::Time(doc.created_at),
        Field::UpdatedAt => FieldValue::Time(doc.updated_at),
    }
}

fn compare_field(field: Field, a: &UserDocument, b: &UserDocument) -> Ordering {
    field_value(field, a).cmp(&field_value(field, b))
}

fn matches(predicate: &Predicate, doc: &UserDocument) -> bool {
    match predicate {
        Predicate::All(children) => children.iter().all(|p| matches(p, doc)),
        Predicate::Any(children) => children.iter().any(|p| matches(p, doc)),
        Predicate::Condition(condition) => condition_holds(condition, doc),
    }
}

fn condition_holds(condition: &FilterCondition, doc: &UserDocument) -> bool {
    let actual = field_value(condition.field, doc);
    match (condition.operator, &condition.value) {
        (FilterOperator::Contains, FilterValue::String(needle)) => match actual {
            FieldValue::Text(text) => text.to_lowercase().contains(&needle.to_lowercase()),
            _ => false,
        },
        (FilterOperator::In, FilterValue::StringList(values)) => match actual {
            FieldValue::Text(text) => values.iter().any(|v| v == text),
            _ => false,
        },
        (operator, value) => {
            let expected = match value {
                FilterValue::String(s) => FieldValue::Text(s),
                FilterValue::Integer(n) => FieldValue::Integer(*n),
                FilterValue::Boolean(b) => FieldValue::Boolean(*b),
                FilterValue::StringList(_) => return false,
            };
            // values of different kinds never compare
            if std::mem::discriminant(&actual) != std::mem::discriminant(&expected) {
                return false;
            }
            match operator {
                FilterOperator::Equal => actual == expected,
                FilterOperator::GreaterThanOrEqual => actual >= expected,
                FilterOperator::LessThanOrEqual => actual <= expected,
                FilterOperator::Contains | FilterOperator::In => false,
            }
        }
    }
}
