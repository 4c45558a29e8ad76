//! Translation of list queries and lifecycle lookups into store predicates

use crate::ids::UserId;
use crate::repository::{Field, FilterCondition, Predicate};

use super::error::UserError;
use super::query::UserQuery;

/// Build the listing predicate for `query`.
///
/// The result is a conjunction of the deletion-state match, an optional
/// name/email search disjunction, and optional age bounds.
pub fn build_filter(query: &UserQuery) -> Result<Predicate, UserError> {
    if let (Some(min), Some(max)) = (query.min_age, query.max_age) {
        if min > max {
            return Err(UserError::InvalidFilter(format!(
                "minAge ({min}) must not be greater than maxAge ({max})"
            )));
        }
    }

    let mut clauses: Vec<Predicate> =
        vec![FilterCondition::eq(Field::IsDeleted, query.deleted()).into()];

    if let Some(term) = query.search_term() {
        clauses.push(Predicate::any([
            FilterCondition::contains(Field::Name, term).into(),
            FilterCondition::contains(Field::Email, term).into(),
        ]));
    }
    if let Some(min) = query.min_age {
        clauses.push(FilterCondition::gte(Field::Age, i64::from(min)).into());
    }
    if let Some(max) = query.max_age {
        clauses.push(FilterCondition::lte(Field::Age, i64::from(max)).into());
    }

    Ok(Predicate::All(clauses))
}

/// The record with `id` in the given deletion state
pub fn by_id_in_state(id: &UserId, deleted: bool) -> Predicate {
    Predicate::all([
        FilterCondition::eq(Field::Id, id.as_str()).into(),
        FilterCondition::eq(Field::IsDeleted, deleted).into(),
    ])
}

/// Records in any deletion state whose email is one of `emails`
pub fn by_emails(emails: Vec<String>) -> Predicate {
    FilterCondition::in_strings(Field::Email, emails).into()
}
