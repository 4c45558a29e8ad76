//! Deduplication plan for bulk inserts

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::model::NewUser;

/// Skip reason for a candidate whose email is already stored
pub const EMAIL_EXISTS: &str = "Email already exists";

/// Skip reason for a repeat of an email earlier in the same batch
pub const DUPLICATE_IN_BATCH: &str = "Duplicate email in request";

/// A candidate left out of a bulk insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SkippedUser {
    pub email: String,
    pub reason: String,
}

impl SkippedUser {
    pub fn new(email: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            reason: reason.into(),
        }
    }
}

/// Outcome of a bulk insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResult {
    pub inserted_count: u64,
    pub skipped: Vec<SkippedUser>,
}

/// Candidates split into what will be inserted and what will not
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkPlan {
    pub accepted: Vec<NewUser>,
    pub skipped: Vec<SkippedUser>,
}

/// Distinct emails of `candidates`, in first-seen order
pub fn distinct_emails(candidates: &[NewUser]) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .iter()
        .filter(|c| seen.insert(c.email.as_str()))
        .map(|c| c.email.clone())
        .collect()
}

/// Partition normalized `candidates` against the set of stored emails.
///
/// Both output lists keep input order. Within the batch the first occurrence
/// of an email wins.
pub fn partition(candidates: Vec<NewUser>, existing: &HashSet<String>) -> BulkPlan {
    let mut plan = BulkPlan::default();
    let mut taken: HashSet<String> = HashSet::new();

    for candidate in candidates {
        if existing.contains(&candidate.email) {
            plan.skipped.push(SkippedUser::new(candidate.email, EMAIL_EXISTS));
        } else if !taken.insert(candidate.email.clone()) {
            plan.skipped
                .push(SkippedUser::new(candidate.email, DUPLICATE_IN_BATCH));
        } else {
            plan.accepted.push(candidate);
        }
    }
    plan
}
