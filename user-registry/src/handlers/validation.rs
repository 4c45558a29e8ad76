//! Request bodies and their boundary checks
//!
//! Shape rules are enforced here, before the engine is called:
//! name 2-100 characters, a plausible email, age 1-150.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::config::QueryConfig;
use crate::users::{NewUser, UserChanges, UserQuery, MAX_PAGE_SIZE};

use super::error::ApiError;

pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 100;
pub const AGE_MIN: i64 = 1;
pub const AGE_MAX: i64 = 150;

/// local@domain.tld, no whitespace
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Body of `POST /users` and one item of `POST /users/bulk`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// 2 to 100 characters
    #[schema(example = "John Smith")]
    pub name: String,
    #[schema(example = "john@example.com")]
    pub email: String,
    /// 1 to 150
    #[schema(example = 30)]
    pub age: i64,
}

/// Body of `PATCH /users/{id}`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub age: Option<i64>,
}

/// Body of `POST /users/bulk`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BulkCreateRequest {
    pub users: Vec<CreateUserRequest>,
}

fn check_name(name: &str, problems: &mut Vec<String>) {
    let len = name.trim().chars().count();
    if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
        problems.push(format!(
            "name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters"
        ));
    }
}

fn check_email(email: &str, problems: &mut Vec<String>) {
    if !EMAIL_REGEX.is_match(email.trim()) {
        problems.push("email must be an email".to_string());
    }
}

fn check_age(age: i64, problems: &mut Vec<String>) -> Option<u8> {
    if (AGE_MIN..=AGE_MAX).contains(&age) {
        u8::try_from(age).ok()
    } else {
        problems.push(format!("age must be between {AGE_MIN} and {AGE_MAX}"));
        None
    }
}

fn finish<T>(value: Option<T>, problems: Vec<String>) -> Result<T, ApiError> {
    match value {
        Some(value) if problems.is_empty() => Ok(value),
        _ => Err(ApiError::validation_failed(problems.join("; "))),
    }
}

impl CreateUserRequest {
    fn problems(&self) -> (Option<u8>, Vec<String>) {
        let mut problems = Vec::new();
        check_name(&self.name, &mut problems);
        check_email(&self.email, &mut problems);
        let age = check_age(self.age, &mut problems);
        (age, problems)
    }

    pub fn validate(self) -> Result<NewUser, ApiError> {
        let (age, problems) = self.problems();
        let age = finish(age, problems)?;
        Ok(NewUser::new(self.name, self.email, age))
    }
}

impl UpdateUserRequest {
    /// At least one field must be present, and every present field must be valid
    pub fn validate(self) -> Result<UserChanges, ApiError> {
        let mut problems = Vec::new();
        if self.name.is_none() && self.email.is_none() && self.age.is_none() {
            problems.push("at least one of name, email, age must be provided".to_string());
        }
        if let Some(name) = &self.name {
            check_name(name, &mut problems);
        }
        if let Some(email) = &self.email {
            check_email(email, &mut problems);
        }
        let age = match self.age {
            Some(age) => check_age(age, &mut problems).map(Some),
            None => Some(None),
        };
        let age = finish(age, problems)?;

        Ok(UserChanges {
            name: self.name,
            email: self.email,
            age,
        })
    }
}

impl BulkCreateRequest {
    /// Every item must be valid; problems name the item index. An empty list is fine.
    pub fn validate(self) -> Result<Vec<NewUser>, ApiError> {
        let mut problems = Vec::new();
        let mut users = Vec::with_capacity(self.users.len());
        for (index, item) in self.users.into_iter().enumerate() {
            let (age, item_problems) = item.problems();
            match age {
                Some(age) if item_problems.is_empty() => {
                    users.push(NewUser::new(item.name, item.email, age));
                }
                _ => problems.extend(
                    item_problems
                        .into_iter()
                        .map(|p| format!("users[{index}]: {p}")),
                ),
            }
        }

        if problems.is_empty() {
            Ok(users)
        } else {
            Err(ApiError::validation_failed(problems.join("; ")))
        }
    }
}

/// Check list parameters against the configured limits and fill defaults
pub fn validate_query(mut query: UserQuery, limits: &QueryConfig) -> Result<UserQuery, ApiError> {
    let mut problems = Vec::new();

    if query.min_age.is_some_and(|min| i64::from(min) < AGE_MIN) {
        problems.push(format!("minAge must not be less than {AGE_MIN}"));
    }
    if query.max_age.is_some_and(|max| i64::from(max) > AGE_MAX) {
        problems.push(format!("maxAge must not be greater than {AGE_MAX}"));
    }
    if query.page == Some(0) {
        problems.push("page must not be less than 1".to_string());
    }
    // configured limits never exceed what the engine serves
    let max_page_size = limits.max_page_size.clamp(1, MAX_PAGE_SIZE);
    match query.page_size {
        Some(size) if size < 1 || size > max_page_size => {
            problems.push(format!("pageSize must be between 1 and {max_page_size}"));
        }
        None => query.page_size = Some(limits.default_page_size.clamp(1, max_page_size)),
        _ => {}
    }

    if problems.is_empty() {
        Ok(query)
    } else {
        Err(ApiError::validation_failed(problems.join("; ")).with_operation(super::ApiOperation::List))
    }
}
