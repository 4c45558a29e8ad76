//! List query for users
//!
//! ```rust
//! use user_registry::users::{SortField, SortOrder, UserQuery};
//!
//! let query = UserQuery::default()
//!     .with_search("john")
//!     .with_age_range(Some(18), None)
//!     .with_page(2)
//!     .with_sort(SortField::Name, SortOrder::Asc);
//!
//! assert_eq!(query.page_number(), 2);
//! assert_eq!(query.items_per_page(), 10);
//! assert!(!query.deleted());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::repository::{Field, OrderDirection, SortSpec};

/// Default number of users per page
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Maximum allowed users per page
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction. Listings default to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl From<SortOrder> for OrderDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Self::Ascending,
            SortOrder::Desc => Self::Descending,
        }
    }
}

/// Fields a listing may be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Name,
    Email,
    Age,
}

impl From<SortField> for Field {
    fn from(field: SortField) -> Self {
        match field {
            SortField::CreatedAt => Self::CreatedAt,
            SortField::UpdatedAt => Self::UpdatedAt,
            SortField::Name => Self::Name,
            SortField::Email => Self::Email,
            SortField::Age => Self::Age,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Field::from(*self).fmt(f)
    }
}

/// Query parameters for listing users
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct UserQuery {
    /// Case-insensitive substring matched against name and email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    /// Minimum age, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,

    /// Maximum age, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,

    /// List deleted users instead of active ones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_deleted: Option<bool>,

    /// Page number (1-indexed). None defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,

    /// None defaults to [`DEFAULT_PAGE_SIZE`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,

    /// Field to sort by, `createdAt` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[param(inline)]
    pub sort_by: Option<SortField>,

    /// `asc` or `desc`, `desc` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[param(inline)]
    pub sort_order: Option<SortOrder>,
}

impl UserQuery {
    /// Page number, at least 1
    #[must_use]
    pub fn page_number(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Page size, clamped to `1..=MAX_PAGE_SIZE`
    #[must_use]
    pub fn items_per_page(&self) -> u32 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    /// Whether deleted users are requested
    #[must_use]
    pub fn deleted(&self) -> bool {
        self.is_deleted.unwrap_or(false)
    }

    /// Search term, if present and not blank
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn sort_spec(&self) -> SortSpec {
        SortSpec::new(
            self.sort_by.unwrap_or_default().into(),
            self.sort_order.unwrap_or_default().into(),
        )
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_age_range(mut self, min_age: Option<u32>, max_age: Option<u32>) -> Self {
        self.min_age = min_age;
        self.max_age = max_age;
        self
    }

    #[must_use]
    pub fn with_deleted(mut self, is_deleted: bool) -> Self {
        self.is_deleted = Some(is_deleted);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = Some(order);
        self
    }
}
