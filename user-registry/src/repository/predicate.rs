//! Backend-agnostic query description: predicates, sorting and pagination
//!
//! A [`Predicate`] is a tagged tree of conjunctions, disjunctions and single
//! field comparisons. Stores translate it into their own query language (or,
//! for the in-memory store, evaluate it directly).
//!
//! ```rust
//! use user_registry::repository::{Field, FilterCondition, OrderDirection, Pagination, Predicate, SortSpec};
//!
//! let filter = Predicate::all([
//!     FilterCondition::eq(Field::IsDeleted, false).into(),
//!     FilterCondition::gte(Field::Age, 18).into(),
//! ]);
//! let sort = SortSpec::new(Field::CreatedAt, OrderDirection::Descending);
//! let pagination = Pagination::page(2, 10);
//! assert_eq!(pagination.offset, 10);
//! ```

use std::fmt;

/// Fields of a stored user that can be filtered or sorted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    Email,
    Age,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id => write!(f, "id"),
            Self::Name => write!(f, "name"),
            Self::Email => write!(f, "email"),
            Self::Age => write!(f, "age"),
            Self::IsDeleted => write!(f, "isDeleted"),
            Self::CreatedAt => write!(f, "createdAt"),
            Self::UpdatedAt => write!(f, "updatedAt"),
        }
    }
}

/// Direction for ordering results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

/// Sort specification: one field and a direction.
///
/// Ties keep the store's natural order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: Field,
    pub direction: OrderDirection,
}

impl SortSpec {
    #[must_use]
    pub const fn new(field: Field, direction: OrderDirection) -> Self {
        Self { field, direction }
    }
}

/// Skip/limit window applied after filtering and sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Number of results to skip
    pub offset: u64,
    /// Maximum number of results to return
    pub limit: u64,
}

impl Pagination {
    /// Create new pagination parameters
    #[must_use]
    pub const fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Pagination for a specific page number (1-indexed)
    ///
    /// ```rust
    /// use user_registry::repository::Pagination;
    ///
    /// let page3 = Pagination::page(3, 20);
    /// assert_eq!(page3.offset, 40);
    /// assert_eq!(page3.limit, 20);
    /// ```
    #[must_use]
    pub const fn page(page_number: u64, page_size: u64) -> Self {
        let offset = page_number.saturating_sub(1).saturating_mul(page_size);
        Self {
            offset,
            limit: page_size,
        }
    }
}

/// Comparison operators for filter conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Greater than or equal to (>=)
    GreaterThanOrEqual,
    /// Less than or equal to (<=)
    LessThanOrEqual,
    /// Case-insensitive substring match
    Contains,
    /// Value is in a list (IN)
    In,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::GreaterThanOrEqual => write!(f, ">="),
            Self::LessThanOrEqual => write!(f, "<="),
            Self::Contains => write!(f, "CONTAINS"),
            Self::In => write!(f, "IN"),
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    /// List of string values (for IN operator)
    StringList(Vec<String>),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<u8> for FilterValue {
    fn from(n: u8) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(list: Vec<String>) -> Self {
        Self::StringList(list)
    }
}

/// A single field comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    /// The field to filter on
    pub field: Field,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    pub fn new(field: Field, operator: FilterOperator, value: impl Into<FilterValue>) -> Self {
        Self {
            field,
            operator,
            value: value.into(),
        }
    }

    /// field = value
    pub fn eq(field: Field, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value)
    }

    /// field >= value
    pub fn gte(field: Field, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::GreaterThanOrEqual, value)
    }

    /// field <= value
    pub fn lte(field: Field, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::LessThanOrEqual, value)
    }

    /// Case-insensitive substring match. The needle is matched literally.
    pub fn contains(field: Field, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Contains, FilterValue::String(needle.into()))
    }

    /// field IN (values)
    pub fn in_strings(field: Field, values: Vec<String>) -> Self {
        Self::new(field, FilterOperator::In, FilterValue::StringList(values))
    }
}

/// Predicate tree consumed by [`UserStore`](super::UserStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Every child must hold. An empty conjunction matches everything.
    All(Vec<Predicate>),
    /// At least one child must hold. An empty disjunction matches nothing.
    Any(Vec<Predicate>),
    /// A single field comparison
    Condition(FilterCondition),
}

impl Predicate {
    pub fn all(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::All(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Any(children.into_iter().collect())
    }

    /// Matches every document
    pub fn everything() -> Self {
        Self::All(Vec::new())
    }
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str| {
            write!(f, "(")?;
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    write!(f, " {} ", sep)?;
                }
                write!(f, "{}", child)?;
            }
            write!(f, ")")
        };
        match self {
            Self::All(children) if children.is_empty() => write!(f, "TRUE"),
            Self::Any(children) if children.is_empty() => write!(f, "FALSE"),
            Self::All(children) => join(f, children, "AND"),
            Self::Any(children) => join(f, children, "OR"),
            Self::Condition(c) => write!(f, "{} {} {:?}", c.field, c.operator, c.value),
        }
    }
}
