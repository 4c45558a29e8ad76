//! User record types: stored form, public projection, inputs and patches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ids::UserId;

/// Deletion state of a record.
///
/// A single enum keeps `isDeleted` and `deletedAt` from ever disagreeing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Active,
    Deleted {
        at: DateTime<Utc>,
    },
}

impl Lifecycle {
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }
}

/// A user record as held by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: u8,
    #[serde(skip)]
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDocument {
    pub fn is_deleted(&self) -> bool {
        self.lifecycle.is_deleted()
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.lifecycle.deleted_at()
    }
}

/// Public projection of a user; deletion state is not exposed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "user_01h455vb4pex5vsknk084sn02q")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub age: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDocument> for User {
    fn from(doc: UserDocument) -> Self {
        Self {
            id: doc.id,
            name: doc.name,
            email: doc.email,
            age: doc.age,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

/// Canonical form of an email: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Input for creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: u8,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, age: u8) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            age,
        }
    }

    /// Trim the name, trim and lowercase the email
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            age: self.age,
        }
    }
}

/// Field changes for an update. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.age.is_none()
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.map(|n| n.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            age: self.age,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn with_age(mut self, age: u8) -> Self {
        self.age = Some(age);
        self
    }
}

/// Everything a conditional update may set on a document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub changes: UserChanges,
    /// New deletion state, if the update moves the record through its lifecycle
    pub lifecycle: Option<Lifecycle>,
}

impl UserPatch {
    pub fn changes(changes: UserChanges) -> Self {
        Self {
            changes,
            lifecycle: None,
        }
    }

    pub fn soft_delete(at: DateTime<Utc>) -> Self {
        Self {
            changes: UserChanges::default(),
            lifecycle: Some(Lifecycle::Deleted { at }),
        }
    }

    pub fn restore() -> Self {
        Self {
            changes: UserChanges::default(),
            lifecycle: Some(Lifecycle::Active),
        }
    }

    /// Apply to `doc`. Timestamps are the store's concern.
    pub fn apply_to(&self, doc: &mut UserDocument) {
        if let Some(name) = &self.changes.name {
            doc.name.clone_from(name);
        }
        if let Some(email) = &self.changes.email {
            doc.email.clone_from(email);
        }
        if let Some(age) = self.changes.age {
            doc.age = age;
        }
        if let Some(lifecycle) = self.lifecycle {
            doc.lifecycle = lifecycle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc() -> UserDocument {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        UserDocument {
            id: UserId::new(),
            name: "John Smith".to_string(),
            email: "john@example.com".to_string(),
            age: 30,
            lifecycle: Lifecycle::Active,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_lifecycle_flags_agree() {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(!Lifecycle::Active.is_deleted());
        assert_eq!(Lifecycle::Active.deleted_at(), None);
        assert!(Lifecycle::Deleted { at }.is_deleted());
        assert_eq!(Lifecycle::Deleted { at }.deleted_at(), Some(at));
    }

    #[test]
    fn test_new_user_normalized() {
        let user = NewUser::new("  Jane Doe ", "  Jane@Example.COM ", 25).normalized();
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.email, "jane@example.com");
    }

    #[test]
    fn test_changes_empty_and_normalized() {
        assert!(UserChanges::default().is_empty());
        let changes = UserChanges::default().with_email(" A@X.com").normalized();
        assert!(!changes.is_empty());
        assert_eq!(changes.email.as_deref(), Some("a@x.com"));
        assert_eq!(changes.name, None);
    }

    #[test]
    fn test_patch_applies_only_provided_fields() {
        let mut d = doc();
        UserPatch::changes(UserChanges::default().with_age(31)).apply_to(&mut d);
        assert_eq!(d.age, 31);
        assert_eq!(d.name, "John Smith");
        assert!(!d.is_deleted());
    }

    #[test]
    fn test_patch_soft_delete_and_restore() {
        let mut d = doc();
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        UserPatch::soft_delete(at).apply_to(&mut d);
        assert!(d.is_deleted());
        assert_eq!(d.deleted_at(), Some(at));

        UserPatch::restore().apply_to(&mut d);
        assert!(!d.is_deleted());
        assert_eq!(d.deleted_at(), None);
    }

    #[test]
    fn test_projection_hides_lifecycle() {
        let d = doc();
        let json = serde_json::to_value(User::from(d.clone())).unwrap();
        assert_eq!(json["email"], "john@example.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("isDeleted").is_none());
        assert!(json.get("deletedAt").is_none());
    }
}
