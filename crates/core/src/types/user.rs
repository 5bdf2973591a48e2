//! User profile record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Role, UserId};

/// A user profile as stored under `user:<id>`.
///
/// Credentials live with the auth provider; this record only carries the
/// username and role the application needs for display and authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Identifier issued by the auth provider.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Authorization level.
    pub role: Role,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
    /// When the profile was last changed by an administrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a fresh profile stamped with `now`.
    #[must_use]
    pub fn new(id: UserId, username: impl Into<String>, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            id,
            username: username.into(),
            role,
            created_at: now,
            updated_at: None,
        }
    }

    /// Whether this user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Merge `patch` over this record and stamp `updated_at`.
    ///
    /// The `id` and `created_at` fields are never touched.
    #[must_use]
    pub fn apply(mut self, patch: UserPatch, now: DateTime<Utc>) -> Self {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = Some(now);
        self
    }
}

/// Partial update for a [`User`]. Absent fields keep their current value.
///
/// Unknown fields, including `id`, are ignored on deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
