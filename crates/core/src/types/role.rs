//! User role.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A user's role.
///
/// Roles are an open set of strings rather than a closed enum: any value
/// supplied at signup is stored as-is. Only [`Role::ADMIN`] carries
/// authorization meaning; every other role is treated as a regular user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    /// The administrator role.
    pub const ADMIN: &'static str = "admin";
    /// The default staff role.
    pub const STAFF: &'static str = "staff";

    /// Create a role from any string.
    #[must_use]
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    /// The administrator role.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// The staff role.
    #[must_use]
    pub fn staff() -> Self {
        Self(Self::STAFF.to_owned())
    }

    /// Whether this role grants admin access. Comparison is exact.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Returns the role as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        Self(role)
    }
}
