//! Username-to-email identity bridging.
//!
//! The auth provider identifies accounts by email address while the system
//! itself only knows usernames. Every username maps deterministically onto
//! `<username>@<identity domain>`, an address that never receives mail.

use core::fmt;

/// Default domain for synthesized identity addresses.
pub const DEFAULT_IDENTITY_DOMAIN: &str = "k4jlpg.local";

/// Errors that can occur when building an [`IdentityEmail`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The username is empty.
    #[error("username cannot be empty")]
    EmptyUsername,
    /// The username already contains an @ symbol.
    #[error("username cannot contain '@'")]
    ContainsAtSymbol,
    /// The domain is empty.
    #[error("identity domain cannot be empty")]
    EmptyDomain,
}

/// The email address presented to the auth provider for a username.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityEmail(String);

impl IdentityEmail {
    /// Build the identity address for `username` under `domain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is empty or contains `@`, or if the
    /// domain is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use lpg_core::IdentityEmail;
    ///
    /// let email = IdentityEmail::for_username("admin", "k4jlpg.local").unwrap();
    /// assert_eq!(email.as_str(), "admin@k4jlpg.local");
    /// assert!(IdentityEmail::for_username("", "k4jlpg.local").is_err());
    /// ```
    pub fn for_username(username: &str, domain: &str) -> Result<Self, IdentityError> {
        if username.is_empty() {
            return Err(IdentityError::EmptyUsername);
        }
        if username.contains('@') {
            return Err(IdentityError::ContainsAtSymbol);
        }
        if domain.is_empty() {
            return Err(IdentityError::EmptyDomain);
        }
        Ok(Self(format!("{username}@{domain}")))
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the username part (before the @).
    #[must_use]
    pub fn username(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(user, _)| user)
    }
}

impl fmt::Display for IdentityEmail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentityEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = IdentityEmail::for_username("staff", DEFAULT_IDENTITY_DOMAIN).unwrap();
        let b = IdentityEmail::for_username("staff", DEFAULT_IDENTITY_DOMAIN).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "staff@k4jlpg.local");
        assert_eq!(a.username(), "staff");
    }

    #[test]
    fn test_rejects_empty_username() {
        assert_eq!(
            IdentityEmail::for_username("", "x.local"),
            Err(IdentityError::EmptyUsername)
        );
    }

    #[test]
    fn test_rejects_at_symbol() {
        assert_eq!(
            IdentityEmail::for_username("a@b", "x.local"),
            Err(IdentityError::ContainsAtSymbol)
        );
    }

    #[test]
    fn test_rejects_empty_domain() {
        assert_eq!(
            IdentityEmail::for_username("admin", ""),
            Err(IdentityError::EmptyDomain)
        );
    }
}
