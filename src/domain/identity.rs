//! Operator identity types
//!
//! The auth collaborator resolves credentials once and hands the core a typed
//! [`Identity`]. The core never parses tokens; it only reads the principal and
//! role for logging and role gating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Committing principal (user name or ledger account)
///
/// # Examples
///
/// ```
/// use deid_ledger::domain::identity::Principal;
/// use std::str::FromStr;
///
/// let principal = Principal::from_str("dr_strange").unwrap();
/// assert_eq!(principal.as_str(), "dr_strange");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Principal(String);

impl Principal {
    /// Creates a new Principal, rejecting blank values
    pub fn new(principal: impl Into<String>) -> Result<Self, String> {
        let principal = principal.into();
        if principal.trim().is_empty() {
            return Err("Principal cannot be empty".to_string());
        }
        Ok(Self(principal))
    }

    /// Returns the principal as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Principal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Principal {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Principal> for String {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

impl AsRef<str> for Principal {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Operator role as issued by the auth collaborator
///
/// Roles are compared case-insensitively after trimming, so `Medical_Professional`
/// and `medical_professional` are the same role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    /// Role allowed to de-identify by default
    pub const MEDICAL_PROFESSIONAL: &'static str = "medical_professional";

    /// Creates a new Role, normalizing to lowercase
    pub fn new(role: impl Into<String>) -> Result<Self, String> {
        let role = role.into();
        let normalized = role.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("Role cannot be empty".to_string());
        }
        Ok(Self(normalized))
    }

    /// Returns the role as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this role matches a configured role name
    pub fn matches(&self, name: &str) -> bool {
        self.0 == name.trim().to_lowercase()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

/// Authenticated operator identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Who is acting
    pub principal: Principal,
    /// Role granted by the auth collaborator
    pub role: Role,
}

impl Identity {
    /// Create a new identity
    pub fn new(principal: Principal, role: Role) -> Self {
        Self { principal, role }
    }

    /// Parse an identity from raw strings
    pub fn parse(principal: &str, role: &str) -> Result<Self, String> {
        Ok(Self {
            principal: Principal::new(principal)?,
            role: Role::new(role)?,
        })
    }
}
