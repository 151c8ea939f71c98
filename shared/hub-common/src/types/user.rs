//! User Types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Community role assigned to a user.
///
/// Records without a role are treated as [`Role::Student`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular member.
    #[default]
    Student,
    /// Forum and event moderator.
    Moderator,
    /// Platform administrator.
    Admin,
}

impl Role {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Moderators and admins are staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }

    /// Rank used for hierarchy checks; higher outranks lower.
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Student => 0,
            Self::Moderator => 1,
            Self::Admin => 2,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            other => Err(Error::UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// Account standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Full access.
    #[default]
    Active,
    /// Read-only access.
    Suspended,
    /// No access.
    Banned,
}

impl AccountStatus {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            "banned" => Ok(Self::Banned),
            other => Err(Error::UnknownVariant {
                kind: "account status",
                value: other.to_string(),
            }),
        }
    }
}

/// User profile (public information).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    /// User ID (identity provider subject).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Community role.
    pub role: Role,
    /// Short biography.
    pub bio: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Whether the user may organize events.
    pub can_organize: bool,
    /// When the user joined.
    pub created_at: DateTime<Utc>,
}
