//! Role-based permissions as integer bit-flags.
//!
//! A role's permission set is the bitwise OR of the flags it grants and is
//! persisted as a plain integer column.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of allowed actions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Permission: i32 {
        const FOLLOW = 1;
        const COMMENT = 2;
        const WRITE = 4;
        const MODERATE = 8;
        const ADMIN = 16;
    }
}

impl Permission {
    /// Load a stored integer. Unknown bits are dropped.
    pub fn from_stored(bits: i32) -> Self {
        Self::from_bits_truncate(bits)
    }

    /// Grant `perm`. Granting an already-held permission is a no-op.
    pub fn add(&mut self, perm: Permission) {
        self.insert(perm);
    }

    /// Revoke `perm`. Revoking a permission that is not held is a no-op.
    pub fn revoke(&mut self, perm: Permission) {
        self.remove(perm);
    }

    /// Clear every permission.
    pub fn reset(&mut self) {
        *self = Permission::empty();
    }

    /// True iff every bit of `perm` is set.
    pub fn has(&self, perm: Permission) -> bool {
        self.bits() & perm.bits() == perm.bits()
    }

    /// Flag names, e.g. `["FOLLOW", "COMMENT"]`.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter_names().map(|(name, _)| name).collect()
    }
}

/// The built-in roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleName {
    User,
    Moderator,
    Administrator,
}

impl RoleName {
    pub const ALL: [RoleName; 3] = [RoleName::User, RoleName::Moderator, RoleName::Administrator];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Moderator => "Moderator",
            Self::Administrator => "Administrator",
        }
    }

    /// Permissions granted to this role.
    pub fn permissions(&self) -> Permission {
        let user = Permission::FOLLOW | Permission::COMMENT | Permission::WRITE;
        match self {
            Self::User => user,
            Self::Moderator => user | Permission::MODERATE,
            Self::Administrator => user | Permission::MODERATE | Permission::ADMIN,
        }
    }

    /// Role assigned to newly registered users.
    pub fn is_default(&self) -> bool {
        matches!(self, Self::User)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// Whoever is making a request.
///
/// Lets callers ask `can()` without first checking whether anyone is
/// logged in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User {
        id: i64,
        /// `None` when the account has no role assigned
        permissions: Option<Permission>,
    },
}

impl Viewer {
    pub fn can(&self, perm: Permission) -> bool {
        match self {
            Self::Anonymous => false,
            Self::User { permissions, .. } => permissions.is_some_and(|p| p.has(perm)),
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.can(Permission::ADMIN)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Anonymous => None,
            Self::User { id, .. } => Some(*id),
        }
    }
}
