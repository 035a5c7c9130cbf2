//! JWT claims and user roles.

use serde::{Deserialize, Serialize};

/// User role.
///
/// Closed set: anything other than `owner` or `cashier` fails to parse,
/// both from the database and from token payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Store owner. Manages cashiers and sale orders.
    Owner,
    /// Cashier. Manages sale orders.
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Cashier => "cashier",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Role::Owner),
            "cashier" => Ok(Role::Cashier),
            _ => Err(format!("unknown role: {}", s)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Identity facts a token is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// JWT claims structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,

    /// Login name at the time of issue.
    pub username: String,

    pub role: Role,

    /// Issued at (as Unix timestamp).
    pub iat: i64,

    /// Expiration time (as Unix timestamp).
    pub exp: i64,

    /// JWT ID. Makes every issued token unique.
    pub jti: String,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.sub,
            username: self.username.clone(),
            role: self.role,
        }
    }

    /// Whether the token carrying these claims has expired at `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
