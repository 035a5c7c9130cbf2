//! User data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::auth::Role;

/// User entity from database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Public user info (safe to return to clients).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Request to create a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Body of `POST /users/cashier`; the role is always cashier.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCashierRequest {
    pub username: String,
    pub password: String,
    pub name: String,
}

impl From<CreateCashierRequest> for CreateUserRequest {
    fn from(request: CreateCashierRequest) -> Self {
        Self {
            username: request.username,
            password: request.password,
            name: request.name,
            role: Role::Cashier,
        }
    }
}

/// Request to update an existing user. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub is_active: Option<bool>,
}
