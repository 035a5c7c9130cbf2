//! User repository for database operations.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, instrument};

use super::models::{CreateUserRequest, UpdateUserRequest, User};
use crate::auth::{CredentialStore, Role, StoredCredential};
use crate::pagination::Page;

const USER_COLUMNS: &str =
    "id, username, password_hash, name, role, is_active, created_at, updated_at, deleted_at";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. `request.password` must already be hashed.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn create(&self, request: &CreateUserRequest) -> Result<User> {
        debug!("Creating {} account", request.role);

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, name, role)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&request.username)
        .bind(&request.password)
        .bind(&request.name)
        .bind(request.role.as_str())
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                bail!("Username '{}' is already taken.", request.username)
            }
            Err(e) => return Err(e).context("Failed to insert user"),
        };

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User {id} missing after creation"))
    }

    /// Get a live (not deleted) user by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        Ok(user)
    }

    /// Get a user by username, deleted ones included.
    #[instrument(skip(self))]
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user by username")?;

        Ok(user)
    }

    /// List live users with `role`, newest first.
    #[instrument(skip(self))]
    pub async fn list_by_role(&self, role: Role, page: Page) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE role = ? AND deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(role.as_str())
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        Ok(users)
    }

    /// Count live users with `role`.
    #[instrument(skip(self))]
    pub async fn count_by_role(&self, role: Role) -> Result<i64> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = ? AND deleted_at IS NULL")
                .bind(role.as_str())
                .fetch_one(&self.pool)
                .await
                .context("Failed to count users by role")?;

        Ok(count.0)
    }

    /// Update a user. `request.password`, when present, must already be hashed.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: &UpdateUserRequest) -> Result<User> {
        let existing = self
            .get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", id))?;

        let mut updates = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if let Some(username) = &request.username {
            updates.push("username = ?");
            values.push(username.clone());
        }

        if let Some(password) = &request.password {
            updates.push("password_hash = ?");
            values.push(password.clone());
        }

        if let Some(name) = &request.name {
            updates.push("name = ?");
            values.push(name.clone());
        }

        if let Some(is_active) = request.is_active {
            updates.push("is_active = ?");
            values.push(if is_active { "1" } else { "0" }.to_string());
        }

        if updates.is_empty() {
            return Ok(existing);
        }

        updates.push("updated_at = datetime('now')");

        let sql = format!(
            "UPDATE users SET {} WHERE id = ? AND deleted_at IS NULL",
            updates.join(", ")
        );

        let mut query_builder = sqlx::query(&sql);
        for value in &values {
            query_builder = query_builder.bind(value);
        }
        query_builder = query_builder.bind(id);

        match query_builder.execute(&self.pool).await {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => bail!(
                "Username '{}' is already taken.",
                request.username.as_deref().unwrap_or_default()
            ),
            Err(e) => return Err(e).context("Failed to update user"),
        }

        self.get(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {}", id))
    }

    /// Soft-delete a user: mark deleted and deactivate.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = datetime('now'), is_active = 0, updated_at = datetime('now')
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            bail!("User not found: {}", id);
        }

        Ok(())
    }

    /// Check if a username is free. Deleted accounts keep their name reserved.
    #[instrument(skip(self))]
    pub async fn is_username_available(&self, username: &str) -> Result<bool> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .context("Failed to check username availability")?;

        Ok(count.0 == 0)
    }

    /// Count all users, deleted ones included.
    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count users")?;

        Ok(count.0)
    }
}

#[async_trait]
impl CredentialStore for UserRepository {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<StoredCredential>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE username = ? AND is_active = 1 AND deleted_at IS NULL"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up credentials")?;

        Ok(user.map(|user| StoredCredential {
            user_id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
            password_hash: user.password_hash,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    async fn setup() -> UserRepository {
        let db = Database::in_memory().await.unwrap();
        UserRepository::new(db.pool().clone())
    }

    fn request(username: &str, role: Role) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: "$2b$04$not-a-real-hash".to_string(),
            name: format!("{username} name"),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let repo = setup().await;

        let user = repo.create(&request("kasir1", Role::Cashier)).await.unwrap();
        assert_eq!(user.username, "kasir1");
        assert_eq!(user.name, "kasir1 name");
        assert_eq!(user.role, Role::Cashier);
        assert!(user.is_active);
        assert!(user.deleted_at.is_none());

        let fetched = repo.get(user.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);

        let by_username = repo.get_by_username("kasir1").await.unwrap().unwrap();
        assert_eq!(by_username.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let repo = setup().await;
        repo.create(&request("kasir1", Role::Cashier)).await.unwrap();

        let err = repo
            .create(&request("kasir1", Role::Owner))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("already taken"));
    }

    #[tokio::test]
    async fn test_update_user() {
        let repo = setup().await;
        let user = repo.create(&request("kasir1", Role::Cashier)).await.unwrap();

        let updated = repo
            .update(
                user.id,
                &UpdateUserRequest {
                    name: Some("Renamed".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");
        assert!(!updated.is_active);
        assert_eq!(updated.username, "kasir1");

        let unchanged = repo
            .update(user.id, &UpdateUserRequest::default())
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Renamed");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user_but_keeps_username() {
        let repo = setup().await;
        let user = repo.create(&request("kasir1", Role::Cashier)).await.unwrap();

        repo.soft_delete(user.id).await.unwrap();
        assert!(repo.get(user.id).await.unwrap().is_none());
        assert!(!repo.is_username_available("kasir1").await.unwrap());
        assert!(repo.soft_delete(user.id).await.is_err());
        assert_eq!(repo.count_by_role(Role::Cashier).await.unwrap(), 0);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_role_paginates() {
        let repo = setup().await;
        repo.create(&request("boss", Role::Owner)).await.unwrap();
        for i in 0..5 {
            repo.create(&request(&format!("kasir{i}"), Role::Cashier))
                .await
                .unwrap();
        }

        assert_eq!(repo.count_by_role(Role::Cashier).await.unwrap(), 5);

        let first = repo
            .list_by_role(Role::Cashier, Page { page: 1, limit: 2 })
            .await
            .unwrap();
        assert_eq!(first.len(), 2);
        // Same-second inserts fall back to id order.
        assert_eq!(first[0].username, "kasir4");

        let last = repo
            .list_by_role(Role::Cashier, Page { page: 3, limit: 2 })
            .await
            .unwrap();
        assert_eq!(last.len(), 1);
        assert!(last.iter().all(|u| u.role == Role::Cashier));
    }

    #[tokio::test]
    async fn test_credential_lookup_skips_inactive_and_deleted() {
        let repo = setup().await;
        let active = repo.create(&request("active", Role::Cashier)).await.unwrap();
        let inactive = repo.create(&request("inactive", Role::Cashier)).await.unwrap();
        let deleted = repo.create(&request("deleted", Role::Cashier)).await.unwrap();

        repo.update(
            inactive.id,
            &UpdateUserRequest {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.soft_delete(deleted.id).await.unwrap();

        let found = repo.find_active_by_username("active").await.unwrap().unwrap();
        assert_eq!(found.user_id, active.id);
        assert_eq!(found.role, Role::Cashier);

        assert!(repo.find_active_by_username("inactive").await.unwrap().is_none());
        assert!(repo.find_active_by_username("deleted").await.unwrap().is_none());
        assert!(repo.find_active_by_username("missing").await.unwrap().is_none());
    }
}
