//! User service for business logic.

use anyhow::{Result, bail};
use tracing::{info, instrument, warn};

use super::models::{CreateUserRequest, UpdateUserRequest, User};
use super::repository::UserRepository;
use crate::auth::Role;
use crate::auth::password::hash_password;
use crate::pagination::{Page, Paginated};

const MIN_PASSWORD_LEN: usize = 6;
const MAX_NAME_LEN: usize = 255;

/// Service for account management operations.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &UserRepository {
        &self.repo
    }

    /// Create a new account with validation. The password is hashed here.
    #[instrument(skip(self, request), fields(username = %request.username, role = %request.role))]
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User> {
        if !is_valid_username(&request.username) {
            bail!(
                "Invalid username format. Must be 3-100 characters of letters, digits, '_', '-' or '.'."
            );
        }
        validate_password(&request.password)?;
        validate_name(&request.name)?;

        if !self.repo.is_username_available(&request.username).await? {
            bail!("Username '{}' is already taken.", request.username);
        }

        let hashed = CreateUserRequest {
            password: hash_password(&request.password)?,
            ..request
        };

        let user = self.repo.create(&hashed).await?;
        info!(user_id = user.id, "Created new {} account", user.role);

        Ok(user)
    }

    /// Get a live cashier by ID. Owners are not visible through this lookup.
    #[instrument(skip(self))]
    pub async fn get_cashier(&self, id: i64) -> Result<User> {
        match self.repo.get(id).await? {
            Some(user) if user.role == Role::Cashier => Ok(user),
            _ => bail!("Cashier not found"),
        }
    }

    /// List cashiers, newest first.
    #[instrument(skip(self))]
    pub async fn list_cashiers(&self, page: Page) -> Result<Paginated<User>> {
        let total = self.repo.count_by_role(Role::Cashier).await?;
        let users = self.repo.list_by_role(Role::Cashier, page).await?;
        Ok(Paginated::new(users, total, page))
    }

    /// Update a cashier. Absent fields are left unchanged.
    #[instrument(skip(self, request))]
    pub async fn update_cashier(&self, id: i64, request: UpdateUserRequest) -> Result<User> {
        let current = self.get_cashier(id).await?;

        if let Some(username) = &request.username {
            if !is_valid_username(username) {
                bail!("Invalid username format.");
            }
            if let Some(existing) = self.repo.get_by_username(username).await?
                && existing.id != current.id
            {
                bail!("Username '{}' is already taken.", username);
            }
        }

        if let Some(name) = &request.name {
            validate_name(name)?;
        }

        let mut processed = request;
        if let Some(password) = &processed.password {
            validate_password(password)?;
            processed.password = Some(hash_password(password)?);
        }

        let user = self.repo.update(current.id, &processed).await?;
        if processed.is_active == Some(false) {
            warn!(user_id = user.id, "Deactivated cashier");
        } else {
            info!(user_id = user.id, "Updated cashier");
        }

        Ok(user)
    }

    /// Soft-delete a cashier.
    #[instrument(skip(self))]
    pub async fn delete_cashier(&self, id: i64) -> Result<()> {
        let cashier = self.get_cashier(id).await?;
        self.repo.soft_delete(cashier.id).await?;
        warn!(user_id = cashier.id, "Deleted cashier");
        Ok(())
    }
}

/// Validate username format.
fn is_valid_username(username: &str) -> bool {
    let len = username.len();
    if !(3..=100).contains(&len) {
        return false;
    }

    username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        bail!("Password must be at least {MIN_PASSWORD_LEN} characters.");
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_NAME_LEN {
        bail!("Name must be between 1 and {MAX_NAME_LEN} characters.");
    }
    Ok(())
}
