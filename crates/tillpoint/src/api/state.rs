//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthState, Authenticator, RevocationStore, TokenCodec};
use crate::db::Database;
use crate::sale_order::{SaleOrderRepository, SaleOrderService};
use crate::user::{UserRepository, UserService};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: UserService,
    pub sale_orders: SaleOrderService,
    pub authenticator: Authenticator,
    /// Request gate (token codec + revocation store).
    pub auth: AuthState,
    /// CORS origins; empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl AppState {
    /// Wire services, the authenticator and the gate over one database.
    ///
    /// The authenticator and the gate share a single revocation store.
    pub fn new(db: &Database, codec: TokenCodec, token_ttl: Duration, allowed_origins: Vec<String>) -> Self {
        let user_repo = UserRepository::new(db.pool().clone());
        let revocations = RevocationStore::new();

        let authenticator = Authenticator::new(
            Arc::new(user_repo.clone()),
            codec.clone(),
            revocations.clone(),
            token_ttl,
        );

        Self {
            users: UserService::new(user_repo),
            sale_orders: SaleOrderService::new(SaleOrderRepository::new(db.pool().clone())),
            authenticator,
            auth: AuthState::new(codec, revocations),
            allowed_origins,
        }
    }

    pub fn revocations(&self) -> &RevocationStore {
        self.auth.revocations()
    }
}
