//! User management module.
//!
//! Account persistence, cashier CRUD and the credential lookup used by login.

mod models;
mod repository;
mod service;

pub use models::{CreateCashierRequest, CreateUserRequest, UpdateUserRequest, User, UserInfo};
pub use repository::UserRepository;
pub use service::UserService;
