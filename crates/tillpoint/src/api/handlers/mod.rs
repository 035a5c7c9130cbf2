//! API request handlers, organized by domain:
//! - `auth`: login, logout, current identity
//! - `sale_orders`: sale order CRUD
//! - `users`: cashier management
//! - `misc`: health check and fallback

mod auth;
mod misc;
mod sale_orders;
mod users;

pub use auth::{LoginRequest, LoginResponse, MeResponse, login, logout, me};
pub use misc::{health, method_not_allowed, not_found};
pub use sale_orders::{
    create_sale_order, delete_sale_order, get_sale_order, list_sale_orders, update_sale_order,
};
pub use users::{create_cashier, delete_cashier, get_cashier, list_cashiers, update_cashier};
