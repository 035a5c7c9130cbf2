//! HTTP API module.
//!
//! REST endpoints for authentication, sale orders and cashier management.

mod error;
mod extract;
pub mod handlers;
mod response;
mod routes;
mod state;

pub use error::{ApiError, ApiResult};
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use response::Envelope;
pub use routes::create_router;
pub use state::AppState;
