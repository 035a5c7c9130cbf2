//! tillpoint: point-of-sale backend.
//!
//! Sale orders and cashier accounts behind JWT bearer authentication with
//! owner/cashier role checks.

pub mod api;
pub mod auth;
pub mod db;
pub mod pagination;
pub mod sale_order;
pub mod user;
