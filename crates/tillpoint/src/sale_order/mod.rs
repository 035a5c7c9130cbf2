//! Sale orders and their line items.

mod models;
mod repository;
mod service;

pub use models::{
    CreateSaleOrderRequest, CreatedBy, NewSaleOrderItem, SaleOrder, SaleOrderDetail,
    SaleOrderItem, SaleOrderItemInput, UpdateSaleOrderRequest,
};
pub use repository::SaleOrderRepository;
pub use service::{SaleOrderService, generate_order_number};
