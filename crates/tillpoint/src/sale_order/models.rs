//! Sale order data models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Sale order row.
#[derive(Debug, Clone, FromRow)]
pub struct SaleOrder {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub notes: String,
    pub created_by_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Line item row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SaleOrderItem {
    pub id: i64,
    pub sale_order_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// The account that created an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CreatedBy {
    pub id: i64,
    pub username: String,
    pub name: String,
}

/// An order with its creator and items, as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrderDetail {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub total_amount: f64,
    pub notes: String,
    pub created_by_id: i64,
    pub created_by: Option<CreatedBy>,
    pub items: Vec<SaleOrderItem>,
    pub created_at: String,
    pub updated_at: String,
}

impl SaleOrderDetail {
    pub fn assemble(order: SaleOrder, created_by: Option<CreatedBy>, items: Vec<SaleOrderItem>) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            total_amount: order.total_amount,
            notes: order.notes,
            created_by_id: order.created_by_id,
            created_by,
            items,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One line of a create/update request.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleOrderItemInput {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
}

/// A validated line with its subtotal, ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSaleOrderItem {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Body of `POST /sale-orders`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSaleOrderRequest {
    pub customer_name: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<SaleOrderItemInput>,
}

/// Body of `PATCH /sale-orders/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSaleOrderRequest {
    pub customer_name: Option<String>,
    pub notes: Option<String>,
    pub items: Option<Vec<SaleOrderItemInput>>,
}
