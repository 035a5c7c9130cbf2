//! Sale order business logic: validation, totals, order numbers.

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{info, instrument, warn};

use super::models::{
    CreateSaleOrderRequest, NewSaleOrderItem, SaleOrderDetail, SaleOrderItemInput,
    UpdateSaleOrderRequest,
};
use super::repository::{NewSaleOrder, SaleOrderChanges, SaleOrderRepository};
use crate::pagination::{Page, Paginated};

const MAX_TEXT_LEN: usize = 255;
const SUFFIX_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const SUFFIX_LEN: usize = 4;
const MAX_NUMBER_ATTEMPTS: usize = 5;

/// `SO-<YYYYMMDDHHMMSS>-<creator id>-<random suffix>`.
pub fn generate_order_number(now: DateTime<Utc>, created_by_id: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();

    format!("SO-{}-{}-{}", now.format("%Y%m%d%H%M%S"), created_by_id, suffix)
}

fn validate_text(field: &str, value: &str) -> Result<()> {
    let len = value.trim().chars().count();
    if len == 0 || len > MAX_TEXT_LEN {
        bail!("{field} must be between 1 and {MAX_TEXT_LEN} characters.");
    }
    Ok(())
}

/// Validate request lines and compute subtotals plus the order total.
fn price_items(inputs: &[SaleOrderItemInput]) -> Result<(Vec<NewSaleOrderItem>, f64)> {
    if inputs.is_empty() {
        bail!("A sale order must have at least one item.");
    }

    let mut total = 0.0;
    let mut items = Vec::with_capacity(inputs.len());

    for input in inputs {
        validate_text("Product name", &input.product_name)?;
        if input.quantity < 1 {
            bail!("Quantity must be at least 1.");
        }
        if !input.unit_price.is_finite() || input.unit_price < 0.0 {
            bail!("Unit price must be zero or greater.");
        }

        let subtotal = input.quantity as f64 * input.unit_price;
        total += subtotal;
        items.push(NewSaleOrderItem {
            product_name: input.product_name.trim().to_string(),
            quantity: input.quantity,
            unit_price: input.unit_price,
            subtotal,
        });
    }

    Ok((items, total))
}

/// Service for sale order operations.
#[derive(Debug, Clone)]
pub struct SaleOrderService {
    repo: SaleOrderRepository,
}

impl SaleOrderService {
    pub fn new(repo: SaleOrderRepository) -> Self {
        Self { repo }
    }

    /// List orders, newest first, with creators and items.
    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Paginated<SaleOrderDetail>> {
        let total = self.repo.count().await?;
        let orders = self.repo.list(page).await?;
        let details = self.repo.load_details(orders).await?;
        Ok(Paginated::new(details, total, page))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<SaleOrderDetail> {
        let Some(order) = self.repo.get(id).await? else {
            bail!("Sale order not found");
        };

        let mut details = self.repo.load_details(vec![order]).await?;
        details
            .pop()
            .ok_or_else(|| anyhow::anyhow!("Sale order not found"))
    }

    /// Create an order on behalf of `created_by_id`.
    #[instrument(skip(self, request))]
    pub async fn create(&self, created_by_id: i64, request: CreateSaleOrderRequest) -> Result<SaleOrderDetail> {
        validate_text("Customer name", &request.customer_name)?;
        let (items, total_amount) = price_items(&request.items)?;
        let customer_name = request.customer_name.trim();
        let notes = request.notes.unwrap_or_default();

        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let order_number = generate_order_number(Utc::now(), created_by_id);
            let order = NewSaleOrder {
                order_number: &order_number,
                customer_name,
                notes: &notes,
                created_by_id,
                total_amount,
            };

            if let Some(id) = self.repo.insert(&order, &items).await? {
                info!(sale_order_id = id, %order_number, total_amount, "Created sale order");
                return self.get(id).await;
            }
            warn!(%order_number, "Order number collision, retrying");
        }

        bail!("Could not allocate a unique order number")
    }

    /// Update an order. A non-empty `items` list replaces all lines.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateSaleOrderRequest) -> Result<SaleOrderDetail> {
        if let Some(customer_name) = &request.customer_name {
            validate_text("Customer name", customer_name)?;
        }

        let priced = match &request.items {
            Some(inputs) if !inputs.is_empty() => Some(price_items(inputs)?),
            _ => None,
        };

        let changes = SaleOrderChanges {
            customer_name: request.customer_name.as_deref().map(str::trim),
            notes: request.notes.as_deref(),
            items: priced
                .as_ref()
                .map(|(items, total)| (items.as_slice(), *total)),
        };

        self.repo.update(id, &changes).await?;
        info!(sale_order_id = id, items_replaced = priced.is_some(), "Updated sale order");

        self.get(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<()> {
        self.repo.soft_delete(id).await?;
        info!(sale_order_id = id, "Deleted sale order");
        Ok(())
    }
}
