//! Sale order repository.

use std::collections::HashMap;

use anyhow::{Context, Result, bail};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, instrument};

use super::models::{CreatedBy, NewSaleOrderItem, SaleOrder, SaleOrderDetail, SaleOrderItem};
use crate::pagination::Page;

const ORDER_COLUMNS: &str =
    "id, order_number, customer_name, total_amount, notes, created_by_id, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, sale_order_id, product_name, quantity, unit_price, subtotal, created_at, updated_at";

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Fields of a new order row.
#[derive(Debug, Clone)]
pub struct NewSaleOrder<'a> {
    pub order_number: &'a str,
    pub customer_name: &'a str,
    pub notes: &'a str,
    pub created_by_id: i64,
    pub total_amount: f64,
}

/// Changes applied by an update. `items` replaces every line and the total.
#[derive(Debug, Clone, Default)]
pub struct SaleOrderChanges<'a> {
    pub customer_name: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub items: Option<(&'a [NewSaleOrderItem], f64)>,
}

/// Repository for sale order database operations.
#[derive(Debug, Clone)]
pub struct SaleOrderRepository {
    pool: SqlitePool,
}

impl SaleOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert an order and its items atomically.
    ///
    /// Returns `None` if the order number is already in use.
    #[instrument(skip(self, order, items), fields(order_number = %order.order_number))]
    pub async fn insert(
        &self,
        order: &NewSaleOrder<'_>,
        items: &[NewSaleOrderItem],
    ) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO sale_orders (order_number, customer_name, total_amount, notes, created_by_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(order.order_number)
        .bind(order.customer_name)
        .bind(order.total_amount)
        .bind(order.notes)
        .bind(order.created_by_id)
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(e)
                if e.as_database_error()
                    .is_some_and(|db_err| db_err.is_unique_violation()) =>
            {
                debug!("Order number collision");
                return Ok(None);
            }
            Err(e) => return Err(e).context("Failed to insert sale order"),
        };

        insert_items(&mut tx, id, items).await?;
        tx.commit().await.context("Failed to commit sale order")?;

        Ok(Some(id))
    }

    /// Get a live order.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<SaleOrder>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM sale_orders WHERE id = ? AND deleted_at IS NULL");
        let order = sqlx::query_as::<_, SaleOrder>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch sale order")?;

        Ok(order)
    }

    /// List live orders, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, page: Page) -> Result<Vec<SaleOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM sale_orders
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?"
        );
        let orders = sqlx::query_as::<_, SaleOrder>(&sql)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .context("Failed to list sale orders")?;

        Ok(orders)
    }

    #[instrument(skip(self))]
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sale_orders WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count sale orders")?;

        Ok(count.0)
    }

    /// Items of the given orders, grouped by order id.
    pub async fn items_for(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<SaleOrderItem>>> {
        let mut grouped: HashMap<i64, Vec<SaleOrderItem>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(grouped);
        }

        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM sale_order_items WHERE sale_order_id IN ({}) ORDER BY id",
            placeholders(order_ids.len())
        );
        let mut query = sqlx::query_as::<_, SaleOrderItem>(&sql);
        for id in order_ids {
            query = query.bind(id);
        }

        let items = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch sale order items")?;

        for item in items {
            grouped.entry(item.sale_order_id).or_default().push(item);
        }

        Ok(grouped)
    }

    /// Creators by user id. Deleted accounts are still resolved.
    pub async fn creators(&self, user_ids: &[i64]) -> Result<HashMap<i64, CreatedBy>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, username, name FROM users WHERE id IN ({})",
            placeholders(user_ids.len())
        );
        let mut query = sqlx::query_as::<_, CreatedBy>(&sql);
        for id in user_ids {
            query = query.bind(id);
        }

        let creators = query
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch sale order creators")?;

        Ok(creators.into_iter().map(|c| (c.id, c)).collect())
    }

    /// Attach creators and items to a batch of orders, keeping their order.
    pub async fn load_details(&self, orders: Vec<SaleOrder>) -> Result<Vec<SaleOrderDetail>> {
        let order_ids: Vec<i64> = orders.iter().map(|o| o.id).collect();
        let mut user_ids: Vec<i64> = orders.iter().map(|o| o.created_by_id).collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let mut items = self.items_for(&order_ids).await?;
        let creators = self.creators(&user_ids).await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let created_by = creators.get(&order.created_by_id).cloned();
                let lines = items.remove(&order.id).unwrap_or_default();
                SaleOrderDetail::assemble(order, created_by, lines)
            })
            .collect())
    }

    /// Apply `changes` to a live order atomically.
    #[instrument(skip(self, changes))]
    pub async fn update(&self, id: i64, changes: &SaleOrderChanges<'_>) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        let mut updates = vec!["updated_at = datetime('now')"];
        if changes.customer_name.is_some() {
            updates.push("customer_name = ?");
        }
        if changes.notes.is_some() {
            updates.push("notes = ?");
        }
        if changes.items.is_some() {
            updates.push("total_amount = ?");
        }

        let sql = format!(
            "UPDATE sale_orders SET {} WHERE id = ? AND deleted_at IS NULL",
            updates.join(", ")
        );
        let mut query = sqlx::query(&sql);
        if let Some(customer_name) = changes.customer_name {
            query = query.bind(customer_name);
        }
        if let Some(notes) = changes.notes {
            query = query.bind(notes);
        }
        if let Some((_, total)) = changes.items {
            query = query.bind(total);
        }

        let result = query
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to update sale order")?;

        if result.rows_affected() == 0 {
            bail!("Sale order not found");
        }

        if let Some((items, _)) = changes.items {
            sqlx::query("DELETE FROM sale_order_items WHERE sale_order_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await
                .context("Failed to remove sale order items")?;
            insert_items(&mut tx, id, items).await?;
        }

        tx.commit().await.context("Failed to commit sale order update")?;
        Ok(())
    }

    /// Soft-delete an order.
    #[instrument(skip(self))]
    pub async fn soft_delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE sale_orders
            SET deleted_at = datetime('now'), updated_at = datetime('now')
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .context("Failed to delete sale order")?;

        if result.rows_affected() == 0 {
            bail!("Sale order not found");
        }

        Ok(())
    }
}

async fn insert_items(
    tx: &mut Transaction<'_, Sqlite>,
    sale_order_id: i64,
    items: &[NewSaleOrderItem],
) -> Result<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO sale_order_items (sale_order_id, product_name, quantity, unit_price, subtotal)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(sale_order_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.subtotal)
        .execute(&mut **tx)
        .await
        .context("Failed to insert sale order item")?;
    }
    Ok(())
}
