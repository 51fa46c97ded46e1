//! Order repository
//!
//! Order creation writes the order and all of its lines as a single
//! transaction: either every row is visible or none. Status columns are
//! mutated only by [`crate::orders::state_machine::OrderStateMachine`].

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::models::{Order, OrderDetail, OrderItem};
use crate::orders::state_machine::{OrderStatus, PaymentState};
use crate::utils::AppResult;

/// Input for one order, monetary fields already priced
pub struct NewOrder {
    pub order_number: String,
    pub user_id: String,
    pub shipping_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    pub subtotal: i64,
    pub discount_amount: i64,
    pub shipping_fee: i64,
    pub tax_amount: i64,
    pub total_amount: i64,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Input for one order line (checkout-time snapshot)
pub struct NewOrderItem {
    pub variant_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total_price: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist an order with its lines atomically and return it.
    pub async fn create_with_items(
        &self,
        order: NewOrder,
        items: Vec<NewOrderItem>,
    ) -> AppResult<Order> {
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders \
             (id, order_number, user_id, shipping_address_id, billing_address_id, \
              order_status, payment_status, subtotal, discount_amount, shipping_fee, \
              tax_amount, total_amount, coupon_code, notes, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 'pending', ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        )
        .bind(&order_id)
        .bind(&order.order_number)
        .bind(&order.user_id)
        .bind(&order.shipping_address_id)
        .bind(&order.billing_address_id)
        .bind(order.subtotal)
        .bind(order.discount_amount)
        .bind(order.shipping_fee)
        .bind(order.tax_amount)
        .bind(order.total_amount)
        .bind(&order.coupon_code)
        .bind(&order.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in &items {
            sqlx::query(
                "INSERT INTO order_items \
                 (id, order_id, variant_id, product_name, quantity, unit_price, total_price, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order_id)
            .bind(&item.variant_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.total_price)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(Order {
            id: order_id,
            order_number: order.order_number,
            user_id: order.user_id,
            shipping_address_id: order.shipping_address_id,
            billing_address_id: order.billing_address_id,
            order_status: OrderStatus::Pending,
            payment_status: PaymentState::Pending,
            subtotal: order.subtotal,
            discount_amount: order.discount_amount,
            shipping_fee: order.shipping_fee,
            tax_amount: order.tax_amount,
            total_amount: order.total_amount,
            coupon_code: order.coupon_code,
            notes: order.notes,
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn find_by_id(&self, order_id: &str) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = ?1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    /// Owner-scoped lookup: absent and not-owned are indistinguishable
    pub async fn find_owned(&self, order_id: &str, user_id: &str) -> AppResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE id = ?1 AND user_id = ?2",
        )
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(order)
    }

    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE user_id = ?1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    /// Admin listing with optional status filter and paging
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, Order>(
                    "SELECT * FROM orders WHERE order_status = ?1 \
                     ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                )
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Order>(
                    "SELECT * FROM orders ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(orders)
    }

    pub async fn items(&self, order_id: &str) -> AppResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY created_at",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn detail(&self, order: Order) -> AppResult<OrderDetail> {
        let items = self.items(&order.id).await?;
        Ok(OrderDetail { order, items })
    }
}
