//! Order repository: captured purchases, receipts, manual fulfillment.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{
    LicenseType, OrderId, OrderItemId, PaymentStatus, ProductId, SellerId, UserId,
};

use super::RepositoryError;
use super::users::SendGate;

/// A captured order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Account the order is attached to; guest checkouts carry `None`.
    pub user_id: Option<UserId>,
    pub buyer_email: String,
    pub buyer_name: String,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub paypal_order_id: String,
    pub paypal_capture_id: Option<String>,
    #[serde(skip)]
    pub receipt_token: String,
    #[serde(skip)]
    pub receipt_expires_at: DateTime<Utc>,
    #[serde(skip)]
    pub last_receipt_sent_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub receipt_send_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A line item on an order. Prices are frozen at capture time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub title: String,
    pub license_type: LicenseType,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Line total: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Line item input for [`OrderRepository::create_with_items`].
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub seller_id: SellerId,
    pub title: String,
    pub license_type: LicenseType,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Fields required to record a captured order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub buyer_email: String,
    pub buyer_name: String,
    pub total: Decimal,
    pub paypal_order_id: String,
    pub paypal_capture_id: String,
    pub receipt_token: String,
    pub receipt_expires_at: DateTime<Utc>,
}

/// Condensed order row for the buyer dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub total: Decimal,
    pub payment_status: PaymentStatus,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Tagged result of the `fulfill_order_from_webhook` backend procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillOutcome {
    Fulfilled,
    NotFound,
    AlreadyCompleted,
}

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a captured order and all its line items in one transaction.
    ///
    /// Escrow entries for each item are written in the same transaction so a
    /// completed order always has matching escrow rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// persisted on failure.
    pub async fn create_with_items(
        &self,
        new: &NewOrder,
        items: &[NewOrderItem],
        escrow_matures_at: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders
                (user_id, buyer_email, buyer_name, total, payment_status,
                 paypal_order_id, paypal_capture_id, receipt_token, receipt_expires_at)
            VALUES ($1, $2, $3, $4, 'completed', $5, $6, $7, $8)
            RETURNING id, user_id, buyer_email, buyer_name, total, payment_status,
                      paypal_order_id, paypal_capture_id, receipt_token,
                      receipt_expires_at, last_receipt_sent_at, receipt_send_count,
                      created_at
            ",
        )
        .bind(new.user_id)
        .bind(&new.buyer_email)
        .bind(&new.buyer_name)
        .bind(new.total)
        .bind(&new.paypal_order_id)
        .bind(&new.paypal_capture_id)
        .bind(&new.receipt_token)
        .bind(new.receipt_expires_at)
        .fetch_one(&mut *tx)
        .await?;

        for item in items {
            let item_id: OrderItemId = sqlx::query_scalar(
                r"
                INSERT INTO order_items
                    (order_id, product_id, seller_id, title, license_type, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                ",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(item.seller_id)
            .bind(&item.title)
            .bind(item.license_type)
            .bind(item.quantity)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query(
                r"
                INSERT INTO escrow_entries (order_item_id, seller_id, amount, matures_at)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(item_id)
            .bind(item.seller_id)
            .bind(item.unit_price * rust_decimal::Decimal::from(item.quantity))
            .bind(escrow_matures_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(order)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, buyer_email, buyer_name, total, payment_status,
                   paypal_order_id, paypal_capture_id, receipt_token,
                   receipt_expires_at, last_receipt_sent_at, receipt_send_count,
                   created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get an order by its receipt token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_receipt_token(
        &self,
        token: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(
            r"
            SELECT id, user_id, buyer_email, buyer_name, total, payment_status,
                   paypal_order_id, paypal_capture_id, receipt_token,
                   receipt_expires_at, last_receipt_sent_at, receipt_send_count,
                   created_at
            FROM orders
            WHERE receipt_token = $1
            ",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get one line item scoped to its order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_item(
        &self,
        order_id: OrderId,
        item_id: OrderItemId,
    ) -> Result<Option<OrderItem>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, seller_id, title, license_type, quantity, unit_price
            FROM order_items
            WHERE id = $1 AND order_id = $2
            ",
        )
        .bind(item_id)
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// List all line items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, seller_id, title, license_type, quantity, unit_price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Order summaries for the buyer dashboard, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summaries_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummary>(
            r"
            SELECT o.id, o.total, o.payment_status,
                   count(oi.id) AS item_count, o.created_at
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Gate a receipt resend on the per-order cooldown.
    ///
    /// Stamps `last_receipt_sent_at` and bumps the send counter in the same
    /// `UPDATE` that checks the cooldown, so two concurrent resends cannot
    /// both pass.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn gate_receipt_resend(
        &self,
        order_id: OrderId,
        cooldown: Duration,
        now: DateTime<Utc>,
    ) -> Result<SendGate, RepositoryError> {
        let threshold = now - cooldown;

        let result = sqlx::query(
            r"
            UPDATE orders
            SET last_receipt_sent_at = $2,
                receipt_send_count = receipt_send_count + 1
            WHERE id = $1
              AND (last_receipt_sent_at IS NULL OR last_receipt_sent_at <= $3)
            ",
        )
        .bind(order_id)
        .bind(now)
        .bind(threshold)
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(SendGate::Allowed);
        }

        let order = self.get(order_id).await?.ok_or(RepositoryError::NotFound)?;
        let wait_seconds = order
            .last_receipt_sent_at
            .map_or(0, |sent| (sent + cooldown - now).num_seconds().max(0));

        Ok(SendGate::Cooldown { wait_seconds })
    }

    /// Fulfill an order through the `fulfill_order_from_webhook` procedure.
    ///
    /// Used by the manual admin path with a synthetic capture id. The
    /// procedure flips payment status, credits escrow, and is a no-op on
    /// already-completed orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the call fails, or
    /// `RepositoryError::DataCorruption` if the procedure returns an
    /// unrecognized tag.
    pub async fn fulfill(
        &self,
        order_id: OrderId,
        capture_id: &str,
    ) -> Result<FulfillOutcome, RepositoryError> {
        let outcome: String = sqlx::query_scalar("SELECT fulfill_order_from_webhook($1, $2)")
            .bind(order_id)
            .bind(capture_id)
            .fetch_one(self.pool)
            .await?;

        match outcome.as_str() {
            "fulfilled" => Ok(FulfillOutcome::Fulfilled),
            "not_found" => Ok(FulfillOutcome::NotFound),
            "already_completed" => Ok(FulfillOutcome::AlreadyCompleted),
            other => Err(RepositoryError::DataCorruption(format!(
                "fulfill_order_from_webhook returned unknown tag: {other}"
            ))),
        }
    }
}
