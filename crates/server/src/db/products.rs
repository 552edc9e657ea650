//! Product repository: listings, lifecycle, and order-preserving deletion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use pixelfair_core::{LicenseType, ProductId, ProductStatus, SellerId};

use super::RepositoryError;

/// A digital-goods listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub seller_id: SellerId,
    pub title: String,
    pub description: Option<String>,
    /// Storage path of the downloadable file.
    pub file_path: String,
    pub price_b2c: Decimal,
    pub price_b2b: Decimal,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Unit price for a license type: personal buyers pay the B2C price,
    /// commercial buyers the B2B price.
    #[must_use]
    pub const fn price_for(&self, license: LicenseType) -> Decimal {
        match license {
            LicenseType::Personal => self.price_b2c,
            LicenseType::Commercial => self.price_b2b,
        }
    }
}

/// Fields required to create a listing.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub price_b2c: Decimal,
    pub price_b2b: Decimal,
}

/// What happened when a seller asked to delete a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// No order ever referenced the product; the row is gone.
    Deleted,
    /// The product has order history and was archived instead.
    Archived,
}

/// Repository for product listings.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a draft listing for a seller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        seller_id: SellerId,
        new: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (seller_id, title, description, file_path, price_b2c, price_b2b)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, seller_id, title, description, file_path,
                      price_b2c, price_b2b, status, created_at, updated_at
            ",
        )
        .bind(seller_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.file_path)
        .bind(new.price_b2c)
        .bind(new.price_b2b)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            SELECT id, seller_id, title, description, file_path,
                   price_b2c, price_b2b, status, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a published product. Order capture prices against this row; drafts
    /// and archived listings are not purchasable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_published(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            SELECT id, seller_id, title, description, file_path,
                   price_b2c, price_b2b, status, created_at, updated_at
            FROM products
            WHERE id = $1 AND status = 'published'
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// List a seller's products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(
        &self,
        seller_id: SellerId,
    ) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(
            r"
            SELECT id, seller_id, title, description, file_path,
                   price_b2c, price_b2b, status, created_at, updated_at
            FROM products
            WHERE seller_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(seller_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Move a seller's own product to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist or
    /// isn't owned by the seller.
    pub async fn set_status(
        &self,
        id: ProductId,
        seller_id: SellerId,
        status: ProductStatus,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(
            r"
            UPDATE products
            SET status = $3, updated_at = now()
            WHERE id = $1 AND seller_id = $2
            RETURNING id, seller_id, title, description, file_path,
                      price_b2c, price_b2b, status, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(seller_id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)
    }

    /// Delete a seller's product, or archive it when order history exists.
    ///
    /// Invariant: a product referenced by any `order_items` row is never
    /// hard-deleted. The reference check and the mutation run in one
    /// transaction with the product row locked, so a concurrent capture
    /// cannot slip an order in between.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist or
    /// isn't owned by the seller.
    pub async fn delete_or_archive(
        &self,
        id: ProductId,
        seller_id: SellerId,
    ) -> Result<DeleteOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<ProductId> = sqlx::query_scalar(
            "SELECT id FROM products WHERE id = $1 AND seller_id = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(seller_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let order_count: i64 =
            sqlx::query_scalar("SELECT count(*) FROM order_items WHERE product_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        let outcome = if order_count > 0 {
            sqlx::query("UPDATE products SET status = 'archived', updated_at = now() WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Archived
        } else {
            sqlx::query("DELETE FROM products WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            DeleteOutcome::Deleted
        };

        tx.commit().await?;

        Ok(outcome)
    }
}
