//! Seller product management handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use pixelfair_core::{ProductId, ProductStatus};

use crate::db::{
    ProductRepository,
    products::{DeleteOutcome, NewProduct, Product},
};
use crate::error::{AppError, Result};
use crate::middleware::RequireSeller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductBody {
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub price_b2c: Decimal,
    pub price_b2b: Decimal,
}

/// Create a draft listing.
#[instrument(skip(seller, state, body))]
pub async fn create(
    seller: RequireSeller,
    State(state): State<AppState>,
    Json(body): Json<CreateProductBody>,
) -> Result<Json<Product>> {
    if body.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if body.file_path.trim().is_empty() {
        return Err(AppError::Validation("file path is required".to_string()));
    }
    if body.price_b2c < Decimal::ZERO || body.price_b2b < Decimal::ZERO {
        return Err(AppError::Validation(
            "prices must not be negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool())
        .create(
            seller.seller.id,
            &NewProduct {
                title: body.title.trim().to_string(),
                description: body.description,
                file_path: body.file_path,
                price_b2c: body.price_b2c,
                price_b2b: body.price_b2b,
            },
        )
        .await?;

    Ok(Json(product))
}

/// List the caller's own products.
#[instrument(skip(seller, state))]
pub async fn list(
    seller: RequireSeller,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool())
        .list_for_seller(seller.seller.id)
        .await?;

    Ok(Json(products))
}

/// Publish a draft listing.
#[instrument(skip(seller, state))]
pub async fn publish(
    seller: RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .set_status(id, seller.seller.id, ProductStatus::Published)
        .await?;

    Ok(Json(product))
}

/// Archive a listing, removing it from sale.
#[instrument(skip(seller, state))]
pub async fn archive(
    seller: RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .set_status(id, seller.seller.id, ProductStatus::Archived)
        .await?;

    Ok(Json(product))
}

/// Delete a listing, or archive it when order history exists.
#[instrument(skip(seller, state))]
pub async fn delete(
    seller: RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let outcome = ProductRepository::new(state.pool())
        .delete_or_archive(id, seller.seller.id)
        .await?;

    let body = match outcome {
        DeleteOutcome::Deleted => json!({ "success": true, "outcome": "deleted" }),
        DeleteOutcome::Archived => json!({
            "success": true,
            "outcome": "archived",
            "message": "product has order history and was archived instead of deleted"
        }),
    };

    Ok(Json(body))
}
