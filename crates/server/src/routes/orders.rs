//! Order capture and download handlers.

use axum::{
    Json,
    extract::{Path, State},
    response::Redirect,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use pixelfair_core::{LicenseType, OrderId, OrderItemId, ProductId};

use crate::db::{
    OrderRepository, ProductRepository,
    orders::{NewOrder, NewOrderItem},
};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalUser, receipt_access};
use crate::services::email::generate_token;
use crate::state::AppState;

/// How long a receipt link stays usable.
const RECEIPT_TTL_DAYS: i64 = 30;

/// How long escrowed funds are held before release.
const ESCROW_HOLD_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRequest {
    pub paypal_order_id: String,
    pub items: Vec<CaptureItem>,
    pub buyer_name: Option<String>,
    /// Required for guest checkouts; ignored when a session is present.
    pub buyer_email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub license: LicenseType,
}

/// Capture an approved PayPal order and record it.
///
/// Prices come from the product table, never from the client. The PayPal
/// capture is confirmed before anything is written; the order and its items
/// then land in one transaction.
#[instrument(skip(state, body))]
pub async fn capture(
    OptionalUser(user): OptionalUser,
    State(state): State<AppState>,
    Json(body): Json<CaptureRequest>,
) -> Result<Json<Value>> {
    if body.items.is_empty() {
        return Err(AppError::Validation("order has no items".to_string()));
    }
    if body.paypal_order_id.trim().is_empty() {
        return Err(AppError::Validation("missing PayPal order id".to_string()));
    }

    let buyer_email = match (&user, &body.buyer_email) {
        (Some(u), _) => u.email.to_string(),
        (None, Some(email)) if !email.trim().is_empty() => email.trim().to_string(),
        (None, _) => {
            return Err(AppError::Validation(
                "buyer email required for guest checkout".to_string(),
            ));
        }
    };
    let buyer_name = body.buyer_name.unwrap_or_default();

    // Re-derive every price server-side; only published products are sellable.
    let products = ProductRepository::new(state.pool());
    let mut line_items = Vec::with_capacity(body.items.len());
    let mut total = Decimal::ZERO;

    for item in &body.items {
        if item.quantity < 1 {
            return Err(AppError::Validation("invalid quantity".to_string()));
        }

        let product = products
            .get_published(item.product_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("product {} is not available", item.product_id))
            })?;

        let unit_price = product.price_for(item.license);
        total += unit_price * Decimal::from(item.quantity);

        line_items.push(NewOrderItem {
            product_id: product.id,
            seller_id: product.seller_id,
            title: product.title,
            license_type: item.license,
            quantity: item.quantity,
            unit_price,
        });
    }

    // Payment gate: no write happens unless the capture completed.
    let capture = state.paypal().capture_order(&body.paypal_order_id).await?;

    let now = Utc::now();
    let order = OrderRepository::new(state.pool())
        .create_with_items(
            &NewOrder {
                user_id: user.as_ref().map(|u| u.id),
                buyer_email,
                buyer_name,
                total,
                paypal_order_id: body.paypal_order_id,
                paypal_capture_id: capture.capture_id,
                receipt_token: generate_token(),
                receipt_expires_at: now + Duration::days(RECEIPT_TTL_DAYS),
            },
            &line_items,
            now + Duration::days(ESCROW_HOLD_DAYS),
        )
        .await?;

    if let Some(user) = &user {
        state.order_cache().invalidate(&user.id).await;
    }

    tracing::info!(order_id = %order.id, total = %order.total, "Order captured");

    Ok(Json(json!({ "success": true, "orderId": order.id })))
}

/// Redirect to a short-lived signed URL for a purchased file.
///
/// Access requires either a session owning the order or a valid receipt
/// grant. Unknown, unowned, and missing items are all 404.
#[instrument(skip(state, session))]
pub async fn download(
    OptionalUser(user): OptionalUser,
    State(state): State<AppState>,
    session: Session,
    Path((order_id, item_id)): Path<(OrderId, OrderItemId)>,
) -> Result<Redirect> {
    let now = Utc::now();

    let orders = OrderRepository::new(state.pool());
    let order = orders
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

    let owns_via_session =
        matches!((&user, order.user_id), (Some(u), Some(owner)) if u.id == owner);
    let owns_via_grant = receipt_access(&session, order_id, now).await.is_some();

    if !owns_via_session && !owns_via_grant {
        return Err(AppError::NotFound("order not found".to_string()));
    }

    let item = orders
        .get_item(order_id, item_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order item not found".to_string()))?;

    let product = ProductRepository::new(state.pool())
        .get(item.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("file no longer available".to_string()))?;

    let url = state.storage().signed_url(&product.file_path, now);

    Ok(Redirect::to(&url))
}
