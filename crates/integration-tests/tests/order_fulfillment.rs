//! Order fulfillment tests against the database procedure.
//!
//! Require a running `PostgreSQL` with migrations applied.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use pixelfair_integration_tests::test_database_url;

async fn pool() -> PgPool {
    PgPool::connect(&test_database_url())
        .await
        .expect("Failed to connect to test database")
}

struct Fixture {
    order_id: i32,
    item_id: i32,
    seller_id: i32,
}

/// Seed a pending order with one line item and no escrow.
async fn seed_pending_order(pool: &PgPool, unit_price: Decimal, quantity: i32) -> Fixture {
    let marker = Uuid::new_v4();
    let email = format!("fulfill-{marker}@test.example");

    let user_id: i32 = sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(&email)
        .fetch_one(pool)
        .await
        .expect("Failed to seed user");

    let seller_id: i32 = sqlx::query_scalar(
        "INSERT INTO sellers (user_id, display_name) VALUES ($1, 'Fulfill Seller') RETURNING id",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("Failed to seed seller");

    let product_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO products (seller_id, title, file_path, price_b2c, price_b2b, status)
        VALUES ($1, 'Asset', 'products/test.zip', $2, $2, 'published')
        RETURNING id
        ",
    )
    .bind(seller_id)
    .bind(unit_price)
    .fetch_one(pool)
    .await
    .expect("Failed to seed product");

    let total = unit_price * Decimal::from(quantity);
    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO orders
            (buyer_email, buyer_name, total, payment_status, paypal_order_id,
             receipt_token, receipt_expires_at)
        VALUES ($1, 'Buyer', $2, 'pending', $3, $4, now() + interval '30 days')
        RETURNING id
        ",
    )
    .bind(&email)
    .bind(total)
    .bind(format!("PP-{marker}"))
    .bind(format!("receipt-{marker}"))
    .fetch_one(pool)
    .await
    .expect("Failed to seed order");

    let item_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO order_items
            (order_id, product_id, seller_id, title, license_type, quantity, unit_price)
        VALUES ($1, $2, $3, 'Asset', 'personal', $4, $5)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(seller_id)
    .bind(quantity)
    .bind(unit_price)
    .fetch_one(pool)
    .await
    .expect("Failed to seed order item");

    Fixture {
        order_id,
        item_id,
        seller_id,
    }
}

async fn fulfill(pool: &PgPool, order_id: i32, capture_id: &str) -> String {
    sqlx::query_scalar("SELECT fulfill_order_from_webhook($1, $2)")
        .bind(order_id)
        .bind(capture_id)
        .fetch_one(pool)
        .await
        .expect("fulfill_order_from_webhook call failed")
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fulfillment_credits_escrow_per_item() {
    let pool = pool().await;
    let unit_price = Decimal::new(1250, 2);
    let fixture = seed_pending_order(&pool, unit_price, 3).await;

    let outcome = fulfill(&pool, fixture.order_id, "MANUAL-test").await;
    assert_eq!(outcome, "fulfilled");

    let (status, capture_id): (String, Option<String>) = sqlx::query_as(
        "SELECT payment_status::text, paypal_capture_id FROM orders WHERE id = $1",
    )
    .bind(fixture.order_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to read order");
    assert_eq!(status, "completed");
    assert_eq!(capture_id.as_deref(), Some("MANUAL-test"));

    // Escrow credited for the line item: unit price times quantity
    let (seller_id, amount): (i32, Decimal) = sqlx::query_as(
        "SELECT seller_id, amount FROM escrow_entries WHERE order_item_id = $1",
    )
    .bind(fixture.item_id)
    .fetch_one(&pool)
    .await
    .expect("Escrow entry missing after fulfillment");
    assert_eq!(seller_id, fixture.seller_id);
    assert_eq!(amount, unit_price * Decimal::from(3));
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fulfilling_twice_does_not_duplicate_escrow() {
    let pool = pool().await;
    let fixture = seed_pending_order(&pool, Decimal::new(999, 2), 1).await;

    let first = fulfill(&pool, fixture.order_id, "MANUAL-first").await;
    assert_eq!(first, "fulfilled");

    let second = fulfill(&pool, fixture.order_id, "MANUAL-second").await;
    assert_eq!(second, "already_completed");

    let escrow_rows: i64 =
        sqlx::query_scalar("SELECT count(*) FROM escrow_entries WHERE order_item_id = $1")
            .bind(fixture.item_id)
            .fetch_one(&pool)
            .await
            .expect("Failed to count escrow entries");
    assert_eq!(escrow_rows, 1);
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fulfilling_unknown_order_reports_not_found() {
    let pool = pool().await;

    let outcome = fulfill(&pool, 999_999_999, "MANUAL-test").await;
    assert_eq!(outcome, "not_found");
}
