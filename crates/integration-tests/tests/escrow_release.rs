//! Escrow release sweep tests against the database procedures.
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
    seller_id: i32,
}

/// Seed a seller with one completed order whose escrow matured in the past.
async fn seed_matured_escrow(pool: &PgPool, amount: Decimal) -> Fixture {
    let marker = Uuid::new_v4();
    let email = format!("escrow-{marker}@test.example");

    let user_id: i32 = sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(&email)
        .fetch_one(pool)
        .await
        .expect("Failed to seed user");

    let seller_id: i32 = sqlx::query_scalar(
        "INSERT INTO sellers (user_id, display_name) VALUES ($1, 'Escrow Seller') RETURNING id",
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
    .bind(amount)
    .fetch_one(pool)
    .await
    .expect("Failed to seed product");

    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO orders
            (buyer_email, buyer_name, total, payment_status, paypal_order_id,
             receipt_token, receipt_expires_at)
        VALUES ($1, 'Buyer', $2, 'completed', $3, $4, now() + interval '30 days')
        RETURNING id
        ",
    )
    .bind(&email)
    .bind(amount)
    .bind(format!("PP-{marker}"))
    .bind(format!("receipt-{marker}"))
    .fetch_one(pool)
    .await
    .expect("Failed to seed order");

    let item_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO order_items
            (order_id, product_id, seller_id, title, license_type, quantity, unit_price)
        VALUES ($1, $2, $3, 'Asset', 'personal', 1, $4)
        RETURNING id
        ",
    )
    .bind(order_id)
    .bind(product_id)
    .bind(seller_id)
    .bind(amount)
    .fetch_one(pool)
    .await
    .expect("Failed to seed order item");

    sqlx::query(
        r"
        INSERT INTO escrow_entries (order_item_id, seller_id, amount, matures_at)
        VALUES ($1, $2, $3, now() - interval '1 hour')
        ",
    )
    .bind(item_id)
    .bind(seller_id)
    .bind(amount)
    .execute(pool)
    .await
    .expect("Failed to seed escrow entry");

    Fixture { seller_id }
}

async fn seller_balance(pool: &PgPool, seller_id: i32) -> Decimal {
    sqlx::query_scalar("SELECT available_balance FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

async fn run_sweep(pool: &PgPool) -> (i64, Decimal) {
    sqlx::query_as(
        "SELECT records_processed, total_amount_released FROM release_matured_escrow()",
    )
    .fetch_one(pool)
    .await
    .expect("release_matured_escrow call failed")
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_matured_escrow_credits_seller() {
    let pool = pool().await;
    let amount = Decimal::new(4200, 2);
    let fixture = seed_matured_escrow(&pool, amount).await;

    let before = seller_balance(&pool, fixture.seller_id).await;
    let (processed, _total) = run_sweep(&pool).await;

    assert!(processed >= 1);
    assert_eq!(
        seller_balance(&pool, fixture.seller_id).await,
        before + amount
    );
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_sweep_is_idempotent() {
    let pool = pool().await;
    let amount = Decimal::new(1999, 2);
    let fixture = seed_matured_escrow(&pool, amount).await;

    run_sweep(&pool).await;
    let balance_after_first = seller_balance(&pool, fixture.seller_id).await;

    // A second sweep over the same window must not double-credit
    run_sweep(&pool).await;
    let balance_after_second = seller_balance(&pool, fixture.seller_id).await;

    assert_eq!(balance_after_first, balance_after_second);
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_unmatured_escrow_is_not_released() {
    let pool = pool().await;
    let amount = Decimal::new(3000, 2);
    let fixture = seed_matured_escrow(&pool, amount).await;

    // Push the entry's maturity into the future before sweeping
    sqlx::query(
        r"
        UPDATE escrow_entries
        SET matures_at = now() + interval '7 days'
        WHERE seller_id = $1
        ",
    )
    .bind(fixture.seller_id)
    .execute(&pool)
    .await
    .expect("Failed to update maturity");

    let before = seller_balance(&pool, fixture.seller_id).await;
    run_sweep(&pool).await;

    assert_eq!(seller_balance(&pool, fixture.seller_id).await, before);
}
