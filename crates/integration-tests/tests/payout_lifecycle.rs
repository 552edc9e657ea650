//! Payout lifecycle tests against the database procedures.
//!
//! These tests require a running `PostgreSQL` with migrations applied:
//!
//! ```bash
//! cargo run -p pixelfair-cli -- migrate
//! cargo test -p pixelfair-integration-tests --test payout_lifecycle -- --ignored
//! ```

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use pixelfair_integration_tests::test_database_url;

async fn pool() -> PgPool {
    PgPool::connect(&test_database_url())
        .await
        .expect("Failed to connect to test database")
}

/// Create a seller with the given balance and payout email, returning its id.
async fn seed_seller(pool: &PgPool, balance: Decimal, payout_email: Option<&str>) -> i32 {
    let email = format!("seller-{}@test.example", Uuid::new_v4());

    let user_id: i32 = sqlx::query_scalar("INSERT INTO users (email) VALUES ($1) RETURNING id")
        .bind(&email)
        .fetch_one(pool)
        .await
        .expect("Failed to seed user");

    sqlx::query_scalar(
        r"
        INSERT INTO sellers (user_id, display_name, available_balance, payout_email)
        VALUES ($1, 'Test Seller', $2, $3)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(balance)
    .bind(payout_email)
    .fetch_one(pool)
    .await
    .expect("Failed to seed seller")
}

async fn request_payout(pool: &PgPool, seller_id: i32, amount: Decimal) -> String {
    sqlx::query_scalar("SELECT request_payout($1, $2)")
        .bind(seller_id)
        .bind(amount)
        .fetch_one(pool)
        .await
        .expect("request_payout call failed")
}

async fn seller_balance(pool: &PgPool, seller_id: i32) -> Decimal {
    sqlx::query_scalar("SELECT available_balance FROM sellers WHERE id = $1")
        .bind(seller_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read balance")
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_payout_exactly_at_balance_succeeds() {
    let pool = pool().await;
    let seller_id = seed_seller(&pool, Decimal::new(1000, 2), Some("pay@test.example")).await;

    let outcome = request_payout(&pool, seller_id, Decimal::new(1000, 2)).await;

    assert!(outcome.starts_with("ok:"), "got {outcome}");
    assert_eq!(seller_balance(&pool, seller_id).await, Decimal::ZERO);
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_payout_one_cent_over_balance_fails() {
    let pool = pool().await;
    let seller_id = seed_seller(&pool, Decimal::new(1000, 2), Some("pay@test.example")).await;

    let outcome = request_payout(&pool, seller_id, Decimal::new(1001, 2)).await;

    assert_eq!(outcome, "insufficient_balance");
    // Balance untouched on failure
    assert_eq!(seller_balance(&pool, seller_id).await, Decimal::new(1000, 2));
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_payout_without_payout_email_fails() {
    let pool = pool().await;
    let seller_id = seed_seller(&pool, Decimal::new(5000, 2), None).await;

    let outcome = request_payout(&pool, seller_id, Decimal::new(1000, 2)).await;

    assert_eq!(outcome, "no_payout_email");
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_payout_for_suspended_seller_fails() {
    let pool = pool().await;
    let seller_id = seed_seller(&pool, Decimal::new(5000, 2), Some("pay@test.example")).await;

    sqlx::query("UPDATE sellers SET status = 'suspended' WHERE id = $1")
        .bind(seller_id)
        .execute(&pool)
        .await
        .expect("Failed to suspend seller");

    let outcome = request_payout(&pool, seller_id, Decimal::new(1000, 2)).await;

    assert_eq!(outcome, "seller_not_active");
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fail_payout_refunds_full_amount() {
    let pool = pool().await;
    let initial = Decimal::new(7500, 2);
    let amount = Decimal::new(2500, 2);
    let seller_id = seed_seller(&pool, initial, Some("pay@test.example")).await;

    let outcome = request_payout(&pool, seller_id, amount).await;
    let payout_id: i32 = outcome
        .strip_prefix("ok:")
        .expect("payout should be created")
        .parse()
        .expect("payout id should be numeric");

    assert_eq!(seller_balance(&pool, seller_id).await, initial - amount);

    let fail_outcome: String = sqlx::query_scalar("SELECT fail_payout($1, $2)")
        .bind(payout_id)
        .bind("bounced")
        .fetch_one(&pool)
        .await
        .expect("fail_payout call failed");
    assert_eq!(fail_outcome, "ok");

    // Conservation: debit plus refund nets to zero
    assert_eq!(seller_balance(&pool, seller_id).await, initial);

    let (status, reason): (String, Option<String>) = sqlx::query_as(
        "SELECT status::text, failure_reason FROM payout_requests WHERE id = $1",
    )
    .bind(payout_id)
    .fetch_one(&pool)
    .await
    .expect("Failed to read payout");
    assert_eq!(status, "failed");
    assert_eq!(reason.as_deref(), Some("bounced"));
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fail_payout_twice_is_rejected() {
    let pool = pool().await;
    let initial = Decimal::new(5000, 2);
    let seller_id = seed_seller(&pool, initial, Some("pay@test.example")).await;

    let outcome = request_payout(&pool, seller_id, Decimal::new(1000, 2)).await;
    let payout_id: i32 = outcome
        .strip_prefix("ok:")
        .expect("payout should be created")
        .parse()
        .expect("payout id should be numeric");

    let first: String = sqlx::query_scalar("SELECT fail_payout($1, 'bounced')")
        .bind(payout_id)
        .fetch_one(&pool)
        .await
        .expect("fail_payout call failed");
    assert_eq!(first, "ok");

    let second: String = sqlx::query_scalar("SELECT fail_payout($1, 'bounced again')")
        .bind(payout_id)
        .fetch_one(&pool)
        .await
        .expect("fail_payout call failed");
    assert_eq!(second, "invalid_state");

    // No double refund
    assert_eq!(seller_balance(&pool, seller_id).await, initial);
}

#[tokio::test]
#[ignore = "Requires running database with migrations"]
async fn test_fail_unknown_payout_reports_not_found() {
    let pool = pool().await;

    let outcome: String = sqlx::query_scalar("SELECT fail_payout($1, 'whatever')")
        .bind(999_999_999_i32)
        .fetch_one(&pool)
        .await
        .expect("fail_payout call failed");

    assert_eq!(outcome, "not_found");
}
