//! Guest receipt access tests against a running server.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied
//! - The server running (cargo run -p pixelfair-server)

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use pixelfair_integration_tests::{server_base_url, test_database_url};

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

struct SeededOrder {
    order_id: i32,
    token: String,
    buyer_email: String,
}

/// Seed a completed order with a known receipt token directly in the database.
async fn seed_order() -> SeededOrder {
    let pool = PgPool::connect(&test_database_url())
        .await
        .expect("Failed to connect to test database");

    let marker = Uuid::new_v4();
    let buyer_email = format!("buyer-{marker}@test.example");
    let token = format!("receipt-{marker}");

    let order_id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO orders
            (buyer_email, buyer_name, total, payment_status, paypal_order_id,
             receipt_token, receipt_expires_at)
        VALUES ($1, 'Test Buyer', 12.34, 'completed', $2, $3,
                now() + interval '30 days')
        RETURNING id
        ",
    )
    .bind(&buyer_email)
    .bind(format!("PP-{marker}"))
    .bind(&token)
    .fetch_one(&pool)
    .await
    .expect("Failed to seed order");

    SeededOrder {
        order_id,
        token,
        buyer_email,
    }
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_receipt_challenge_succeeds_with_matching_email() {
    let order = seed_order().await;
    let client = client();
    let base_url = server_base_url();

    let resp = client
        .post(format!("{base_url}/api/receipt/verify"))
        .json(&json!({ "token": order.token, "email": order.buyer_email }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["orderId"], json!(order.order_id));
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_receipt_challenge_is_case_insensitive() {
    let order = seed_order().await;
    let client = client();
    let base_url = server_base_url();

    let resp = client
        .post(format!("{base_url}/api/receipt/verify"))
        .json(&json!({
            "token": order.token,
            "email": order.buyer_email.to_uppercase(),
        }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_wrong_email_and_wrong_token_look_identical() {
    let order = seed_order().await;
    let client = client();
    let base_url = server_base_url();

    let wrong_email = client
        .post(format!("{base_url}/api/receipt/verify"))
        .json(&json!({ "token": order.token, "email": "other@test.example" }))
        .send()
        .await
        .expect("request failed");

    let wrong_token = client
        .post(format!("{base_url}/api/receipt/verify"))
        .json(&json!({ "token": "no-such-token", "email": order.buyer_email }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(wrong_email.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_token.status(), StatusCode::UNAUTHORIZED);

    // Same generic body either way; neither input is probeable
    let body_email: Value = wrong_email.json().await.expect("invalid JSON");
    let body_token: Value = wrong_token.json().await.expect("invalid JSON");
    assert_eq!(body_email, body_token);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_grant_cookie_unlocks_downloads_for_that_order_only() {
    let order = seed_order().await;
    let other = seed_order().await;
    let client = client();
    let base_url = server_base_url();

    let resp = client
        .post(format!("{base_url}/api/receipt/verify"))
        .json(&json!({ "token": order.token, "email": order.buyer_email }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    // The grant is scoped to the verified order; another order stays 404
    let cross = client
        .get(format!(
            "{base_url}/api/downloads/{}/1",
            other.order_id
        ))
        .send()
        .await
        .expect("request failed");

    assert_eq!(cross.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_resend_cooldown_returns_wait_seconds() {
    let order = seed_order().await;
    let client = client();
    let base_url = server_base_url();

    let first = client
        .post(format!("{base_url}/api/receipt/resend"))
        .json(&json!({ "token": order.token, "email": order.buyer_email }))
        .send()
        .await
        .expect("request failed");
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .post(format!("{base_url}/api/receipt/resend"))
        .json(&json!({ "token": order.token, "email": order.buyer_email }))
        .send()
        .await
        .expect("request failed");

    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = second.json().await.expect("invalid JSON");
    let wait = body["waitSeconds"].as_i64().expect("waitSeconds missing");
    assert!(wait > 0 && wait <= 120);
}
