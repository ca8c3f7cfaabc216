//! Storefront pages served against the fake backend.

#![allow(clippy::unwrap_used)]

use reqwest::{Client, StatusCode};
use safeuse_integration_tests::{FakeBackend, INTENT_ID, INTENT_SECRET, browser, serve};
use safeuse_storefront::state::AppState;
use serde_json::{Value, json};

async fn start() -> (FakeBackend, String) {
    let fake = FakeBackend::start().await.unwrap();
    let state = AppState::new(fake.storefront_config()).unwrap();
    let addr = serve(safeuse_storefront::app(state)).await.unwrap();
    (fake, format!("http://{addr}"))
}

#[tokio::test]
async fn test_health() {
    let (_fake, base) = start().await;
    let response = browser().unwrap().get(format!("{base}/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_cookie_banner_hidden_after_consent() {
    let (_fake, base) = start().await;
    let client = browser().unwrap();

    let home = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(home.status(), StatusCode::OK);
    assert!(home.text().await.unwrap().contains(r#"id="cookie-banner""#));

    let after = client
        .post(format!("{base}/consent"))
        .form(&[("choice", "accept"), ("return_to", "/advice")])
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::OK);
    assert_eq!(after.url().path(), "/advice");
    let body = after.text().await.unwrap();
    assert!(!body.contains(r#"id="cookie-banner""#));
    assert!(body.contains("Test your substance"));
}

#[tokio::test]
async fn test_consent_ignores_foreign_return_path() {
    let (_fake, base) = start().await;
    let response = browser()
        .unwrap()
        .post(format!("{base}/consent"))
        .form(&[("choice", "reject"), ("return_to", "//evil.example")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/");
}

#[tokio::test]
async fn test_cart_totals() {
    let (_fake, base) = start().await;
    let client = browser().unwrap();

    let cart = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "3"), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    assert_eq!(cart.url().path(), "/cart");

    let body = cart.text().await.unwrap();
    assert!(body.contains("Reagent kit"));
    assert!(body.contains(r#"<dd data-total="subtotal">20.00 €</dd>"#));
    assert!(body.contains(r#"<dd data-total="vat">4.20 €</dd>"#));
    assert!(body.contains(r#"data-total="total" class="grand-total">24.20 €</dd>"#));
}

#[tokio::test]
async fn test_cart_clamps_to_stock() {
    let (_fake, base) = start().await;
    let client = browser().unwrap();

    let body = client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "3"), ("quantity", "9")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(r#"<dd data-total="units">5</dd>"#));
    assert!(body.contains("Only 5 of Reagent kit in stock."));
}

#[tokio::test]
async fn test_empty_cart_checkout_redirects_to_cart() {
    let (fake, base) = start().await;
    let response = browser()
        .unwrap()
        .get(format!("{base}/checkout"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/cart");
    assert_eq!(fake.hits("/api/create-payment-intent"), 0);
}

#[tokio::test]
async fn test_cookie_banner_hidden_after_reject() {
    let (_fake, base) = start().await;
    let client = browser().unwrap();

    client
        .post(format!("{base}/consent"))
        .form(&[("choice", "reject"), ("return_to", "/")])
        .send()
        .await
        .unwrap();

    for path in ["/", "/advice", "/contact"] {
        let body = client
            .get(format!("{base}{path}"))
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(!body.contains(r#"id="cookie-banner""#), "banner shown on {path}");
    }
}

fn contact_form() -> [(&'static str, &'static str); 5] {
    [
        ("first_name", "Ana"),
        ("last_name", "Ruiz"),
        ("email", "ana@example.org"),
        ("phone", ""),
        ("message", "Do you ship reagent kits to Portugal?"),
    ]
}

#[tokio::test]
async fn test_contact_submission_is_forwarded() {
    let (fake, base) = start().await;

    let response = browser()
        .unwrap()
        .post(format!("{base}/contact"))
        .form(&contact_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/contact");
    let body = response.text().await.unwrap();
    assert!(body.contains("Thanks for your message."));
    assert!(!body.contains(r#"role="alert""#));

    let data = fake.data();
    assert_eq!(data.contact_submissions.len(), 1);
    let sent = &data.contact_submissions[0];
    assert_eq!(sent["email"], "ana@example.org");
    assert_eq!(sent["first_name"], "Ana");
    assert!(sent.get("phone").is_none());
}

#[tokio::test]
async fn test_contact_backend_failure_rerenders_form() {
    let (fake, base) = start().await;
    fake.data().fail_contact_submissions = true;

    let response = browser()
        .unwrap()
        .post(format!("{base}/contact"))
        .form(&contact_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/contact");
    let body = response.text().await.unwrap();
    assert!(body.contains(r#"role="alert">The SafeUse service returned an error (HTTP 503)."#));
    assert!(body.contains(r#"value="Ruiz""#));
    assert!(body.contains("Do you ship reagent kits to Portugal?"));
    assert!(fake.data().contact_submissions.is_empty());
}

/// Fill the cart and take the checkout up to a created intent.
async fn start_payment(base: &str) -> Client {
    let client = browser().unwrap();
    client
        .post(format!("{base}/cart/add"))
        .form(&[("product_id", "3"), ("quantity", "2")])
        .send()
        .await
        .unwrap();
    let page = client.get(format!("{base}/checkout")).send().await.unwrap();
    assert_eq!(page.url().path(), "/checkout");

    let intent: Value = client
        .post(format!("{base}/checkout/intent"))
        .json(&json!({
            "cardholder_name": "Ana Ruiz",
            "shipping_address": "Calle Mayor 1, Madrid"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(intent["client_secret"], INTENT_SECRET);
    client
}

async fn report_success(client: &Client, base: &str, transaction_id: &str) -> reqwest::Response {
    client
        .post(format!("{base}/checkout/result"))
        .json(&json!({ "status": "succeeded", "transaction_id": transaction_id }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_checkout_records_order_and_clears_cart() {
    let (fake, base) = start().await;
    let client = start_payment(&base).await;
    assert_eq!(fake.data().intent_requests[0]["amount"], 2420);

    let result: Value = report_success(&client, &base, INTENT_ID)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(result["redirect"], "/checkout/confirmation");

    let body = client
        .get(format!("{base}/checkout/confirmation"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains(&format!("<code data-transaction-id>{INTENT_ID}</code>")));
    assert!(body.contains(r#"<dd data-total="total" class="grand-total">24.20 €</dd>"#));

    {
        let data = fake.data();
        assert_eq!(data.created_orders.len(), 1);
        assert_eq!(data.created_orders[0]["payment_intent_id"], INTENT_ID);
        assert_eq!(data.created_orders[0]["shipping_address"], "Calle Mayor 1, Madrid");
    }

    let cart = client.get(format!("{base}/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_order_failure_still_confirms_payment() {
    let (fake, base) = start().await;
    fake.data().fail_order_creation = true;
    let client = start_payment(&base).await;
    report_success(&client, &base, INTENT_ID).await;

    let response = client
        .get(format!("{base}/checkout/confirmation"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Your payment went through."));
    assert!(!body.contains(r#"role="alert""#));
    assert_eq!(fake.hits("/api/order/create"), 1);
    assert!(fake.data().created_orders.is_empty());

    let cart = client.get(format!("{base}/cart")).send().await.unwrap().text().await.unwrap();
    assert!(cart.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_mismatched_transaction_is_rejected() {
    let (fake, base) = start().await;
    let client = start_payment(&base).await;

    let response = report_success(&client, &base, "pi_someone_else").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No success was recorded, so there is nothing to confirm
    let confirmation = client
        .get(format!("{base}/checkout/confirmation"))
        .send()
        .await
        .unwrap();
    assert_eq!(confirmation.url().path(), "/cart");
    assert_eq!(fake.hits("/api/order/create"), 0);
}
