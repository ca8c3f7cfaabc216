//! Backend client against the fake backend: normalization, caching and
//! credential forwarding.

#![allow(clippy::unwrap_used)]

use safeuse_backend::{BackendClient, CacheKey, Credentials, ImageUpload, ProductForm};
use safeuse_core::{ContactId, OrderId, Price, ProductId, Stage, SubstanceId, UserRole};
use safeuse_integration_tests::{ADMIN_EMAIL, CUSTOMER_EMAIL, FakeBackend, PASSWORD};
use secrecy::SecretString;

async fn setup() -> (FakeBackend, BackendClient) {
    let fake = FakeBackend::start().await.unwrap();
    let client = BackendClient::new(&fake.backend_config()).unwrap();
    (fake, client)
}

async fn admin_credentials(client: &BackendClient) -> Credentials {
    client
        .login(ADMIN_EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap()
        .credentials
}

#[tokio::test]
async fn test_substances_are_merged_with_details() {
    let (_fake, client) = setup().await;

    let substances = client.substances().await.unwrap();
    assert_eq!(substances.len(), 2);

    let mdma = client.substance(SubstanceId::new(1)).await.unwrap();
    assert_eq!(mdma.title.as_deref(), Some("Éxtasis"));
    assert!(mdma.details.has_content());

    // String ids and English field names normalize the same way
    let ketamine = client.substance(SubstanceId::new(2)).await.unwrap();
    assert_eq!(ketamine.name, "Ketamina");
    assert!(!ketamine.details.has_content());
}

#[tokio::test]
async fn test_list_envelopes_and_invalid_rows() {
    let (_fake, client) = setup().await;

    let advice = client.advice().await.unwrap();
    let stages: Vec<Stage> = advice.rows().iter().map(|a| a.stage).collect();
    assert_eq!(stages, vec![Stage::Before, Stage::While]);

    // The nameless product is skipped, not fatal
    let products = client.products().await.unwrap();
    assert_eq!(products.len(), 1);
    let kit = client.product(ProductId::new(3)).await.unwrap();
    assert_eq!(kit.price, Price::from_cents(1000));
    assert_eq!(kit.stock, 5);
}

#[tokio::test]
async fn test_lists_are_cached_until_invalidated() {
    let (fake, client) = setup().await;

    client.advice().await.unwrap();
    client.advice().await.unwrap();
    assert_eq!(fake.hits("/api/advice"), 1);

    client.invalidate(CacheKey::Advice).await;
    client.advice().await.unwrap();
    assert_eq!(fake.hits("/api/advice"), 2);
}

#[tokio::test]
async fn test_login_credentials_are_forwarded() {
    let (_fake, client) = setup().await;

    let err = client.users(&Credentials::default()).await.unwrap_err();
    assert!(err.is_unauthorized());

    let login = client
        .login(ADMIN_EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    assert_eq!(login.user.role, UserRole::Admin);
    assert_eq!(login.user.name, "Ana");

    let users = client.users(&login.credentials).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users.filter("bea").len(), 1);
}

#[tokio::test]
async fn test_login_rejections() {
    let (_fake, client) = setup().await;

    let err = client
        .login(CUSTOMER_EMAIL, &SecretString::from("wrong".to_string()))
        .await
        .unwrap_err();
    assert!(err.is_unauthorized());

    let customer = client
        .login(CUSTOMER_EMAIL, &SecretString::from(PASSWORD.to_string()))
        .await
        .unwrap();
    assert!(!customer.user.role.is_admin());
}

#[tokio::test]
async fn test_toggle_patches_cached_contacts() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;

    let before = client.contacts(&credentials).await.unwrap();
    assert!(!before.get(ContactId::new(5)).unwrap().checked);

    let checked = client
        .toggle_contact(ContactId::new(5), &credentials)
        .await
        .unwrap();
    assert!(checked);

    let after = client.contacts(&credentials).await.unwrap();
    assert!(after.get(ContactId::new(5)).unwrap().checked);
    assert_eq!(fake.hits("/api/admin/contact"), 1);
}

#[tokio::test]
async fn test_failed_update_leaves_cache_alone() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;
    client.contacts(&credentials).await.unwrap();

    fake.data().fail_contact_updates = true;
    let err = client
        .toggle_contact(ContactId::new(5), &credentials)
        .await
        .unwrap_err();
    assert!(!err.is_unauthorized());

    let contacts = client.contacts(&credentials).await.unwrap();
    assert!(!contacts.get(ContactId::new(5)).unwrap().checked);
}

#[tokio::test]
async fn test_delete_removes_cached_row() {
    let (_fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;
    client.contacts(&credentials).await.unwrap();

    client
        .delete_contact(ContactId::new(6), &credentials)
        .await
        .unwrap();

    let contacts = client.contacts(&credentials).await.unwrap();
    assert_eq!(contacts.len(), 1);
    assert!(contacts.get(ContactId::new(6)).is_none());
}

#[tokio::test]
async fn test_plain_text_acknowledgement_counts_as_success() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;
    client.contacts(&credentials).await.unwrap();
    fake.data().plain_text_acks = true;

    let checked = client
        .toggle_contact(ContactId::new(5), &credentials)
        .await
        .unwrap();
    assert!(checked);

    let contacts = client.contacts(&credentials).await.unwrap();
    assert!(contacts.get(ContactId::new(5)).unwrap().checked);
    assert!(contacts.get(ContactId::new(6)).unwrap().checked);
}

#[tokio::test]
async fn test_failed_delete_keeps_cached_row() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;
    client.orders(&credentials).await.unwrap();
    fake.data().fail_deletes = true;

    let err = client
        .delete_order(OrderId::new(10), &credentials)
        .await
        .unwrap_err();
    assert!(!err.is_unauthorized());

    let orders = client.orders(&credentials).await.unwrap();
    assert_eq!(orders.len(), 2);
    assert!(orders.get(OrderId::new(10)).is_some());
    assert_eq!(fake.hits("/api/admin/orders"), 1);
}

fn kit_form(image: Option<ImageUpload>) -> ProductForm {
    ProductForm {
        name: "Fentanyl strips".to_string(),
        price: Price::from_cents(250),
        stock: 40,
        description: None,
        image,
    }
}

#[tokio::test]
async fn test_product_update_posts_multipart_to_member_path() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;

    let echoed = client
        .update_product(ProductId::new(3), kit_form(None), &credentials)
        .await
        .unwrap();
    assert_eq!(echoed.unwrap().id, ProductId::new(3));

    let data = fake.data();
    let write = data.product_writes.last().unwrap();
    assert_eq!(write.path, "/api/admin/products/3");
    assert_eq!(write.fields.get("name").map(String::as_str), Some("Fentanyl strips"));
    assert_eq!(write.fields.get("price").map(String::as_str), Some("2.50"));
    assert_eq!(write.fields.get("stock").map(String::as_str), Some("40"));
    assert!(write.image.is_none());
}

#[tokio::test]
async fn test_product_create_with_image_and_plain_ack() {
    let (fake, client) = setup().await;
    let credentials = admin_credentials(&client).await;
    client.admin_products(&credentials).await.unwrap();
    fake.data().plain_text_acks = true;

    let image = ImageUpload {
        file_name: "strips.png".to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, b'P', b'N', b'G'],
    };
    let echoed = client
        .create_product(kit_form(Some(image)), &credentials)
        .await
        .unwrap();
    assert!(echoed.is_none());
    assert_eq!(
        fake.data().product_writes.last().unwrap().image.as_deref(),
        Some("strips.png")
    );

    // Nothing was echoed, so the admin list is read again
    client.admin_products(&credentials).await.unwrap();
    assert_eq!(fake.hits("/api/admin/products"), 3);
}
