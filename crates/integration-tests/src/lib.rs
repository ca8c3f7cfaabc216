//! End-to-end test harness for SafeUse.
//!
//! Each test starts an in-process fake of the SafeUse backend on an
//! ephemeral port and serves the real storefront or admin router next to it.
//! A `reqwest` client with a cookie store then plays the browser.
//!
//! ```bash
//! cargo test -p safeuse-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{Next, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use safeuse_admin::config::AdminConfig;
use safeuse_backend::BackendConfig;
use safeuse_storefront::config::StorefrontConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

/// Password accepted by the fake backend for every account.
pub const PASSWORD: &str = "correct horse battery";

/// An account with the admin role.
pub const ADMIN_EMAIL: &str = "ana@safeuse.es";

/// An account with the customer role.
pub const CUSTOMER_EMAIL: &str = "bea@example.org";

const SESSION_COOKIE: &str = "backend_session";

// =============================================================================
// Fake backend
// =============================================================================

/// A multipart product write received by the fake.
#[derive(Debug, Clone, Default)]
pub struct ProductWrite {
    pub path: String,
    /// Text fields by name.
    pub fields: HashMap<String, String>,
    /// File name of the uploaded image, if one was sent.
    pub image: Option<String>,
}

/// Mutable data behind the fake backend.
#[derive(Debug)]
pub struct FakeData {
    pub contacts: Vec<Value>,
    pub orders: Vec<Value>,
    /// Make contact updates fail with a 500.
    pub fail_contact_updates: bool,
    /// Make every admin delete fail with a 500.
    pub fail_deletes: bool,
    /// Acknowledge mutations with plain text instead of JSON.
    pub plain_text_acks: bool,
    /// Make `POST /api/contact` fail with a 503.
    pub fail_contact_submissions: bool,
    /// Make `POST /api/order/create` fail with a 500.
    pub fail_order_creation: bool,
    pub product_writes: Vec<ProductWrite>,
    pub contact_submissions: Vec<Value>,
    pub intent_requests: Vec<Value>,
    pub created_orders: Vec<Value>,
    /// Requests received, by path.
    pub hits: HashMap<String, usize>,
}

impl Default for FakeData {
    fn default() -> Self {
        Self {
            contacts: vec![
                json!({
                    "ID_Contacto": 5, "Nombre": "Ana", "Apellidos": "Ruiz",
                    "Email": "ana.ruiz@example.org", "Mensaje": "Do you ship to Portugal?",
                    "Revisado": 0
                }),
                json!({
                    "id": 6, "firstName": "Luis", "lastName": "Gómez",
                    "email": "luis@example.org", "message": "Kit arrived broken",
                    "checked": true
                }),
            ],
            orders: vec![
                json!({
                    "ID_Pedido": 10, "ID_Usuario": 2, "Total": "24,20",
                    "Estado": "pendiente", "Direccion_Envio": "Calle Mayor 1, Madrid"
                }),
                json!({
                    "id": 11, "userId": 7, "total": 87.12,
                    "status": "shipped", "shippingAddress": "Rua Augusta 20, Lisboa"
                }),
            ],
            fail_contact_updates: false,
            fail_deletes: false,
            plain_text_acks: false,
            fail_contact_submissions: false,
            fail_order_creation: false,
            product_writes: Vec::new(),
            contact_submissions: Vec::new(),
            intent_requests: Vec::new(),
            created_orders: Vec::new(),
            hits: HashMap::new(),
        }
    }
}

/// A running fake backend.
#[derive(Clone)]
pub struct FakeBackend {
    pub url: Url,
    data: Arc<Mutex<FakeData>>,
}

impl FakeBackend {
    /// Start the fake on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if no port can be bound.
    pub async fn start() -> std::io::Result<Self> {
        let data = Arc::new(Mutex::new(FakeData::default()));
        let addr = serve(fake_routes(Arc::clone(&data))).await?;
        let url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(Self { url, data })
    }

    /// Lock the fake's data.
    pub fn data(&self) -> MutexGuard<'_, FakeData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How many requests reached `path`.
    #[must_use]
    pub fn hits(&self, path: &str) -> usize {
        self.data().hits.get(path).copied().unwrap_or(0)
    }

    /// Client settings pointing at the fake.
    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.url.clone(),
            timeout: Duration::from_secs(5),
            cache_ttl: Duration::from_secs(60),
        }
    }

    /// Storefront configuration pointing at the fake.
    #[must_use]
    pub fn storefront_config(&self) -> StorefrontConfig {
        StorefrontConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            api: self.backend_config(),
            stripe_publishable_key: "pk_test_integration".to_string(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../storefront/static").to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Admin configuration pointing at the fake.
    #[must_use]
    pub fn admin_config(&self) -> AdminConfig {
        AdminConfig {
            host: [127, 0, 0, 1].into(),
            port: 0,
            base_url: "http://127.0.0.1".to_string(),
            api: self.backend_config(),
            static_dir: concat!(env!("CARGO_MANIFEST_DIR"), "/../admin/static").to_string(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 0.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

type Shared = Arc<Mutex<FakeData>>;

fn lock(data: &Shared) -> MutexGuard<'_, FakeData> {
    data.lock().unwrap_or_else(PoisonError::into_inner)
}

fn fake_routes(data: Shared) -> Router {
    Router::new()
        .route("/api/sustancias", get(substances))
        .route("/api/detalles_sustancias", get(substance_details))
        .route("/api/advice", get(advice))
        .route("/api/productos", get(products))
        .route("/api/admin/products", get(admin_products).post(create_product))
        .route(
            "/api/admin/products/{id}",
            post(update_product).delete(delete_product),
        )
        .route("/api/users", get(users))
        .route("/api/admin/orders", get(orders))
        .route("/api/admin/orders/{id}", delete(delete_order))
        .route("/api/admin/contact", get(contacts))
        .route(
            "/api/admin/contact/{id}",
            put(update_contact).delete(delete_contact),
        )
        .route("/api/contact", post(submit_contact))
        .route("/api/create-payment-intent", post(create_payment_intent))
        .route("/api/order/create", post(create_order))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .layer(from_fn_with_state(Arc::clone(&data), count_hits))
        .with_state(data)
}

async fn count_hits(State(data): State<Shared>, request: Request, next: Next) -> Response {
    *lock(&data)
        .hits
        .entry(request.uri().path().to_string())
        .or_default() += 1;
    next.run(request).await
}

fn signed_in(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|cookie| cookie.contains(&format!("{SESSION_COOKIE}=")))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "No autenticado" })),
    )
        .into_response()
}

fn server_error(message: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": message })),
    )
        .into_response()
}

/// A success reply in the configured acknowledgement style.
fn acknowledge(data: &FakeData, text: &'static str) -> Response {
    if data.plain_text_acks {
        text.into_response()
    } else {
        Json(json!({ "ok": true })).into_response()
    }
}

fn row_id(row: &Value, key: &str) -> Option<i64> {
    row.get(key).or_else(|| row.get("id")).and_then(Value::as_i64)
}

fn product_rows() -> Value {
    json!([
        {
            "ID_Producto": 3, "Nombre": "Reagent kit", "Precio": "10,00",
            "Stock": 5, "Descripcion": "Marquis and Mecke reagents"
        },
        // No name: skipped by normalization
        { "ID_Producto": 9, "Precio": 4 }
    ])
}

async fn substances() -> Json<Value> {
    Json(json!({ "sustancias": [
        { "ID_Sustancia": 1, "Nombre": "MDMA", "Titulo": "Éxtasis", "Formula": "C11H15NO2" },
        { "id": "2", "name": "Ketamina", "title": "Ketamine" }
    ]}))
}

async fn substance_details() -> Json<Value> {
    Json(json!([
        { "ID_Sustancia": 1, "Riesgos": "Overheating", "Dosis": "Start low" }
    ]))
}

async fn advice() -> Json<Value> {
    Json(json!({ "data": [
        { "ID_Consejo": 1, "Titulo": "Test your substance", "Etapa": "antes" },
        { "id": 2, "title": "Drink water in small sips", "stage": "during" }
    ]}))
}

async fn products() -> Json<Value> {
    Json(product_rows())
}

async fn admin_products(headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    Json(json!({ "products": product_rows() })).into_response()
}

async fn users(headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    Json(json!({ "usuarios": [
        { "ID_Usuario": 1, "Nombre": "Ana", "Email": ADMIN_EMAIL, "Rol": "admin" },
        { "id": 2, "name": "Bea", "email": CUSTOMER_EMAIL, "role": "user" }
    ]}))
    .into_response()
}

async fn orders(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let rows = lock(&data).orders.clone();
    Json(json!({ "orders": rows })).into_response()
}

async fn delete_order(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let mut data = lock(&data);
    if data.fail_deletes {
        return server_error("database unavailable");
    }
    data.orders.retain(|row| row_id(row, "ID_Pedido") != Some(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn read_product_write(path: String, mut multipart: Multipart) -> ProductWrite {
    let mut write = ProductWrite {
        path,
        ..ProductWrite::default()
    };
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            write.image = field.file_name().map(String::from);
            let _ = field.bytes().await;
        } else if let Ok(text) = field.text().await {
            write.fields.insert(name, text);
        }
    }
    write
}

/// Record the write and echo the product back, unless plain acks are on.
fn product_written(data: &Shared, id: i64, write: ProductWrite) -> Response {
    let mut data = lock(data);
    let name = write.fields.get("name").cloned().unwrap_or_default();
    data.product_writes.push(write);
    if data.plain_text_acks {
        return "Producto guardado".into_response();
    }
    Json(json!({ "product": { "ID_Producto": id, "Nombre": name, "Precio": 1, "Stock": 1 } }))
        .into_response()
}

async fn create_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let write = read_product_write("/api/admin/products".to_string(), multipart).await;
    product_written(&data, 30, write)
}

async fn update_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let write = read_product_write(format!("/api/admin/products/{id}"), multipart).await;
    product_written(&data, id, write)
}

async fn delete_product(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(_id): Path<i64>,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    if lock(&data).fail_deletes {
        return server_error("database unavailable");
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn contacts(State(data): State<Shared>, headers: HeaderMap) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let rows = lock(&data).contacts.clone();
    Json(json!({ "contacts": rows })).into_response()
}

fn contact_id(row: &Value) -> Option<i64> {
    row_id(row, "ID_Contacto")
}

#[derive(Deserialize)]
struct ContactUpdate {
    checked: bool,
}

async fn update_contact(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(update): Json<ContactUpdate>,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let mut data = lock(&data);
    if data.fail_contact_updates {
        return server_error("database unavailable");
    }
    let Some(row) = data
        .contacts
        .iter_mut()
        .find(|row| contact_id(row) == Some(id))
    else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(object) = row.as_object_mut() {
        object.remove("Revisado");
        object.insert("checked".to_string(), json!(update.checked));
    }
    acknowledge(&data, "Contacto actualizado")
}

async fn delete_contact(
    State(data): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !signed_in(&headers) {
        return unauthorized();
    }
    let mut data = lock(&data);
    if data.fail_deletes {
        return server_error("database unavailable");
    }
    data.contacts.retain(|row| contact_id(row) != Some(id));
    StatusCode::NO_CONTENT.into_response()
}

async fn submit_contact(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    if data.fail_contact_submissions {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "mail queue full" })),
        )
            .into_response();
    }
    data.contact_submissions.push(body);
    "Mensaje recibido".into_response()
}

/// Secrets follow the `pi_<id>_secret_<token>` shape.
pub const INTENT_SECRET: &str = "pi_fake1_secret_s3cr3t";

/// Intent id carried by [`INTENT_SECRET`].
pub const INTENT_ID: &str = "pi_fake1";

async fn create_payment_intent(State(data): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    lock(&data).intent_requests.push(body);
    Json(json!({ "clientSecret": INTENT_SECRET }))
}

async fn create_order(State(data): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut data = lock(&data);
    if data.fail_order_creation {
        return server_error("orders table locked");
    }
    data.created_orders.push(body);
    acknowledge(&data, "Pedido creado")
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn login(Json(credentials): Json<Credentials>) -> Response {
    let user = match credentials.email.as_str() {
        ADMIN_EMAIL => json!({ "ID_Usuario": 1, "Nombre": "Ana", "Email": ADMIN_EMAIL, "Rol": "admin" }),
        CUSTOMER_EMAIL => json!({ "id": 2, "name": "Bea", "email": CUSTOMER_EMAIL, "role": "user" }),
        _ => return unauthorized(),
    };
    if credentials.password != PASSWORD {
        return unauthorized();
    }
    (
        [(
            header::SET_COOKIE,
            format!("{SESSION_COOKIE}=session-for-{}; Path=/; HttpOnly", credentials.email),
        )],
        Json(json!({ "user": user })),
    )
        .into_response()
}

async fn logout() -> Json<Value> {
    Json(json!({ "ok": true }))
}

// =============================================================================
// Serving
// =============================================================================

/// Serve `router` on an ephemeral local port with peer addresses available
/// to the rate limiters.
///
/// # Errors
///
/// Returns an error if no port can be bound.
pub async fn serve(router: Router) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });
    Ok(addr)
}

/// A browser-like client: keeps cookies and follows redirects.
///
/// # Errors
///
/// Returns an error if the client cannot be built.
pub fn browser() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(10))
        .build()
}
