//! Backend endpoint paths.

pub const USERS: &str = "/api/users";
pub const PRODUCTS: &str = "/api/productos";
pub const ADMIN_PRODUCTS: &str = "/api/admin/products";
pub const SUBSTANCES: &str = "/api/sustancias";
pub const SUBSTANCE_DETAILS: &str = "/api/detalles_sustancias";
pub const ADMIN_SUBSTANCES: &str = "/api/admin/sustancias";
pub const ADVICE: &str = "/api/advice";
pub const ADMIN_ADVICE: &str = "/api/admin/advice";
pub const ADMIN_CONTACTS: &str = "/api/admin/contact";
pub const CONTACT: &str = "/api/contact";
pub const ADMIN_ORDERS: &str = "/api/admin/orders";
pub const PAYMENT_INTENT: &str = "/api/create-payment-intent";
pub const ORDER_CREATE: &str = "/api/order/create";
pub const LOGIN: &str = "/api/login";
pub const LOGOUT: &str = "/api/logout";

/// `{collection}/{id}`.
#[must_use]
pub fn member(collection: &str, id: impl std::fmt::Display) -> String {
    format!("{collection}/{id}")
}
