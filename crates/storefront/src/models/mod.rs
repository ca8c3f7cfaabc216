//! Types kept in the storefront session.

pub mod session;

pub use session::{CheckoutDetails, Flash, keys as session_keys};
