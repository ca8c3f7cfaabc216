//! Session-stored types for admin.

pub mod session;

pub use session::{CurrentAdmin, Flash, keys as session_keys};
