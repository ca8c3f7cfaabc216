//! SafeUse backend API client.
//!
//! # Architecture
//!
//! - One `reqwest` connection pool per process, shared by clones of
//!   [`BackendClient`]
//! - The backend is the source of truth; list responses are cached in memory
//!   via `moka` with a configurable TTL
//! - Successful mutations patch or invalidate the cached list they affect
//! - Visitor credentials (backend session cookie, bearer token) are forwarded
//!   per call, never stored in the client
//!
//! # Example
//!
//! ```rust,ignore
//! use safeuse_backend::{BackendClient, BackendConfig};
//!
//! let client = BackendClient::new(&config)?;
//! let substances = client.substances().await?;
//! let hits = substances.filter("mdma");
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod admin;
mod auth;
mod cache;
mod catalog;
mod checkout;
mod client;
mod credentials;
mod error;
pub mod paths;

pub use admin::{DashboardCounts, ImageUpload, ProductForm};
pub use auth::{Login, SessionUser};
pub use cache::CacheKey;
pub use checkout::{CURRENCY, PaymentIntent};
pub use client::{BackendClient, BackendConfig};
pub use credentials::Credentials;
pub use error::BackendError;
