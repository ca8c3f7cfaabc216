//! SafeUse Core - shared types library.
//!
//! This crate provides the types used by every SafeUse component:
//! - `storefront` - Public harm-reduction site and test-kit shop
//! - `admin` - Back-office for users, products, substances, orders and contacts
//! - `cli` - Operator tooling against the backend API
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients. Raw backend JSON enters through [`normalize`] and leaves as one
//! canonical record per entity in [`records`].
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, money, email and status enums
//! - [`normalize`] - Field fallback chains and list envelope handling
//! - [`records`] - Canonical entity records
//! - [`cart`] - Session cart with VAT totals
//! - [`table`] - Filterable, patchable copies of admin lists
//! - [`payment`] - Checkout payment state machine
//! - [`fetch`] - Outcome of a single backend read
//! - [`preferences`] - Typed key/value preference store contract

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod fetch;
pub mod normalize;
pub mod payment;
pub mod preferences;
pub mod records;
pub mod table;
pub mod types;

pub use types::*;
