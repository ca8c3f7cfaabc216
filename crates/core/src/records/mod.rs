//! Canonical records for every backend entity.
//!
//! Each record implements [`Normalize`](crate::normalize::Normalize) for the
//! raw backend shapes and [`TableRow`](crate::table::TableRow) so it can be
//! listed in a back-office table.

pub mod advice;
pub mod contact;
pub mod order;
pub mod product;
pub mod substance;
pub mod user;

pub use advice::{Advice, group_by_stage};
pub use contact::{ContactSubmission, FieldError, MAX_MESSAGE_LENGTH, NewContactSubmission};
pub use order::{NewOrder, NewOrderLine, Order};
pub use product::Product;
pub use substance::{Substance, SubstanceDetails, merge_details};
pub use user::User;
