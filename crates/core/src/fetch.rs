//! Outcome of a single backend read.
//!
//! A read is either ready with data or failed with a message, never both.
//! Page handlers keep one [`Fetched`] per page section so a failing section
//! renders its own error block while the rest of the page still renders.

use std::fmt::Display;

/// Data or the error message that replaced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched<T> {
    Ready(T),
    Failed(String),
}

impl<T> Fetched<T> {
    /// Convert a read result, keeping only the error's display text.
    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::Ready(data),
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            Self::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Failed(message) => Some(message),
        }
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Transform the data, leaving a failure untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Ready(data) => Fetched::Ready(f(data)),
            Self::Failed(message) => Fetched::Failed(message),
        }
    }

    /// The data, or `fallback` on failure.
    pub fn unwrap_or(self, fallback: T) -> T {
        match self {
            Self::Ready(data) => data,
            Self::Failed(_) => fallback,
        }
    }
}
