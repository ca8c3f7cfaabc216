//! Cache types for backend list responses.

use safeuse_core::normalize::Normalize;
use safeuse_core::records::{Advice, ContactSubmission, Order, Product, Substance, User};
use safeuse_core::table::{ManagedTable, TableRow};

/// Cache key for list resources.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum CacheKey {
    /// Substances merged with their detail sheets.
    Substances,
    Advice,
    /// Public product catalog.
    Products,
    /// Back-office product list.
    AdminProducts,
    Users,
    Orders,
    Contacts,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Substances(ManagedTable<Substance>),
    Advice(ManagedTable<Advice>),
    Products(ManagedTable<Product>),
    Users(ManagedTable<User>),
    Orders(ManagedTable<Order>),
    Contacts(ManagedTable<ContactSubmission>),
}

/// A record type whose lists are cached as managed tables.
pub trait Resource: Normalize + TableRow + Clone + Send + Sync + 'static {
    fn wrap(table: ManagedTable<Self>) -> CacheValue;
    fn unwrap(value: CacheValue) -> Option<ManagedTable<Self>>;
}

macro_rules! impl_resource {
    ($record:ty, $variant:ident) => {
        impl Resource for $record {
            fn wrap(table: ManagedTable<Self>) -> CacheValue {
                CacheValue::$variant(table)
            }

            fn unwrap(value: CacheValue) -> Option<ManagedTable<Self>> {
                match value {
                    CacheValue::$variant(table) => Some(table),
                    _ => None,
                }
            }
        }
    };
}

impl_resource!(Substance, Substances);
impl_resource!(Advice, Advice);
impl_resource!(Product, Products);
impl_resource!(User, Users);
impl_resource!(Order, Orders);
impl_resource!(ContactSubmission, Contacts);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwrap_rejects_other_variant() {
        let value = User::wrap(ManagedTable::default());
        assert!(Order::unwrap(value.clone()).is_none());
        assert!(User::unwrap(value).is_some());
    }
}
