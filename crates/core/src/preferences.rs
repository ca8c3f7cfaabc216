//! Typed key/value preferences kept in the visitor's browser.
//!
//! A [`Preferences`] wraps a [`KeyValueStore`] loaded from the request
//! (cookies, in the storefront), reads and writes through typed
//! [`PreferenceKey`]s, and records every write so the caller can flush them
//! to the response.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::time::Duration;

/// One year, the lifetime of a stored consent choice.
pub const ONE_YEAR: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Raw string storage behind [`Preferences`].
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<&str>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
}

/// A value that can be stored as a preference string.
pub trait PreferenceValue: Sized {
    fn encode(&self) -> String;

    /// Parse a stored string. Unrecognised values read as absent.
    fn decode(raw: &str) -> Option<Self>;
}

/// A named, typed preference with its storage lifetime.
#[derive(Debug)]
pub struct PreferenceKey<T> {
    name: &'static str,
    max_age: Duration,
    _value: PhantomData<fn() -> T>,
}

impl<T> PreferenceKey<T> {
    #[must_use]
    pub const fn new(name: &'static str, max_age: Duration) -> Self {
        Self {
            name,
            max_age,
            _value: PhantomData,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }
}

/// A write that still has to reach the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceChange {
    Set {
        name: &'static str,
        value: String,
        max_age: Duration,
    },
    Removed {
        name: &'static str,
    },
}

/// Typed access to a store, with write tracking.
#[derive(Debug, Default)]
pub struct Preferences<S> {
    store: S,
    changes: Vec<PreferenceChange>,
}

impl<S: KeyValueStore> Preferences<S> {
    pub const fn new(store: S) -> Self {
        Self {
            store,
            changes: Vec::new(),
        }
    }

    pub fn get<T: PreferenceValue>(&self, key: &PreferenceKey<T>) -> Option<T> {
        self.store.get(key.name).and_then(T::decode)
    }

    pub fn set<T: PreferenceValue>(&mut self, key: &PreferenceKey<T>, value: &T) {
        let encoded = value.encode();
        self.store.set(key.name, encoded.clone());
        self.changes.push(PreferenceChange::Set {
            name: key.name,
            value: encoded,
            max_age: key.max_age,
        });
    }

    pub fn remove<T>(&mut self, key: &PreferenceKey<T>) {
        self.store.remove(key.name);
        self.changes.push(PreferenceChange::Removed { name: key.name });
    }

    /// Drain the writes made since the last call.
    pub fn take_changes(&mut self) -> Vec<PreferenceChange> {
        std::mem::take(&mut self.changes)
    }
}

/// In-memory store, filled from request cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapStore(BTreeMap<String, String>);

impl KeyValueStore for MapStore {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The visitor's answer to the cookie banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieConsent {
    Accepted,
    Rejected,
}

impl PreferenceValue for CookieConsent {
    fn encode(&self) -> String {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
        .to_string()
    }

    fn decode(raw: &str) -> Option<Self> {
        match raw.trim() {
            "accepted" | "true" => Some(Self::Accepted),
            "rejected" | "false" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// Cookie consent, stored for a year once the visitor chooses.
pub const COOKIE_CONSENT: PreferenceKey<CookieConsent> =
    PreferenceKey::new("safeuse_cookie_consent", ONE_YEAR);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_consent_reads_none() {
        let prefs = Preferences::new(MapStore::default());
        assert_eq!(prefs.get(&COOKIE_CONSENT), None);
    }

    #[test]
    fn test_set_is_readable_and_tracked() {
        let mut prefs = Preferences::new(MapStore::default());
        prefs.set(&COOKIE_CONSENT, &CookieConsent::Rejected);
        assert_eq!(prefs.get(&COOKIE_CONSENT), Some(CookieConsent::Rejected));

        let changes = prefs.take_changes();
        assert_eq!(
            changes,
            vec![PreferenceChange::Set {
                name: "safeuse_cookie_consent",
                value: "rejected".into(),
                max_age: ONE_YEAR,
            }]
        );
        assert!(prefs.take_changes().is_empty());
    }

    #[test]
    fn test_loaded_from_cookies() {
        let store: MapStore = [("safeuse_cookie_consent", "accepted"), ("other", "x")]
            .into_iter()
            .collect();
        let mut prefs = Preferences::new(store);
        assert_eq!(prefs.get(&COOKIE_CONSENT), Some(CookieConsent::Accepted));
        prefs.remove(&COOKIE_CONSENT);
        assert_eq!(prefs.get(&COOKIE_CONSENT), None);
    }

    #[test]
    fn test_garbage_value_reads_none() {
        let store: MapStore = [("safeuse_cookie_consent", "maybe")].into_iter().collect();
        assert_eq!(Preferences::new(store).get(&COOKIE_CONSENT), None);
    }
}
