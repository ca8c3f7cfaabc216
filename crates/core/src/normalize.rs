//! Parsing boundary between raw backend JSON and canonical records.
//!
//! The backend names the same field differently depending on the endpoint
//! (`ID_Usuario`, `id`, `userId`, ...), sends numbers as strings, and wraps
//! lists in assorted envelopes. Everything below resolves that once, so the
//! rest of the code only ever sees the types in [`crate::records`].
//!
//! Lookup rule: for a fallback chain of keys, the first key that is present
//! with a non-null value wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use thiserror::Error;

/// Keys commonly used to wrap a list, tried after the entity-specific ones.
const GENERIC_LIST_KEYS: &[&str] = &["data", "items", "results"];

/// Keys under which an image URL may hide when images are objects.
const IMAGE_OBJECT_KEYS: &[&str] = &["url", "src", "path", "ruta"];

/// Errors raised while turning raw JSON into records.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// A record was expected to be a JSON object.
    #[error("{entity}: expected a JSON object")]
    NotAnObject { entity: &'static str },

    /// A required field was absent under every known name.
    #[error("{entity}: missing required field `{field}`")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    /// A field was present but unusable.
    #[error("{entity}: invalid `{field}`: {reason}")]
    InvalidField {
        entity: &'static str,
        field: &'static str,
        reason: String,
    },

    /// A list response did not contain a recognizable array.
    #[error("{entity}: response does not contain a list")]
    NoList { entity: &'static str },
}

/// A canonical record that can be parsed from one raw backend object.
pub trait Normalize: Sized {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Envelope keys specific to this entity's list endpoints.
    const LIST_KEYS: &'static [&'static str] = &[];

    /// Build the record from a raw object.
    ///
    /// # Errors
    ///
    /// Returns a [`NormalizeError`] when a required field is missing or a
    /// present field cannot be interpreted.
    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError>;

    /// Build the record from any JSON value.
    ///
    /// # Errors
    ///
    /// Fails with [`NormalizeError::NotAnObject`] for non-objects, otherwise
    /// as [`Normalize::normalize`].
    fn from_value(value: &Value) -> Result<Self, NormalizeError> {
        Self::normalize(&Fields::of(Self::ENTITY, value)?)
    }
}

/// Result of parsing a list response.
///
/// Invalid rows do not fail the list; they are reported in `skipped` with
/// their position so the caller can log them.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedList<T> {
    pub records: Vec<T>,
    pub skipped: Vec<(usize, NormalizeError)>,
}

/// Parse a list response into records.
///
/// # Errors
///
/// Returns [`NormalizeError::NoList`] if no array can be found in the
/// response. Individual bad rows are collected in [`ParsedList::skipped`].
pub fn parse_list<T: Normalize>(value: &Value) -> Result<ParsedList<T>, NormalizeError> {
    let rows = find_list(value, T::LIST_KEYS).ok_or(NormalizeError::NoList { entity: T::ENTITY })?;

    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        match T::from_value(row) {
            Ok(record) => records.push(record),
            Err(err) => skipped.push((index, err)),
        }
    }

    Ok(ParsedList { records, skipped })
}

/// Unwrap a single-record response such as `{ "user": { ... } }`.
///
/// Falls back to the value itself when none of `keys` holds an object.
#[must_use]
pub fn unwrap_object<'a>(value: &'a Value, keys: &[&str]) -> &'a Value {
    keys.iter()
        .filter_map(|key| value.get(*key))
        .find(|inner| inner.is_object())
        .unwrap_or(value)
}

fn find_list<'a>(value: &'a Value, entity_keys: &[&str]) -> Option<&'a Vec<Value>> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(object) => {
            for key in entity_keys.iter().chain(GENERIC_LIST_KEYS) {
                match object.get(*key) {
                    Some(Value::Array(rows)) => return Some(rows),
                    // `{ "data": { "users": [...] } }`
                    Some(inner @ Value::Object(_)) => {
                        if let Some(rows) = find_list_shallow(inner, entity_keys) {
                            return Some(rows);
                        }
                    }
                    _ => {}
                }
            }
            None
        }
        _ => None,
    }
}

fn find_list_shallow<'a>(value: &'a Value, entity_keys: &[&str]) -> Option<&'a Vec<Value>> {
    entity_keys
        .iter()
        .chain(GENERIC_LIST_KEYS)
        .find_map(|key| value.get(*key).and_then(Value::as_array))
}

/// Read-only view over one raw backend object with fallback-chain lookups.
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    entity: &'static str,
    object: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    /// Wrap a JSON value that must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::NotAnObject`] for any other JSON value.
    pub fn of(entity: &'static str, value: &'a Value) -> Result<Self, NormalizeError> {
        value
            .as_object()
            .map(|object| Self { entity, object })
            .ok_or(NormalizeError::NotAnObject { entity })
    }

    /// The first present, non-null value among `keys`.
    #[must_use]
    pub fn first(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter()
            .filter_map(|key| self.object.get(*key))
            .find(|value| !value.is_null())
    }

    /// A textual field. Numbers and booleans are rendered as text; blank
    /// strings count as absent.
    #[must_use]
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        let text = match self.first(keys)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }

    /// A textual field that must be present.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::MissingField`] naming `field`.
    pub fn required_text(&self, keys: &[&str], field: &'static str) -> Result<String, NormalizeError> {
        self.text(keys).ok_or(NormalizeError::MissingField {
            entity: self.entity,
            field,
        })
    }

    /// An integer field, accepting numbers and numeric strings.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidField`] when the value is present but
    /// not an integer.
    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)] // whole floats only
    pub fn int(&self, keys: &[&str], field: &'static str) -> Result<Option<i64>, NormalizeError> {
        let Some(value) = self.first(keys) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(field, format!("expected an integer, got {value}")))
    }

    /// An entity id; absent ids become `0`, matching the backend's own
    /// fallback.
    ///
    /// # Errors
    ///
    /// Fails when the id is present but not an integer.
    pub fn id<T: From<i64>>(&self, keys: &[&str]) -> Result<T, NormalizeError> {
        Ok(T::from(self.int(keys, "id")?.unwrap_or(0)))
    }

    /// A decimal amount. Accepts JSON numbers, `"12.50"`, `"12,50"` and
    /// scientific notation.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidField`] when the value is present but
    /// not numeric.
    pub fn decimal(&self, keys: &[&str], field: &'static str) -> Result<Option<Decimal>, NormalizeError> {
        let Some(value) = self.first(keys) else {
            return Ok(None);
        };
        let raw = match value {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().replace(',', "."),
            _ => return Err(self.invalid(field, format!("expected a number, got {value}"))),
        };
        raw.parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(&raw))
            .map(Some)
            .map_err(|e| self.invalid(field, e.to_string()))
    }

    /// A boolean flag. Accepts `true/false`, `0/1` and their string forms.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::InvalidField`] for any other value.
    pub fn flag(&self, keys: &[&str], field: &'static str) -> Result<Option<bool>, NormalizeError> {
        let Some(value) = self.first(keys) else {
            return Ok(None);
        };
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "true" | "1" | "yes" | "si" | "sí" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| self.invalid(field, format!("expected a boolean, got {value}")))
    }

    /// A timestamp. Unparseable values are treated as absent rather than
    /// failing the record.
    #[must_use]
    pub fn timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.text(keys)?)
    }

    /// A list of URLs. Accepts an array of strings, an array of objects with
    /// a `url`-like key, or a single string.
    #[must_use]
    pub fn url_list(&self, keys: &[&str]) -> Vec<String> {
        let Some(value) = self.first(keys) else {
            return Vec::new();
        };
        match value {
            Value::String(s) if !s.trim().is_empty() => vec![s.trim().to_string()],
            Value::Array(items) => items.iter().filter_map(url_from_item).collect(),
            Value::Object(_) => url_from_item(value).into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Build an [`NormalizeError::InvalidField`] for this entity.
    #[must_use]
    pub fn invalid(&self, field: &'static str, reason: impl Into<String>) -> NormalizeError {
        NormalizeError::InvalidField {
            entity: self.entity,
            field,
            reason: reason.into(),
        }
    }
}

fn url_from_item(item: &Value) -> Option<String> {
    match item {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Object(object) => IMAGE_OBJECT_KEYS
            .iter()
            .filter_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::trim)
            .find(|s| !s.is_empty())
            .map(String::from),
        _ => None,
    }
}

/// Parse the timestamp formats the backend is known to emit.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, PartialEq)]
    struct Named {
        id: i64,
        name: String,
    }

    impl Normalize for Named {
        const ENTITY: &'static str = "named";
        const LIST_KEYS: &'static [&'static str] = &["things"];

        fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
            Ok(Self {
                id: fields.id(&["ID_Thing", "id"])?,
                name: fields.required_text(&["Nombre", "name"], "name")?,
            })
        }
    }

    #[test]
    fn test_first_skips_null() {
        let raw = json!({ "ID_Thing": null, "id": 4, "name": "x" });
        let fields = Fields::of("named", &raw).unwrap();
        assert_eq!(fields.int(&["ID_Thing", "id"], "id").unwrap(), Some(4));
    }

    #[test]
    fn test_first_key_wins_over_later() {
        let raw = json!({ "ID_Thing": "9", "id": 4, "name": "x" });
        assert_eq!(Named::from_value(&raw).unwrap().id, 9);
    }

    #[test]
    fn test_missing_id_defaults_to_zero() {
        let raw = json!({ "name": "x" });
        assert_eq!(Named::from_value(&raw).unwrap().id, 0);
    }

    #[test]
    fn test_blank_required_text_is_missing() {
        let raw = json!({ "Nombre": "   " });
        assert_eq!(
            Named::from_value(&raw),
            Err(NormalizeError::MissingField {
                entity: "named",
                field: "name"
            })
        );
    }

    #[test]
    fn test_list_envelopes() {
        let bare = json!([{ "name": "a" }]);
        let keyed = json!({ "things": [{ "name": "a" }] });
        let generic = json!({ "data": [{ "name": "a" }] });
        let nested = json!({ "data": { "things": [{ "name": "a" }] } });
        for value in [bare, keyed, generic, nested] {
            let parsed = parse_list::<Named>(&value).unwrap();
            assert_eq!(parsed.records.len(), 1, "{value}");
        }
    }

    #[test]
    fn test_list_skips_bad_rows() {
        let value = json!([{ "name": "a" }, { "id": 2 }, 7, { "name": "c" }]);
        let parsed = parse_list::<Named>(&value).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped.len(), 2);
        assert_eq!(parsed.skipped[0].0, 1);
        assert_eq!(parsed.skipped[1].0, 2);
    }

    #[test]
    fn test_no_list() {
        let value = json!({ "message": "nope" });
        assert_eq!(
            parse_list::<Named>(&value),
            Err(NormalizeError::NoList { entity: "named" })
        );
    }

    #[test]
    fn test_decimal_variants() {
        let raw = json!({ "a": 12.5, "b": "12,50", "c": "1.2e1", "d": "abc" });
        let fields = Fields::of("t", &raw).unwrap();
        assert_eq!(fields.decimal(&["a"], "a").unwrap(), Some(Decimal::new(125, 1)));
        assert_eq!(fields.decimal(&["b"], "b").unwrap(), Some(Decimal::new(1250, 2)));
        assert_eq!(fields.decimal(&["c"], "c").unwrap(), Some(Decimal::new(12, 0)));
        assert!(fields.decimal(&["d"], "d").is_err());
        assert_eq!(fields.decimal(&["missing"], "m").unwrap(), None);
    }

    #[test]
    fn test_flag_variants() {
        let raw = json!({ "a": 1, "b": "false", "c": true, "d": "maybe" });
        let fields = Fields::of("t", &raw).unwrap();
        assert_eq!(fields.flag(&["a"], "a").unwrap(), Some(true));
        assert_eq!(fields.flag(&["b"], "b").unwrap(), Some(false));
        assert_eq!(fields.flag(&["c"], "c").unwrap(), Some(true));
        assert!(fields.flag(&["d"], "d").is_err());
    }

    #[test]
    fn test_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01T10:00:00Z").is_some());
        assert!(parse_timestamp("2024-03-01T10:00:00.123").is_some());
        assert!(parse_timestamp("2024-03-01 10:00:00").is_some());
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_url_list_shapes() {
        let raw = json!({
            "one": "/img/a.png",
            "many": ["/img/a.png", "", "/img/b.png"],
            "objects": [{ "url": "/img/a.png" }, { "src": "/img/b.png" }, { "alt": "x" }],
        });
        let fields = Fields::of("t", &raw).unwrap();
        assert_eq!(fields.url_list(&["one"]), vec!["/img/a.png"]);
        assert_eq!(fields.url_list(&["many"]).len(), 2);
        assert_eq!(fields.url_list(&["objects"]).len(), 2);
        assert!(fields.url_list(&["none"]).is_empty());
    }

    #[test]
    fn test_unwrap_object() {
        let wrapped = json!({ "user": { "id": 1 } });
        assert_eq!(unwrap_object(&wrapped, &["user"]), &json!({ "id": 1 }));
        let bare = json!({ "id": 1 });
        assert_eq!(unwrap_object(&bare, &["user"]), &bare);
    }
}
