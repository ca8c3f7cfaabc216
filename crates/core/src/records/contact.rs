//! Contact form submissions, incoming and as stored by the backend.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::{ContactId, Email};

/// Longest message the contact form accepts.
pub const MAX_MESSAGE_LENGTH: usize = 5000;

/// A stored contact submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    /// Whether staff marked the submission as handled.
    pub checked: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl ContactSubmission {
    /// First and last name joined.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Flip the handled flag.
    pub const fn toggle_checked(&mut self) {
        self.checked = !self.checked;
    }
}

impl Normalize for ContactSubmission {
    const ENTITY: &'static str = "contact";
    const LIST_KEYS: &'static [&'static str] = &["contacts", "contactos", "contact"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        Ok(Self {
            id: fields.id(&["ID_Contacto", "id_contacto", "id", "contactId"])?,
            first_name: fields
                .text(&["Nombre", "nombre", "firstName", "first_name", "name"])
                .unwrap_or_default(),
            last_name: fields
                .text(&["Apellidos", "apellidos", "lastName", "last_name"])
                .unwrap_or_default(),
            email: fields.required_text(&["Email", "email", "Correo", "correo"], "email")?,
            phone: fields.text(&["Telefono", "telefono", "phone"]),
            message: fields
                .text(&["Mensaje", "mensaje", "message"])
                .unwrap_or_default(),
            checked: fields
                .flag(&["Revisado", "revisado", "checked", "leido", "read"], "checked")?
                .unwrap_or(false),
            created_at: fields.timestamp(&[
                "Fecha_Envio",
                "fecha_envio",
                "createdAt",
                "created_at",
                "fecha",
            ]),
        })
    }
}

impl TableRow for ContactSubmission {
    type Id = ContactId;

    fn row_id(&self) -> ContactId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Owned(self.full_name()),
            Cow::Borrowed(self.email.as_str()),
        ]
    }
}

/// A field-level problem with a contact form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// A contact form submission ready for `POST /api/contact`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewContactSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub message: String,
}

impl NewContactSubmission {
    /// Validate raw form input.
    ///
    /// # Errors
    ///
    /// Returns every field problem found, so the form can show them together.
    pub fn validate(
        first_name: &str,
        last_name: &str,
        email: &str,
        phone: Option<&str>,
        message: &str,
    ) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();
        let mut required = |field: &'static str, value: &str| {
            if value.trim().is_empty() {
                errors.push(FieldError {
                    field,
                    message: "This field is required.".to_string(),
                });
            }
        };
        required("first_name", first_name);
        required("last_name", last_name);
        required("message", message);

        if message.chars().count() > MAX_MESSAGE_LENGTH {
            errors.push(FieldError {
                field: "message",
                message: format!("Please keep your message under {MAX_MESSAGE_LENGTH} characters."),
            });
        }

        let email = match Email::parse(email) {
            Ok(email) => Some(email),
            Err(err) => {
                errors.push(FieldError {
                    field: "email",
                    message: format!("Please enter a valid email address ({err})."),
                });
                None
            }
        };

        match email {
            Some(email) if errors.is_empty() => Ok(Self {
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                email,
                phone: phone
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(String::from),
                message: message.trim().to_string(),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_checked_variants() {
        for (raw, expected) in [
            (json!({ "email": "a@b.es", "Revisado": 1 }), true),
            (json!({ "email": "a@b.es", "checked": false }), false),
            (json!({ "email": "a@b.es", "leido": "true" }), true),
            (json!({ "email": "a@b.es" }), false),
        ] {
            assert_eq!(ContactSubmission::from_value(&raw).unwrap().checked, expected, "{raw}");
        }
    }

    #[test]
    fn test_toggle_and_search() {
        let mut c = ContactSubmission::from_value(&json!({
            "ID_Contacto": 4, "Nombre": "Lucía", "Apellidos": "Martín",
            "Email": "lucia@example.com", "Mensaje": "Hola"
        }))
        .unwrap();
        assert_eq!(c.full_name(), "Lucía Martín");
        assert!(c.matches("lucía mar"));
        c.toggle_checked();
        assert!(c.checked);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let errors = NewContactSubmission::validate(" ", "", "nope", None, "").unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["first_name", "last_name", "message", "email"]);
    }

    #[test]
    fn test_validate_trims() {
        let ok = NewContactSubmission::validate(
            " Ana ",
            "Ruiz",
            "ana@example.com",
            Some("  "),
            " Question about kits ",
        )
        .unwrap();
        assert_eq!(ok.first_name, "Ana");
        assert_eq!(ok.phone, None);
        assert_eq!(ok.message, "Question about kits");
    }
}
