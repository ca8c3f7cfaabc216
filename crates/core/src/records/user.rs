//! Backend user accounts.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::{UserId, UserRole};

/// A user account as listed in the back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to greet the user with; falls back to the email's local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.email.split('@').next().unwrap_or(&self.email)
        } else {
            &self.name
        }
    }
}

impl Normalize for User {
    const ENTITY: &'static str = "user";
    const LIST_KEYS: &'static [&'static str] = &["users", "usuarios"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        let first = fields.text(&["Nombre", "nombre", "name", "firstName", "username"]);
        let last = fields.text(&["Apellidos", "apellidos", "lastName", "last_name"]);
        let name = match (first, last) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first,
            (None, Some(last)) => last,
            (None, None) => String::new(),
        };

        // Role may be a name or an explicit admin flag.
        let role = match fields.text(&["Rol", "rol", "role", "tipo"]) {
            Some(raw) => UserRole::parse(&raw),
            None if fields.flag(&["isAdmin", "is_admin", "admin"], "is_admin")? == Some(true) => {
                UserRole::Admin
            }
            None => UserRole::Customer,
        };

        Ok(Self {
            id: fields.id(&["ID_Usuario", "id", "userId", "id_usuario"])?,
            name,
            email: fields.required_text(&["Email", "email", "Correo", "correo"], "email")?,
            role,
            address: fields.text(&["Direccion", "direccion", "address"]),
            phone: fields.text(&["Telefono", "telefono", "phone"]),
            created_at: fields.timestamp(&[
                "Fecha_Registro",
                "fecha_registro",
                "createdAt",
                "created_at",
                "fecha_creacion",
            ]),
        })
    }
}

impl TableRow for User {
    type Id = UserId;

    fn row_id(&self) -> UserId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.name.as_str()),
            Cow::Borrowed(self.email.as_str()),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_id_fallback_chain() {
        for raw in [
            json!({ "ID_Usuario": 5, "id": 9, "email": "a@b.es" }),
            json!({ "id": 5, "userId": 9, "email": "a@b.es" }),
            json!({ "userId": "5", "email": "a@b.es" }),
            json!({ "ID_Usuario": null, "id_usuario": 5, "email": "a@b.es" }),
        ] {
            assert_eq!(User::from_value(&raw).unwrap().id, UserId::new(5), "{raw}");
        }
        let none = User::from_value(&json!({ "email": "a@b.es" })).unwrap();
        assert!(none.id.is_missing());
    }

    #[test]
    fn test_name_and_role() {
        let u = User::from_value(&json!({
            "Nombre": "Ana", "Apellidos": "García", "Correo": "ana@b.es", "Rol": "admin"
        }))
        .unwrap();
        assert_eq!(u.name, "Ana García");
        assert!(u.role.is_admin());

        let flagged = User::from_value(&json!({ "email": "x@b.es", "isAdmin": 1 })).unwrap();
        assert!(flagged.role.is_admin());
        assert_eq!(flagged.display_name(), "x");
    }

    #[test]
    fn test_email_required() {
        assert!(User::from_value(&json!({ "name": "nobody" })).is_err());
    }
}
