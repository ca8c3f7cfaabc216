//! Categorical attributes carried by backend records.
//!
//! The backend is not consistent about language or casing, so every enum here
//! parses case-insensitively from both the English and Spanish spellings seen
//! in responses.

use serde::{Deserialize, Serialize};

/// When a piece of advice applies, relative to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Before,
    While,
    After,
}

impl Stage {
    /// All stages in page order.
    pub const ALL: [Self; 3] = [Self::Before, Self::While, Self::After];

    /// Section heading for this stage.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Before => "Before use",
            Self::While => "While using",
            Self::After => "After use",
        }
    }

    /// Stable identifier used in URLs and anchors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::While => "while",
            Self::After => "after",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "before" | "antes" | "pre" => Ok(Self::Before),
            "while" | "during" | "durante" => Ok(Self::While),
            "after" | "despues" | "después" | "post" => Ok(Self::After),
            other => Err(format!("invalid advice stage: {other}")),
        }
    }
}

/// Order lifecycle status as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    /// A status string this front end does not know; shown verbatim.
    Other(String),
}

impl OrderStatus {
    /// Parse a backend status string. Never fails; unknown values are kept.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "pending" | "pendiente" => Self::Pending,
            "paid" | "pagado" | "completed" | "succeeded" => Self::Paid,
            "shipped" | "enviado" => Self::Shipped,
            "delivered" | "entregado" => Self::Delivered,
            "cancelled" | "canceled" | "cancelado" => Self::Cancelled,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
            Self::Other(raw) => raw,
        }
    }

    /// Tailwind classes for the status badge.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Pending => "bg-yellow-100 text-yellow-700",
            Self::Paid => "bg-blue-100 text-blue-700",
            Self::Shipped => "bg-indigo-100 text-indigo-700",
            Self::Delivered => "bg-green-100 text-green-700",
            Self::Cancelled => "bg-red-100 text-red-700",
            Self::Other(_) => "bg-gray-100 text-gray-700",
        }
    }
}

/// Account role of a backend user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Customer,
}

impl UserRole {
    /// Parse a backend role value. Anything that is not an admin spelling is
    /// treated as a customer.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "admin" | "administrator" | "administrador" | "superadmin" => Self::Admin,
            _ => Self::Customer,
        }
    }

    /// Whether this role may use the back-office.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Customer => "Customer",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parses_both_languages() {
        assert_eq!("Antes".parse::<Stage>().unwrap(), Stage::Before);
        assert_eq!("during".parse::<Stage>().unwrap(), Stage::While);
        assert_eq!(" DESPUÉS ".parse::<Stage>().unwrap(), Stage::After);
        assert!("someday".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_order() {
        let mut stages = vec![Stage::After, Stage::Before, Stage::While];
        stages.sort();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[test]
    fn test_order_status_keeps_unknown() {
        assert_eq!(OrderStatus::parse("Enviado"), OrderStatus::Shipped);
        assert_eq!(OrderStatus::parse(""), OrderStatus::Pending);
        let other = OrderStatus::parse("on hold");
        assert_eq!(other.label(), "on hold");
    }

    #[test]
    fn test_user_role() {
        assert!(UserRole::parse("Administrador").is_admin());
        assert!(!UserRole::parse("cliente").is_admin());
    }
}
