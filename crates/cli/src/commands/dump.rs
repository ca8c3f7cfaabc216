//! `safeuse-cli dump <resource>`: print normalized records as JSON.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

use super::{CliError, admin_login, admin_logout, client_from_env};

/// Resources that can be dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Resource {
    Substances,
    Advice,
    Products,
    Users,
    Orders,
    Contacts,
}

impl Resource {
    /// Whether reading this resource needs an admin account.
    #[must_use]
    pub const fn is_admin_only(self) -> bool {
        matches!(self, Self::Users | Self::Orders | Self::Contacts)
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Substances => "substances",
            Self::Advice => "advice",
            Self::Products => "products",
            Self::Users => "users",
            Self::Orders => "orders",
            Self::Contacts => "contacts",
        }
    }
}

fn print<T: Serialize>(rows: &[T]) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, rows)?;
    // Nothing to recover if stdout is gone
    let _ = writeln!(out);
    Ok(())
}

pub async fn run(resource: Resource) -> Result<(), CliError> {
    let client = client_from_env()?;

    if !resource.is_admin_only() {
        return match resource {
            Resource::Substances => print(client.substances().await?.rows()),
            Resource::Advice => print(client.advice().await?.rows()),
            _ => print(client.products().await?.rows()),
        };
    }

    let credentials = admin_login(&client)
        .await?
        .ok_or(CliError::AdminRequired(resource.name()))?;

    let result = match resource {
        Resource::Users => client
            .users(&credentials)
            .await
            .map_err(CliError::from)
            .and_then(|t| print(t.rows())),
        Resource::Orders => client
            .orders(&credentials)
            .await
            .map_err(CliError::from)
            .and_then(|t| print(t.rows())),
        _ => client
            .contacts(&credentials)
            .await
            .map_err(CliError::from)
            .and_then(|t| print(t.rows())),
    };

    admin_logout(&client, &credentials).await;
    tracing::info!(resource = resource.name(), "Dump finished");
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_only_resources() {
        assert!(Resource::Contacts.is_admin_only());
        assert!(Resource::Orders.is_admin_only());
        assert!(!Resource::Substances.is_admin_only());
        assert!(!Resource::Products.is_admin_only());
    }

    #[test]
    fn test_resource_names_parse() {
        let parsed = Resource::from_str("advice", true);
        assert_eq!(parsed, Ok(Resource::Advice));
    }
}
