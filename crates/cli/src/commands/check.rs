//! `safeuse-cli check`: probe every read endpoint.
//!
//! Reads bypass nothing: they go through the same client and normalization
//! the sites use, so a record the sites could not parse shows up here as a
//! lower count rather than a failure.

use safeuse_backend::{BackendClient, BackendError, Credentials};

use super::{CliError, admin_login, admin_logout, client_from_env};

/// Outcome of one endpoint.
#[derive(Debug)]
enum Outcome {
    Ok(usize),
    Failed(BackendError),
    Skipped,
}

#[derive(Debug)]
struct Probe {
    name: &'static str,
    outcome: Outcome,
}

impl Probe {
    fn new(name: &'static str, result: Result<usize, BackendError>) -> Self {
        Self {
            name,
            outcome: match result {
                Ok(count) => Outcome::Ok(count),
                Err(e) => Outcome::Failed(e),
            },
        }
    }

    const fn skipped(name: &'static str) -> Self {
        Self {
            name,
            outcome: Outcome::Skipped,
        }
    }

    const fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed(_))
    }

    /// One report line.
    fn line(&self) -> String {
        match &self.outcome {
            Outcome::Ok(count) => format!("OK    {:<16} {count} records", self.name),
            Outcome::Failed(e) => format!("FAIL  {:<16} {e}", self.name),
            Outcome::Skipped => format!("SKIP  {:<16} no admin account configured", self.name),
        }
    }
}

#[allow(clippy::print_stdout)]
pub async fn run() -> Result<(), CliError> {
    let client = client_from_env()?;
    println!("Backend: {}", client.base_url());

    let mut probes = vec![
        Probe::new("substances", client.substances().await.map(|t| t.len())),
        Probe::new("advice", client.advice().await.map(|t| t.len())),
        Probe::new("products", client.products().await.map(|t| t.len())),
    ];

    match admin_login(&client).await {
        Ok(Some(credentials)) => {
            probes.extend(admin_probes(&client, &credentials).await);
            admin_logout(&client, &credentials).await;
        }
        Ok(None) => probes.extend(ADMIN_RESOURCES.iter().copied().map(Probe::skipped)),
        Err(CliError::Backend(e)) => probes.push(Probe::new("login", Err(e))),
        Err(e) => return Err(e),
    }

    for probe in &probes {
        println!("{}", probe.line());
    }

    let failures = probes.iter().filter(|p| p.failed()).count();
    if failures > 0 {
        return Err(CliError::ChecksFailed(failures));
    }
    Ok(())
}

const ADMIN_RESOURCES: [&str; 4] = ["users", "admin products", "orders", "contacts"];

async fn admin_probes(client: &BackendClient, credentials: &Credentials) -> Vec<Probe> {
    vec![
        Probe::new("users", client.users(credentials).await.map(|t| t.len())),
        Probe::new(
            "admin products",
            client.admin_products(credentials).await.map(|t| t.len()),
        ),
        Probe::new("orders", client.orders(credentials).await.map(|t| t.len())),
        Probe::new("contacts", client.contacts(credentials).await.map(|t| t.len())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lines() {
        let ok = Probe::new("advice", Ok(3));
        assert_eq!(ok.line(), "OK    advice           3 records");
        assert!(!ok.failed());

        let skipped = Probe::skipped("orders");
        assert!(skipped.line().starts_with("SKIP  orders"));
        assert!(!skipped.failed());
    }

    #[test]
    fn test_failure_counts() {
        let failed = Probe::new("users", Err(BackendError::NotFound("/api/users".into())));
        assert!(failed.failed());
        assert!(failed.line().starts_with("FAIL  users"));
    }
}
