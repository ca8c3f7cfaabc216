//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use safeuse_backend::DashboardCounts;
use safeuse_core::fetch::Fetched;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::fetched;
use crate::state::AppState;

/// One dashboard tile.
pub struct CountCard {
    pub label: &'static str,
    pub value: usize,
    pub href: &'static str,
}

impl CountCard {
    fn all(counts: &DashboardCounts) -> Vec<Self> {
        vec![
            Self {
                label: "Users",
                value: counts.users,
                href: "/users",
            },
            Self {
                label: "Products",
                value: counts.products,
                href: "/products",
            },
            Self {
                label: "Substances",
                value: counts.substances,
                href: "/substances",
            },
            Self {
                label: "Orders",
                value: counts.orders,
                href: "/orders",
            },
            Self {
                label: "Unchecked contact messages",
                value: counts.unchecked_contacts,
                href: "/contacts",
            },
        ]
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub cards: Fetched<Vec<CountCard>>,
}

#[instrument(skip_all)]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    page: PageContext,
) -> Result<DashboardTemplate> {
    let counts = state.backend().dashboard_counts(&admin.credentials).await;

    Ok(DashboardTemplate {
        page,
        cards: fetched(counts, "dashboard counts")?.map(|counts| CountCard::all(&counts)),
    })
}
