//! Users list route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::User;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ListQuery, fetched};
use crate::state::AppState;

/// User view for templates.
#[derive(Debug, Clone)]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub phone: String,
    pub joined: String,
}

impl UserView {
    fn new(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.display_name().to_string(),
            email: user.email.clone(),
            role: user.role.label(),
            phone: user.phone.clone().unwrap_or_default(),
            joined: user
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: "users",
        columns: vec![
            TableColumn::numeric("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Email"),
            TableColumn::new("Role"),
            TableColumn::new("Phone"),
            TableColumn::new("Joined"),
        ],
        search_label: "Filter by name or email",
        empty_title: "No users yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users/index.html")]
pub struct UsersIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<UserView>>,
}

#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<UsersIndexTemplate> {
    let users = fetched(state.backend().users(&admin.credentials).await, "users")?;

    Ok(UsersIndexTemplate {
        page,
        config: table_config(),
        table: users.map(|table| DataTable::new(&table, &query.q, UserView::new)),
        query: query.q,
    })
}
