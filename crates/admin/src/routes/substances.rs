//! Substances list route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::Substance;
use safeuse_core::types::SubstanceId;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ListQuery, RowActionForm, fetched, finish_mutation};
use crate::state::AppState;

const TABLE_ID: &str = "substances";

/// Substance view for templates.
#[derive(Debug, Clone)]
pub struct SubstanceView {
    pub id: String,
    pub name: String,
    pub title: String,
    pub formula: String,
    /// Whether a detail sheet was merged in.
    pub has_details: bool,
}

impl SubstanceView {
    fn new(substance: &Substance) -> Self {
        Self {
            id: substance.id.to_string(),
            name: substance.name.clone(),
            title: substance.title.clone().unwrap_or_default(),
            formula: substance.formula.clone().unwrap_or_default(),
            has_details: substance.details.has_content(),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: TABLE_ID,
        columns: vec![
            TableColumn::numeric("ID"),
            TableColumn::new("Name"),
            TableColumn::new("Title"),
            TableColumn::new("Formula"),
            TableColumn::new("Detail sheet"),
            TableColumn::new("Actions"),
        ],
        search_label: "Filter by name or title",
        empty_title: "No substances yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "substances/index.html")]
pub struct SubstancesIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<SubstanceView>>,
}

/// Substances share the public catalog read, so the list is the one visitors see.
#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<SubstancesIndexTemplate> {
    let substances = fetched(state.backend().substances().await, "substances")?;

    Ok(SubstancesIndexTemplate {
        page,
        config: table_config(),
        table: substances.map(|table| DataTable::new(&table, &query.q, SubstanceView::new)),
        query: query.q,
    })
}

#[instrument(skip_all, fields(substance_id = id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .delete_substance(SubstanceId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |()| format!("Substance {id} deleted."),
        "The substance could not be deleted.",
    )
    .await
}
