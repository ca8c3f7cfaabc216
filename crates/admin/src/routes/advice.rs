//! Advice list route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::Advice;
use safeuse_core::types::AdviceId;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ListQuery, RowActionForm, fetched, finish_mutation};
use crate::state::AppState;

const TABLE_ID: &str = "advice";

#[derive(Debug, Clone)]
pub struct AdviceView {
    pub id: String,
    pub title: String,
    pub stage: &'static str,
    pub description: String,
    pub link: Option<String>,
}

impl AdviceView {
    fn new(advice: &Advice) -> Self {
        Self {
            id: advice.id.to_string(),
            title: advice.title.clone(),
            stage: advice.stage.label(),
            description: advice.description.clone().unwrap_or_default(),
            link: advice.link.clone(),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: TABLE_ID,
        columns: vec![
            TableColumn::numeric("ID"),
            TableColumn::new("Title"),
            TableColumn::new("Stage"),
            TableColumn::new("Description"),
            TableColumn::new("Link"),
            TableColumn::new("Actions"),
        ],
        search_label: "Filter by title or stage",
        empty_title: "No advice yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "advice/index.html")]
pub struct AdviceIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<AdviceView>>,
}

#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    _admin: RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<AdviceIndexTemplate> {
    let advice = fetched(state.backend().advice().await, "advice")?;

    Ok(AdviceIndexTemplate {
        page,
        config: table_config(),
        table: advice.map(|table| DataTable::new(&table, &query.q, AdviceView::new)),
        query: query.q,
    })
}

#[instrument(skip_all, fields(advice_id = id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .delete_advice(AdviceId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |()| format!("Advice {id} deleted."),
        "The advice could not be deleted.",
    )
    .await
}
