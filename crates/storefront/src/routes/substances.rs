//! Substance information pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::types::SubstanceId;
use serde::Deserialize;
use tracing::instrument;

use crate::error::Result;
use crate::page::PageContext;
use crate::routes::views::SubstanceCard;
use crate::state::AppState;

/// Search query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// One detail section, e.g. "Effects".
pub struct SectionView {
    pub heading: &'static str,
    pub body: String,
}

/// Substance list template.
#[derive(Template, WebTemplate)]
#[template(path = "substances/index.html")]
pub struct SubstancesIndexTemplate {
    pub page: PageContext,
    pub query: String,
    pub substances: Fetched<Vec<SubstanceCard>>,
}

/// Substance detail template.
#[derive(Template, WebTemplate)]
#[template(path = "substances/show.html")]
pub struct SubstanceShowTemplate {
    pub page: PageContext,
    pub substance: SubstanceCard,
    pub heading: String,
    pub sections: Vec<SectionView>,
}

/// List substances, filtered by name or title.
#[instrument(skip(state, page))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    page: PageContext,
) -> impl IntoResponse {
    let backend = state.backend();
    let substances = Fetched::from_result(backend.substances().await).map(|table| {
        table
            .filter(&query.q)
            .into_iter()
            .map(|s| SubstanceCard::new(s, backend))
            .collect()
    });

    SubstancesIndexTemplate {
        page,
        query: query.q,
        substances,
    }
}

/// Show one substance with its detail sheet.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let substance = state.backend().substance(SubstanceId::new(id)).await?;

    let sections = substance
        .details
        .sections()
        .into_iter()
        .map(|(heading, body)| SectionView {
            heading,
            body: body.to_string(),
        })
        .collect();

    Ok(SubstanceShowTemplate {
        page,
        heading: substance.heading(),
        substance: SubstanceCard::new(&substance, state.backend()),
        sections,
    })
}
