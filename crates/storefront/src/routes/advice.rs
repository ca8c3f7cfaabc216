//! Harm-reduction advice, grouped before, while and after use.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::group_by_stage;
use tracing::instrument;

use crate::page::PageContext;
use crate::routes::views::AdviceView;
use crate::state::AppState;

/// One stage section.
pub struct StageSection {
    pub slug: &'static str,
    pub label: &'static str,
    pub items: Vec<AdviceView>,
}

/// Advice page template.
#[derive(Template, WebTemplate)]
#[template(path = "advice.html")]
pub struct AdviceTemplate {
    pub page: PageContext,
    pub sections: Fetched<Vec<StageSection>>,
}

/// Display advice in stage order.
#[instrument(skip(state, page))]
pub async fn index(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let sections = Fetched::from_result(state.backend().advice().await).map(|table| {
        group_by_stage(table.rows())
            .into_iter()
            .map(|(stage, items)| StageSection {
                slug: stage.as_str(),
                label: stage.label(),
                items: items.into_iter().map(AdviceView::from).collect(),
            })
            .collect()
    });

    AdviceTemplate { page, sections }
}
