//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use safeuse_core::fetch::Fetched;
use tracing::instrument;

use crate::page::PageContext;
use crate::routes::views::{AdviceView, SubstanceCard};
use crate::state::AppState;

/// Substances featured on the home page.
const FEATURED_SUBSTANCES: usize = 6;

/// Advice teasers on the home page.
const ADVICE_TEASERS: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub substances: Fetched<Vec<SubstanceCard>>,
    pub advice: Fetched<Vec<AdviceView>>,
}

/// Display the home page.
///
/// Both sections load concurrently; a failure in one leaves the other intact.
#[instrument(skip(state, page))]
pub async fn home(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let backend = state.backend();
    let (substances, advice) = tokio::join!(backend.substances(), backend.advice());

    let substances = Fetched::from_result(substances).map(|table| {
        table
            .rows()
            .iter()
            .take(FEATURED_SUBSTANCES)
            .map(|s| SubstanceCard::new(s, backend))
            .collect()
    });
    let advice = Fetched::from_result(advice).map(|table| {
        table
            .rows()
            .iter()
            .take(ADVICE_TEASERS)
            .map(AdviceView::from)
            .collect()
    });

    HomeTemplate {
        page,
        substances,
        advice,
    }
}
