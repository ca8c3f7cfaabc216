//! Static information pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;

use crate::page::PageContext;

/// About page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub page: PageContext,
}

/// Legal notice template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/legal.html")]
pub struct LegalTemplate {
    pub page: PageContext,
}

pub async fn about(page: PageContext) -> impl IntoResponse {
    AboutTemplate { page }
}

pub async fn legal(page: PageContext) -> impl IntoResponse {
    LegalTemplate { page }
}
