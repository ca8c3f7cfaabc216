//! Test-kit shop pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::types::ProductId;
use tracing::instrument;

use crate::error::Result;
use crate::page::PageContext;
use crate::routes::views::ProductCard;
use crate::state::AppState;

/// Product grid template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/index.html")]
pub struct ShopIndexTemplate {
    pub page: PageContext,
    pub products: Fetched<Vec<ProductCard>>,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "shop/show.html")]
pub struct ShopShowTemplate {
    pub page: PageContext,
    pub product: ProductCard,
}

/// Display the product grid.
#[instrument(skip(state, page))]
pub async fn index(State(state): State<AppState>, page: PageContext) -> impl IntoResponse {
    let backend = state.backend();
    let products = Fetched::from_result(backend.products().await).map(|table| {
        table
            .rows()
            .iter()
            .map(|p| ProductCard::new(p, backend))
            .collect()
    });

    ShopIndexTemplate { page, products }
}

/// Display one product with its add-to-cart form.
#[instrument(skip(state, page))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let product = state.backend().product(ProductId::new(id)).await?;

    Ok(ShopShowTemplate {
        page,
        product: ProductCard::new(&product, state.backend()),
    })
}
