//! Display data shared by several page templates.
//!
//! Templates get plain strings: prices already formatted, optional text
//! already defaulted, image paths already resolved against the backend.

use safeuse_backend::BackendClient;
use safeuse_core::records::{Advice, Product, Substance};

/// A substance in a list or teaser.
#[derive(Clone)]
pub struct SubstanceCard {
    pub id: String,
    pub name: String,
    pub title: String,
    pub formula: String,
    pub image_url: Option<String>,
}

impl SubstanceCard {
    #[must_use]
    pub fn new(substance: &Substance, backend: &BackendClient) -> Self {
        Self {
            id: substance.id.to_string(),
            name: substance.name.clone(),
            title: substance.title.clone().unwrap_or_default(),
            formula: substance.formula.clone().unwrap_or_default(),
            image_url: substance.image.as_deref().map(|path| backend.asset_url(path)),
        }
    }
}

/// A piece of advice.
#[derive(Clone)]
pub struct AdviceView {
    pub title: String,
    pub description: String,
    pub link: Option<String>,
    pub stage: String,
}

impl From<&Advice> for AdviceView {
    fn from(advice: &Advice) -> Self {
        Self {
            title: advice.title.clone(),
            description: advice.description.clone().unwrap_or_default(),
            link: advice
                .link
                .clone()
                .filter(|link| link.starts_with("https://") || link.starts_with("http://")),
            stage: advice.stage.label().to_string(),
        }
    }
}

/// A shop product.
#[derive(Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    /// VAT-exclusive price.
    pub price: String,
    /// Price including VAT.
    pub price_with_vat: String,
    pub stock: u32,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

impl ProductCard {
    #[must_use]
    pub fn new(product: &Product, backend: &BackendClient) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: product.price.display(),
            price_with_vat: product.price.with_vat().display(),
            stock: product.stock,
            in_stock: product.in_stock(),
            image_url: product.primary_image().map(|path| backend.asset_url(path)),
        }
    }
}
