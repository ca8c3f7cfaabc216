//! Cart route handlers.
//!
//! The cart lives in the session. Mutations are plain form posts answered
//! with a redirect back to the cart page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect},
};
use safeuse_backend::BackendClient;
use safeuse_core::cart::{Cart, CartError, CartItem, CartTotals};
use safeuse_core::types::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::models::{Flash, session_keys};
use crate::page::{PageContext, set_flash};
use crate::state::AppState;

/// Cart line display data for templates.
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
    pub line_total: String,
    pub image_url: Option<String>,
}

/// Cart totals, rounded for display.
pub struct TotalsView {
    pub units: u32,
    pub subtotal: String,
    pub vat: String,
    pub total: String,
}

impl From<CartTotals> for TotalsView {
    fn from(totals: CartTotals) -> Self {
        Self {
            units: totals.units,
            subtotal: totals.subtotal.display(),
            vat: totals.vat.display(),
            total: totals.total.display(),
        }
    }
}

/// Cart display data for templates.
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub totals: TotalsView,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, backend: &BackendClient) -> Self {
        Self {
            lines: cart
                .items()
                .iter()
                .map(|item| CartLineView {
                    product_id: item.product_id.to_string(),
                    name: item.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.unit_price.display(),
                    line_total: item.line_total().display(),
                    image_url: item.image.as_deref().map(|path| backend.asset_url(path)),
                })
                .collect(),
            totals: cart.totals().into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Load the cart from the session; a missing cart is empty.
///
/// # Errors
///
/// Returns an error if the session store cannot be read.
pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session
        .get::<Cart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

/// Store the cart in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i64,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i64,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i64,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: CartView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart with its totals.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> Result<impl IntoResponse> {
    let cart = load_cart(&session).await?;

    Ok(CartTemplate {
        page,
        cart: CartView::new(&cart, state.backend()),
    })
}

/// Add a product, clamping to its stock.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let product = state.backend().product(ProductId::new(form.product_id)).await?;
    let requested = form.quantity.unwrap_or(1);

    let mut cart = load_cart(&session).await?;
    let item = CartItem::new(
        product.id,
        product.name.clone(),
        product.price,
        requested,
        product.primary_image().map(String::from),
    );

    match cart.add(item, Some(product.stock)) {
        Ok(quantity) => {
            save_cart(&session, &cart).await?;
            add_breadcrumb(
                "cart",
                "Added to cart",
                Some(&[("product_id", &product.id.to_string())]),
            );
            if quantity < requested {
                set_flash(
                    &session,
                    Flash::notice(format!(
                        "Only {} of {} in stock. Your cart has {quantity}.",
                        product.stock, product.name
                    )),
                )
                .await;
            }
            Ok(Redirect::to("/cart"))
        }
        Err(e) => {
            set_flash(&session, Flash::error(cart_error_message(&e, &product.name))).await;
            Ok(Redirect::to(&format!("/shop/{}", product.id)))
        }
    }
}

/// Change a line's quantity; zero removes it.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    // Stock is best effort; a failed read leaves the quantity unclamped.
    let stock = state
        .backend()
        .product(product_id)
        .await
        .ok()
        .map(|product| product.stock);

    let mut cart = load_cart(&session).await?;
    match cart.set_quantity(product_id, form.quantity, stock) {
        Ok(()) => save_cart(&session, &cart).await?,
        Err(e) => set_flash(&session, Flash::error(cart_error_message(&e, "This product"))).await,
    }

    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveFromCartForm>) -> Result<Redirect> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(ProductId::new(form.product_id)).is_some() {
        save_cart(&session, &cart).await?;
    }
    Ok(Redirect::to("/cart"))
}

fn cart_error_message(error: &CartError, name: &str) -> String {
    match error {
        CartError::ZeroQuantity => "Choose at least one unit.".to_string(),
        CartError::OutOfStock(_) => format!("{name} is out of stock."),
        CartError::NotInCart(_) => format!("{name} is no longer in your cart."),
    }
}

#[cfg(test)]
mod tests {
    use safeuse_core::types::Price;

    use super::*;

    #[test]
    fn test_totals_view_rounds_for_display() {
        let mut cart = Cart::default();
        cart.add(
            CartItem::new(ProductId::new(1), "Reagent kit", Price::from_cents(1999), 3, None),
            None,
        )
        .ok();
        let view = TotalsView::from(cart.totals());
        assert_eq!(view.units, 3);
        assert_eq!(view.subtotal, "59.97 €");
        // 59.97 * 0.21 = 12.5937
        assert_eq!(view.vat, "12.59 €");
        assert_eq!(view.total, "72.56 €");
    }

    #[test]
    fn test_cart_error_messages() {
        assert_eq!(
            cart_error_message(&CartError::OutOfStock(ProductId::new(2)), "Fentanyl strips"),
            "Fentanyl strips is out of stock."
        );
    }
}
