//! Product management: list, create, edit, delete.
//!
//! Create and update arrive as `multipart/form-data` (the image is a file
//! field) and are forwarded to the backend as multipart.

use std::str::FromStr;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use safeuse_backend::{BackendClient, ImageUpload, ProductForm};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::{FieldError, Product};
use safeuse_core::types::{Price, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn, list_url};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::models::Flash;
use crate::page::{PageContext, set_flash};
use crate::routes::{ListQuery, RowActionForm, fetched, finish_mutation};
use crate::state::AppState;

const TABLE_ID: &str = "products";
const MAX_NAME_LENGTH: usize = 200;

// =============================================================================
// List
// =============================================================================

/// Product view for templates.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub stock: u32,
    pub image_url: Option<String>,
}

impl ProductView {
    fn new(product: &Product, backend: &BackendClient) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.display(),
            stock: product.stock,
            image_url: product.primary_image().map(|path| backend.asset_url(path)),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: TABLE_ID,
        columns: vec![
            TableColumn::new("Image"),
            TableColumn::numeric("ID"),
            TableColumn::new("Name"),
            TableColumn::numeric("Price"),
            TableColumn::numeric("Stock"),
            TableColumn::new("Actions"),
        ],
        search_label: "Filter by name",
        empty_title: "No products yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<ProductView>>,
}

#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<ProductsIndexTemplate> {
    let backend = state.backend();
    let products = fetched(backend.admin_products(&admin.credentials).await, "products")?;

    Ok(ProductsIndexTemplate {
        page,
        config: table_config(),
        table: products.map(|table| {
            DataTable::new(&table, &query.q, |product| ProductView::new(product, backend))
        }),
        query: query.q,
    })
}

// =============================================================================
// Form
// =============================================================================

/// The product form as typed, kept for re-rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub price: String,
    pub stock: String,
    pub description: String,
}

impl ProductInput {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price.amount().to_string(),
            stock: product.stock.to_string(),
            description: product.description.clone().unwrap_or_default(),
        }
    }

    /// Check every field, collecting all problems.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per invalid field.
    pub fn validate(
        &self,
        image: Option<ImageUpload>,
    ) -> std::result::Result<ProductForm, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(field_error("name", "Enter a product name."));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(field_error(
                "name",
                format!("Use at most {MAX_NAME_LENGTH} characters."),
            ));
        }

        let price = match parse_price(&self.price) {
            Ok(price) => Some(price),
            Err(message) => {
                errors.push(field_error("price", message));
                None
            }
        };

        let stock = self.stock.trim().parse::<u32>().ok();
        if stock.is_none() {
            errors.push(field_error("stock", "Enter a whole number of units, 0 or more."));
        }

        if let Some(image) = &image {
            if !image.content_type.starts_with("image/") {
                errors.push(field_error("image", "Upload an image file."));
            }
        }

        match (price, stock) {
            (Some(price), Some(stock)) if errors.is_empty() => Ok(ProductForm {
                name: name.to_string(),
                price,
                stock,
                description: Some(self.description.trim())
                    .filter(|d| !d.is_empty())
                    .map(String::from),
                image,
            }),
            _ => Err(errors),
        }
    }
}

fn field_error(field: &'static str, message: impl Into<String>) -> FieldError {
    FieldError {
        field,
        message: message.into(),
    }
}

/// Parse a euro amount, accepting a decimal comma.
fn parse_price(raw: &str) -> std::result::Result<Price, &'static str> {
    let amount = Decimal::from_str(&raw.trim().replace(',', "."))
        .map_err(|_| "Enter a price such as 12.50.")?;
    let price = Price::new(amount);
    if price.is_negative() {
        return Err("The price cannot be negative.");
    }
    if amount.normalize().scale() > 2 {
        return Err("Use at most two decimals.");
    }
    Ok(price)
}

/// Read the multipart body into the typed fields and the optional image.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(ProductInput, Option<ImageUpload>)> {
    let mut input = ProductInput::default();
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                // An untouched file input still sends an empty part.
                if !file_name.is_empty() && !bytes.is_empty() {
                    image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "name" | "price" | "stock" | "description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                match name.as_str() {
                    "name" => input.name = value,
                    "price" => input.price = value,
                    "stock" => input.stock = value,
                    _ => input.description = value,
                }
            }
            _ => {}
        }
    }

    Ok((input, image))
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: String,
    pub action: String,
    pub input: ProductInput,
    pub errors: Vec<FieldError>,
    pub submit_error: Option<String>,
    pub current_image: Option<String>,
}

impl ProductFormTemplate {
    /// Message for `field`, if it failed validation.
    #[must_use]
    pub fn error_for(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Re-render the form after a rejected submission.
fn form_again(template: ProductFormTemplate) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, template).into_response()
}

// =============================================================================
// Handlers
// =============================================================================

pub async fn new(_admin: RequireAdminAuth, page: PageContext) -> ProductFormTemplate {
    ProductFormTemplate {
        page,
        heading: "New product".to_string(),
        action: "/products".to_string(),
        input: ProductInput {
            stock: "0".to_string(),
            ..ProductInput::default()
        },
        errors: Vec::new(),
        submit_error: None,
        current_image: None,
    }
}

#[instrument(skip_all)]
pub async fn create(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let (input, image) = read_multipart(multipart).await?;
    let mut template = ProductFormTemplate {
        page,
        heading: "New product".to_string(),
        action: "/products".to_string(),
        input,
        errors: Vec::new(),
        submit_error: None,
        current_image: None,
    };

    let form = match template.input.validate(image) {
        Ok(form) => form,
        Err(errors) => {
            template.errors = errors;
            return Ok(form_again(template));
        }
    };

    let name = form.name.clone();
    match state.backend().create_product(form, &admin.credentials).await {
        Ok(_) => {
            set_flash(&session, Flash::notice(format!("Product \"{name}\" created."))).await;
            Ok(Redirect::to(&list_url(TABLE_ID, "")).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Product creation failed");
            template.submit_error = Some(format!(
                "The product could not be created. {}",
                e.user_message()
            ));
            Ok(form_again(template))
        }
    }
}

#[instrument(skip_all, fields(product_id = id))]
pub async fn edit(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    page: PageContext,
) -> Result<ProductFormTemplate> {
    let backend = state.backend();
    let products = backend.admin_products(&admin.credentials).await?;
    let product = products
        .get(ProductId::new(id))
        .ok_or_else(|| AppError::NotFound(format!("Product {id}")))?;

    Ok(ProductFormTemplate {
        page,
        heading: format!("Edit {}", product.name),
        action: format!("/products/{id}"),
        input: ProductInput::from_product(product),
        errors: Vec::new(),
        submit_error: None,
        current_image: product.primary_image().map(|path| backend.asset_url(path)),
    })
}

#[instrument(skip_all, fields(product_id = id))]
pub async fn update(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let (input, image) = read_multipart(multipart).await?;
    let mut template = ProductFormTemplate {
        page,
        heading: format!("Edit product {id}"),
        action: format!("/products/{id}"),
        input,
        errors: Vec::new(),
        submit_error: None,
        current_image: None,
    };

    let form = match template.input.validate(image) {
        Ok(form) => form,
        Err(errors) => {
            template.errors = errors;
            return Ok(form_again(template));
        }
    };

    let name = form.name.clone();
    match state
        .backend()
        .update_product(ProductId::new(id), form, &admin.credentials)
        .await
    {
        Ok(_) => {
            set_flash(&session, Flash::notice(format!("Product \"{name}\" saved."))).await;
            Ok(Redirect::to(&list_url(TABLE_ID, "")).into_response())
        }
        Err(e) if e.is_unauthorized() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "Product update failed");
            template.submit_error = Some(format!(
                "The product could not be saved. {}",
                e.user_message()
            ));
            Ok(form_again(template))
        }
    }
}

#[instrument(skip_all, fields(product_id = id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .delete_product(ProductId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |()| format!("Product {id} deleted."),
        "The product could not be deleted.",
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, price: &str, stock: &str) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price: price.to_string(),
            stock: stock.to_string(),
            description: "  ".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let form = input(" Reagent kit ", "12,50", "4").validate(None).unwrap();
        assert_eq!(form.name, "Reagent kit");
        assert_eq!(form.price, Price::from_cents(1250));
        assert_eq!(form.stock, 4);
        assert_eq!(form.description, None);
    }

    #[test]
    fn test_collects_every_field_error() {
        let errors = input("", "-3", "lots").validate(None).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["name", "price", "stock"]);
    }

    #[test]
    fn test_price_precision() {
        assert!(parse_price("9.999").is_err());
        assert!(parse_price("9.990").is_ok());
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn test_rejects_non_image_upload() {
        let upload = ImageUpload {
            file_name: "notes.txt".into(),
            content_type: "text/plain".into(),
            bytes: vec![1],
        };
        let errors = input("Kit", "5", "1").validate(Some(upload)).unwrap_err();
        assert_eq!(errors.first().map(|e| e.field), Some("image"));
    }
}
