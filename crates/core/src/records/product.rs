//! Drug-checking kits sold in the shop.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::{Price, ProductId};

/// A shop product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// VAT-exclusive unit price.
    pub price: Price,
    pub stock: u32,
    pub description: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Image URLs; the first one is the primary image.
    pub images: Vec<String>,
}

impl Product {
    /// The primary image, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Whether the product can be added to a cart.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Normalize for Product {
    const ENTITY: &'static str = "product";
    const LIST_KEYS: &'static [&'static str] = &["productos", "products"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        let price = Price::new(
            fields
                .decimal(&["Precio", "precio", "price"], "price")?
                .unwrap_or_default(),
        );
        if price.is_negative() {
            return Err(fields.invalid("price", "negative price"));
        }

        // Negative stock shows up after overselling; treat it as sold out.
        let stock = fields
            .int(&["Stock", "stock", "cantidad", "quantity"], "stock")?
            .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX));

        Ok(Self {
            id: fields.id(&["ID_Producto", "id_producto", "id", "productId"])?,
            name: fields.required_text(&["Nombre", "nombre", "name"], "name")?,
            price,
            stock,
            description: fields.text(&["Descripcion", "descripcion", "description"]),
            created_at: fields.timestamp(&[
                "Fecha_Creacion",
                "fecha_creacion",
                "createdAt",
                "created_at",
            ]),
            images: fields.url_list(&[
                "Imagenes",
                "imagenes",
                "images",
                "Imagen",
                "imagen",
                "image",
            ]),
        })
    }
}

impl TableRow for Product {
    type Id = ProductId;

    fn row_id(&self) -> ProductId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_variants_agree() {
        let a = json!({
            "ID_Producto": 10, "Nombre": "Reagent kit", "Precio": "12.50",
            "Stock": "4", "Imagen": "/uploads/kit.png", "Fecha_Creacion": "2024-01-02"
        });
        let b = json!({
            "id": 10, "name": "Reagent kit", "price": 12.5, "stock": 4,
            "images": [{ "url": "/uploads/kit.png" }], "createdAt": "2024-01-02T00:00:00Z"
        });
        assert_eq!(Product::from_value(&a).unwrap(), Product::from_value(&b).unwrap());
    }

    #[test]
    fn test_defaults_and_clamping() {
        let p = Product::from_value(&json!({ "nombre": "Strips", "stock": -3 })).unwrap();
        assert_eq!(p.price.amount(), Decimal::ZERO);
        assert_eq!(p.stock, 0);
        assert!(!p.in_stock());
        assert!(p.primary_image().is_none());
    }

    #[test]
    fn test_negative_price_rejected() {
        assert!(Product::from_value(&json!({ "name": "x", "price": -1 })).is_err());
    }
}
