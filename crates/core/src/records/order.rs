//! Shop orders and the order-creation request sent after payment.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::normalize::{Fields, Normalize, NormalizeError};
use crate::table::TableRow;
use crate::types::{OrderId, OrderStatus, Price, ProductId, UserId};

/// An order as listed in the back-office.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub total: Price,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub shipping_address: Option<String>,
}

impl Normalize for Order {
    const ENTITY: &'static str = "order";
    const LIST_KEYS: &'static [&'static str] = &["orders", "pedidos"];

    fn normalize(fields: &Fields<'_>) -> Result<Self, NormalizeError> {
        // Orders are only ever addressed by id, so a missing one is fatal.
        let id: OrderId = fields.id(&["ID_Pedido", "id_pedido", "id", "orderId"])?;
        if id.is_missing() {
            return Err(NormalizeError::MissingField {
                entity: Self::ENTITY,
                field: "id",
            });
        }

        Ok(Self {
            id,
            user_id: fields
                .int(&["ID_Usuario", "id_usuario", "userId", "user_id"], "user_id")?
                .map(UserId::new),
            total: Price::new(
                fields
                    .decimal(&["Total", "total", "amount", "importe"], "total")?
                    .unwrap_or_default(),
            ),
            status: fields
                .text(&["Estado", "estado", "status"])
                .map(|raw| OrderStatus::parse(&raw))
                .unwrap_or_default(),
            created_at: fields.timestamp(&[
                "Fecha_Pedido",
                "fecha_pedido",
                "createdAt",
                "created_at",
                "fecha",
            ]),
            shipping_address: fields.text(&[
                "Direccion_Envio",
                "direccion_envio",
                "shippingAddress",
                "shipping_address",
                "direccion",
            ]),
        })
    }
}

impl TableRow for Order {
    type Id = OrderId;

    fn row_id(&self) -> OrderId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Borrowed(self.status.label())];
        if let Some(user_id) = self.user_id {
            fields.push(Cow::Owned(user_id.to_string()));
        }
        fields
    }
}

/// One line of an order-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
    pub unit_price: Price,
}

/// Body of `POST /api/order/create`, sent once a payment has succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub payment_intent_id: String,
    pub shipping_address: String,
    pub items: Vec<NewOrderLine>,
    pub subtotal: Price,
    pub vat: Price,
    pub total: Price,
}

impl NewOrder {
    /// Build the request from the paid cart.
    #[must_use]
    pub fn from_cart(
        cart: &Cart,
        user_id: Option<UserId>,
        payment_intent_id: String,
        shipping_address: String,
    ) -> Self {
        let totals = cart.totals();
        Self {
            user_id,
            payment_intent_id,
            shipping_address,
            items: cart
                .items()
                .iter()
                .map(|item| NewOrderLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                })
                .collect(),
            subtotal: totals.subtotal.rounded(),
            vat: totals.vat.rounded(),
            total: totals.total.rounded(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cart::CartItem;

    #[test]
    fn test_order_variants() {
        let a = Order::from_value(&json!({
            "ID_Pedido": 7, "ID_Usuario": 3, "Total": "87.12", "Estado": "enviado",
            "Direccion_Envio": "Calle Mayor 1"
        }))
        .unwrap();
        let b = Order::from_value(&json!({
            "id": 7, "userId": 3, "total": 87.12, "status": "shipped",
            "shippingAddress": "Calle Mayor 1"
        }))
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(a.status, OrderStatus::Shipped);
    }

    #[test]
    fn test_order_without_id_rejected() {
        assert!(Order::from_value(&json!({ "total": 1 })).is_err());
    }

    #[test]
    fn test_filter_by_user_id() {
        let o = Order::from_value(&json!({ "id": 1, "user_id": 42, "estado": "pagado" })).unwrap();
        assert!(o.matches("42"));
        assert!(o.matches("paid"));
        assert!(!o.matches("shipped"));
    }

    #[test]
    fn test_new_order_from_cart() {
        let mut cart = Cart::default();
        cart.add(CartItem::new(ProductId::new(1), "Kit", Price::from_cents(1200), 2, None), None)
            .unwrap();
        let order = NewOrder::from_cart(&cart, None, "pi_123".into(), "Calle 1".into());
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.subtotal, Price::from_cents(2400));
        assert_eq!(order.total, Price::from_cents(2904));
        let body = serde_json::to_value(&order).unwrap();
        assert_eq!(body["payment_intent_id"], "pi_123");
    }
}
