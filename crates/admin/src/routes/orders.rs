//! Orders list and delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::Order;
use safeuse_core::types::OrderId;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ListQuery, RowActionForm, fetched, finish_mutation};
use crate::state::AppState;

const TABLE_ID: &str = "orders";

/// Order view for templates.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub user_id: String,
    pub total: String,
    pub status: String,
    pub status_class: &'static str,
    pub created_at: String,
    pub shipping_address: String,
}

impl OrderView {
    fn new(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            user_id: order.user_id.map(|id| id.to_string()).unwrap_or_default(),
            total: order.total.display(),
            status: order.status.label().to_string(),
            status_class: order.status.badge_class(),
            created_at: order
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            shipping_address: order.shipping_address.clone().unwrap_or_default(),
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: TABLE_ID,
        columns: vec![
            TableColumn::numeric("ID"),
            TableColumn::numeric("User"),
            TableColumn::numeric("Total"),
            TableColumn::new("Status"),
            TableColumn::new("Placed"),
            TableColumn::new("Shipping address"),
            TableColumn::new("Actions"),
        ],
        search_label: "Filter by status or user ID",
        empty_title: "No orders yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<OrderView>>,
}

#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<OrdersIndexTemplate> {
    let orders = fetched(state.backend().orders(&admin.credentials).await, "orders")?;

    Ok(OrdersIndexTemplate {
        page,
        config: table_config(),
        table: orders.map(|table| DataTable::new(&table, &query.q, OrderView::new)),
        query: query.q,
    })
}

#[instrument(skip_all, fields(order_id = id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .delete_order(OrderId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |()| format!("Order {id} deleted."),
        "The order could not be deleted.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use safeuse_core::types::{OrderStatus, Price, UserId};

    use super::*;

    #[test]
    fn test_order_view_badge() {
        let order = Order {
            id: OrderId::new(12),
            user_id: Some(UserId::new(4)),
            total: Price::from_cents(3630),
            status: OrderStatus::Shipped,
            created_at: None,
            shipping_address: None,
        };
        let view = OrderView::new(&order);
        assert_eq!(view.id, "12");
        assert_eq!(view.user_id, "4");
        assert_eq!(view.total, "36.30 €");
        assert_eq!(view.status, "Shipped");
        assert_eq!(view.status_class, "bg-indigo-100 text-indigo-700");
        assert!(view.shipping_address.is_empty());
    }
}
