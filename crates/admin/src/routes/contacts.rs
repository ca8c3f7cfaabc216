//! Contact submissions: review, mark as handled, delete.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::Redirect,
};
use safeuse_core::fetch::Fetched;
use safeuse_core::records::ContactSubmission;
use safeuse_core::types::ContactId;
use tower_sessions::Session;
use tracing::instrument;

use crate::components::{DataTable, DataTableConfig, TableColumn};
use crate::error::Result;
use crate::middleware::RequireAdminAuth;
use crate::page::PageContext;
use crate::routes::{ListQuery, RowActionForm, fetched, finish_mutation};
use crate::state::AppState;

const TABLE_ID: &str = "contacts";

/// Contact submission view for templates.
#[derive(Debug, Clone)]
pub struct ContactView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub received: String,
    pub checked: bool,
}

impl ContactView {
    fn new(contact: &ContactSubmission) -> Self {
        Self {
            id: contact.id.to_string(),
            name: contact.full_name(),
            email: contact.email.clone(),
            phone: contact.phone.clone().unwrap_or_default(),
            message: contact.message.clone(),
            received: contact
                .created_at
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
            checked: contact.checked,
        }
    }

    /// Label of the toggle button.
    #[must_use]
    pub const fn toggle_label(&self) -> &'static str {
        if self.checked {
            "Mark unchecked"
        } else {
            "Mark checked"
        }
    }
}

fn table_config() -> DataTableConfig {
    DataTableConfig {
        table_id: TABLE_ID,
        columns: vec![
            TableColumn::new("Checked"),
            TableColumn::new("Name"),
            TableColumn::new("Email"),
            TableColumn::new("Phone"),
            TableColumn::new("Message"),
            TableColumn::new("Received"),
            TableColumn::new("Actions"),
        ],
        search_label: "Filter by name or email",
        empty_title: "No contact messages yet.",
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "contacts/index.html")]
pub struct ContactsIndexTemplate {
    pub page: PageContext,
    pub config: DataTableConfig,
    pub query: String,
    pub table: Fetched<DataTable<ContactView>>,
}

#[instrument(skip_all, fields(q = %query.q))]
pub async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    page: PageContext,
) -> Result<ContactsIndexTemplate> {
    let contacts = fetched(state.backend().contacts(&admin.credentials).await, "contacts")?;

    Ok(ContactsIndexTemplate {
        page,
        config: table_config(),
        table: contacts.map(|table| DataTable::new(&table, &query.q, ContactView::new)),
        query: query.q,
    })
}

/// Flip the checked flag of one submission.
#[instrument(skip_all, fields(contact_id = id))]
pub async fn toggle(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .toggle_contact(ContactId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |checked| {
            if checked {
                format!("Message {id} marked as checked.")
            } else {
                format!("Message {id} marked as unchecked.")
            }
        },
        "The message could not be updated.",
    )
    .await
}

#[instrument(skip_all, fields(contact_id = id))]
pub async fn delete(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<RowActionForm>,
) -> Result<Redirect> {
    let result = state
        .backend()
        .delete_contact(ContactId::new(id), &admin.credentials)
        .await;

    finish_mutation(
        &session,
        result,
        TABLE_ID,
        &form.q,
        |()| format!("Message {id} deleted."),
        "The message could not be deleted.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_view() {
        let view = ContactView::new(&ContactSubmission {
            id: ContactId::new(5),
            first_name: "Ana".into(),
            last_name: "Ruiz".into(),
            email: "ana@example.org".into(),
            phone: None,
            message: "Hola".into(),
            checked: false,
            created_at: None,
        });
        assert_eq!(view.name, "Ana Ruiz");
        assert_eq!(view.toggle_label(), "Mark checked");
        assert!(view.phone.is_empty());
    }
}
