//! Back-office reads and mutations.
//!
//! Every mutation goes to the backend first. Only when it succeeds is the
//! cached copy of the affected list patched; a failed mutation leaves the
//! cache untouched.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use safeuse_core::normalize::{Normalize, unwrap_object};
use safeuse_core::records::{Advice, ContactSubmission, Order, Product, Substance, User};
use safeuse_core::table::ManagedTable;
use safeuse_core::types::{AdviceId, ContactId, OrderId, Price, ProductId, SubstanceId};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::cache::{CacheKey, Resource};
use crate::client::BackendClient;
use crate::credentials::Credentials;
use crate::error::BackendError;
use crate::paths;

/// An uploaded product image.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Fields of the product create/update form.
#[derive(Debug, Clone)]
pub struct ProductForm {
    pub name: String,
    pub price: Price,
    pub stock: u32,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

impl ProductForm {
    fn into_multipart(self) -> Result<Form, BackendError> {
        let mut form = Form::new()
            .text("name", self.name)
            .text("price", self.price.amount().to_string())
            .text("stock", self.stock.to_string());
        if let Some(description) = self.description {
            form = form.text("description", description);
        }
        if let Some(image) = self.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part("image", part);
        }
        Ok(form)
    }
}

/// Row counts for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: usize,
    pub products: usize,
    pub substances: usize,
    pub orders: usize,
    pub unchecked_contacts: usize,
}

impl BackendClient {
    // =========================================================================
    // Lists
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn users(&self, credentials: &Credentials) -> Result<ManagedTable<User>, BackendError> {
        self.table(CacheKey::Users, paths::USERS, Some(credentials))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn admin_products(
        &self,
        credentials: &Credentials,
    ) -> Result<ManagedTable<Product>, BackendError> {
        self.table(CacheKey::AdminProducts, paths::ADMIN_PRODUCTS, Some(credentials))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn orders(&self, credentials: &Credentials) -> Result<ManagedTable<Order>, BackendError> {
        self.table(CacheKey::Orders, paths::ADMIN_ORDERS, Some(credentials))
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, credentials))]
    pub async fn contacts(
        &self,
        credentials: &Credentials,
    ) -> Result<ManagedTable<ContactSubmission>, BackendError> {
        self.table(CacheKey::Contacts, paths::ADMIN_CONTACTS, Some(credentials))
            .await
    }

    /// Counts for the dashboard, fetched concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if any list request fails.
    #[instrument(skip(self, credentials))]
    pub async fn dashboard_counts(
        &self,
        credentials: &Credentials,
    ) -> Result<DashboardCounts, BackendError> {
        let (users, products, substances, orders, contacts) = tokio::try_join!(
            self.users(credentials),
            self.admin_products(credentials),
            self.substances(),
            self.orders(credentials),
            self.contacts(credentials),
        )?;

        Ok(DashboardCounts {
            users: users.len(),
            products: products.len(),
            substances: substances.len(),
            orders: orders.len(),
            unchecked_contacts: contacts.rows().iter().filter(|c| !c.checked).count(),
        })
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    /// Flip a contact submission's checked flag. Returns the new value.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the submission is not listed, or
    /// the backend error if the update fails.
    #[instrument(skip(self, credentials), fields(contact_id = %id))]
    pub async fn toggle_contact(
        &self,
        id: ContactId,
        credentials: &Credentials,
    ) -> Result<bool, BackendError> {
        let contacts = self.contacts(credentials).await?;
        let current = contacts
            .get(id)
            .ok_or_else(|| BackendError::NotFound(format!("Contact {id}")))?;
        let checked = !current.checked;

        self.send_json_ignoring_body(
            Method::PUT,
            &paths::member(paths::ADMIN_CONTACTS, id),
            &json!({ "checked": checked }),
            Some(credentials),
        )
        .await?;

        self.patch_cached::<ContactSubmission>(CacheKey::Contacts, |table| {
            table.patch(id, |row| row.checked = checked);
        })
        .await;
        info!(checked, "Contact submission updated");
        Ok(checked)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credentials), fields(contact_id = %id))]
    pub async fn delete_contact(&self, id: ContactId, credentials: &Credentials) -> Result<(), BackendError> {
        self.delete_row::<ContactSubmission>(CacheKey::Contacts, paths::ADMIN_CONTACTS, id, credentials)
            .await
    }

    // =========================================================================
    // Orders, substances, advice
    // =========================================================================

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credentials), fields(order_id = %id))]
    pub async fn delete_order(&self, id: OrderId, credentials: &Credentials) -> Result<(), BackendError> {
        self.delete_row::<Order>(CacheKey::Orders, paths::ADMIN_ORDERS, id, credentials)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credentials), fields(substance_id = %id))]
    pub async fn delete_substance(
        &self,
        id: SubstanceId,
        credentials: &Credentials,
    ) -> Result<(), BackendError> {
        self.delete_row::<Substance>(CacheKey::Substances, paths::ADMIN_SUBSTANCES, id, credentials)
            .await
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credentials), fields(advice_id = %id))]
    pub async fn delete_advice(&self, id: AdviceId, credentials: &Credentials) -> Result<(), BackendError> {
        self.delete_row::<Advice>(CacheKey::Advice, paths::ADMIN_ADVICE, id, credentials)
            .await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Create a product from the multipart form.
    ///
    /// # Errors
    ///
    /// Returns an error if the form cannot be encoded or the backend rejects it.
    #[instrument(skip(self, form, credentials), fields(name = %form.name))]
    pub async fn create_product(
        &self,
        form: ProductForm,
        credentials: &Credentials,
    ) -> Result<Option<Product>, BackendError> {
        let request = self
            .request(Method::POST, paths::ADMIN_PRODUCTS, Some(credentials))?
            .multipart(form.into_multipart()?);
        let body = Self::read_json_lenient(self.send(request).await?).await;
        Ok(self.after_product_write(body.as_ref()).await)
    }

    /// Update a product from the multipart form, posted to the product's
    /// own path.
    ///
    /// # Errors
    ///
    /// Returns an error if the form cannot be encoded or the backend rejects it.
    #[instrument(skip(self, form, credentials), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: ProductForm,
        credentials: &Credentials,
    ) -> Result<Option<Product>, BackendError> {
        let request = self
            .request(Method::POST, &paths::member(paths::ADMIN_PRODUCTS, id), Some(credentials))?
            .multipart(form.into_multipart()?);
        let body = Self::read_json_lenient(self.send(request).await?).await;
        Ok(self.after_product_write(body.as_ref()).await)
    }

    /// # Errors
    ///
    /// Returns an error if the backend rejects the delete.
    #[instrument(skip(self, credentials), fields(product_id = %id))]
    pub async fn delete_product(&self, id: ProductId, credentials: &Credentials) -> Result<(), BackendError> {
        self.delete_row::<Product>(CacheKey::AdminProducts, paths::ADMIN_PRODUCTS, id, credentials)
            .await?;
        self.invalidate(CacheKey::Products).await;
        Ok(())
    }

    /// Upsert the written product if the backend echoed it back, otherwise
    /// drop the admin list so the next read refetches.
    async fn after_product_write(&self, body: Option<&serde_json::Value>) -> Option<Product> {
        self.invalidate(CacheKey::Products).await;

        let echoed = body
            .and_then(|body| {
                Product::from_value(unwrap_object(body, &["product", "producto", "data"])).ok()
            })
            .filter(|product| !product.id.is_missing());

        match &echoed {
            Some(product) => {
                let product = product.clone();
                self.patch_cached::<Product>(CacheKey::AdminProducts, |table| table.upsert(product))
                    .await;
            }
            None => {
                warn!("Backend did not echo the product; dropping cached list");
                self.invalidate(CacheKey::AdminProducts).await;
            }
        }
        echoed
    }

    /// DELETE `{collection}/{id}` and drop the row from the cached table.
    async fn delete_row<T: Resource>(
        &self,
        key: CacheKey,
        collection: &str,
        id: T::Id,
        credentials: &Credentials,
    ) -> Result<(), BackendError>
    where
        T::Id: std::fmt::Display + Send,
    {
        let request = self.request(Method::DELETE, &paths::member(collection, id), Some(credentials))?;
        self.send(request).await?;
        self.patch_cached::<T>(key, |table| {
            table.remove(id);
        })
        .await;
        info!(entity = T::ENTITY, "Row deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_form_rejects_bad_mime() {
        let form = ProductForm {
            name: "Kit".into(),
            price: Price::from_cents(1250),
            stock: 3,
            description: None,
            image: Some(ImageUpload {
                file_name: "kit.png".into(),
                content_type: "not a mime type".into(),
                bytes: vec![1, 2, 3],
            }),
        };
        assert!(form.into_multipart().is_err());
    }

    #[test]
    fn test_product_form_without_image() {
        let form = ProductForm {
            name: "Kit".into(),
            price: Price::from_cents(1250),
            stock: 3,
            description: Some("Reagent".into()),
            image: None,
        };
        assert!(form.into_multipart().is_ok());
    }
}
