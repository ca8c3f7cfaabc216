//! Public catalog reads: substances, advice and products.

use safeuse_core::records::{Advice, Product, Substance, SubstanceDetails, merge_details};
use safeuse_core::table::ManagedTable;
use safeuse_core::types::{ProductId, SubstanceId};
use tracing::instrument;

use crate::cache::CacheKey;
use crate::client::BackendClient;
use crate::error::BackendError;
use crate::paths;

impl BackendClient {
    /// All substances with their detail sheets attached.
    ///
    /// The list and detail endpoints are fetched concurrently and merged by
    /// id. The merged table is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if either request fails.
    #[instrument(skip(self))]
    pub async fn substances(&self) -> Result<ManagedTable<Substance>, BackendError> {
        if let Some(table) = self.cached::<Substance>(CacheKey::Substances).await {
            return Ok(table);
        }

        let (substances, details) = tokio::try_join!(
            self.list::<Substance>(paths::SUBSTANCES, None),
            self.list::<SubstanceDetails>(paths::SUBSTANCE_DETAILS, None),
        )?;

        let table = ManagedTable::new(merge_details(substances, details));
        self.store(CacheKey::Substances, table.clone()).await;
        Ok(table)
    }

    /// One substance by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no substance has the id.
    #[instrument(skip(self), fields(substance_id = %id))]
    pub async fn substance(&self, id: SubstanceId) -> Result<Substance, BackendError> {
        self.substances()
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("Substance {id}")))
    }

    /// All advice, in backend order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn advice(&self) -> Result<ManagedTable<Advice>, BackendError> {
        self.table(CacheKey::Advice, paths::ADVICE, None).await
    }

    /// The public product catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<ManagedTable<Product>, BackendError> {
        self.table(CacheKey::Products, paths::PRODUCTS, None).await
    }

    /// One product from the public catalog.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no product has the id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, BackendError> {
        self.products()
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("Product {id}")))
    }
}
