use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Product, ProductStatus, Rental};
use crate::store::types::{
    NewProduct, NewRental, ProductPatch, RentalFilter, RentalPatch, RentalSort,
};

/// Failures from the underlying document store
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document addressed by an update or delete does not exist
    #[error("{collection} document {id} does not exist")]
    Missing { collection: &'static str, id: String },

    /// A guarded update found a different status than the caller expected
    #[error("{collection} document {id} has status '{found}', expected '{expected}'")]
    GuardConflict {
        collection: &'static str,
        id: String,
        expected: ProductStatus,
        found: ProductStatus,
    },

    /// The store cannot serve this filter+sort combination (e.g. a missing
    /// composite index); callers fall back to filtering only
    #[error("query needs a composite index: {0}")]
    UnsupportedQuery(String),

    /// Transport or backend failure, message passed through
    #[error("backend error: {0}")]
    Backend(String),
}

/// Thin interface over a document database holding the `products` and
/// `rentals` collections.
///
/// Each method is a single round-trip and each write is atomic at the
/// document level; the store offers no cross-document transactions, so
/// multi-document consistency is the coordinator's problem.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Clock used for server-assigned timestamp fields
    fn server_now(&self) -> DateTime<Utc>;

    /// Whether the store can serve an equality filter combined with a sort
    /// in one query
    fn supports_filter_sort(&self) -> bool;

    async fn insert_product(&self, doc: NewProduct) -> Result<Product, StoreError>;

    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError>;

    /// All products, newest first
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    async fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Product, StoreError>;

    /// Compare-and-swap variant of [`update_product`]: applies the patch only
    /// while the document status equals `expected`, otherwise fails with
    /// [`StoreError::GuardConflict`] and writes nothing.
    ///
    /// [`update_product`]: EntityStore::update_product
    async fn update_product_if_status(
        &self,
        id: &str,
        expected: ProductStatus,
        patch: ProductPatch,
    ) -> Result<Product, StoreError>;

    async fn delete_product(&self, id: &str) -> Result<(), StoreError>;

    async fn insert_rental(&self, doc: NewRental) -> Result<Rental, StoreError>;

    async fn get_rental(&self, id: &str) -> Result<Option<Rental>, StoreError>;

    /// Equality filter with an optional sort; requesting a sort on a store
    /// where [`supports_filter_sort`] is false fails with
    /// [`StoreError::UnsupportedQuery`].
    ///
    /// [`supports_filter_sort`]: EntityStore::supports_filter_sort
    async fn find_rentals(
        &self,
        filter: RentalFilter,
        sort: Option<RentalSort>,
    ) -> Result<Vec<Rental>, StoreError>;

    async fn update_rental(&self, id: &str, patch: RentalPatch) -> Result<Rental, StoreError>;

    async fn delete_rental(&self, id: &str) -> Result<(), StoreError>;
}
