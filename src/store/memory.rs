use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::models::{Product, ProductStatus, Rental, RentalStatus};
use crate::store::traits::{EntityStore, StoreError};
use crate::store::types::{
    NewProduct, NewRental, ProductPatch, RentalFilter, RentalPatch, RentalSort,
};

#[derive(Debug, Default)]
struct Collections {
    products: HashMap<String, Product>,
    rentals: HashMap<String, Rental>,
    next_id: u64,
}

impl Collections {
    fn assign_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{:06}", self.next_id)
    }
}

/// In-memory implementation of [`EntityStore`].
///
/// Backs the demo binary and the test suite. Writes are atomic per document
/// (one mutex acquisition per call) and nothing spans two documents, matching
/// the guarantees of the real store.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
    compound_queries: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Collections::default()),
            compound_queries: true,
        }
    }

    /// A store that refuses filter+sort queries, standing in for a backend
    /// with no composite index over the rentals collection
    pub fn without_compound_queries() -> Self {
        Self {
            inner: Mutex::new(Collections::default()),
            compound_queries: false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        // A poisoned lock only means a test thread panicked mid-write
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(rental: &Rental, filter: &RentalFilter) -> bool {
    if let Some(status) = filter.status {
        if rental.status != status {
            return false;
        }
    }
    if let Some(product_id) = &filter.product_id {
        if &rental.product_id != product_id {
            return false;
        }
    }
    true
}

fn sort_rentals(list: &mut [Rental], sort: RentalSort) {
    match sort {
        RentalSort::RentalDateDesc => {
            list.sort_by(|a, b| (b.rental_date, &b.id).cmp(&(a.rental_date, &a.id)));
        }
        RentalSort::ReturnDateDesc => {
            // Missing return dates sort last; ties break on id so the order
            // is stable across paths
            list.sort_by_key(|r| Reverse((r.return_date, r.id.clone())));
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    fn server_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn supports_filter_sort(&self) -> bool {
        self.compound_queries
    }

    async fn insert_product(&self, doc: NewProduct) -> Result<Product, StoreError> {
        let now = self.server_now();
        let mut inner = self.lock();
        let id = inner.assign_id("P");
        let product = Product {
            id: id.clone(),
            name: doc.name,
            sku: doc.sku,
            description: doc.description,
            serial_number: doc.serial_number,
            store_location: doc.store_location,
            status: ProductStatus::Available,
            current_rental_id: None,
            created_at: now,
            updated_at: now,
        };
        inner.products.insert(id.clone(), product.clone());
        debug!(%id, "inserted product");
        Ok(product)
    }

    async fn get_product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.lock().products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut list: Vec<Product> = self.lock().products.values().cloned().collect();
        list.sort_by(|a, b| (b.created_at, &b.id).cmp(&(a.created_at, &a.id)));
        Ok(list)
    }

    async fn update_product(&self, id: &str, patch: ProductPatch) -> Result<Product, StoreError> {
        let now = self.server_now();
        let mut inner = self.lock();
        let product = inner.products.get_mut(id).ok_or_else(|| StoreError::Missing {
            collection: "products",
            id: id.to_string(),
        })?;
        apply_product_patch(product, patch, now);
        Ok(product.clone())
    }

    async fn update_product_if_status(
        &self,
        id: &str,
        expected: ProductStatus,
        patch: ProductPatch,
    ) -> Result<Product, StoreError> {
        let now = self.server_now();
        let mut inner = self.lock();
        let product = inner.products.get_mut(id).ok_or_else(|| StoreError::Missing {
            collection: "products",
            id: id.to_string(),
        })?;
        if product.status != expected {
            return Err(StoreError::GuardConflict {
                collection: "products",
                id: id.to_string(),
                expected,
                found: product.status,
            });
        }
        apply_product_patch(product, patch, now);
        Ok(product.clone())
    }

    async fn delete_product(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.products.remove(id).ok_or_else(|| StoreError::Missing {
            collection: "products",
            id: id.to_string(),
        })?;
        debug!(%id, "deleted product");
        Ok(())
    }

    async fn insert_rental(&self, doc: NewRental) -> Result<Rental, StoreError> {
        let now = self.server_now();
        let mut inner = self.lock();
        let id = inner.assign_id("R");
        let rental = Rental {
            id: id.clone(),
            product_id: doc.product_id,
            product_snapshot: doc.product_snapshot,
            store_location: doc.store_location,
            staff_name: doc.staff_name,
            rental_date: now,
            due_date: doc.due_date,
            return_date: None,
            status: RentalStatus::Active,
            created_at: now,
            updated_at: now,
        };
        inner.rentals.insert(id.clone(), rental.clone());
        debug!(%id, "inserted rental");
        Ok(rental)
    }

    async fn get_rental(&self, id: &str) -> Result<Option<Rental>, StoreError> {
        Ok(self.lock().rentals.get(id).cloned())
    }

    async fn find_rentals(
        &self,
        filter: RentalFilter,
        sort: Option<RentalSort>,
    ) -> Result<Vec<Rental>, StoreError> {
        if sort.is_some() && !self.compound_queries {
            return Err(StoreError::UnsupportedQuery(
                "rentals filter with sort requires a composite index".to_string(),
            ));
        }
        let mut list: Vec<Rental> = self
            .lock()
            .rentals
            .values()
            .filter(|r| matches(r, &filter))
            .cloned()
            .collect();
        if let Some(sort) = sort {
            sort_rentals(&mut list, sort);
        }
        Ok(list)
    }

    async fn update_rental(&self, id: &str, patch: RentalPatch) -> Result<Rental, StoreError> {
        let now = self.server_now();
        let mut inner = self.lock();
        let rental = inner.rentals.get_mut(id).ok_or_else(|| StoreError::Missing {
            collection: "rentals",
            id: id.to_string(),
        })?;
        if let Some(status) = patch.status {
            rental.status = status;
        }
        if let Some(return_date) = patch.return_date {
            rental.return_date = return_date;
        }
        rental.updated_at = now;
        Ok(rental.clone())
    }

    async fn delete_rental(&self, id: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.rentals.remove(id).ok_or_else(|| StoreError::Missing {
            collection: "rentals",
            id: id.to_string(),
        })?;
        debug!(%id, "deleted rental");
        Ok(())
    }
}

fn apply_product_patch(product: &mut Product, patch: ProductPatch, now: DateTime<Utc>) {
    if let Some(name) = patch.name {
        product.name = name;
    }
    if let Some(sku) = patch.sku {
        product.sku = sku;
    }
    if let Some(description) = patch.description {
        product.description = description;
    }
    if let Some(serial_number) = patch.serial_number {
        product.serial_number = serial_number;
    }
    if let Some(store_location) = patch.store_location {
        product.store_location = store_location;
    }
    if let Some(status) = patch.status {
        product.status = status;
    }
    if let Some(current_rental_id) = patch.current_rental_id {
        product.current_rental_id = current_rental_id;
    }
    product.updated_at = now;
}
