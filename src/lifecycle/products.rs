use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::error::TrackerError;
use crate::models::{Product, ProductDraft, ProductStatus};
use crate::notify::{RefreshNotifier, RefreshSignal};
use crate::store::{EntityStore, NewProduct, ProductPatch};

/// Owns the product side of the lifecycle: create, edit, delete, list.
///
/// Status transitions (book-out, check-in) go through the coordinator; this
/// manager never touches `status` or `current_rental_id`.
#[derive(Clone)]
pub struct ProductManager {
    store: Arc<dyn EntityStore>,
    notifier: RefreshNotifier,
}

impl ProductManager {
    pub fn new(store: Arc<dyn EntityStore>, notifier: RefreshNotifier) -> Self {
        Self { store, notifier }
    }

    /// Insert a new product as Available with no open rental
    pub async fn create(&self, draft: ProductDraft) -> Result<Product, TrackerError> {
        validate_draft(&draft)?;
        let product = self
            .store
            .insert_product(NewProduct {
                name: draft.name,
                sku: draft.sku,
                description: draft.description,
                serial_number: draft.serial_number,
                store_location: draft.store_location,
            })
            .await?;
        info!(id = %product.id, sku = %product.sku, "added product");
        self.notifier.publish(RefreshSignal::ProductsChanged);
        Ok(product)
    }

    /// Update the staff-editable attributes of a product, leaving its
    /// status and rental reference alone
    pub async fn edit(&self, id: &str, draft: ProductDraft) -> Result<Product, TrackerError> {
        validate_draft(&draft)?;
        let product = self
            .store
            .update_product(
                id,
                ProductPatch {
                    name: Some(draft.name),
                    sku: Some(draft.sku),
                    description: Some(draft.description),
                    serial_number: Some(draft.serial_number),
                    store_location: Some(draft.store_location),
                    ..ProductPatch::default()
                },
            )
            .await?;
        info!(%id, "edited product");
        self.notifier.publish(RefreshSignal::ProductsChanged);
        Ok(product)
    }

    /// Remove a product permanently. Only Available products can go;
    /// historical rentals keep their snapshot and are untouched.
    pub async fn delete(&self, id: &str) -> Result<(), TrackerError> {
        let product = self
            .store
            .get_product(id)
            .await?
            .ok_or_else(|| TrackerError::NotFound {
                collection: "products",
                id: id.to_string(),
            })?;
        if product.status != ProductStatus::Available {
            return Err(TrackerError::InvalidState(
                "only Available products can be deleted".to_string(),
            ));
        }
        self.store.delete_product(id).await?;
        info!(%id, "deleted product");
        self.notifier.publish(RefreshSignal::ProductsChanged);
        Ok(())
    }

    /// All products, newest first
    pub async fn list(&self) -> Result<Vec<Product>, TrackerError> {
        Ok(self.store.list_products().await?)
    }

    /// Inventory head-counts for the summary panel
    pub async fn summary(&self) -> Result<InventorySummary, TrackerError> {
        let products = self.list().await?;
        let mut by_sku: BTreeMap<String, SkuCounts> = BTreeMap::new();
        let mut available = 0;
        let mut rented_out = 0;
        for product in &products {
            let counts = by_sku.entry(product.sku.clone()).or_insert_with(|| SkuCounts {
                sku: product.sku.clone(),
                available: 0,
                rented_out: 0,
            });
            match product.status {
                ProductStatus::Available => {
                    available += 1;
                    counts.available += 1;
                }
                ProductStatus::RentedOut => {
                    rented_out += 1;
                    counts.rented_out += 1;
                }
            }
        }
        Ok(InventorySummary {
            total: products.len(),
            available,
            rented_out,
            by_sku: by_sku.into_values().collect(),
        })
    }
}

/// Counts of products per status, overall and broken down by SKU
#[derive(Debug, Clone, Serialize)]
pub struct InventorySummary {
    pub total: usize,
    pub available: usize,
    pub rented_out: usize,
    pub by_sku: Vec<SkuCounts>,
}

/// Per-SKU slice of the inventory summary
#[derive(Debug, Clone, Serialize)]
pub struct SkuCounts {
    pub sku: String,
    pub available: usize,
    pub rented_out: usize,
}

fn validate_draft(draft: &ProductDraft) -> Result<(), TrackerError> {
    for (field, value) in [
        ("name", &draft.name),
        ("sku", &draft.sku),
        ("serialNumber", &draft.serial_number),
    ] {
        if value.trim().is_empty() {
            return Err(TrackerError::Validation(format!("{field} is required")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoreLocation;
    use crate::store::MemoryStore;

    fn manager() -> (Arc<MemoryStore>, ProductManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = ProductManager::new(store.clone(), RefreshNotifier::new());
        (store, manager)
    }

    fn drone_draft() -> ProductDraft {
        ProductDraft {
            name: "Drone".to_string(),
            sku: "D1".to_string(),
            description: "Camera drone".to_string(),
            serial_number: "SN1".to_string(),
            store_location: StoreLocation::Mel,
        }
    }

    #[tokio::test]
    async fn create_starts_available_with_no_rental() {
        let (_, manager) = manager();
        let product = manager.create(drone_draft()).await.unwrap();
        assert_eq!(product.status, ProductStatus::Available);
        assert_eq!(product.current_rental_id, None);
        assert_eq!(product.created_at, product.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_blank_required_fields() {
        let (_, manager) = manager();
        let draft = ProductDraft { sku: "  ".to_string(), ..drone_draft() };
        let err = manager.create(draft).await.unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        // nothing was written
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_changes_attributes_but_not_status() {
        let (_, manager) = manager();
        let product = manager.create(drone_draft()).await.unwrap();
        let edited = manager
            .edit(
                &product.id,
                ProductDraft {
                    name: "Drone Pro".to_string(),
                    store_location: StoreLocation::Syd,
                    ..drone_draft()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.name, "Drone Pro");
        assert_eq!(edited.store_location, StoreLocation::Syd);
        assert_eq!(edited.status, ProductStatus::Available);
        assert_eq!(edited.current_rental_id, None);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_not_found() {
        let (_, manager) = manager();
        let err = manager.edit("P999999", drone_draft()).await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound { collection: "products", .. }));
    }

    #[tokio::test]
    async fn delete_removes_available_product() {
        let (_, manager) = manager();
        let product = manager.create(drone_draft()).await.unwrap();
        manager.delete(&product.id).await.unwrap();
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_rejects_rented_out_product() {
        let (store, manager) = manager();
        let product = manager.create(drone_draft()).await.unwrap();
        store
            .update_product(
                &product.id,
                ProductPatch {
                    status: Some(ProductStatus::RentedOut),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        let err = manager.delete(&product.id).await.unwrap_err();
        assert!(matches!(err, TrackerError::InvalidState(_)));
        assert_eq!(manager.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn summary_counts_by_status_and_sku() {
        let (store, manager) = manager();
        manager.create(drone_draft()).await.unwrap();
        let second = manager.create(drone_draft()).await.unwrap();
        manager
            .create(ProductDraft { sku: "CAM1".to_string(), ..drone_draft() })
            .await
            .unwrap();
        store
            .update_product(
                &second.id,
                ProductPatch {
                    status: Some(ProductStatus::RentedOut),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();

        let summary = manager.summary().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.available, 2);
        assert_eq!(summary.rented_out, 1);
        assert_eq!(summary.by_sku.len(), 2);
        let d1 = summary.by_sku.iter().find(|s| s.sku == "D1").unwrap();
        assert_eq!((d1.available, d1.rented_out), (1, 1));
    }
}
