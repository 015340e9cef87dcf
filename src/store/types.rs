use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ProductSnapshot, ProductStatus, RentalStatus, StoreLocation};

/// Fields for a new product document; the store assigns id, status and
/// timestamps on insert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub serial_number: String,
    pub store_location: StoreLocation,
}

/// Fields for a new rental document; the store assigns id, rental_date and
/// timestamps, and the rental starts Active with no return date
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRental {
    pub product_id: String,
    pub product_snapshot: ProductSnapshot,
    pub store_location: StoreLocation,
    pub staff_name: String,
    pub due_date: DateTime<Utc>,
}

/// Partial update of a product document. `None` fields are left untouched;
/// the store bumps updated_at on every applied patch.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub serial_number: Option<String>,
    pub store_location: Option<StoreLocation>,
    pub status: Option<ProductStatus>,
    /// Outer None leaves the reference alone; Some(None) clears it
    pub current_rental_id: Option<Option<String>>,
}

/// Partial update of a rental document; same conventions as [`ProductPatch`]
#[derive(Debug, Clone, Default)]
pub struct RentalPatch {
    pub status: Option<RentalStatus>,
    /// Outer None leaves the date alone; Some(None) clears it
    pub return_date: Option<Option<DateTime<Utc>>>,
}

/// Equality filter over the rentals collection
#[derive(Debug, Clone, Default)]
pub struct RentalFilter {
    pub status: Option<RentalStatus>,
    pub product_id: Option<String>,
}

/// Descending sort orders the rentals collection can be queried with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RentalSort {
    RentalDateDesc,
    ReturnDateDesc,
}
