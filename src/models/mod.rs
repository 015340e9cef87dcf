use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Store locations products can belong to or be booked out from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoreLocation {
    #[serde(rename = "MEL")]
    Mel,
    #[serde(rename = "SYD")]
    Syd,
    #[serde(rename = "BNE")]
    Bne,
    #[serde(rename = "PER")]
    Per,
    #[serde(rename = "ADL")]
    Adl,
    #[serde(rename = "CBR")]
    Cbr,
    #[serde(rename = "HBA")]
    Hba,
    #[serde(rename = "DRW")]
    Drw,
}

impl StoreLocation {
    /// All locations, in the order they appear in the booking form
    pub const ALL: [StoreLocation; 8] = [
        StoreLocation::Mel,
        StoreLocation::Syd,
        StoreLocation::Bne,
        StoreLocation::Per,
        StoreLocation::Adl,
        StoreLocation::Cbr,
        StoreLocation::Hba,
        StoreLocation::Drw,
    ];

    /// Three-letter code stored in documents
    pub fn code(&self) -> &'static str {
        match self {
            StoreLocation::Mel => "MEL",
            StoreLocation::Syd => "SYD",
            StoreLocation::Bne => "BNE",
            StoreLocation::Per => "PER",
            StoreLocation::Adl => "ADL",
            StoreLocation::Cbr => "CBR",
            StoreLocation::Hba => "HBA",
            StoreLocation::Drw => "DRW",
        }
    }

    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            StoreLocation::Mel => "Melbourne (MEL)",
            StoreLocation::Syd => "Sydney (SYD)",
            StoreLocation::Bne => "Brisbane (BNE)",
            StoreLocation::Per => "Perth (PER)",
            StoreLocation::Adl => "Adelaide (ADL)",
            StoreLocation::Cbr => "Canberra (CBR)",
            StoreLocation::Hba => "Hobart (HBA)",
            StoreLocation::Drw => "Darwin (DRW)",
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for StoreLocation {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoreLocation::ALL
            .iter()
            .copied()
            .find(|loc| loc.code() == s)
            .ok_or_else(|| {
                TrackerError::Validation(format!("'{s}' is not a valid store location"))
            })
    }
}

/// Whether a product is on the shelf or out with a renter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductStatus {
    Available,
    #[serde(rename = "Rented Out")]
    RentedOut,
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductStatus::Available => f.write_str("Available"),
            ProductStatus::RentedOut => f.write_str("Rented Out"),
        }
    }
}

/// Rental state; Returned is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalStatus {
    Active,
    Returned,
}

impl fmt::Display for RentalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RentalStatus::Active => f.write_str("Active"),
            RentalStatus::Returned => f.write_str("Returned"),
        }
    }
}

/// A product document from the `products` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub serial_number: String,
    pub store_location: StoreLocation,
    pub status: ProductStatus,
    /// Set iff status is RentedOut; points at the open rental
    pub current_rental_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Staff-editable product attributes, shared by create and edit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub sku: String,
    pub description: String,
    pub serial_number: String,
    pub store_location: StoreLocation,
}

/// Copy of product identity captured at book-out time.
///
/// Never refreshed after the rental is created, so rental history stays
/// displayable after the product is edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    pub name: String,
    pub sku: String,
    pub serial_number: String,
}

impl ProductSnapshot {
    pub fn of(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            sku: product.sku.clone(),
            serial_number: product.serial_number.clone(),
        }
    }
}

/// A rental document from the `rentals` collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: String,
    pub product_id: String,
    pub product_snapshot: ProductSnapshot,
    /// Location the product was booked out from; defaults to the product's
    /// home location in the UI but staff may override it
    pub store_location: StoreLocation,
    pub staff_name: String,
    pub rental_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    /// None while Active, set at check-in
    pub return_date: Option<DateTime<Utc>>,
    pub status: RentalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
