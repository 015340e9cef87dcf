use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use tracing::{info, warn};

use crate::error::TrackerError;
use crate::lifecycle::rentals::RentalManager;
use crate::models::{Product, ProductSnapshot, ProductStatus, Rental, RentalStatus, StoreLocation};
use crate::notify::{RefreshNotifier, RefreshSignal};
use crate::store::{EntityStore, NewRental, ProductPatch, RentalPatch};

/// Staff input for booking a product out
#[derive(Debug, Clone)]
pub struct BookOutRequest {
    /// Defaults to the product's home location in the UI, but staff may
    /// book out from a different store
    pub store_location: StoreLocation,
    pub staff_name: String,
    pub due_date: NaiveDate,
}

/// Sequences the paired writes that move a product between Available and
/// Rented Out.
///
/// The store has no cross-document transactions, so each transition is two
/// ordered single-document writes. The product write of a book-out is a
/// compare-and-swap on its status; if it loses, or fails outright, the
/// freshly created rental is removed again so the pair either lands
/// together or not at all.
#[derive(Clone)]
pub struct RentalCoordinator {
    store: Arc<dyn EntityStore>,
    rentals: RentalManager,
    notifier: RefreshNotifier,
}

impl RentalCoordinator {
    pub fn new(store: Arc<dyn EntityStore>, notifier: RefreshNotifier) -> Self {
        let rentals = RentalManager::new(store.clone());
        Self { store, rentals, notifier }
    }

    /// Book a product out: create an Active rental carrying a snapshot of
    /// the product, then flip the product to Rented Out.
    ///
    /// Field checks run before the date check and the first failure wins,
    /// with nothing written.
    pub async fn book_out(
        &self,
        product_id: &str,
        request: BookOutRequest,
    ) -> Result<Rental, TrackerError> {
        if request.staff_name.trim().is_empty() {
            return Err(TrackerError::Validation("staff name is required".to_string()));
        }
        let today = Local::now().date_naive();
        if request.due_date < today {
            return Err(TrackerError::Validation(
                "due date cannot be earlier than today".to_string(),
            ));
        }

        let product = self.fetch_product(product_id).await?;
        if product.status != ProductStatus::Available {
            return Err(TrackerError::InvalidState(
                "only Available products can be booked out".to_string(),
            ));
        }

        let rental = self
            .store
            .insert_rental(NewRental {
                product_id: product_id.to_string(),
                product_snapshot: ProductSnapshot::of(&product),
                store_location: request.store_location,
                staff_name: request.staff_name,
                due_date: due_date_timestamp(request.due_date),
            })
            .await?;

        let flip = self
            .store
            .update_product_if_status(
                product_id,
                ProductStatus::Available,
                ProductPatch {
                    status: Some(ProductStatus::RentedOut),
                    current_rental_id: Some(Some(rental.id.clone())),
                    ..ProductPatch::default()
                },
            )
            .await;

        if let Err(err) = flip {
            warn!(%product_id, rental_id = %rental.id, %err, "product write failed, removing orphan rental");
            if let Err(cleanup) = self.store.delete_rental(&rental.id).await {
                // both writes failed; the orphan Active rental stays visible
                // until someone cleans it up by hand
                warn!(rental_id = %rental.id, %cleanup, "orphan rental could not be removed");
            }
            return Err(err.into());
        }

        info!(%product_id, rental_id = %rental.id, "booked out product");
        self.notifier.publish(RefreshSignal::RentalsChanged);
        self.notifier.publish(RefreshSignal::ProductsChanged);
        Ok(rental)
    }

    /// Check a product back in, resolving its open rental first via
    /// `current_rental_id` and then by query
    pub async fn check_in_product(&self, product_id: &str) -> Result<Rental, TrackerError> {
        let product = self.fetch_product(product_id).await?;

        let mut rental = None;
        if let Some(rental_id) = &product.current_rental_id {
            rental = self.store.get_rental(rental_id).await?;
        }
        let rental = match rental.filter(|r| r.status == RentalStatus::Active) {
            Some(r) => r,
            None => self
                .rentals
                .find_active_for_product(product_id)
                .await?
                .ok_or_else(|| TrackerError::NoActiveRental {
                    product_id: product_id.to_string(),
                })?,
        };

        self.complete_check_in(rental).await
    }

    /// Check a specific rental back in (the active-rentals table path)
    pub async fn check_in_rental(&self, rental_id: &str) -> Result<Rental, TrackerError> {
        let rental = self
            .store
            .get_rental(rental_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound {
                collection: "rentals",
                id: rental_id.to_string(),
            })?;
        if rental.status != RentalStatus::Active {
            return Err(TrackerError::InvalidState(format!(
                "rental {rental_id} is already returned"
            )));
        }
        self.complete_check_in(rental).await
    }

    /// Close the rental, then free the product. If the product write fails
    /// the rental is re-opened so the transition never half-lands.
    async fn complete_check_in(&self, rental: Rental) -> Result<Rental, TrackerError> {
        let returned = self
            .store
            .update_rental(
                &rental.id,
                RentalPatch {
                    status: Some(RentalStatus::Returned),
                    return_date: Some(Some(self.store.server_now())),
                },
            )
            .await?;

        let free = self
            .store
            .update_product(
                &rental.product_id,
                ProductPatch {
                    status: Some(ProductStatus::Available),
                    current_rental_id: Some(None),
                    ..ProductPatch::default()
                },
            )
            .await;

        if let Err(err) = free {
            warn!(product_id = %rental.product_id, rental_id = %rental.id, %err,
                "product write failed, re-opening rental");
            let reopen = self
                .store
                .update_rental(
                    &rental.id,
                    RentalPatch {
                        status: Some(RentalStatus::Active),
                        return_date: Some(None),
                    },
                )
                .await;
            if let Err(cleanup) = reopen {
                warn!(rental_id = %rental.id, %cleanup, "rental stuck Returned against a Rented Out product");
            }
            return Err(err.into());
        }

        info!(product_id = %rental.product_id, rental_id = %rental.id, "checked in product");
        self.notifier.publish(RefreshSignal::RentalsChanged);
        self.notifier.publish(RefreshSignal::ProductsChanged);
        Ok(returned)
    }

    async fn fetch_product(&self, product_id: &str) -> Result<Product, TrackerError> {
        self.store
            .get_product(product_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound {
                collection: "products",
                id: product_id.to_string(),
            })
    }
}

/// Due dates are calendar dates; they are stored as local midnight, matching
/// the date-picker behavior of the UI
fn due_date_timestamp(date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match Local.from_local_datetime(&midnight).earliest() {
        Some(local) => local.with_timezone(&Utc),
        // local midnight does not exist on this date (DST gap)
        None => Utc.from_utc_datetime(&midnight),
    }
}
