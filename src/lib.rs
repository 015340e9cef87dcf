//! Staff-facing inventory and rental tracking core.
//!
//! Products live in a `products` collection and move between Available and
//! Rented Out; each book-out creates an Active rental in a `rentals`
//! collection and each check-in closes it. The two collections are kept in
//! step by the [`RentalCoordinator`], and read-views learn about mutations
//! through the [`RefreshNotifier`] rather than store subscriptions.

pub mod error;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod store;

pub use error::TrackerError;
pub use lifecycle::{
    BookOutRequest, InventorySummary, ProductManager, RentalCoordinator, RentalManager,
};
pub use notify::{RefreshNotifier, RefreshSignal};
