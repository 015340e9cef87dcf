pub mod coordinator;
pub mod products;
pub mod rentals;

pub use coordinator::{BookOutRequest, RentalCoordinator};
pub use products::{InventorySummary, ProductManager, SkuCounts};
pub use rentals::RentalManager;
