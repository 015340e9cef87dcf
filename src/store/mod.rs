pub mod memory;
pub mod traits;
pub mod types;

pub use memory::MemoryStore;
pub use traits::{EntityStore, StoreError};
pub use types::{NewProduct, NewRental, ProductPatch, RentalFilter, RentalPatch, RentalSort};
