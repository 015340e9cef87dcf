use std::sync::Arc;

use chrono::{Duration, Local};
use tracing::{info, Level};

use rental_tracker::lifecycle::{BookOutRequest, ProductManager, RentalCoordinator, RentalManager};
use rental_tracker::models::{ProductDraft, StoreLocation};
use rental_tracker::notify::RefreshNotifier;
use rental_tracker::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Rental Tracker - lifecycle demo");
    info!("===============================");

    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let notifier = RefreshNotifier::new();

    let products = ProductManager::new(store.clone(), notifier.clone());
    let rentals = RentalManager::new(store.clone());
    let coordinator = RentalCoordinator::new(store, notifier.clone());

    // A read-view stand-in: log every refresh pulse the way the tables
    // re-query on them
    let mut refresh_rx = notifier.subscribe();
    tokio::spawn(async move {
        while let Ok(signal) = refresh_rx.recv().await {
            info!(?signal, "read-views would re-query now");
        }
    });

    // Stock a few products
    let drone = products
        .create(ProductDraft {
            name: "DJI Mavic 3 Pro".to_string(),
            sku: "MAVIC3PRO".to_string(),
            description: "Professional drone with Hasselblad camera".to_string(),
            serial_number: "SN-DJI-M3P-0001".to_string(),
            store_location: StoreLocation::Mel,
        })
        .await?;
    let camera = products
        .create(ProductDraft {
            name: "Sony A7 IV".to_string(),
            sku: "A7IV".to_string(),
            description: "Full-frame mirrorless body".to_string(),
            serial_number: "SN-SONY-A7IV-0042".to_string(),
            store_location: StoreLocation::Syd,
        })
        .await?;

    // Book the drone out from Sydney for a week, then bring it back
    let rental = coordinator
        .book_out(
            &drone.id,
            BookOutRequest {
                store_location: StoreLocation::Syd,
                staff_name: "Alex Chen".to_string(),
                due_date: Local::now().date_naive() + Duration::days(7),
            },
        )
        .await?;
    info!(rental_id = %rental.id, due = %rental.due_date, "drone is out");

    for r in rentals.list_active().await? {
        println!(
            "ACTIVE   {} - {} ({}) by {} from {}",
            r.id, r.product_snapshot.name, r.product_snapshot.sku, r.staff_name, r.store_location
        );
    }

    coordinator.check_in_product(&drone.id).await?;

    for r in rentals.list_returned().await? {
        let returned = r.return_date.map_or_else(|| "-".to_string(), |d| d.to_rfc3339());
        println!(
            "RETURNED {} - {} ({}) at {}",
            r.id, r.product_snapshot.name, r.product_snapshot.sku, returned
        );
    }

    // The camera never moved, so it can be retired
    products.delete(&camera.id).await?;

    let summary = products.summary().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
