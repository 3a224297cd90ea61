//! # Seed Data Generator
//!
//! Populates a database with a small catalog and places one sample order.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by ORDERFLOW_DATABASE_PATH (default ./orderflow.db)
//! cargo run -p orderflow-service --bin seed
//!
//! # Specify database path
//! cargo run -p orderflow-service --bin seed -- --db ./data/orders.db
//! ```
//!
//! The placed order is printed as JSON on stdout.

use std::env;
use std::path::PathBuf;

use orderflow_core::validation::validate_new_product;
use orderflow_core::{Money, NewProduct};
use orderflow_service::{connect, telemetry, ServiceConfig};
use tracing::info;

/// (name, price in cents, stock)
const CATALOG: &[(&str, i64, i64)] = &[
    ("Product 1", 1099, 100),
    ("Product 2", 1599, 50),
    ("Espresso Beans 1kg", 2450, 30),
    ("Paper Filters (100)", 399, 200),
    ("Ceramic Mug", 1250, 12),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut config = ServiceConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.database_path = PathBuf::from(path);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Orderflow Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $ORDERFLOW_DATABASE_PATH or ./orderflow.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    telemetry::init_tracing(&config.log_filter)?;

    info!(path = %config.database_path.display(), "Seeding database");
    let service = connect(&config).await?;
    let db = service.ledger();

    let existing = db.products().count().await?;
    if existing > 0 {
        eprintln!("Database already has {existing} products; skipping catalog insert.");
    } else {
        for &(name, cents, stock) in CATALOG {
            let product = NewProduct {
                name: name.to_string(),
                price: Money::from_cents(cents),
                stock,
            };
            validate_new_product(&product)?;
            let inserted = db.products().insert(&product).await?;
            info!(id = %inserted.id, name = %inserted.name, price = %inserted.price, stock, "Product added");
        }
    }

    let catalog = db.products().list_all().await?;
    let lines: Vec<(i64, i64)> = catalog
        .iter()
        .filter(|product| product.stock > 0)
        .take(2)
        .map(|product| (product.id.0, 1))
        .collect();

    if lines.is_empty() {
        eprintln!("No product in stock; no sample order placed.");
        return Ok(());
    }

    let order = service.place_order_lines(&lines).await?;
    println!("{}", serde_json::to_string_pretty(&order)?);

    db.close().await;
    Ok(())
}
