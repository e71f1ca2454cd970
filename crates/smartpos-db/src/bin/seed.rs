//! # Seed Data Generator
//!
//! Populates a database with demo accounts, suppliers, products and store
//! settings for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p smartpos-db --bin seed
//!
//! # Specify database path
//! cargo run -p smartpos-db --bin seed -- --db ./data/smartpos.db
//! ```
//!
//! ## Demo Accounts
//! | E-mail            | Password   | Role    |
//! |-------------------|------------|---------|
//! | admin@pos.com     | admin123   | admin   |
//! | manager@pos.com   | manager123 | manager |
//! | cashier@pos.com   | cashier123 | cashier |

use std::env;

use anyhow::{anyhow, Context};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use smartpos_core::catalog::{NewProduct, NewSupplier};
use smartpos_core::{ConfigKey, RoleName};
use smartpos_db::{Database, DbConfig, NewUser};

const USERS: &[(&str, &str, &str, RoleName)] = &[
    ("admin@pos.com", "admin123", "Admin User", RoleName::Admin),
    ("manager@pos.com", "manager123", "Manager User", RoleName::Manager),
    ("cashier@pos.com", "cashier123", "Cashier User", RoleName::Cashier),
];

/// (name, contact, email, phone, address)
const SUPPLIERS: &[(&str, &str, &str, &str, &str)] = &[
    ("TechWorld Distributors", "John Smith", "john@techworld.com", "+1-555-0101", "123 Tech Street, Silicon Valley, CA"),
    ("Global Electronics Inc", "Sarah Johnson", "sarah@globalelec.com", "+1-555-0102", "456 Electronics Ave, New York, NY"),
    ("Office Supplies Co", "Mike Davis", "mike@officesupplies.com", "+1-555-0103", "789 Business Blvd, Chicago, IL"),
    ("Premium Goods Ltd", "Emily Chen", "emily@premiumgoods.com", "+1-555-0104", "321 Quality Road, Seattle, WA"),
    ("Budget Wholesale", "David Brown", "david@budgetwholesale.com", "+1-555-0105", "654 Discount Lane, Austin, TX"),
];

/// (name, sku, description, price_cents, cost_cents, stock, threshold, supplier index)
const PRODUCTS: &[(&str, &str, &str, i64, i64, i64, i64, usize)] = &[
    ("Wireless Mouse", "TECH-001", "Ergonomic wireless mouse with USB receiver", 2999, 1500, 45, 10, 0),
    ("USB-C Cable 6ft", "TECH-002", "High-speed USB-C charging cable", 1299, 650, 120, 20, 0),
    ("Bluetooth Keyboard", "TECH-003", "Slim wireless keyboard with backlight", 5999, 3000, 25, 8, 1),
    ("Laptop Stand", "TECH-004", "Adjustable aluminum laptop stand", 3999, 2000, 35, 10, 1),
    ("Webcam HD 1080p", "TECH-005", "Full HD webcam with built-in microphone", 7999, 4000, 18, 5, 0),
    ("Noise Cancelling Headphones", "TECH-006", "Over-ear wireless headphones", 14999, 8000, 4, 5, 1),
    ("A4 Copy Paper (500)", "OFF-001", "80gsm multipurpose paper", 899, 450, 200, 40, 2),
    ("Gel Pens (12 pack)", "OFF-002", "Assorted colour gel pens", 699, 300, 60, 15, 2),
    ("Desk Organizer", "OFF-003", "Bamboo desk organizer with drawers", 2499, 1200, 12, 5, 2),
    ("Leather Notebook", "PRM-001", "Hand-stitched A5 leather notebook", 3499, 1600, 8, 10, 3),
    ("Stainless Water Bottle", "PRM-002", "Insulated 750ml bottle", 2499, 1100, 30, 10, 3),
    ("Sticky Notes (6 pack)", "BUD-001", "3x3 inch sticky notes", 399, 150, 3, 20, 4),
    ("AA Batteries (8 pack)", "BUD-002", "Alkaline AA batteries", 799, 380, 75, 20, 4),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./smartpos.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Smart POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./smartpos.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Smart POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("opening database")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.users().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} users", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Users
    println!();
    println!("Creating users...");
    let mut admin_id = None;
    for (email, password, name, role_name) in USERS {
        let role = db
            .roles()
            .get_by_name(*role_name)
            .await?
            .ok_or_else(|| anyhow!("built-in role {} missing", role_name))?;

        let user = db
            .users()
            .create(&NewUser {
                email: email.to_string(),
                password_hash: hash_password(password)?,
                name: name.to_string(),
                role_id: role.id,
            })
            .await?;

        if *role_name == RoleName::Admin {
            admin_id = Some(user.id);
        }
        println!("  {} / {} ({})", email, password, role_name);
    }

    // Suppliers
    println!();
    println!("Creating suppliers...");
    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (name, contact, email, phone, address) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .create(&NewSupplier {
                name: name.to_string(),
                contact: contact.to_string(),
                email: email.to_string(),
                phone: phone.to_string(),
                address: Some(address.to_string()),
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ Created {} suppliers", supplier_ids.len());

    // Products
    println!();
    println!("Creating products...");
    let mut created = 0;
    for (name, sku, description, price, cost, stock, threshold, supplier_idx) in PRODUCTS {
        let input = NewProduct {
            name: name.to_string(),
            sku: sku.to_string(),
            description: Some(description.to_string()),
            price_cents: *price,
            cost_cents: *cost,
            stock: *stock,
            low_stock_threshold: *threshold,
            supplier_id: supplier_ids[*supplier_idx],
        };

        if let Err(e) = db.products().create(&input).await {
            eprintln!("Failed to insert {}: {}", sku, e);
            continue;
        }
        created += 1;
    }
    println!("✓ Created {} products", created);

    // Store settings
    let admin_id = admin_id.ok_or_else(|| anyhow!("admin user was not created"))?;
    for key in ConfigKey::ALL {
        db.configs().set(key, key.default_value(), admin_id).await?;
    }
    println!("✓ Stored {} configuration defaults", ConfigKey::ALL.len());

    let low = db.products().low_stock().await?;
    println!();
    println!("  Low stock products: {}", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hashing password: {}", e))?;

    Ok(hash.to_string())
}
