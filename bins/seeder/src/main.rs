//! Database seeder for Scriva development and testing.
//!
//! Seeds the default pricing document and a demo credit account (with its
//! signup grant) for local development.
//!
//! Usage: cargo run --bin seeder

use uuid::Uuid;

use scriva_core::credit::{CreditError, CreditPricing};
use scriva_db::{AccountRepository, SettingsRepository};

/// Demo user ID (consistent for all seeds)
const DEMO_USER_ID: &str = "00000000-0000-0000-0000-000000000002";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");

    println!("Connecting to database...");
    let db = scriva_db::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    let pricing = CreditPricing::default();

    println!("Seeding credit pricing...");
    match SettingsRepository::new(db.clone())
        .set_credit_pricing(&pricing)
        .await
    {
        Ok(()) => println!("  Stored default pricing document"),
        Err(e) => eprintln!("Failed to store pricing: {e}"),
    }

    println!("Seeding demo credit account...");
    let demo_user = Uuid::parse_str(DEMO_USER_ID).expect("demo user id is a valid uuid");
    match AccountRepository::new(db)
        .create(demo_user, pricing.signup_grant)
        .await
    {
        Ok((account, _)) => println!(
            "  Created account {} with {} promo credits",
            account.id, account.promo_balance
        ),
        Err(CreditError::AccountExists(_)) => {
            println!("  Demo account already exists, skipping...");
        }
        Err(e) => eprintln!("Failed to create demo account: {e}"),
    }

    println!("Seeding complete!");
}
