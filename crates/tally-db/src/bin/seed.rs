//! # Seed Data Generator
//!
//! Populates the database with a demo bill for development.
//!
//! ## Usage
//! ```bash
//! # Create the demo bill in ./tally_dev.db (default)
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! One restaurant bill with:
//! - A handful of receipt lines (mixed OCR and manual)
//! - Four participants, one with a +1
//! - A few claims in every share type
//!
//! Ends by printing the per-participant settlement so the numbers can be
//! eyeballed against the receipt.

use std::env;

use tally_core::settlement::calculate_splits;
use tally_core::{ItemSource, Money, ShareType, SubmitClaimInput};
use tally_db::{BillSelector, Database, DbConfig, NewBill, NewItem, NewParticipant};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");

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
                println!("Tally Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");
    println!();

    // The demo receipt: $88.00 subtotal, $7.26 tax, $15.84 tip
    let created = db
        .bills()
        .create(NewBill {
            organizer_phone: "+15550001111".to_string(),
            tax_amount_cents: 726,
            tip_amount_cents: 1584,
            items: vec![
                NewItem {
                    name: "Truffle Fries".to_string(),
                    price_cents: 1400,
                    quantity: 1,
                    source: ItemSource::Ocr,
                },
                NewItem {
                    name: "Margherita Pizza".to_string(),
                    price_cents: 2200,
                    quantity: 1,
                    source: ItemSource::Ocr,
                },
                NewItem {
                    name: "IPA Draft".to_string(),
                    price_cents: 2700,
                    quantity: 3,
                    source: ItemSource::Ocr,
                },
                NewItem {
                    name: "Tiramisu".to_string(),
                    price_cents: 2500,
                    quantity: 2,
                    source: ItemSource::Manual,
                },
            ],
            participants: vec![
                NewParticipant {
                    name: "Ana".to_string(),
                    phone_number: Some("+15550002222".to_string()),
                    plus_one_count: 0,
                },
                NewParticipant {
                    name: "Ben".to_string(),
                    phone_number: None,
                    plus_one_count: 1,
                },
                NewParticipant {
                    name: "Cleo".to_string(),
                    phone_number: None,
                    plus_one_count: 0,
                },
                NewParticipant {
                    name: "Dev".to_string(),
                    phone_number: None,
                    plus_one_count: 0,
                },
            ],
        })
        .await?;

    println!("✓ Created bill {}", created.bill.bill_code);
    println!("  Join code:   {}", created.bill.bill_code);
    println!("  Access code: {}", created.bill.organizer_access_code);
    println!();

    let item_id = |name: &str| {
        created
            .items
            .iter()
            .find(|i| i.name == name)
            .map(|i| i.id.clone())
            .unwrap_or_default()
    };
    let participant_id = |name: &str| {
        created
            .participants
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.id.clone())
            .unwrap_or_default()
    };

    let svc = db.claim_service();

    // Fries are shared by the whole table
    svc.submit(&SubmitClaimInput {
        item_id: item_id("Truffle Fries"),
        participant_id: participant_id("Ana"),
        share_type: Some(ShareType::SplitWithAll),
        share_with_participant_ids: None,
        quantity_claimed: None,
    })
    .await?;

    // Ben and his +1 split the pizza with Cleo
    svc.submit(&SubmitClaimInput {
        item_id: item_id("Margherita Pizza"),
        participant_id: participant_id("Ben"),
        share_type: Some(ShareType::SplitWithSpecific),
        share_with_participant_ids: Some(vec![participant_id("Cleo")]),
        quantity_claimed: None,
    })
    .await?;

    // Dev drank two of the three beers, Ana had the third
    svc.submit(&SubmitClaimInput {
        item_id: item_id("IPA Draft"),
        participant_id: participant_id("Dev"),
        share_type: Some(ShareType::Solo),
        share_with_participant_ids: None,
        quantity_claimed: Some(2.0),
    })
    .await?;
    svc.submit(&SubmitClaimInput {
        item_id: item_id("IPA Draft"),
        participant_id: participant_id("Ana"),
        share_type: Some(ShareType::Solo),
        share_with_participant_ids: None,
        quantity_claimed: Some(1.0),
    })
    .await?;

    println!("✓ Submitted demo claims (tiramisu left unclaimed)");
    println!();

    // Reload and print the settlement
    let aggregate = db
        .bills()
        .get_aggregate(BillSelector::Id(created.bill.id.clone()))
        .await?;

    let splits = calculate_splits(
        &aggregate.items,
        &aggregate.participants,
        &aggregate.claims,
        aggregate.bill.tax_amount(),
        aggregate.bill.tip_amount(),
    );

    println!("Settlement");
    println!("----------");
    let mut total = Money::zero();
    for participant in &aggregate.participants {
        let owed = splits.get(&participant.id).copied().unwrap_or_default();
        total += owed;
        println!(
            "  {:<8} {:>10}   (responded: {})",
            participant.name,
            owed.to_string(),
            participant.has_responded
        );
    }
    println!("  {:<8} {:>10}", "total", total.to_string());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
