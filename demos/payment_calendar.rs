//! Payment calendar walkthrough with in-memory storage

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::path::Path;
use storage_rental_core::utils::{MemoryStorage, StaticAuthProvider};
use storage_rental_core::{
    AdminSession, MonthKey, NewCustomer, Portal, PortalConfig, SizeCategory, StorageUnit,
    UnitAssignment,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = PortalConfig::load(Some(Path::new("portal.toml")))?;
    let mut portal = Portal::new(MemoryStorage::new(), config);
    let auth = StaticAuthProvider::signed_in("demo-admin", "admin@example.com");
    let session = AdminSession::establish(&auth).await?;

    println!("Storage Rental Core - Payment Calendar Example\n");

    // 1. Stock a few units
    let mut units = Vec::new();
    for (number, size, rate) in [
        ("101", SizeCategory::Small, 55),
        ("102", SizeCategory::Medium, 85),
        ("201", SizeCategory::Large, 140),
    ] {
        let unit = portal
            .create_unit(
                &session,
                StorageUnit::new(number.to_string(), size, BigDecimal::from(rate)),
            )
            .await?;
        println!("  Created unit {} at {}/month", unit.unit_number, unit.monthly_rate);
        units.push(unit);
    }
    println!();

    // 2. Rent two of them
    let start = NaiveDate::from_ymd_opt(2026, 1, 1).ok_or("invalid start date")?;
    let mut rentals = Vec::new();
    for ((first, last), unit) in [("Maya", "Ortiz"), ("Tom", "Becker")].into_iter().zip(&units) {
        let created = portal
            .create_customer(
                &session,
                NewCustomer {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: format!("{}@example.com", first.to_lowercase()),
                    phone: None,
                },
                Some(UnitAssignment {
                    unit_id: unit.id,
                    start_date: start,
                    lease_status: None,
                }),
            )
            .await?;
        if let Some(rental) = created.rental {
            println!("  {} rents unit {}", created.customer.full_name(), unit.unit_number);
            rentals.push(rental);
        }
    }
    println!();

    // 3. Reconcile: this month paid for the first rental, last month missed
    // for the second
    let today = chrono::Utc::now().date_naive();
    let this_month = MonthKey::from_date(today);
    if let Some(rental) = rentals.first() {
        portal.mark_paid(&session, rental.id, this_month).await?;
    }
    if let Some(rental) = rentals.get(1) {
        portal
            .mark_missed(&session, rental.id, this_month.previous())
            .await?;
    }

    // 4. Print the calendar
    let calendar = portal.current_payment_calendar(&session).await?;
    print!("{:<8}{:<16}", "Unit", "Customer");
    for month in &calendar.months {
        print!("{:<10}", month.to_string());
    }
    println!();
    for row in &calendar.rows {
        print!("{:<8}{:<16}", row.unit_number, row.customer_name);
        for cell in &row.cells {
            let marker = if cell.overdue { "!" } else { "" };
            print!("{:<10}", format!("{}{}", cell.status.as_str(), marker));
        }
        println!();
    }
    println!();

    // 5. Dashboard
    let stats = portal.dashboard_stats(&session).await?;
    println!(
        "Occupancy {}% ({:?}), {} customers, revenue this month {}",
        stats.occupancy_rate, stats.occupancy_tier, stats.total_customers, stats.monthly_revenue
    );

    session.sign_out(&auth).await?;
    Ok(())
}
