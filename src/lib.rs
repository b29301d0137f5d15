//! # Storage Rental Core
//!
//! Back office library for a self-storage rental business: units, customers,
//! rental agreements, payments and the monthly rent reconciliation behind
//! the payment calendar.
//!
//! ## Features
//!
//! - **Units and facilities**: unit inventory with availability tracking
//! - **Customers and rentals**: assigning units, terminating rentals, cascade deletes
//! - **Payments**: manually recorded payments and recent payment listings
//! - **Reconciliation**: per-month paid, missed, pending and future rent status
//!   with mark-paid and mark-missed transitions
//! - **Dashboard**: occupancy, revenue and recent activity aggregates
//! - **Storage abstraction**: trait-based storage with an in-memory backend
//!
//! ## Quick Start
//!
//! ```rust
//! use storage_rental_core::{Portal, PortalConfig};
//! use storage_rental_core::utils::{MemoryStorage, StaticAuthProvider};
//!
//! // let storage = MemoryStorage::new();
//! // let mut portal = Portal::new(storage, PortalConfig::default());
//! // let session = AdminSession::establish(&StaticAuthProvider::signed_in("id", "admin@example.com")).await?;
//! ```

pub mod config;
pub mod portal;
pub mod query;
pub mod reconciliation;
pub mod session;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::PortalConfig;
pub use portal::*;
pub use query::*;
pub use reconciliation::*;
pub use session::*;
pub use traits::*;
pub use types::*;
