//! Admin portal operations over units, customers, rentals and payments

pub mod core;
pub mod customers;
pub mod dashboard;
pub mod payments;
pub mod rentals;
pub mod units;

pub use self::core::{CustomerCreation, Portal};
pub use customers::{CustomerDetails, CustomerManager, NewCustomer, RentalLine};
pub use dashboard::{
    ActivityItem, ActivityKind, Dashboard, DashboardStats, OccupancyBreakdown, OccupancyTier,
    PaymentsSummary,
};
pub use payments::{NewPayment, PaymentListing, PaymentManager};
pub use rentals::{CascadeOutcome, RentalManager, TerminationOutcome, UnitAssignment};
pub use units::{UnitManager, UnitOverview};
