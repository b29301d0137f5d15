//! Payment reconciliation for rentals
//!
//! Derives a per-rental, per-month payment state (paid, missed, pending or
//! future) from the sparse set of rent payment rows, and applies the
//! mark-paid and mark-missed transitions. At most one rent row exists per
//! rental and month; the transitions delete any duplicates they find.

pub mod calendar;
pub mod engine;
pub mod status;

pub use calendar::*;
pub use engine::*;
pub use status::*;
