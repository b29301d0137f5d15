//! Utility modules

pub mod memory_storage;
pub mod static_auth;
pub mod validation;

pub use memory_storage::*;
pub use static_auth::*;
pub use validation::*;
