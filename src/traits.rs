//! Traits for storage, authentication and clock abstraction

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::query::*;
use crate::session::{AdminSession, AdminUser};
use crate::types::*;

/// Storage abstraction for the portal
///
/// Table-scoped access to units, facilities, customers, rentals and
/// payments. Any relational backend (a hosted Postgres, SQLite, in-memory)
/// can sit behind it by translating the query objects into its own filter
/// language.
#[async_trait]
pub trait PortalStorage: Send + Sync {
    /// Save a facility
    async fn save_facility(&mut self, facility: &Facility) -> PortalResult<()>;

    /// List all facilities ordered by name
    async fn list_facilities(&self) -> PortalResult<Vec<Facility>>;

    /// Save a new storage unit
    async fn save_unit(&mut self, unit: &StorageUnit) -> PortalResult<()>;

    /// Get a unit by ID
    async fn get_unit(&self, unit_id: Uuid) -> PortalResult<Option<StorageUnit>>;

    /// List units matching the query, ordered by unit number
    async fn list_units(&self, query: &UnitQuery) -> PortalResult<Vec<StorageUnit>>;

    /// Update an existing unit
    async fn update_unit(&mut self, unit: &StorageUnit) -> PortalResult<()>;

    /// Delete a unit
    async fn delete_unit(&mut self, unit_id: Uuid) -> PortalResult<()>;

    /// Save a new customer
    async fn save_customer(&mut self, customer: &Customer) -> PortalResult<()>;

    /// Get a customer by ID
    async fn get_customer(&self, customer_id: Uuid) -> PortalResult<Option<Customer>>;

    /// List customers matching the query, ordered by last name
    async fn list_customers(&self, query: &CustomerQuery) -> PortalResult<Vec<Customer>>;

    /// Update an existing customer
    async fn update_customer(&mut self, customer: &Customer) -> PortalResult<()>;

    /// Delete a customer
    async fn delete_customer(&mut self, customer_id: Uuid) -> PortalResult<()>;

    /// Save a new rental
    async fn save_rental(&mut self, rental: &Rental) -> PortalResult<()>;

    /// Get a rental by ID
    async fn get_rental(&self, rental_id: Uuid) -> PortalResult<Option<Rental>>;

    /// List rentals matching the query
    async fn list_rentals(&self, query: &RentalQuery) -> PortalResult<Vec<Rental>>;

    /// Update an existing rental
    async fn update_rental(&mut self, rental: &Rental) -> PortalResult<()>;

    /// Save a new payment
    async fn save_payment(&mut self, payment: &Payment) -> PortalResult<()>;

    /// Get a payment by ID
    async fn get_payment(&self, payment_id: Uuid) -> PortalResult<Option<Payment>>;

    /// List payments matching the query
    async fn list_payments(&self, query: &PaymentQuery) -> PortalResult<Vec<Payment>>;

    /// Update an existing payment
    async fn update_payment(&mut self, payment: &Payment) -> PortalResult<()>;

    /// Delete a payment
    async fn delete_payment(&mut self, payment_id: Uuid) -> PortalResult<()>;
}

/// Authentication provider backing the admin session
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in user, if any
    async fn current_user(&self) -> PortalResult<Option<AdminUser>>;

    /// End the given session and invalidate its tokens
    async fn sign_out(&self, session: &AdminSession) -> PortalResult<()>;
}

/// Source of "today" for month arithmetic
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Clock reading the system time in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        chrono::Utc::now().date_naive()
    }
}

/// Clock pinned to a fixed date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Trait for implementing custom record validation rules
pub trait RecordValidator: Send + Sync {
    /// Validate a unit before saving
    fn validate_unit(&self, unit: &StorageUnit) -> PortalResult<()>;

    /// Validate a customer before saving
    fn validate_customer(&self, customer: &Customer) -> PortalResult<()>;

    /// Validate a payment recorded by an admin
    fn validate_payment(&self, payment: &Payment) -> PortalResult<()>;
}

/// Default validator with the rules every record must satisfy
pub struct DefaultRecordValidator;

impl RecordValidator for DefaultRecordValidator {
    fn validate_unit(&self, unit: &StorageUnit) -> PortalResult<()> {
        if unit.unit_number.trim().is_empty() {
            return Err(PortalError::Validation(
                "Unit number cannot be empty".to_string(),
            ));
        }

        if unit.monthly_rate <= BigDecimal::from(0) {
            return Err(PortalError::Validation(
                "Monthly rate must be positive".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_customer(&self, customer: &Customer) -> PortalResult<()> {
        if customer.first_name.trim().is_empty() || customer.last_name.trim().is_empty() {
            return Err(PortalError::Validation(
                "Customer first and last name are required".to_string(),
            ));
        }

        if customer.email.trim().is_empty() {
            return Err(PortalError::Validation(
                "Customer email is required".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_payment(&self, payment: &Payment) -> PortalResult<()> {
        if payment.amount <= BigDecimal::from(0) {
            return Err(PortalError::Validation(
                "Payment amount must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
