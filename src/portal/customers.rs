//! Customer management

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::portal::rentals::{terminate_all, CascadeOutcome};
use crate::query::*;
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

/// Parameters for creating a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A rental paired with the unit number it covers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalLine {
    pub rental: Rental,
    pub unit_number: String,
}

/// A customer with the rentals shown on the customers list and details page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub customer: Customer,
    /// Active rentals ordered by numeric unit number
    pub active_rentals: Vec<RentalLine>,
    /// Terminated rentals, newest start first
    pub inactive_rentals: Vec<RentalLine>,
    /// Sum of the active rentals' monthly rates
    pub total_monthly_rent: BigDecimal,
}

impl CustomerDetails {
    /// Lowest numeric unit number among active rentals
    fn lowest_unit_rank(&self) -> Option<u32> {
        self.active_rentals
            .iter()
            .map(|line| unit_number_rank(&line.unit_number))
            .min()
    }
}

/// Customer manager for handling customer operations
pub struct CustomerManager<S: PortalStorage> {
    storage: S,
    validator: Arc<dyn RecordValidator>,
    clock: Arc<dyn Clock>,
}

impl<S: PortalStorage> CustomerManager<S> {
    /// Create a new customer manager
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator), clock)
    }

    /// Create a new customer manager with custom validator
    pub fn with_validator(
        storage: S,
        validator: Arc<dyn RecordValidator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            validator,
            clock,
        }
    }

    /// Create a new customer
    pub async fn create_customer(
        &mut self,
        session: &AdminSession,
        new_customer: NewCustomer,
    ) -> PortalResult<Customer> {
        let customer = Customer::new(
            new_customer.first_name,
            new_customer.last_name,
            new_customer.email,
            new_customer.phone,
        );
        self.validator.validate_customer(&customer)?;

        self.storage.save_customer(&customer).await?;
        info!(customer_id = %customer.id, admin = %session.user().email, "Created customer");
        Ok(customer)
    }

    /// Get a customer by ID
    pub async fn get_customer(&self, customer_id: Uuid) -> PortalResult<Option<Customer>> {
        self.storage.get_customer(customer_id).await
    }

    /// Get a customer by ID, returning an error if not found
    pub async fn get_customer_required(&self, customer_id: Uuid) -> PortalResult<Customer> {
        self.storage
            .get_customer(customer_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Customer", customer_id))
    }

    /// Update a customer's contact details
    pub async fn update_customer(
        &mut self,
        _session: &AdminSession,
        customer: &Customer,
    ) -> PortalResult<()> {
        self.validator.validate_customer(customer)?;

        let mut customer = customer.clone();
        customer.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_customer(&customer).await
    }

    /// Customers whose name or email contains `pattern`, ignoring case
    pub async fn search_customers(
        &self,
        _session: &AdminSession,
        pattern: &str,
    ) -> PortalResult<Vec<Customer>> {
        self.storage
            .list_customers(&CustomerQuery::search(pattern))
            .await
    }

    /// Customer with active and past rentals
    pub async fn customer_details(
        &self,
        _session: &AdminSession,
        customer_id: Uuid,
    ) -> PortalResult<CustomerDetails> {
        let customer = self.get_customer_required(customer_id).await?;
        self.details_for(customer).await
    }

    /// Every customer with rentals, ordered by the lowest unit number they
    /// actively rent. Customers without active rentals come last, by last
    /// name.
    pub async fn customers_overview(
        &self,
        _session: &AdminSession,
    ) -> PortalResult<Vec<CustomerDetails>> {
        let customers = self.storage.list_customers(&CustomerQuery::default()).await?;

        let mut overview = Vec::with_capacity(customers.len());
        for customer in customers {
            overview.push(self.details_for(customer).await?);
        }

        overview.sort_by(|a, b| match (a.lowest_unit_rank(), b.lowest_unit_rank()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.customer.last_name.cmp(&b.customer.last_name),
        });
        Ok(overview)
    }

    async fn details_for(&self, customer: Customer) -> PortalResult<CustomerDetails> {
        let rentals = self
            .storage
            .list_rentals(&RentalQuery::default().for_customer(customer.id))
            .await?;

        let mut active_rentals = Vec::new();
        let mut inactive_rentals = Vec::new();
        for rental in rentals {
            let unit_number = self
                .storage
                .get_unit(rental.unit_id)
                .await?
                .map(|unit| unit.unit_number)
                .unwrap_or_default();
            let line = RentalLine {
                rental,
                unit_number,
            };
            if line.rental.is_active() {
                active_rentals.push(line);
            } else {
                inactive_rentals.push(line);
            }
        }

        active_rentals.sort_by_key(|line| unit_number_rank(&line.unit_number));
        inactive_rentals.sort_by(|a, b| b.rental.start_date.cmp(&a.rental.start_date));
        let total_monthly_rent: BigDecimal = active_rentals
            .iter()
            .map(|line| &line.rental.monthly_rate)
            .sum();

        Ok(CustomerDetails {
            customer,
            active_rentals,
            inactive_rentals,
            total_monthly_rent,
        })
    }

    /// Delete a customer after terminating their active rentals and freeing
    /// the units.
    ///
    /// Failures on individual rentals or units are reported as warnings;
    /// failing to delete the customer itself is an error.
    pub async fn delete_customer(
        &mut self,
        session: &AdminSession,
        customer_id: Uuid,
    ) -> PortalResult<CascadeOutcome> {
        let customer = self.get_customer_required(customer_id).await?;
        let active = self
            .storage
            .list_rentals(&RentalQuery::active().for_customer(customer.id))
            .await?;

        let mut outcome = terminate_all(&mut self.storage, active, self.clock.today(), true).await;
        self.storage.delete_customer(customer.id).await?;

        outcome.refresh = vec![View::Customers, View::Units, View::Dashboard];
        info!(
            customer = %customer.full_name(),
            terminated = outcome.terminated_rentals,
            warnings = outcome.warnings.len(),
            admin = %session.user().email,
            "Deleted customer"
        );
        Ok(outcome)
    }
}
