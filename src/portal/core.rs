//! Main portal orchestrator that coordinates units, customers, rentals and payments

use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::portal::{
    CascadeOutcome, CustomerDetails, CustomerManager, Dashboard, DashboardStats, NewCustomer,
    NewPayment, OccupancyBreakdown, PaymentListing, PaymentManager, PaymentsSummary,
    RentalManager, TerminationOutcome, UnitAssignment, UnitManager, UnitOverview,
};
use crate::portal::dashboard::ActivityItem;
use crate::query::*;
use crate::reconciliation::{
    CalendarWindow, PaymentCalendar, PaymentStatus, ReconciliationEngine, TransitionOutcome,
};
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

/// A customer created together with an optional first rental
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerCreation {
    pub customer: Customer,
    pub rental: Option<Rental>,
}

/// Main portal that orchestrates all admin operations
pub struct Portal<S: PortalStorage> {
    unit_manager: UnitManager<S>,
    customer_manager: CustomerManager<S>,
    rental_manager: RentalManager<S>,
    payment_manager: PaymentManager<S>,
    dashboard: Dashboard<S>,
    reconciliation: ReconciliationEngine<S>,
    config: PortalConfig,
}

impl<S: PortalStorage + Clone> Portal<S> {
    /// Create a new portal with the given storage backend and configuration
    pub fn new(storage: S, config: PortalConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    /// Create a new portal reading today's date from `clock`
    pub fn with_clock(storage: S, config: PortalConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_validator(storage, config, clock, Arc::new(DefaultRecordValidator))
    }

    /// Create a new portal with a custom record validator
    pub fn with_validator(
        storage: S,
        config: PortalConfig,
        clock: Arc<dyn Clock>,
        validator: Arc<dyn RecordValidator>,
    ) -> Self {
        Self {
            unit_manager: UnitManager::with_validator(
                storage.clone(),
                validator.clone(),
                clock.clone(),
            ),
            customer_manager: CustomerManager::with_validator(
                storage.clone(),
                validator.clone(),
                clock.clone(),
            ),
            rental_manager: RentalManager::new(storage.clone(), clock.clone()),
            payment_manager: PaymentManager::with_validator(storage.clone(), validator),
            dashboard: Dashboard::new(storage.clone(), clock.clone(), config.clone()),
            reconciliation: ReconciliationEngine::with_clock(storage, config.clone(), clock),
            config,
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    // Unit operations
    /// Register a facility
    pub async fn add_facility(&mut self, session: &AdminSession, name: String) -> PortalResult<Facility> {
        self.unit_manager.add_facility(session, name).await
    }

    /// List all facilities
    pub async fn list_facilities(&self, _session: &AdminSession) -> PortalResult<Vec<Facility>> {
        self.unit_manager.list_facilities().await
    }

    /// Create a new unit
    pub async fn create_unit(
        &mut self,
        session: &AdminSession,
        unit: StorageUnit,
    ) -> PortalResult<StorageUnit> {
        self.unit_manager.create_unit(session, unit).await
    }

    /// Get a unit by ID
    pub async fn get_unit(
        &self,
        _session: &AdminSession,
        unit_id: Uuid,
    ) -> PortalResult<Option<StorageUnit>> {
        self.unit_manager.get_unit(unit_id).await
    }

    /// List units, optionally by status
    pub async fn list_units(
        &self,
        _session: &AdminSession,
        status: Option<UnitStatus>,
    ) -> PortalResult<Vec<StorageUnit>> {
        self.unit_manager
            .list_units(&UnitQuery {
                status,
                ..UnitQuery::default()
            })
            .await
    }

    /// Update a unit
    pub async fn update_unit(&mut self, session: &AdminSession, unit: &StorageUnit) -> PortalResult<()> {
        self.unit_manager.update_unit(session, unit).await
    }

    /// Units in numeric order with their occupants
    pub async fn units_overview(&self, session: &AdminSession) -> PortalResult<Vec<UnitOverview>> {
        self.unit_manager.units_overview(session).await
    }

    /// Delete a unit and terminate its active rentals
    pub async fn delete_unit(
        &mut self,
        session: &AdminSession,
        unit_id: Uuid,
    ) -> PortalResult<CascadeOutcome> {
        self.unit_manager.delete_unit(session, unit_id).await
    }

    // Customer operations
    /// Create a customer, optionally assigning a unit in the same step.
    ///
    /// The customer is kept when the assignment fails; the error is
    /// returned so the caller can retry the assignment on its own.
    pub async fn create_customer(
        &mut self,
        session: &AdminSession,
        new_customer: NewCustomer,
        assignment: Option<UnitAssignment>,
    ) -> PortalResult<CustomerCreation> {
        let customer = self
            .customer_manager
            .create_customer(session, new_customer)
            .await?;

        let rental = match assignment {
            Some(assignment) => {
                let rental = self
                    .rental_manager
                    .assign_unit(session, customer.id, assignment)
                    .await
                    .inspect_err(|e| {
                        warn!(customer_id = %customer.id, error = %e, "Customer created but unit assignment failed");
                    })?;
                Some(rental)
            }
            None => None,
        };

        Ok(CustomerCreation { customer, rental })
    }

    /// Get a customer by ID
    pub async fn get_customer(
        &self,
        _session: &AdminSession,
        customer_id: Uuid,
    ) -> PortalResult<Option<Customer>> {
        self.customer_manager.get_customer(customer_id).await
    }

    /// Update a customer
    pub async fn update_customer(
        &mut self,
        session: &AdminSession,
        customer: &Customer,
    ) -> PortalResult<()> {
        self.customer_manager.update_customer(session, customer).await
    }

    /// Search customers by name or email
    pub async fn search_customers(
        &self,
        session: &AdminSession,
        pattern: &str,
    ) -> PortalResult<Vec<Customer>> {
        self.customer_manager.search_customers(session, pattern).await
    }

    /// Customers ordered by the lowest unit number they rent
    pub async fn customers_overview(
        &self,
        session: &AdminSession,
    ) -> PortalResult<Vec<CustomerDetails>> {
        self.customer_manager.customers_overview(session).await
    }

    /// One customer with their rentals
    pub async fn customer_details(
        &self,
        session: &AdminSession,
        customer_id: Uuid,
    ) -> PortalResult<CustomerDetails> {
        self.customer_manager
            .customer_details(session, customer_id)
            .await
    }

    /// Delete a customer, terminating their rentals
    pub async fn delete_customer(
        &mut self,
        session: &AdminSession,
        customer_id: Uuid,
    ) -> PortalResult<CascadeOutcome> {
        self.customer_manager
            .delete_customer(session, customer_id)
            .await
    }

    // Rental operations
    /// Assign an available unit to an existing customer
    pub async fn assign_unit(
        &mut self,
        session: &AdminSession,
        customer_id: Uuid,
        assignment: UnitAssignment,
    ) -> PortalResult<Rental> {
        self.rental_manager
            .assign_unit(session, customer_id, assignment)
            .await
    }

    /// Terminate a rental
    pub async fn terminate_rental(
        &mut self,
        session: &AdminSession,
        rental_id: Uuid,
    ) -> PortalResult<TerminationOutcome> {
        self.rental_manager.terminate_rental(session, rental_id).await
    }

    /// Get a rental by ID
    pub async fn get_rental(
        &self,
        _session: &AdminSession,
        rental_id: Uuid,
    ) -> PortalResult<Option<Rental>> {
        self.rental_manager.get_rental(rental_id).await
    }

    /// Active rentals, e.g. for the payment form's rental picker
    pub async fn active_rentals(&self, _session: &AdminSession) -> PortalResult<Vec<Rental>> {
        self.rental_manager.list_rentals(&RentalQuery::active()).await
    }

    // Payment operations
    /// Record a payment from the payment form
    pub async fn record_payment(
        &mut self,
        session: &AdminSession,
        new_payment: NewPayment,
    ) -> PortalResult<Payment> {
        self.payment_manager.record_payment(session, new_payment).await
    }

    /// Most recent payments, up to the configured limit
    pub async fn recent_payments(&self, session: &AdminSession) -> PortalResult<Vec<PaymentListing>> {
        self.payment_manager
            .recent_payments(session, self.config.recent_payments_limit)
            .await
    }

    /// All payments for a rental
    pub async fn payments_for_rental(
        &self,
        session: &AdminSession,
        rental_id: Uuid,
    ) -> PortalResult<Vec<Payment>> {
        self.payment_manager
            .payments_for_rental(session, rental_id)
            .await
    }

    // Reconciliation operations
    /// Payment status of a rental for a month
    pub async fn payment_status(
        &self,
        session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
    ) -> PortalResult<PaymentStatus> {
        self.reconciliation
            .payment_status(session, rental_id, month)
            .await
    }

    /// Mark a month paid at the rental's monthly rate
    pub async fn mark_paid(
        &mut self,
        session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
    ) -> PortalResult<TransitionOutcome> {
        let rental = self.rental_manager.get_rental_required(rental_id).await?;
        self.mark_paid_amount(session, rental.id, month, rental.monthly_rate)
            .await
    }

    /// Mark a month paid with an explicit amount
    pub async fn mark_paid_amount(
        &mut self,
        session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
        amount: BigDecimal,
    ) -> PortalResult<TransitionOutcome> {
        self.reconciliation
            .mark_paid(session, rental_id, month, amount)
            .await
    }

    /// Mark a month missed
    pub async fn mark_missed(
        &mut self,
        session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
    ) -> PortalResult<TransitionOutcome> {
        self.reconciliation
            .mark_missed(session, rental_id, month)
            .await
    }

    /// Payment calendar over `window`
    pub async fn payment_calendar(
        &self,
        session: &AdminSession,
        window: CalendarWindow,
    ) -> PortalResult<PaymentCalendar> {
        self.reconciliation.calendar(session, window).await
    }

    /// Payment calendar ending at the current month
    pub async fn current_payment_calendar(
        &self,
        session: &AdminSession,
    ) -> PortalResult<PaymentCalendar> {
        self.reconciliation.current_calendar(session).await
    }

    // Dashboard operations
    /// Dashboard headline numbers
    pub async fn dashboard_stats(&self, session: &AdminSession) -> PortalResult<DashboardStats> {
        self.dashboard.stats(session).await
    }

    /// Payments page summary
    pub async fn payments_summary(&self, session: &AdminSession) -> PortalResult<PaymentsSummary> {
        self.dashboard.payments_summary(session).await
    }

    /// Unit counts by status
    pub async fn occupancy(&self, session: &AdminSession) -> PortalResult<OccupancyBreakdown> {
        self.dashboard.occupancy(session).await
    }

    /// Recent payments and rentals
    pub async fn recent_activity(&self, session: &AdminSession) -> PortalResult<Vec<ActivityItem>> {
        self.dashboard.recent_activity(session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryStorage, StaticAuthProvider};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_portal_basic_operations() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let storage = MemoryStorage::new();
        let mut portal =
            Portal::with_clock(storage, PortalConfig::default(), Arc::new(FixedClock(today)));
        let auth = StaticAuthProvider::signed_in("admin", "admin@example.com");
        let session = AdminSession::establish(&auth).await.unwrap();

        let unit = portal
            .create_unit(
                &session,
                StorageUnit::new("A-1".to_string(), SizeCategory::Small, BigDecimal::from(65)),
            )
            .await
            .unwrap();

        let created = portal
            .create_customer(
                &session,
                NewCustomer {
                    first_name: "Omar".to_string(),
                    last_name: "Haddad".to_string(),
                    email: "omar@example.com".to_string(),
                    phone: None,
                },
                Some(UnitAssignment {
                    unit_id: unit.id,
                    start_date: today,
                    lease_status: Some(LeaseStatus::Signed),
                }),
            )
            .await
            .unwrap();
        let rental = created.rental.unwrap();

        let outcome = portal
            .mark_paid(&session, rental.id, MonthKey::from_date(today))
            .await
            .unwrap();
        assert_eq!(outcome.payment.amount, BigDecimal::from(65));

        let stats = portal.dashboard_stats(&session).await.unwrap();
        assert_eq!(stats.total_units, 1);
        assert_eq!(stats.occupied_units, 1);
        assert_eq!(stats.occupancy_rate, 100);
        assert_eq!(stats.monthly_revenue, BigDecimal::from(65));
    }
}
