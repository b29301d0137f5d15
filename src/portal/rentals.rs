//! Rental agreements: assigning units and terminating rentals

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::query::*;
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

/// Parameters for assigning a unit to a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitAssignment {
    pub unit_id: Uuid,
    pub start_date: NaiveDate,
    pub lease_status: Option<LeaseStatus>,
}

/// Result of terminating a rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationOutcome {
    pub rental: Rental,
    /// Whether the unit went back to available
    pub unit_freed: bool,
    pub refresh: Vec<View>,
}

/// Result of deleting a record together with its active rentals
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CascadeOutcome {
    pub terminated_rentals: usize,
    /// Non-fatal failures on dependent records
    pub warnings: Vec<String>,
    pub refresh: Vec<View>,
}

/// Rental manager for assigning and terminating rentals
pub struct RentalManager<S: PortalStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
}

impl<S: PortalStorage> RentalManager<S> {
    /// Create a new rental manager
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Get a rental by ID
    pub async fn get_rental(&self, rental_id: Uuid) -> PortalResult<Option<Rental>> {
        self.storage.get_rental(rental_id).await
    }

    /// Get a rental by ID, returning an error if not found
    pub async fn get_rental_required(&self, rental_id: Uuid) -> PortalResult<Rental> {
        self.storage
            .get_rental(rental_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Rental", rental_id))
    }

    /// List rentals matching a query
    pub async fn list_rentals(&self, query: &RentalQuery) -> PortalResult<Vec<Rental>> {
        self.storage.list_rentals(query).await
    }

    /// Start an active rental of an available unit at the unit's current
    /// rate and mark the unit occupied
    pub async fn assign_unit(
        &mut self,
        session: &AdminSession,
        customer_id: Uuid,
        assignment: UnitAssignment,
    ) -> PortalResult<Rental> {
        if self.storage.get_customer(customer_id).await?.is_none() {
            return Err(PortalError::not_found("Customer", customer_id));
        }

        let mut unit = self
            .storage
            .get_unit(assignment.unit_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Unit", assignment.unit_id))?;

        if unit.status != UnitStatus::Available {
            return Err(PortalError::Conflict(format!(
                "Unit {} is not available",
                unit.unit_number
            )));
        }

        let mut rental = Rental::new(
            customer_id,
            unit.id,
            unit.monthly_rate.clone(),
            assignment.start_date,
        );
        rental.lease_status = assignment.lease_status;
        self.storage.save_rental(&rental).await?;

        unit.set_status(UnitStatus::Occupied);
        self.storage.update_unit(&unit).await?;

        info!(
            rental_id = %rental.id,
            customer_id = %customer_id,
            unit_number = %unit.unit_number,
            admin = %session.user().email,
            "Assigned unit to customer"
        );

        Ok(rental)
    }

    /// Terminate a rental as of today. The unit is freed only when no other
    /// active rental holds it; failing to free it aborts the operation.
    pub async fn terminate_rental(
        &mut self,
        session: &AdminSession,
        rental_id: Uuid,
    ) -> PortalResult<TerminationOutcome> {
        let mut rental = self.get_rental_required(rental_id).await?;
        if !rental.is_active() {
            return Err(PortalError::Conflict(format!(
                "Rental {rental_id} is already terminated"
            )));
        }

        rental.terminate(self.clock.today());
        self.storage.update_rental(&rental).await?;

        let others = self
            .storage
            .list_rentals(&RentalQuery::active().for_unit(rental.unit_id).excluding(rental.id))
            .await?;

        let unit_freed = if others.is_empty() {
            match self.storage.get_unit(rental.unit_id).await? {
                Some(mut unit) => {
                    unit.set_status(UnitStatus::Available);
                    self.storage.update_unit(&unit).await?;
                    true
                }
                None => {
                    warn!(rental_id = %rental.id, unit_id = %rental.unit_id, "Rental references a missing unit");
                    false
                }
            }
        } else {
            false
        };

        info!(
            rental_id = %rental.id,
            unit_freed,
            admin = %session.user().email,
            "Terminated rental"
        );

        Ok(TerminationOutcome {
            rental,
            unit_freed,
            refresh: vec![View::Customers, View::Units, View::Dashboard],
        })
    }
}

/// Terminate each rental as of `today`, optionally freeing its unit.
/// Failures are logged and collected as warnings rather than returned.
pub(crate) async fn terminate_all<S: PortalStorage>(
    storage: &mut S,
    rentals: Vec<Rental>,
    today: NaiveDate,
    free_units: bool,
) -> CascadeOutcome {
    let mut outcome = CascadeOutcome::default();

    for mut rental in rentals {
        if free_units {
            if let Err(e) = free_unit(storage, rental.unit_id).await {
                warn!(unit_id = %rental.unit_id, error = %e, "Failed to free unit");
                outcome
                    .warnings
                    .push(format!("Failed to update unit {}: {e}", rental.unit_id));
            }
        }

        rental.terminate(today);
        match storage.update_rental(&rental).await {
            Ok(()) => outcome.terminated_rentals += 1,
            Err(e) => {
                warn!(rental_id = %rental.id, error = %e, "Failed to terminate rental");
                outcome
                    .warnings
                    .push(format!("Failed to terminate rental {}: {e}", rental.id));
            }
        }
    }

    outcome
}

async fn free_unit<S: PortalStorage>(storage: &mut S, unit_id: Uuid) -> PortalResult<()> {
    let mut unit = storage
        .get_unit(unit_id)
        .await?
        .ok_or_else(|| PortalError::not_found("Unit", unit_id))?;
    unit.set_status(UnitStatus::Available);
    storage.update_unit(&unit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FixedClock;
    use crate::utils::{MemoryStorage, StaticAuthProvider};
    use bigdecimal::BigDecimal;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    async fn seeded() -> (MemoryStorage, Customer, StorageUnit, AdminSession) {
        let mut storage = MemoryStorage::new();
        let customer = Customer::new(
            "Lena".to_string(),
            "Park".to_string(),
            "lena@example.com".to_string(),
            None,
        );
        let unit = StorageUnit::new("D-4".to_string(), SizeCategory::Large, BigDecimal::from(180));
        storage.save_customer(&customer).await.unwrap();
        storage.save_unit(&unit).await.unwrap();
        let auth = StaticAuthProvider::signed_in("admin", "admin@example.com");
        let session = AdminSession::establish(&auth).await.unwrap();
        (storage, customer, unit, session)
    }

    #[tokio::test]
    async fn test_assign_then_terminate_frees_unit() {
        let (storage, customer, unit, session) = seeded().await;
        let mut manager = RentalManager::new(storage.clone(), Arc::new(FixedClock(today())));

        let rental = manager
            .assign_unit(
                &session,
                customer.id,
                UnitAssignment {
                    unit_id: unit.id,
                    start_date: today(),
                    lease_status: Some(LeaseStatus::Sent),
                },
            )
            .await
            .unwrap();
        assert_eq!(rental.monthly_rate, BigDecimal::from(180));
        assert_eq!(
            storage.get_unit(unit.id).await.unwrap().unwrap().status,
            UnitStatus::Occupied
        );

        let outcome = manager.terminate_rental(&session, rental.id).await.unwrap();

        assert!(outcome.unit_freed);
        assert_eq!(outcome.rental.end_date, Some(today()));
        assert_eq!(
            storage.get_unit(unit.id).await.unwrap().unwrap().status,
            UnitStatus::Available
        );
    }

    #[tokio::test]
    async fn test_assigning_occupied_unit_conflicts() {
        let (mut storage, customer, mut unit, session) = seeded().await;
        unit.status = UnitStatus::Occupied;
        storage.update_unit(&unit).await.unwrap();
        let mut manager = RentalManager::new(storage, Arc::new(FixedClock(today())));

        let result = manager
            .assign_unit(
                &session,
                customer.id,
                UnitAssignment {
                    unit_id: unit.id,
                    start_date: today(),
                    lease_status: None,
                },
            )
            .await;

        assert!(matches!(result, Err(PortalError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_unit_stays_occupied_with_other_active_rental() {
        let (mut storage, customer, unit, session) = seeded().await;
        let first = Rental::new(customer.id, unit.id, BigDecimal::from(180), today());
        let second = Rental::new(customer.id, unit.id, BigDecimal::from(180), today());
        storage.save_rental(&first).await.unwrap();
        storage.save_rental(&second).await.unwrap();
        let mut manager = RentalManager::new(storage, Arc::new(FixedClock(today())));

        let outcome = manager.terminate_rental(&session, first.id).await.unwrap();

        assert!(!outcome.unit_freed);
        assert!(matches!(
            manager.terminate_rental(&session, first.id).await,
            Err(PortalError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_failure_to_free_unit_aborts_termination() {
        let (mut storage, customer, unit, session) = seeded().await;
        let rental = Rental::new(customer.id, unit.id, BigDecimal::from(180), today());
        storage.save_rental(&rental).await.unwrap();
        storage.inject_failure(unit.id).unwrap();
        let mut manager = RentalManager::new(storage, Arc::new(FixedClock(today())));

        let result = manager.terminate_rental(&session, rental.id).await;

        assert!(matches!(result, Err(PortalError::Storage(_))));
    }
}
