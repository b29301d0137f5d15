//! Storage unit management

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::portal::rentals::{terminate_all, CascadeOutcome};
use crate::query::*;
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

/// A unit with its current occupant, as shown on the units grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOverview {
    pub unit: StorageUnit,
    pub active_rental: Option<Rental>,
    pub occupant_name: Option<String>,
}

/// Unit manager for handling storage unit operations
pub struct UnitManager<S: PortalStorage> {
    pub(crate) storage: S,
    validator: Arc<dyn RecordValidator>,
    clock: Arc<dyn Clock>,
}

impl<S: PortalStorage> UnitManager<S> {
    /// Create a new unit manager
    pub fn new(storage: S, clock: Arc<dyn Clock>) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator), clock)
    }

    /// Create a new unit manager with custom validator
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

    /// Register a facility
    pub async fn add_facility(&mut self, _session: &AdminSession, name: String) -> PortalResult<Facility> {
        if name.trim().is_empty() {
            return Err(PortalError::Validation(
                "Facility name cannot be empty".to_string(),
            ));
        }
        let facility = Facility::new(name);
        self.storage.save_facility(&facility).await?;
        Ok(facility)
    }

    /// List all facilities
    pub async fn list_facilities(&self) -> PortalResult<Vec<Facility>> {
        self.storage.list_facilities().await
    }

    /// Create a new unit
    pub async fn create_unit(
        &mut self,
        session: &AdminSession,
        unit: StorageUnit,
    ) -> PortalResult<StorageUnit> {
        self.validator.validate_unit(&unit)?;

        let taken = self
            .storage
            .list_units(&UnitQuery {
                facility_id: unit.facility_id,
                ..UnitQuery::default()
            })
            .await?
            .into_iter()
            .any(|existing| existing.unit_number.eq_ignore_ascii_case(&unit.unit_number));
        if taken {
            return Err(PortalError::Conflict(format!(
                "Unit number '{}' already exists",
                unit.unit_number
            )));
        }

        self.storage.save_unit(&unit).await?;
        info!(unit_id = %unit.id, unit_number = %unit.unit_number, admin = %session.user().email, "Created unit");
        Ok(unit)
    }

    /// Get a unit by ID
    pub async fn get_unit(&self, unit_id: Uuid) -> PortalResult<Option<StorageUnit>> {
        self.storage.get_unit(unit_id).await
    }

    /// Get a unit by ID, returning an error if not found
    pub async fn get_unit_required(&self, unit_id: Uuid) -> PortalResult<StorageUnit> {
        self.storage
            .get_unit(unit_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Unit", unit_id))
    }

    /// List units matching a query
    pub async fn list_units(&self, query: &UnitQuery) -> PortalResult<Vec<StorageUnit>> {
        self.storage.list_units(query).await
    }

    /// Update a unit
    pub async fn update_unit(&mut self, _session: &AdminSession, unit: &StorageUnit) -> PortalResult<()> {
        self.validator.validate_unit(unit)?;

        let mut unit = unit.clone();
        unit.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_unit(&unit).await
    }

    /// All units ordered by the numeric part of their unit number, each with
    /// its active rental and occupant
    pub async fn units_overview(&self, _session: &AdminSession) -> PortalResult<Vec<UnitOverview>> {
        let mut units = self.storage.list_units(&UnitQuery::default()).await?;
        units.sort_by(|a, b| {
            a.rank()
                .cmp(&b.rank())
                .then_with(|| a.unit_number.cmp(&b.unit_number))
        });

        let mut overview = Vec::with_capacity(units.len());
        for unit in units {
            let active_rental = self
                .storage
                .list_rentals(&RentalQuery::active().for_unit(unit.id))
                .await?
                .into_iter()
                .next();
            let occupant_name = match &active_rental {
                Some(rental) => self
                    .storage
                    .get_customer(rental.customer_id)
                    .await?
                    .map(|c| c.full_name()),
                None => None,
            };
            overview.push(UnitOverview {
                unit,
                active_rental,
                occupant_name,
            });
        }
        Ok(overview)
    }

    /// Delete a unit after terminating its active rentals.
    ///
    /// Rental termination failures are reported as warnings; failing to
    /// delete the unit itself is an error.
    pub async fn delete_unit(
        &mut self,
        session: &AdminSession,
        unit_id: Uuid,
    ) -> PortalResult<CascadeOutcome> {
        let unit = self.get_unit_required(unit_id).await?;
        let active = self
            .storage
            .list_rentals(&RentalQuery::active().for_unit(unit.id))
            .await?;

        let mut outcome = terminate_all(&mut self.storage, active, self.clock.today(), false).await;
        self.storage.delete_unit(unit.id).await?;

        outcome.refresh = vec![View::Units, View::Dashboard];
        info!(
            unit_number = %unit.unit_number,
            terminated = outcome.terminated_rentals,
            warnings = outcome.warnings.len(),
            admin = %session.user().email,
            "Deleted unit"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryStorage, StaticAuthProvider};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    async fn manager() -> (UnitManager<MemoryStorage>, AdminSession) {
        let clock = Arc::new(FixedClock(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()));
        let auth = StaticAuthProvider::signed_in("admin", "admin@example.com");
        let session = AdminSession::establish(&auth).await.unwrap();
        (UnitManager::new(MemoryStorage::new(), clock), session)
    }

    #[tokio::test]
    async fn test_facility_name_required() {
        let (mut manager, session) = manager().await;

        assert!(manager.add_facility(&session, "  ".to_string()).await.is_err());
        manager
            .add_facility(&session, "Riverside".to_string())
            .await
            .unwrap();
        assert_eq!(manager.list_facilities().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unit_numbers_unique_per_facility() {
        let (mut manager, session) = manager().await;
        let north = manager.add_facility(&session, "North".to_string()).await.unwrap();
        let south = manager.add_facility(&session, "South".to_string()).await.unwrap();

        let mut unit = StorageUnit::new("1".to_string(), SizeCategory::Small, BigDecimal::from(40));
        unit.facility_id = Some(north.id);
        manager.create_unit(&session, unit).await.unwrap();

        let mut same_elsewhere =
            StorageUnit::new("1".to_string(), SizeCategory::Small, BigDecimal::from(40));
        same_elsewhere.facility_id = Some(south.id);
        assert!(manager.create_unit(&session, same_elsewhere).await.is_ok());

        let mut clash = StorageUnit::new("1".to_string(), SizeCategory::Small, BigDecimal::from(40));
        clash.facility_id = Some(north.id);
        assert!(matches!(
            manager.create_unit(&session, clash).await,
            Err(PortalError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_non_positive_rate() {
        let (mut manager, session) = manager().await;
        let mut unit = manager
            .create_unit(
                &session,
                StorageUnit::new("3".to_string(), SizeCategory::Medium, BigDecimal::from(70)),
            )
            .await
            .unwrap();

        unit.monthly_rate = BigDecimal::from(0);
        assert!(matches!(
            manager.update_unit(&session, &unit).await,
            Err(PortalError::Validation(_))
        ));
    }
}
