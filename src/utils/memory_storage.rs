//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::query::*;
use crate::traits::*;
use crate::types::*;

#[derive(Debug, Default)]
struct Tables {
    facilities: HashMap<Uuid, Facility>,
    units: HashMap<Uuid, StorageUnit>,
    customers: HashMap<Uuid, Customer>,
    rentals: HashMap<Uuid, Rental>,
    payments: HashMap<Uuid, Payment>,
    /// Record IDs whose writes are rejected
    failing: HashSet<Uuid>,
}

/// In-memory storage implementation for testing and development
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> PortalResult<()> {
        *self.write()? = Tables::default();
        Ok(())
    }

    /// Make every subsequent write to the record with `id` fail, to exercise
    /// partial-failure handling
    pub fn inject_failure(&self, id: Uuid) -> PortalResult<()> {
        self.write()?.failing.insert(id);
        Ok(())
    }

    /// Number of stored payments
    pub fn payment_count(&self) -> PortalResult<usize> {
        Ok(self.read()?.payments.len())
    }

    fn read(&self) -> PortalResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| PortalError::Storage(format!("memory storage lock poisoned: {e}")))
    }

    fn write(&self) -> PortalResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| PortalError::Storage(format!("memory storage lock poisoned: {e}")))
    }

    /// Write guard that refuses records marked with [`Self::inject_failure`]
    fn write_record(&self, id: Uuid) -> PortalResult<RwLockWriteGuard<'_, Tables>> {
        let guard = self.write()?;
        if guard.failing.contains(&id) {
            return Err(PortalError::Storage(format!("write rejected for record {id}")));
        }
        Ok(guard)
    }
}

fn apply_limit<T>(mut rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

fn replace<T: Clone>(
    table: &mut HashMap<Uuid, T>,
    id: Uuid,
    record: &T,
    entity: &'static str,
) -> PortalResult<()> {
    match table.get_mut(&id) {
        Some(existing) => {
            *existing = record.clone();
            Ok(())
        }
        None => Err(PortalError::not_found(entity, id)),
    }
}

fn remove<T>(table: &mut HashMap<Uuid, T>, id: Uuid, entity: &'static str) -> PortalResult<()> {
    table
        .remove(&id)
        .map(|_| ())
        .ok_or_else(|| PortalError::not_found(entity, id))
}

#[async_trait]
impl PortalStorage for MemoryStorage {
    async fn save_facility(&mut self, facility: &Facility) -> PortalResult<()> {
        self.write_record(facility.id)?
            .facilities
            .insert(facility.id, facility.clone());
        Ok(())
    }

    async fn list_facilities(&self) -> PortalResult<Vec<Facility>> {
        let mut facilities: Vec<Facility> = self.read()?.facilities.values().cloned().collect();
        facilities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(facilities)
    }

    async fn save_unit(&mut self, unit: &StorageUnit) -> PortalResult<()> {
        self.write_record(unit.id)?.units.insert(unit.id, unit.clone());
        Ok(())
    }

    async fn get_unit(&self, unit_id: Uuid) -> PortalResult<Option<StorageUnit>> {
        Ok(self.read()?.units.get(&unit_id).cloned())
    }

    async fn list_units(&self, query: &UnitQuery) -> PortalResult<Vec<StorageUnit>> {
        let mut units: Vec<StorageUnit> = self
            .read()?
            .units
            .values()
            .filter(|unit| query.matches(unit))
            .cloned()
            .collect();
        units.sort_by(|a, b| a.unit_number.cmp(&b.unit_number));
        Ok(units)
    }

    async fn update_unit(&mut self, unit: &StorageUnit) -> PortalResult<()> {
        replace(&mut self.write_record(unit.id)?.units, unit.id, unit, "Unit")
    }

    async fn delete_unit(&mut self, unit_id: Uuid) -> PortalResult<()> {
        remove(&mut self.write_record(unit_id)?.units, unit_id, "Unit")
    }

    async fn save_customer(&mut self, customer: &Customer) -> PortalResult<()> {
        self.write_record(customer.id)?
            .customers
            .insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, customer_id: Uuid) -> PortalResult<Option<Customer>> {
        Ok(self.read()?.customers.get(&customer_id).cloned())
    }

    async fn list_customers(&self, query: &CustomerQuery) -> PortalResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = self
            .read()?
            .customers
            .values()
            .filter(|customer| query.matches(customer))
            .cloned()
            .collect();
        customers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(customers)
    }

    async fn update_customer(&mut self, customer: &Customer) -> PortalResult<()> {
        replace(
            &mut self.write_record(customer.id)?.customers,
            customer.id,
            customer,
            "Customer",
        )
    }

    async fn delete_customer(&mut self, customer_id: Uuid) -> PortalResult<()> {
        remove(
            &mut self.write_record(customer_id)?.customers,
            customer_id,
            "Customer",
        )
    }

    async fn save_rental(&mut self, rental: &Rental) -> PortalResult<()> {
        self.write_record(rental.id)?
            .rentals
            .insert(rental.id, rental.clone());
        Ok(())
    }

    async fn get_rental(&self, rental_id: Uuid) -> PortalResult<Option<Rental>> {
        Ok(self.read()?.rentals.get(&rental_id).cloned())
    }

    async fn list_rentals(&self, query: &RentalQuery) -> PortalResult<Vec<Rental>> {
        let mut rentals: Vec<Rental> = self
            .read()?
            .rentals
            .values()
            .filter(|rental| query.matches(rental))
            .cloned()
            .collect();
        rentals.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        if query.created_order == Some(SortOrder::Descending) {
            rentals.reverse();
        }
        Ok(apply_limit(rentals, query.limit))
    }

    async fn update_rental(&mut self, rental: &Rental) -> PortalResult<()> {
        replace(
            &mut self.write_record(rental.id)?.rentals,
            rental.id,
            rental,
            "Rental",
        )
    }

    async fn save_payment(&mut self, payment: &Payment) -> PortalResult<()> {
        self.write_record(payment.id)?
            .payments
            .insert(payment.id, payment.clone());
        Ok(())
    }

    async fn get_payment(&self, payment_id: Uuid) -> PortalResult<Option<Payment>> {
        Ok(self.read()?.payments.get(&payment_id).cloned())
    }

    async fn list_payments(&self, query: &PaymentQuery) -> PortalResult<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .read()?
            .payments
            .values()
            .filter(|payment| query.matches(payment))
            .cloned()
            .collect();

        match (query.date_order, query.created_order) {
            (Some(order), _) => {
                payments.sort_by(|a, b| {
                    a.payment_date
                        .cmp(&b.payment_date)
                        .then(a.created_at.cmp(&b.created_at))
                        .then(a.id.cmp(&b.id))
                });
                if order == SortOrder::Descending {
                    payments.reverse();
                }
            }
            (None, Some(order)) => {
                payments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                if order == SortOrder::Descending {
                    payments.reverse();
                }
            }
            (None, None) => {
                payments.sort_by(|a, b| a.payment_date.cmp(&b.payment_date).then(a.id.cmp(&b.id)));
            }
        }

        Ok(apply_limit(payments, query.limit))
    }

    async fn update_payment(&mut self, payment: &Payment) -> PortalResult<()> {
        replace(
            &mut self.write_record(payment.id)?.payments,
            payment.id,
            payment,
            "Payment",
        )
    }

    async fn delete_payment(&mut self, payment_id: Uuid) -> PortalResult<()> {
        remove(
            &mut self.write_record(payment_id)?.payments,
            payment_id,
            "Payment",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_clones_share_tables() {
        let mut storage = MemoryStorage::new();
        let other = storage.clone();
        let unit = StorageUnit::new("A-1".to_string(), SizeCategory::Small, BigDecimal::from(50));

        storage.save_unit(&unit).await.unwrap();

        assert_eq!(other.get_unit(unit.id).await.unwrap(), Some(unit));
    }

    #[tokio::test]
    async fn test_injected_failure_rejects_writes() {
        let mut storage = MemoryStorage::new();
        let unit = StorageUnit::new("A-1".to_string(), SizeCategory::Small, BigDecimal::from(50));
        storage.save_unit(&unit).await.unwrap();
        storage.inject_failure(unit.id).unwrap();

        let result = storage.update_unit(&unit).await;

        assert!(matches!(result, Err(PortalError::Storage(_))));
        assert!(storage.get_unit(unit.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_payments_ordered_newest_first_with_limit() {
        let mut storage = MemoryStorage::new();
        let rental_id = Uuid::new_v4();
        for day in [3, 17, 9] {
            let payment = Payment::rent(
                rental_id,
                BigDecimal::from(75),
                NaiveDate::from_ymd_opt(2026, 5, day).unwrap(),
            );
            storage.save_payment(&payment).await.unwrap();
        }

        let query = PaymentQuery {
            date_order: Some(SortOrder::Descending),
            limit: Some(2),
            ..PaymentQuery::default()
        };
        let payments = storage.list_payments(&query).await.unwrap();

        let days: Vec<_> = payments.iter().map(|p| p.payment_date).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2026, 5, 17).unwrap(),
                NaiveDate::from_ymd_opt(2026, 5, 9).unwrap(),
            ]
        );
    }
}
