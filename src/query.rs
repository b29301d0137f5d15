//! Typed query objects for the table-scoped storage API
//!
//! Each query mirrors the filter predicates a relational client offers
//! (equality, inequality, date ranges, case-insensitive pattern match),
//! together with ordering and an optional row limit. Storage backends may
//! translate them to SQL; [`crate::utils::MemoryStorage`] evaluates them
//! with the `matches` helpers below.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::*;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filter for storage units
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitQuery {
    pub status: Option<UnitStatus>,
    pub facility_id: Option<Uuid>,
}

impl UnitQuery {
    pub fn with_status(status: UnitStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, unit: &StorageUnit) -> bool {
        self.status.is_none_or(|s| unit.status == s)
            && self
                .facility_id
                .is_none_or(|f| unit.facility_id == Some(f))
    }
}

/// Filter for customers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerQuery {
    /// Case-insensitive substring matched against first name, last name and email
    pub pattern: Option<String>,
}

impl CustomerQuery {
    pub fn search(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
        }
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        let Some(pattern) = self.pattern.as_deref() else {
            return true;
        };
        let needle = pattern.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [&customer.first_name, &customer.last_name, &customer.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Filter for rentals
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RentalQuery {
    pub customer_id: Option<Uuid>,
    pub unit_id: Option<Uuid>,
    pub status: Option<RentalStatus>,
    /// Exclude a single rental from the result
    pub exclude_id: Option<Uuid>,
    /// Order by creation time; `None` leaves backend order
    pub created_order: Option<SortOrder>,
    pub limit: Option<usize>,
}

impl RentalQuery {
    pub fn active() -> Self {
        Self {
            status: Some(RentalStatus::Active),
            ..Self::default()
        }
    }

    pub fn for_customer(mut self, customer_id: Uuid) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn for_unit(mut self, unit_id: Uuid) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    pub fn excluding(mut self, rental_id: Uuid) -> Self {
        self.exclude_id = Some(rental_id);
        self
    }

    pub fn matches(&self, rental: &Rental) -> bool {
        self.customer_id.is_none_or(|c| rental.customer_id == c)
            && self.unit_id.is_none_or(|u| rental.unit_id == u)
            && self.status.is_none_or(|s| rental.status == s)
            && self.exclude_id.is_none_or(|id| rental.id != id)
    }
}

/// Filter for payments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentQuery {
    pub rental_id: Option<Uuid>,
    pub payment_type: Option<PaymentType>,
    /// Inclusive lower bound on the payment date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on the payment date
    pub date_to: Option<NaiveDate>,
    /// Order by payment date, ties broken by creation time
    pub date_order: Option<SortOrder>,
    /// Order by creation time; applied when `date_order` is not set
    pub created_order: Option<SortOrder>,
    pub limit: Option<usize>,
    /// Skip rows marked missed
    pub received_only: bool,
}

impl PaymentQuery {
    /// Rent rows for one rental within one month
    pub fn rent_for_month(rental_id: Uuid, month: MonthKey) -> Self {
        Self {
            rental_id: Some(rental_id),
            payment_type: Some(PaymentType::Rent),
            date_from: Some(month.first_day()),
            date_to: Some(month.last_day()),
            date_order: Some(SortOrder::Descending),
            ..Self::default()
        }
    }

    /// Every payment dated within `[from, to]`
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            date_from: Some(from),
            date_to: Some(to),
            ..Self::default()
        }
    }

    pub fn in_month(month: MonthKey) -> Self {
        Self::between(month.first_day(), month.last_day())
    }

    pub fn of_type(mut self, payment_type: PaymentType) -> Self {
        self.payment_type = Some(payment_type);
        self
    }

    /// Only money actually received
    pub fn received(mut self) -> Self {
        self.received_only = true;
        self
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.rental_id.is_none_or(|r| payment.rental_id == r)
            && self.payment_type.is_none_or(|t| payment.payment_type == t)
            && self.date_from.is_none_or(|from| payment.payment_date >= from)
            && self.date_to.is_none_or(|to| payment.payment_date <= to)
            && (!self.received_only || payment.is_received())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn test_customer_pattern_is_case_insensitive() {
        let customer = Customer::new(
            "Maria".to_string(),
            "Okafor".to_string(),
            "maria@example.com".to_string(),
            None,
        );
        assert!(CustomerQuery::search("OKA").matches(&customer));
        assert!(CustomerQuery::search("example.com").matches(&customer));
        assert!(CustomerQuery::search("  ").matches(&customer));
        assert!(!CustomerQuery::search("smith").matches(&customer));
    }

    #[test]
    fn test_rent_for_month_bounds() {
        let rental_id = Uuid::new_v4();
        let month = MonthKey::new(2026, 9).unwrap();
        let query = PaymentQuery::rent_for_month(rental_id, month);

        let inside = Payment::rent(
            rental_id,
            BigDecimal::from(80),
            NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
        );
        let outside = Payment::rent(
            rental_id,
            BigDecimal::from(80),
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
        );
        let mut deposit = inside.clone();
        deposit.payment_type = PaymentType::Deposit;

        assert!(query.matches(&inside));
        assert!(!query.matches(&outside));
        assert!(!query.matches(&deposit));
    }

    #[test]
    fn test_received_skips_missed_rows() {
        let month = MonthKey::new(2026, 9).unwrap();
        let mut payment = Payment::rent(
            Uuid::new_v4(),
            BigDecimal::from(80),
            NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
        );
        let query = PaymentQuery::in_month(month).received();
        assert!(query.matches(&payment));

        payment.status = None;
        assert!(query.matches(&payment));

        payment.status = Some(PaymentRecordStatus::Missed);
        assert!(!query.matches(&payment));
        assert!(PaymentQuery::in_month(month).matches(&payment));
    }
}
