//! Mark-paid and mark-missed transitions against the payments table

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PortalConfig;
use crate::query::*;
use crate::reconciliation::calendar::{CalendarEntry, CalendarWindow, PaymentCalendar};
use crate::reconciliation::status::{deciding_payment, PaymentStatus};
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_positive_amount;

/// How a transition touched the payments table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionAction {
    /// A new row was written
    Inserted,
    /// The existing row for the month was rewritten
    Updated,
}

/// Result of marking a month paid or missed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub rental_id: Uuid,
    pub month: MonthKey,
    pub action: TransitionAction,
    /// The single rent row now deciding the month
    pub payment: Payment,
    /// Duplicate rows for the same month that were deleted
    pub removed_duplicates: Vec<Uuid>,
    /// Views to refresh
    pub refresh: Vec<View>,
}

impl TransitionOutcome {
    pub fn status(&self) -> PaymentStatus {
        match self.payment.effective_status() {
            PaymentRecordStatus::Completed => PaymentStatus::Paid,
            PaymentRecordStatus::Missed => PaymentStatus::Missed,
        }
    }
}

/// Reconciles rentals against their monthly rent payments
pub struct ReconciliationEngine<S: PortalStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
    config: PortalConfig,
}

impl<S: PortalStorage> ReconciliationEngine<S> {
    /// Create an engine reading today's date from the system clock
    pub fn new(storage: S, config: PortalConfig) -> Self {
        Self::with_clock(storage, config, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: S, config: PortalConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    async fn rental_required(&self, rental_id: Uuid) -> PortalResult<Rental> {
        self.storage
            .get_rental(rental_id)
            .await?
            .ok_or_else(|| PortalError::not_found("Rental", rental_id))
    }

    /// Payment status of `rental_id` for `month`
    pub async fn payment_status(
        &self,
        _session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
    ) -> PortalResult<PaymentStatus> {
        let rental = self.rental_required(rental_id).await?;
        let rows = self
            .storage
            .list_payments(&PaymentQuery::rent_for_month(rental.id, month))
            .await?;
        let current = MonthKey::from_date(self.today());
        let status = PaymentStatus::derive(rows.first(), month, current);
        debug!(rental_id = %rental.id, month = %month, status = status.as_str(), "Derived payment status");
        Ok(status)
    }

    /// Record the rent for `month` as paid with `amount`.
    ///
    /// Rewrites the month's existing rent row when there is one, otherwise
    /// inserts a new row. The row is dated today when today falls in
    /// `month`, else on the nearest day inside `month`.
    pub async fn mark_paid(
        &mut self,
        _session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
        amount: BigDecimal,
    ) -> PortalResult<TransitionOutcome> {
        validate_positive_amount(&amount)?;
        let rental = self.rental_required(rental_id).await?;
        let today = self.today();
        let notes = format!("Payment for {} (recorded {})", month.label(), today);

        let (existing, removed_duplicates) =
            collapse_month(&mut self.storage, rental.id, month).await?;
        let (action, payment) = match existing {
            Some(mut payment) => {
                payment.amount = amount;
                payment.payment_date = month.clamp_date(today);
                payment.notes = Some(notes);
                payment.status = Some(PaymentRecordStatus::Completed);
                self.storage.update_payment(&payment).await?;
                (TransitionAction::Updated, payment)
            }
            None => {
                let mut payment = Payment::rent(rental.id, amount, month.clamp_date(today));
                payment.payment_method = Some(self.config.default_payment_method);
                payment.notes = Some(notes);
                self.storage.save_payment(&payment).await?;
                (TransitionAction::Inserted, payment)
            }
        };

        info!(
            rental_id = %rental.id,
            month = %month,
            payment_id = %payment.id,
            amount = %payment.amount,
            action = ?action,
            "Marked month paid"
        );

        Ok(TransitionOutcome {
            rental_id: rental.id,
            month,
            action,
            payment,
            removed_duplicates,
            refresh: vec![View::Dashboard, View::Payments],
        })
    }

    /// Record the rent for `month` as missed.
    ///
    /// The existing rent row keeps its amount and date and has its status
    /// flipped to missed. Without a row, a zero-amount missed marker is
    /// inserted so the month reads as missed even while it is current.
    pub async fn mark_missed(
        &mut self,
        _session: &AdminSession,
        rental_id: Uuid,
        month: MonthKey,
    ) -> PortalResult<TransitionOutcome> {
        let rental = self.rental_required(rental_id).await?;
        let today = self.today();
        if month > MonthKey::from_date(today) {
            return Err(PortalError::Validation(format!(
                "Cannot mark {} missed before it has started",
                month.label()
            )));
        }

        let (existing, removed_duplicates) =
            collapse_month(&mut self.storage, rental.id, month).await?;
        let (action, payment) = match existing {
            Some(mut payment) => {
                payment.status = Some(PaymentRecordStatus::Missed);
                self.storage.update_payment(&payment).await?;
                (TransitionAction::Updated, payment)
            }
            None => {
                let mut payment = Payment::rent(rental.id, BigDecimal::from(0), month.clamp_date(today));
                payment.status = Some(PaymentRecordStatus::Missed);
                payment.notes = Some(format!("Missed payment for {}", month.label()));
                self.storage.save_payment(&payment).await?;
                (TransitionAction::Inserted, payment)
            }
        };

        info!(
            rental_id = %rental.id,
            month = %month,
            payment_id = %payment.id,
            action = ?action,
            "Marked month missed"
        );

        Ok(TransitionOutcome {
            rental_id: rental.id,
            month,
            action,
            payment,
            removed_duplicates,
            refresh: vec![View::Dashboard, View::Payments],
        })
    }

    /// Build the payment calendar of all active rentals over `window`
    pub async fn calendar(
        &self,
        _session: &AdminSession,
        window: CalendarWindow,
    ) -> PortalResult<PaymentCalendar> {
        let rentals = self.storage.list_rentals(&RentalQuery::active()).await?;

        let mut customers: HashMap<Uuid, Option<Customer>> = HashMap::new();
        let mut units: HashMap<Uuid, Option<StorageUnit>> = HashMap::new();
        let mut entries = Vec::with_capacity(rentals.len());
        for rental in rentals {
            if !customers.contains_key(&rental.customer_id) {
                let customer = self.storage.get_customer(rental.customer_id).await?;
                customers.insert(rental.customer_id, customer);
            }
            if !units.contains_key(&rental.unit_id) {
                let unit = self.storage.get_unit(rental.unit_id).await?;
                units.insert(rental.unit_id, unit);
            }
            entries.push(CalendarEntry {
                customer: customers.get(&rental.customer_id).cloned().flatten(),
                unit: units.get(&rental.unit_id).cloned().flatten(),
                rental,
            });
        }

        let payments = self
            .storage
            .list_payments(
                &PaymentQuery::between(window.first_month().first_day(), window.anchor.last_day())
                    .of_type(PaymentType::Rent),
            )
            .await?;

        Ok(PaymentCalendar::build(
            window,
            entries,
            payments,
            self.today(),
            self.config.rent_due_day,
        ))
    }

    /// Calendar over the configured number of months ending this month
    pub async fn current_calendar(&self, session: &AdminSession) -> PortalResult<PaymentCalendar> {
        let window = CalendarWindow::current(self.today(), self.config.calendar_months);
        self.calendar(session, window).await
    }
}

/// Load the month's rent rows, keep the deciding one and delete the rest
/// so at most one row per rental and month remains
pub(crate) async fn collapse_month<S: PortalStorage>(
    storage: &mut S,
    rental_id: Uuid,
    month: MonthKey,
) -> PortalResult<(Option<Payment>, Vec<Uuid>)> {
    let rows = storage
        .list_payments(&PaymentQuery::rent_for_month(rental_id, month))
        .await?;
    let keeper = deciding_payment(&rows).cloned();

    let mut removed = Vec::new();
    for duplicate in rows
        .iter()
        .filter(|p| keeper.as_ref().is_none_or(|k| k.id != p.id))
    {
        warn!(
            rental_id = %rental_id,
            month = %month,
            payment_id = %duplicate.id,
            "Removing duplicate rent payment for month"
        );
        storage.delete_payment(duplicate.id).await?;
        removed.push(duplicate.id);
    }

    Ok((keeper, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{MemoryStorage, StaticAuthProvider};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    async fn setup() -> (ReconciliationEngine<MemoryStorage>, MemoryStorage, AdminSession, Rental) {
        let mut storage = MemoryStorage::new();
        let rental = Rental::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(140),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        );
        storage.save_rental(&rental).await.unwrap();

        let auth = StaticAuthProvider::signed_in("admin", "admin@example.com");
        let session = AdminSession::establish(&auth).await.unwrap();
        let engine = ReconciliationEngine::with_clock(
            storage.clone(),
            PortalConfig::default(),
            Arc::new(FixedClock(today())),
        );
        (engine, storage, session, rental)
    }

    #[tokio::test]
    async fn test_mark_paid_inserts_single_row() {
        let (mut engine, storage, session, rental) = setup().await;
        let october = MonthKey::from_date(today());

        assert_eq!(
            engine.payment_status(&session, rental.id, october).await.unwrap(),
            PaymentStatus::Pending
        );

        let outcome = engine
            .mark_paid(&session, rental.id, october, BigDecimal::from(140))
            .await
            .unwrap();

        assert_eq!(outcome.action, TransitionAction::Inserted);
        assert_eq!(outcome.payment.payment_date, today());
        assert_eq!(outcome.payment.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(storage.payment_count().unwrap(), 1);
        assert_eq!(
            engine.payment_status(&session, rental.id, october).await.unwrap(),
            PaymentStatus::Paid
        );
    }

    #[tokio::test]
    async fn test_mark_paid_for_past_month_dates_row_inside_month() {
        let (mut engine, _storage, session, rental) = setup().await;
        let august = MonthKey::new(2026, 8).unwrap();

        let outcome = engine
            .mark_paid(&session, rental.id, august, BigDecimal::from(140))
            .await
            .unwrap();

        assert_eq!(
            outcome.payment.payment_date,
            NaiveDate::from_ymd_opt(2026, 8, 31).unwrap()
        );
        assert_eq!(
            engine.payment_status(&session, rental.id, august).await.unwrap(),
            PaymentStatus::Paid
        );
        // October is still untouched
        assert_eq!(
            engine
                .payment_status(&session, rental.id, MonthKey::from_date(today()))
                .await
                .unwrap(),
            PaymentStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_mark_missed_flips_existing_row() {
        let (mut engine, storage, session, rental) = setup().await;
        let september = MonthKey::new(2026, 9).unwrap();
        let paid = engine
            .mark_paid(&session, rental.id, september, BigDecimal::from(140))
            .await
            .unwrap();

        let outcome = engine
            .mark_missed(&session, rental.id, september)
            .await
            .unwrap();

        assert_eq!(outcome.action, TransitionAction::Updated);
        assert_eq!(outcome.payment.id, paid.payment.id);
        assert_eq!(outcome.status(), PaymentStatus::Missed);
        assert_eq!(storage.payment_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_missed_rejects_future_month() {
        let (mut engine, _storage, session, rental) = setup().await;
        let result = engine
            .mark_missed(&session, rental.id, MonthKey::new(2026, 12).unwrap())
            .await;
        assert!(matches!(result, Err(PortalError::Validation(_))));
    }

    #[tokio::test]
    async fn test_mark_paid_rejects_unknown_rental_and_zero_amount() {
        let (mut engine, _storage, session, rental) = setup().await;
        let october = MonthKey::from_date(today());

        let unknown = engine
            .mark_paid(&session, Uuid::new_v4(), october, BigDecimal::from(140))
            .await;
        assert!(matches!(unknown, Err(PortalError::NotFound { .. })));

        let zero = engine
            .mark_paid(&session, rental.id, october, BigDecimal::from(0))
            .await;
        assert!(matches!(zero, Err(PortalError::Validation(_))));
    }
}
