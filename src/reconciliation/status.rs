//! Per-rental, per-month payment status derivation

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::types::*;

/// Payment state of one rental for one month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// A completed rent payment exists for the month
    Paid,
    /// The month was marked missed, or it is over without a payment
    Missed,
    /// Current month, nothing recorded yet
    Pending,
    /// A month that has not started
    Future,
}

impl PaymentStatus {
    /// Derive the status for `month` given the deciding rent payment, if any.
    ///
    /// `current` is the month containing today.
    pub fn derive(payment: Option<&Payment>, month: MonthKey, current: MonthKey) -> Self {
        match payment.map(Payment::effective_status) {
            Some(PaymentRecordStatus::Completed) => PaymentStatus::Paid,
            Some(PaymentRecordStatus::Missed) => PaymentStatus::Missed,
            None if month < current => PaymentStatus::Missed,
            None if month == current => PaymentStatus::Pending,
            None => PaymentStatus::Future,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Missed => "missed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Future => "future",
        }
    }
}

/// Whether `candidate` should decide a month over `current`: a received
/// payment beats a missed marker, then the later payment date wins, then
/// the later creation time.
fn supersedes(candidate: &Payment, current: &Payment) -> bool {
    (
        candidate.is_received(),
        candidate.payment_date,
        candidate.created_at,
        candidate.id,
    ) > (
        current.is_received(),
        current.payment_date,
        current.created_at,
        current.id,
    )
}

/// Pick the payment that decides a month's status out of several rows for
/// the same rental and month
pub fn deciding_payment<'a, I>(payments: I) -> Option<&'a Payment>
where
    I: IntoIterator<Item = &'a Payment>,
{
    payments
        .into_iter()
        .filter(|p| p.is_rent())
        .fold(None, |best, p| match best {
            Some(b) if !supersedes(p, b) => Some(b),
            _ => Some(p),
        })
}

/// Rent payments indexed by rental and month
#[derive(Debug, Clone, Default)]
pub struct PaymentLookup {
    by_month: HashMap<(Uuid, MonthKey), Payment>,
}

impl PaymentLookup {
    /// Index rent payments; non-rent rows are ignored
    pub fn new<I>(payments: I) -> Self
    where
        I: IntoIterator<Item = Payment>,
    {
        let mut by_month: HashMap<(Uuid, MonthKey), Payment> = HashMap::new();
        for payment in payments.into_iter().filter(Payment::is_rent) {
            let key = (payment.rental_id, payment.month());
            match by_month.get(&key) {
                Some(existing) if !supersedes(&payment, existing) => {}
                _ => {
                    by_month.insert(key, payment);
                }
            }
        }
        Self { by_month }
    }

    pub fn get(&self, rental_id: Uuid, month: MonthKey) -> Option<&Payment> {
        self.by_month.get(&(rental_id, month))
    }

    pub fn status(&self, rental_id: Uuid, month: MonthKey, current: MonthKey) -> PaymentStatus {
        PaymentStatus::derive(self.get(rental_id, month), month, current)
    }

    pub fn len(&self) -> usize {
        self.by_month.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_month.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn month(y: i32, m: u32) -> MonthKey {
        MonthKey::new(y, m).unwrap()
    }

    fn rent(rental_id: Uuid, y: i32, m: u32, d: u32) -> Payment {
        Payment::rent(
            rental_id,
            BigDecimal::from(95),
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        )
    }

    #[test]
    fn test_status_without_payment_depends_on_month() {
        let current = month(2026, 10);
        assert_eq!(
            PaymentStatus::derive(None, month(2026, 9), current),
            PaymentStatus::Missed
        );
        assert_eq!(
            PaymentStatus::derive(None, current, current),
            PaymentStatus::Pending
        );
        assert_eq!(
            PaymentStatus::derive(None, month(2026, 11), current),
            PaymentStatus::Future
        );
    }

    #[test]
    fn test_status_follows_record_disposition() {
        let current = month(2026, 10);
        let mut payment = rent(Uuid::new_v4(), 2026, 8, 2);
        assert_eq!(
            PaymentStatus::derive(Some(&payment), month(2026, 8), current),
            PaymentStatus::Paid
        );

        payment.status = Some(PaymentRecordStatus::Missed);
        assert_eq!(
            PaymentStatus::derive(Some(&payment), month(2026, 8), current),
            PaymentStatus::Missed
        );

        payment.status = None;
        assert_eq!(
            PaymentStatus::derive(Some(&payment), month(2026, 8), current),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn test_lookup_keeps_latest_payment_per_month() {
        let rental_id = Uuid::new_v4();
        let early = rent(rental_id, 2026, 9, 1);
        let late = rent(rental_id, 2026, 9, 20);
        let mut deposit = rent(rental_id, 2026, 9, 25);
        deposit.payment_type = PaymentType::Deposit;

        let lookup = PaymentLookup::new(vec![late.clone(), early, deposit]);

        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup.get(rental_id, month(2026, 9)), Some(&late));
    }

    #[test]
    fn test_received_payment_outranks_later_missed_marker() {
        let rental_id = Uuid::new_v4();
        let paid = rent(rental_id, 2026, 9, 10);
        let mut marker = rent(rental_id, 2026, 9, 30);
        marker.amount = BigDecimal::from(0);
        marker.status = Some(PaymentRecordStatus::Missed);

        let lookup = PaymentLookup::new(vec![marker.clone(), paid.clone()]);
        assert_eq!(lookup.get(rental_id, month(2026, 9)), Some(&paid));
        assert_eq!(
            lookup.status(rental_id, month(2026, 9), month(2026, 10)),
            PaymentStatus::Paid
        );
        assert_eq!(deciding_payment([&marker, &paid]), Some(&paid));
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PaymentStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(PaymentStatus::Future.as_str(), "future");
    }
}
