//! Manually recorded payments and payment listings

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::query::*;
use crate::reconciliation::engine::collapse_month;
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

/// Parameters for recording a payment from the payment form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPayment {
    pub rental_id: Uuid,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

/// A payment with the customer and unit it was received for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentListing {
    pub payment: Payment,
    pub customer_name: String,
    pub unit_number: String,
}

/// Payment manager for recording and listing payments
pub struct PaymentManager<S: PortalStorage> {
    storage: S,
    validator: Arc<dyn RecordValidator>,
}

impl<S: PortalStorage> PaymentManager<S> {
    /// Create a new payment manager
    pub fn new(storage: S) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator))
    }

    /// Create a new payment manager with custom validator
    pub fn with_validator(storage: S, validator: Arc<dyn RecordValidator>) -> Self {
        Self { storage, validator }
    }

    /// Record a payment against an existing rental.
    ///
    /// A rent payment takes over the month's existing rent row, if any,
    /// turning a missed marker into a received payment, so the month keeps a
    /// single rent row.
    pub async fn record_payment(
        &mut self,
        session: &AdminSession,
        new_payment: NewPayment,
    ) -> PortalResult<Payment> {
        if self.storage.get_rental(new_payment.rental_id).await?.is_none() {
            return Err(PortalError::not_found("Rental", new_payment.rental_id));
        }

        let mut payment = Payment::new(
            new_payment.rental_id,
            new_payment.amount,
            new_payment.payment_date,
            new_payment.payment_type,
        );
        payment.payment_method = new_payment.payment_method;
        payment.reference_number = new_payment.reference_number;
        payment.notes = new_payment.notes;
        self.validator.validate_payment(&payment)?;

        let existing = if payment.is_rent() {
            collapse_month(&mut self.storage, payment.rental_id, payment.month())
                .await?
                .0
        } else {
            None
        };

        match &existing {
            Some(existing) => {
                payment.id = existing.id;
                payment.created_at = existing.created_at;
                self.storage.update_payment(&payment).await?;
            }
            None => self.storage.save_payment(&payment).await?,
        }

        info!(
            payment_id = %payment.id,
            rental_id = %payment.rental_id,
            amount = %payment.amount,
            replaced = existing.is_some(),
            admin = %session.user().email,
            "Recorded payment"
        );
        Ok(payment)
    }

    /// Get a payment by ID
    pub async fn get_payment(&self, payment_id: Uuid) -> PortalResult<Option<Payment>> {
        self.storage.get_payment(payment_id).await
    }

    /// All payments for one rental, newest first
    pub async fn payments_for_rental(
        &self,
        _session: &AdminSession,
        rental_id: Uuid,
    ) -> PortalResult<Vec<Payment>> {
        self.storage
            .list_payments(&PaymentQuery {
                rental_id: Some(rental_id),
                date_order: Some(SortOrder::Descending),
                ..PaymentQuery::default()
            })
            .await
    }

    /// The `limit` most recent received payments by payment date, with
    /// customer and unit attached. Missed markers are left out.
    pub async fn recent_payments(
        &self,
        _session: &AdminSession,
        limit: usize,
    ) -> PortalResult<Vec<PaymentListing>> {
        let payments = self
            .storage
            .list_payments(&PaymentQuery {
                date_order: Some(SortOrder::Descending),
                limit: Some(limit),
                received_only: true,
                ..PaymentQuery::default()
            })
            .await?;
        payment_listings(&self.storage, payments).await
    }
}

/// Attach customer name and unit number to each payment
pub(crate) async fn payment_listings<S: PortalStorage>(
    storage: &S,
    payments: Vec<Payment>,
) -> PortalResult<Vec<PaymentListing>> {
    let mut listings = Vec::with_capacity(payments.len());
    for payment in payments {
        let (customer_name, unit_number) = match storage.get_rental(payment.rental_id).await? {
            Some(rental) => {
                let customer_name = storage
                    .get_customer(rental.customer_id)
                    .await?
                    .map(|c| c.full_name())
                    .unwrap_or_default();
                let unit_number = storage
                    .get_unit(rental.unit_id)
                    .await?
                    .map(|u| u.unit_number)
                    .unwrap_or_default();
                (customer_name, unit_number)
            }
            None => (String::new(), String::new()),
        };
        listings.push(PaymentListing {
            payment,
            customer_name,
            unit_number,
        });
    }
    Ok(listings)
}
