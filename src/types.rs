//! Core types and data structures for the rental portal

use bigdecimal::BigDecimal;
use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Rank used when a unit number carries no usable digits
pub const UNRANKED_UNIT: u32 = 999;

/// Occupancy state of a storage unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    /// Free to rent
    Available,
    /// Held by an active rental
    Occupied,
    /// Temporarily out of service
    Maintenance,
}

/// Size class of a storage unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeCategory {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

/// Lifecycle state of a rental agreement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalStatus {
    Active,
    Terminated,
}

/// Whether the lease document has been sent to or signed by the customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseStatus {
    Sent,
    Signed,
}

/// What a payment was for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Monthly rent; the only type considered by reconciliation
    Rent,
    /// Security deposit
    Deposit,
    LateFee,
    Other,
}

/// How a payment was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Check,
    CreditCard,
    BankTransfer,
}

/// Disposition stored on a payment row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentRecordStatus {
    /// Money was received
    Completed,
    /// The admin marked the month as missed
    Missed,
}

/// Portal views whose cached contents go stale after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Dashboard,
    Units,
    Customers,
    Payments,
}

/// A calendar month, stored as its first day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// Build a month from a year and a 1-based month number
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().0 - Days::new(1)
    }

    /// The following month
    pub fn next(&self) -> Self {
        Self(self.0 + Months::new(1))
    }

    /// The preceding month
    pub fn previous(&self) -> Self {
        Self(self.0 - Months::new(1))
    }

    /// Move by a signed number of months
    pub fn offset(&self, months: i32) -> Self {
        if months >= 0 {
            Self(self.0 + Months::new(months.unsigned_abs()))
        } else {
            Self(self.0 - Months::new(months.unsigned_abs()))
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }

    /// Pull `date` into this month: unchanged when inside it, otherwise the
    /// nearest boundary day
    pub fn clamp_date(&self, date: NaiveDate) -> NaiveDate {
        if self.contains(date) {
            date
        } else if date > self.last_day() {
            self.last_day()
        } else {
            self.first_day()
        }
    }

    /// Human readable label such as "October 2026"
    pub fn label(&self) -> String {
        self.0.format("%B %Y").to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

/// Numeric ordering key for a unit number: the digits it contains, read as
/// an integer. Unit numbers without digits sort last.
pub fn unit_number_rank(unit_number: &str) -> u32 {
    let digits: String = unit_number.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(UNRANKED_UNIT)
}

/// A storage site that groups units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
}

impl Facility {
    pub fn new(name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
        }
    }
}

/// A rentable storage unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageUnit {
    pub id: Uuid,
    /// Facility the unit belongs to, if facilities are tracked
    pub facility_id: Option<Uuid>,
    /// Unit label as painted on the door, e.g. "A-12"
    pub unit_number: String,
    pub size_category: SizeCategory,
    /// Free text such as "10x10"
    pub dimensions: Option<String>,
    pub monthly_rate: BigDecimal,
    pub status: UnitStatus,
    pub has_electricity: bool,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl StorageUnit {
    /// Create a new, available unit
    pub fn new(unit_number: String, size_category: SizeCategory, monthly_rate: BigDecimal) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            facility_id: None,
            unit_number,
            size_category,
            dimensions: None,
            monthly_rate,
            status: UnitStatus::Available,
            has_electricity: false,
            description: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rank(&self) -> u32 {
        unit_number_rank(&self.unit_number)
    }

    /// Change the unit status and bump the update timestamp
    pub fn set_status(&mut self, status: UnitStatus) {
        self.status = status;
        self.updated_at = chrono::Utc::now().naive_utc();
    }
}

/// A person renting one or more units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Customer {
    pub fn new(first_name: String, last_name: String, email: String, phone: Option<String>) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            phone,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An agreement linking one customer to one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub unit_id: Uuid,
    /// Rate agreed at signing; later unit rate changes do not affect it
    pub monthly_rate: BigDecimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: RentalStatus,
    pub lease_status: Option<LeaseStatus>,
    pub created_at: NaiveDateTime,
}

impl Rental {
    /// Create a new active rental
    pub fn new(
        customer_id: Uuid,
        unit_id: Uuid,
        monthly_rate: BigDecimal,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            unit_id,
            monthly_rate,
            start_date,
            end_date: None,
            status: RentalStatus::Active,
            lease_status: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RentalStatus::Active
    }

    /// End the rental as of `end_date`
    pub fn terminate(&mut self, end_date: NaiveDate) {
        self.status = RentalStatus::Terminated;
        self.end_date = Some(end_date);
    }
}

/// Money received (or marked missed) against a rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub rental_id: Uuid,
    pub amount: BigDecimal,
    pub payment_date: NaiveDate,
    pub payment_type: PaymentType,
    pub payment_method: Option<PaymentMethod>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    /// Absent on rows written before statuses were tracked
    pub status: Option<PaymentRecordStatus>,
    pub created_at: NaiveDateTime,
}

impl Payment {
    /// Create a new completed payment
    pub fn new(
        rental_id: Uuid,
        amount: BigDecimal,
        payment_date: NaiveDate,
        payment_type: PaymentType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rental_id,
            amount,
            payment_date,
            payment_type,
            payment_method: None,
            reference_number: None,
            notes: None,
            status: Some(PaymentRecordStatus::Completed),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    /// Create a completed rent payment
    pub fn rent(rental_id: Uuid, amount: BigDecimal, payment_date: NaiveDate) -> Self {
        Self::new(rental_id, amount, payment_date, PaymentType::Rent)
    }

    pub fn is_rent(&self) -> bool {
        self.payment_type == PaymentType::Rent
    }

    /// Stored status, treating legacy rows without one as completed
    pub fn effective_status(&self) -> PaymentRecordStatus {
        self.status.unwrap_or(PaymentRecordStatus::Completed)
    }

    /// Money was actually received, i.e. the row is not a missed marker
    pub fn is_received(&self) -> bool {
        self.effective_status() == PaymentRecordStatus::Completed
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::from_date(self.payment_date)
    }
}

/// Errors that can occur in the portal
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PortalError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PortalError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_key_boundaries() {
        let feb = MonthKey::from_date(date(2024, 2, 17));
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert_eq!(feb.next(), MonthKey::new(2024, 3).unwrap());
        assert_eq!(feb.previous(), MonthKey::new(2024, 1).unwrap());
        assert_eq!(feb.offset(-2), MonthKey::new(2023, 12).unwrap());
        assert_eq!(feb.to_string(), "2024-02");
        assert_eq!(feb.label(), "February 2024");
        assert!(MonthKey::new(2024, 13).is_none());
    }

    #[test]
    fn test_month_key_clamp() {
        let aug = MonthKey::new(2026, 8).unwrap();
        assert_eq!(aug.clamp_date(date(2026, 8, 9)), date(2026, 8, 9));
        assert_eq!(aug.clamp_date(date(2026, 10, 18)), date(2026, 8, 31));
        assert_eq!(aug.clamp_date(date(2026, 3, 2)), date(2026, 8, 1));
    }

    #[test]
    fn test_unit_number_rank() {
        assert_eq!(unit_number_rank("A-12"), 12);
        assert_eq!(unit_number_rank("7"), 7);
        assert_eq!(unit_number_rank("Locker"), UNRANKED_UNIT);
        assert_eq!(unit_number_rank("B1-04"), 104);
    }

    #[test]
    fn test_legacy_payment_counts_as_completed() {
        let mut payment = Payment::rent(Uuid::new_v4(), BigDecimal::from(120), date(2026, 9, 3));
        payment.status = None;
        assert_eq!(payment.effective_status(), PaymentRecordStatus::Completed);
        assert_eq!(payment.month(), MonthKey::new(2026, 9).unwrap());
    }
}
