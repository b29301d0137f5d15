//! Dashboard aggregates

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::PortalConfig;
use crate::portal::payments::payment_listings;
use crate::query::*;
use crate::session::AdminSession;
use crate::traits::*;
use crate::types::*;

const RECENT_PAYMENTS_SCANNED: usize = 10;
const RECENT_RENTALS_SCANNED: usize = 5;

/// Coarse occupancy level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyTier {
    /// Above 80%
    High,
    /// Above 60%
    Medium,
    Low,
}

impl OccupancyTier {
    pub fn from_rate(rate: u32) -> Self {
        if rate > 80 {
            OccupancyTier::High
        } else if rate > 60 {
            OccupancyTier::Medium
        } else {
            OccupancyTier::Low
        }
    }
}

/// Headline numbers for the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_units: usize,
    pub occupied_units: usize,
    /// Units not occupied, including those in maintenance
    pub available_units: usize,
    /// Occupied share of all units in whole percent
    pub occupancy_rate: u32,
    pub occupancy_tier: OccupancyTier,
    pub total_customers: usize,
    /// Sum of payments received this month
    pub monthly_revenue: BigDecimal,
}

/// Payment totals for the payments page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsSummary {
    pub current_month_total: BigDecimal,
    pub current_month_count: usize,
    pub last_month_total: BigDecimal,
    /// Change against last month in percent, one decimal place; zero when
    /// last month had no revenue
    pub growth_percent: BigDecimal,
    pub today_total: BigDecimal,
    /// Rent-type share of this month's total
    pub rent_total: BigDecimal,
}

/// Unit counts by status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OccupancyBreakdown {
    pub available: usize,
    pub occupied: usize,
    pub maintenance: usize,
}

/// What a recent-activity entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityKind {
    Payment { payment_type: PaymentType },
    Rental { status: RentalStatus },
}

/// One line of the recent activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub description: String,
    pub amount: BigDecimal,
    pub unit_number: String,
    pub at: NaiveDateTime,
}

/// Read-only aggregate queries for the dashboard
pub struct Dashboard<S: PortalStorage> {
    storage: S,
    clock: Arc<dyn Clock>,
    config: PortalConfig,
}

/// Round `occupied / total` to a whole percent, halves up
fn occupancy_rate(occupied: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    let rate = (occupied * 200 + total) / (total * 2);
    u32::try_from(rate).unwrap_or(u32::MAX)
}

fn total(payments: &[Payment]) -> BigDecimal {
    payments.iter().map(|p| &p.amount).sum()
}

impl<S: PortalStorage> Dashboard<S> {
    pub fn new(storage: S, clock: Arc<dyn Clock>, config: PortalConfig) -> Self {
        Self {
            storage,
            clock,
            config,
        }
    }

    /// Unit, customer and revenue headline numbers
    pub async fn stats(&self, _session: &AdminSession) -> PortalResult<DashboardStats> {
        let units = self.storage.list_units(&UnitQuery::default()).await?;
        let total_units = units.len();
        let occupied_units = units
            .iter()
            .filter(|u| u.status == UnitStatus::Occupied)
            .count();
        let total_customers = self
            .storage
            .list_customers(&CustomerQuery::default())
            .await?
            .len();

        let month = MonthKey::from_date(self.clock.today());
        let received = self
            .storage
            .list_payments(&PaymentQuery::in_month(month).received())
            .await?;
        let monthly_revenue = total(&received);

        let occupancy_rate = occupancy_rate(occupied_units, total_units);
        Ok(DashboardStats {
            total_units,
            occupied_units,
            available_units: total_units - occupied_units,
            occupancy_rate,
            occupancy_tier: OccupancyTier::from_rate(occupancy_rate),
            total_customers,
            monthly_revenue,
        })
    }

    /// This month against last month, plus today's takings
    pub async fn payments_summary(&self, _session: &AdminSession) -> PortalResult<PaymentsSummary> {
        let today = self.clock.today();
        let month = MonthKey::from_date(today);

        let current = self
            .storage
            .list_payments(&PaymentQuery::in_month(month).received())
            .await?;
        let last = self
            .storage
            .list_payments(&PaymentQuery::in_month(month.previous()).received())
            .await?;

        let current_month_total = total(&current);
        let last_month_total = total(&last);
        let today_total: BigDecimal = current
            .iter()
            .filter(|p| p.payment_date == today)
            .map(|p| &p.amount)
            .sum();
        let rent_total: BigDecimal = current
            .iter()
            .filter(|p| p.is_rent())
            .map(|p| &p.amount)
            .sum();

        let zero = BigDecimal::from(0);
        let growth_percent = if last_month_total > zero {
            ((&current_month_total - &last_month_total) / &last_month_total * BigDecimal::from(100))
                .round(1)
        } else {
            zero
        };

        Ok(PaymentsSummary {
            current_month_count: current.len(),
            current_month_total,
            last_month_total,
            growth_percent,
            today_total,
            rent_total,
        })
    }

    /// Unit counts per status
    pub async fn occupancy(&self, _session: &AdminSession) -> PortalResult<OccupancyBreakdown> {
        let units = self.storage.list_units(&UnitQuery::default()).await?;
        Ok(units
            .iter()
            .fold(OccupancyBreakdown::default(), |mut acc, unit| {
                match unit.status {
                    UnitStatus::Available => acc.available += 1,
                    UnitStatus::Occupied => acc.occupied += 1,
                    UnitStatus::Maintenance => acc.maintenance += 1,
                }
                acc
            }))
    }

    /// Newest payments and rentals merged into one feed, newest first
    pub async fn recent_activity(&self, _session: &AdminSession) -> PortalResult<Vec<ActivityItem>> {
        let payments = self
            .storage
            .list_payments(&PaymentQuery {
                created_order: Some(SortOrder::Descending),
                limit: Some(RECENT_PAYMENTS_SCANNED),
                received_only: true,
                ..PaymentQuery::default()
            })
            .await?;
        let rentals = self
            .storage
            .list_rentals(&RentalQuery {
                created_order: Some(SortOrder::Descending),
                limit: Some(RECENT_RENTALS_SCANNED),
                ..RentalQuery::default()
            })
            .await?;

        let mut items: Vec<ActivityItem> = payment_listings(&self.storage, payments)
            .await?
            .into_iter()
            .map(|listing| ActivityItem {
                kind: ActivityKind::Payment {
                    payment_type: listing.payment.payment_type,
                },
                description: format!("Payment received from {}", listing.customer_name),
                amount: listing.payment.amount,
                unit_number: listing.unit_number,
                at: listing.payment.created_at,
            })
            .collect();

        for rental in rentals {
            let customer_name = self
                .storage
                .get_customer(rental.customer_id)
                .await?
                .map(|c| c.full_name())
                .unwrap_or_default();
            let unit_number = self
                .storage
                .get_unit(rental.unit_id)
                .await?
                .map(|u| u.unit_number)
                .unwrap_or_default();
            items.push(ActivityItem {
                kind: ActivityKind::Rental {
                    status: rental.status,
                },
                description: format!("New rental for {customer_name}"),
                amount: rental.monthly_rate,
                unit_number,
                at: rental.created_at,
            });
        }

        items.sort_by(|a, b| b.at.cmp(&a.at));
        items.truncate(self.config.recent_activity_limit);
        Ok(items)
    }
}
