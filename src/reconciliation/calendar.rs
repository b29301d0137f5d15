//! Multi-month payment calendar

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::reconciliation::status::{PaymentLookup, PaymentStatus};
use crate::types::*;

/// Widest calendar window, in months
pub const MAX_CALENDAR_MONTHS: u32 = 12;

/// Range of consecutive months ending at an anchor month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarWindow {
    /// Last (most recent) month shown
    pub anchor: MonthKey,
    /// Number of months shown, between one and [`MAX_CALENDAR_MONTHS`]
    pub months: u32,
}

impl CalendarWindow {
    pub fn ending_at(anchor: MonthKey, months: u32) -> Self {
        Self {
            anchor,
            months: months.clamp(1, MAX_CALENDAR_MONTHS),
        }
    }

    /// Window ending at the month containing `today`
    pub fn current(today: NaiveDate, months: u32) -> Self {
        Self::ending_at(MonthKey::from_date(today), months)
    }

    fn span(&self) -> i32 {
        // the field is public and may hold anything
        self.months.clamp(1, MAX_CALENDAR_MONTHS) as i32
    }

    /// Months in the window, oldest first
    pub fn month_keys(&self) -> Vec<MonthKey> {
        (0..self.span()).rev().map(|back| self.anchor.offset(-back)).collect()
    }

    pub fn first_month(&self) -> MonthKey {
        self.anchor.offset(1 - self.span())
    }

    pub fn previous(&self) -> Self {
        Self::ending_at(self.anchor.previous(), self.months)
    }

    pub fn next(&self) -> Self {
        Self::ending_at(self.anchor.next(), self.months)
    }
}

/// One rental/month cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub month: MonthKey,
    pub status: PaymentStatus,
    /// Rent payment deciding the status, if one exists
    pub payment: Option<Payment>,
    /// Pending and past the rent due day
    pub overdue: bool,
}

impl CalendarCell {
    /// Whether the admin can still mark this month paid or missed
    pub fn is_actionable(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// A rental together with the customer and unit it references
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEntry {
    pub rental: Rental,
    pub customer: Option<Customer>,
    pub unit: Option<StorageUnit>,
}

/// One calendar row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarRow {
    pub rental: Rental,
    pub customer_name: String,
    pub unit_number: String,
    pub cells: Vec<CalendarCell>,
}

/// Status counts for one month across all rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub paid: usize,
    pub missed: usize,
    pub pending: usize,
    pub future: usize,
    pub total: usize,
}

/// Payment grid of rentals by month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCalendar {
    pub window: CalendarWindow,
    pub months: Vec<MonthKey>,
    pub rows: Vec<CalendarRow>,
    pub summaries: Vec<MonthSummary>,
}

impl PaymentCalendar {
    /// Lay out `entries` over `window`, ordered by numeric unit number.
    ///
    /// `payments` may contain rows outside the window or of other types;
    /// only rent rows inside the window affect the grid.
    pub fn build(
        window: CalendarWindow,
        entries: Vec<CalendarEntry>,
        payments: Vec<Payment>,
        today: NaiveDate,
        rent_due_day: u32,
    ) -> Self {
        let months = window.month_keys();
        let current = MonthKey::from_date(today);
        let past_due_day = today.day() > rent_due_day;
        let lookup = PaymentLookup::new(payments);

        let mut rows: Vec<CalendarRow> = entries
            .into_iter()
            .map(|entry| {
                let cells = months
                    .iter()
                    .map(|&month| {
                        let payment = lookup.get(entry.rental.id, month).cloned();
                        let status = PaymentStatus::derive(payment.as_ref(), month, current);
                        CalendarCell {
                            month,
                            status,
                            payment,
                            overdue: status == PaymentStatus::Pending && past_due_day,
                        }
                    })
                    .collect();
                CalendarRow {
                    customer_name: entry
                        .customer
                        .as_ref()
                        .map(Customer::full_name)
                        .unwrap_or_default(),
                    unit_number: entry
                        .unit
                        .map(|unit| unit.unit_number)
                        .unwrap_or_default(),
                    rental: entry.rental,
                    cells,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            unit_number_rank(&a.unit_number)
                .cmp(&unit_number_rank(&b.unit_number))
                .then_with(|| a.unit_number.cmp(&b.unit_number))
        });

        let summaries = months
            .iter()
            .enumerate()
            .map(|(index, &month)| {
                let mut summary = MonthSummary {
                    month,
                    paid: 0,
                    missed: 0,
                    pending: 0,
                    future: 0,
                    total: rows.len(),
                };
                for row in &rows {
                    match row.cells[index].status {
                        PaymentStatus::Paid => summary.paid += 1,
                        PaymentStatus::Missed => summary.missed += 1,
                        PaymentStatus::Pending => summary.pending += 1,
                        PaymentStatus::Future => summary.future += 1,
                    }
                }
                summary
            })
            .collect();

        Self {
            window,
            months,
            rows,
            summaries,
        }
    }

    pub fn row(&self, rental_id: uuid::Uuid) -> Option<&CalendarRow> {
        self.rows.iter().find(|row| row.rental.id == rental_id)
    }

    pub fn summary(&self, month: MonthKey) -> Option<&MonthSummary> {
        self.summaries.iter().find(|s| s.month == month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(unit_number: &str, last_name: &str) -> CalendarEntry {
        let unit = StorageUnit::new(
            unit_number.to_string(),
            SizeCategory::Medium,
            BigDecimal::from(110),
        );
        let customer = Customer::new(
            "Sam".to_string(),
            last_name.to_string(),
            format!("{}@example.com", last_name.to_lowercase()),
            None,
        );
        CalendarEntry {
            rental: Rental::new(customer.id, unit.id, BigDecimal::from(110), date(2026, 1, 1)),
            customer: Some(customer),
            unit: Some(unit),
        }
    }

    #[test]
    fn test_window_size_is_bounded() {
        let anchor = MonthKey::new(2026, 10).unwrap();
        let window = CalendarWindow::ending_at(anchor, u32::MAX);
        assert_eq!(window.months, MAX_CALENDAR_MONTHS);
        assert_eq!(window.month_keys().len(), 12);
        assert_eq!(window.first_month(), MonthKey::new(2025, 11).unwrap());

        let raw = CalendarWindow {
            anchor,
            months: 5000,
        };
        assert_eq!(raw.month_keys().len(), 12);
        assert_eq!(CalendarWindow::ending_at(anchor, 0).month_keys(), vec![anchor]);
    }

    #[test]
    fn test_window_months_oldest_first() {
        let window = CalendarWindow::current(date(2026, 1, 15), 3);
        assert_eq!(
            window.month_keys(),
            vec![
                MonthKey::new(2025, 11).unwrap(),
                MonthKey::new(2025, 12).unwrap(),
                MonthKey::new(2026, 1).unwrap(),
            ]
        );
        assert_eq!(window.first_month(), MonthKey::new(2025, 11).unwrap());
        assert_eq!(window.next().anchor, MonthKey::new(2026, 2).unwrap());
        assert_eq!(window.previous().anchor, MonthKey::new(2025, 12).unwrap());
    }

    #[test]
    fn test_calendar_grid_and_summaries() {
        let today = date(2026, 10, 18);
        let window = CalendarWindow::current(today, 3);
        let a = entry("A-10", "Nguyen");
        let b = entry("A-2", "Brandt");
        let payments = vec![
            Payment::rent(a.rental.id, BigDecimal::from(110), date(2026, 8, 4)),
            Payment::rent(b.rental.id, BigDecimal::from(110), date(2026, 10, 2)),
        ];

        let calendar = PaymentCalendar::build(window, vec![a.clone(), b.clone()], payments, today, 5);

        assert_eq!(calendar.rows[0].unit_number, "A-2");
        assert_eq!(calendar.rows[1].unit_number, "A-10");

        let row_a = calendar.row(a.rental.id).unwrap();
        let statuses: Vec<_> = row_a.cells.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                PaymentStatus::Paid,
                PaymentStatus::Missed,
                PaymentStatus::Pending
            ]
        );
        assert!(row_a.cells[2].overdue);
        assert!(row_a.cells[2].is_actionable());

        let october = calendar.summary(MonthKey::new(2026, 10).unwrap()).unwrap();
        assert_eq!(october.paid, 1);
        assert_eq!(october.pending, 1);
        assert_eq!(october.total, 2);
    }

    #[test]
    fn test_not_overdue_before_due_day() {
        let today = date(2026, 10, 3);
        let a = entry("B-1", "Ito");
        let calendar =
            PaymentCalendar::build(CalendarWindow::current(today, 1), vec![a], Vec::new(), today, 5);

        let cell = &calendar.rows[0].cells[0];
        assert_eq!(cell.status, PaymentStatus::Pending);
        assert!(!cell.overdue);
    }

    #[test]
    fn test_future_months_in_window() {
        let today = date(2026, 10, 18);
        let window = CalendarWindow::current(today, 3).next();
        let calendar = PaymentCalendar::build(window, vec![entry("C-3", "Reyes")], Vec::new(), today, 5);

        let summary = calendar.summary(MonthKey::new(2026, 11).unwrap()).unwrap();
        assert_eq!(summary.future, 1);
        assert_eq!(summary.pending, 0);
        assert!(calendar.row(Uuid::new_v4()).is_none());
    }
}
