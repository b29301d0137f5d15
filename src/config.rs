//! Portal configuration loaded from TOML

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::reconciliation::MAX_CALENDAR_MONTHS;
use crate::types::*;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PortalConfig {
    /// Day of month after which an unpaid current month is overdue
    pub rent_due_day: u32,

    /// Number of months shown by the payment calendar
    pub calendar_months: u32,

    /// Method stamped on payments created from the calendar
    pub default_payment_method: PaymentMethod,

    pub recent_payments_limit: usize,

    pub recent_activity_limit: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            rent_due_day: 5,
            calendar_months: 3,
            default_payment_method: PaymentMethod::Cash,
            recent_payments_limit: 50,
            recent_activity_limit: 8,
        }
    }
}

impl PortalConfig {
    /// Parse and validate a TOML document; absent keys take their defaults
    pub fn from_toml_str(contents: &str) -> PortalResult<Self> {
        let config: PortalConfig = toml::from_str(contents)
            .map_err(|e| PortalError::Config(format!("Failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`. A missing path or file yields the defaults.
    pub fn load(path: Option<&Path>) -> PortalResult<Self> {
        let Some(path) = path.filter(|p| p.exists()) else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path).map_err(|e| {
            PortalError::Config(format!("Failed to read config file at {path:?}: {e}"))
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> PortalResult<()> {
        if !(1..=28).contains(&self.rent_due_day) {
            return Err(PortalError::Config(format!(
                "rent_due_day must be between 1 and 28, got {}",
                self.rent_due_day
            )));
        }
        if !(1..=MAX_CALENDAR_MONTHS).contains(&self.calendar_months) {
            return Err(PortalError::Config(format!(
                "calendar_months must be between 1 and {MAX_CALENDAR_MONTHS}, got {}",
                self.calendar_months
            )));
        }
        if self.recent_payments_limit == 0 || self.recent_activity_limit == 0 {
            return Err(PortalError::Config(
                "recent list limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
