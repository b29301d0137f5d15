//! Validation utilities

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> PortalResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(PortalError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate a unit number such as "A-12"
pub fn validate_unit_number(unit_number: &str) -> PortalResult<()> {
    if unit_number.trim().is_empty() {
        return Err(PortalError::Validation(
            "Unit number cannot be empty".to_string(),
        ));
    }

    if unit_number.len() > 20 {
        return Err(PortalError::Validation(
            "Unit number cannot exceed 20 characters".to_string(),
        ));
    }

    if !unit_number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ')
    {
        return Err(PortalError::Validation(
            "Unit number can only contain alphanumeric characters, spaces, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate a person name field
pub fn validate_name(field: &str, value: &str) -> PortalResult<()> {
    if value.trim().is_empty() {
        return Err(PortalError::Validation(format!("{field} cannot be empty")));
    }

    if value.len() > 100 {
        return Err(PortalError::Validation(format!(
            "{field} cannot exceed 100 characters"
        )));
    }

    Ok(())
}

/// Validate the shape of an email address
pub fn validate_email(email: &str) -> PortalResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(PortalError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }

    Ok(())
}

/// Enhanced validator with field format checks on top of the defaults
pub struct EnhancedRecordValidator;

impl RecordValidator for EnhancedRecordValidator {
    fn validate_unit(&self, unit: &StorageUnit) -> PortalResult<()> {
        DefaultRecordValidator.validate_unit(unit)?;
        validate_unit_number(&unit.unit_number)
    }

    fn validate_customer(&self, customer: &Customer) -> PortalResult<()> {
        validate_name("First name", &customer.first_name)?;
        validate_name("Last name", &customer.last_name)?;
        validate_email(&customer.email)
    }

    fn validate_payment(&self, payment: &Payment) -> PortalResult<()> {
        validate_positive_amount(&payment.amount)?;

        if let Some(reference) = &payment.reference_number {
            if reference.len() > 50 {
                return Err(PortalError::Validation(
                    "Reference number cannot exceed 50 characters".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("ops@storage.example").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@localhost").is_err());
    }

    #[test]
    fn test_unit_number_characters() {
        assert!(validate_unit_number("B-07").is_ok());
        assert!(validate_unit_number("Unit 4").is_ok());
        assert!(validate_unit_number("A/12").is_err());
        assert!(validate_unit_number("   ").is_err());
    }

    #[test]
    fn test_enhanced_unit_rate_checked_once() {
        let mut unit = StorageUnit::new(
            "B-07".to_string(),
            SizeCategory::Small,
            BigDecimal::from(0),
        );
        match EnhancedRecordValidator.validate_unit(&unit) {
            Err(PortalError::Validation(message)) => {
                assert_eq!(message, "Monthly rate must be positive")
            }
            other => panic!("unexpected result: {other:?}"),
        }

        unit.monthly_rate = BigDecimal::from(45);
        assert!(EnhancedRecordValidator.validate_unit(&unit).is_ok());
    }
}
