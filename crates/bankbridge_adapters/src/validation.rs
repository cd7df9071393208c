//! Amount and type checks shared by every provider.
//!
//! Rules run in a fixed order and the first failure wins: recognised type,
//! lower bound, upper bound, then the provider's supported types.

use bankbridge_contract::{
    error_codes, ApplicationEnvelope, ApplicationType, BankInfo, BankResponse,
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unsupported application type: {0}")]
    UnsupportedType(String),
    #[error("amount {amount:.2} is below the minimum of {min:.2}")]
    AmountTooLow { amount: f64, min: f64 },
    #[error("amount {amount:.2} exceeds the maximum of {max:.2}")]
    AmountTooHigh { amount: f64, max: f64 },
    #[error("provider does not accept {0} applications")]
    TypeNotSupported(ApplicationType),
}

pub fn validate(envelope: &ApplicationEnvelope, info: &BankInfo) -> Result<(), ValidationError> {
    let kind = &envelope.application_type;
    if !kind.is_recognized() {
        return Err(ValidationError::UnsupportedType(kind.to_string()));
    }

    if envelope.amount.is_nan() || envelope.amount < info.min_amount {
        return Err(ValidationError::AmountTooLow {
            amount: envelope.amount,
            min: info.min_amount,
        });
    }

    if envelope.amount > info.max_amount {
        return Err(ValidationError::AmountTooHigh {
            amount: envelope.amount,
            max: info.max_amount,
        });
    }

    if !info.supports(kind) {
        return Err(ValidationError::TypeNotSupported(kind.clone()));
    }

    Ok(())
}

/// The response an adapter returns instead of submitting an invalid envelope.
pub fn rejection(info: &BankInfo, error: &ValidationError) -> BankResponse {
    BankResponse::failure(
        info.id.clone(),
        error_codes::VALIDATION_ERROR,
        format!("validation failed: {error}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_bank() -> BankInfo {
        BankInfo {
            id: "test_bank".to_string(),
            name: "Test Bank".to_string(),
            code: "TST".to_string(),
            api_endpoint: String::new(),
            is_active: true,
            supported_types: vec![ApplicationType::Credit],
            max_amount: 1_000_000.0,
            min_amount: 10_000.0,
            processing_time: "1 day".to_string(),
        }
    }

    fn envelope(kind: &str, amount: f64) -> ApplicationEnvelope {
        ApplicationEnvelope::new("t-1", kind, amount, json!({}))
    }

    #[test]
    fn accepts_in_range_supported_type() {
        assert_eq!(validate(&envelope("credit", 500_000.0), &test_bank()), Ok(()));
    }

    #[test]
    fn bounds_are_inclusive() {
        let bank = test_bank();
        assert!(validate(&envelope("credit", 10_000.0), &bank).is_ok());
        assert!(validate(&envelope("credit", 1_000_000.0), &bank).is_ok());
    }

    #[test]
    fn rejects_unknown_type_first() {
        let result = validate(&envelope("invalid_type", 5.0), &test_bank());
        assert_eq!(
            result,
            Err(ValidationError::UnsupportedType("invalid_type".to_string()))
        );
    }

    #[test]
    fn rejects_small_amount() {
        let result = validate(&envelope("credit", 5_000.0), &test_bank());
        assert!(matches!(result, Err(ValidationError::AmountTooLow { .. })));
    }

    #[test]
    fn rejects_large_amount() {
        let result = validate(&envelope("credit", 2_000_000.0), &test_bank());
        assert!(matches!(result, Err(ValidationError::AmountTooHigh { .. })));
    }

    #[test]
    fn rejects_nan_amount() {
        let result = validate(&envelope("credit", f64::NAN), &test_bank());
        assert!(matches!(result, Err(ValidationError::AmountTooLow { .. })));
    }

    #[test]
    fn amount_checks_precede_type_support() {
        let result = validate(&envelope("guarantee", 5_000.0), &test_bank());
        assert!(matches!(result, Err(ValidationError::AmountTooLow { .. })));

        let result = validate(&envelope("guarantee", 500_000.0), &test_bank());
        assert_eq!(
            result,
            Err(ValidationError::TypeNotSupported(ApplicationType::Guarantee))
        );
    }

    #[test]
    fn rejection_response_names_the_bank() {
        let bank = test_bank();
        let error = ValidationError::AmountTooLow {
            amount: 5_000.0,
            min: 10_000.0,
        };
        let response = rejection(&bank, &error);

        assert!(!response.success);
        assert_eq!(response.bank_id, "test_bank");
        assert_eq!(
            response.error_code.as_deref(),
            Some(error_codes::VALIDATION_ERROR)
        );
        assert!(response.message.contains("10000.00"));
    }
}
