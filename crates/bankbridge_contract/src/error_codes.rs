//! Error codes carried in `BankResponse::error_code`.
//!
//! Providers may add their own rejection codes; only the dispatch-layer codes
//! below are retryable.

pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const PRIMARY_CHECK_FAILED: &str = "PRIMARY_CHECK_FAILED";
pub const INITIAL_SCREENING_FAILED: &str = "INITIAL_SCREENING_FAILED";
pub const ADAPTER_ERROR: &str = "ADAPTER_ERROR";
pub const ADAPTER_NOT_FOUND: &str = "ADAPTER_NOT_FOUND";
pub const SEND_ERROR: &str = "SEND_ERROR";

/// Whether a failed submission carrying `code` may succeed if sent again.
pub fn is_retryable(code: &str) -> bool {
    matches!(code, ADAPTER_ERROR | SEND_ERROR)
}
