use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::envelope::ApplicationType;
use crate::error_codes;

/// Status reported on responses built locally rather than by a provider.
pub const STATUS_FAILED: &str = "failed";

/// Static description of one provider and its operating limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankInfo {
    pub id: String,
    pub name: String,
    pub code: String,
    pub api_endpoint: String,
    pub is_active: bool,
    pub supported_types: Vec<ApplicationType>,
    pub max_amount: f64,
    pub min_amount: f64,
    pub processing_time: String,
}

impl BankInfo {
    pub fn supports(&self, application_type: &ApplicationType) -> bool {
        self.supported_types.contains(application_type)
    }
}

/// Outcome of one submission attempt to one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankResponse {
    pub success: bool,
    #[serde(default)]
    pub application_id: String,
    pub bank_id: String,
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl BankResponse {
    /// A failure produced by the dispatch layer itself, stamped with the
    /// current time.
    pub fn failure(
        bank_id: impl Into<String>,
        error_code: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            application_id: String::new(),
            bank_id: bank_id.into(),
            status: STATUS_FAILED.to_string(),
            message: message.into(),
            error_code: Some(error_code.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !self.success
            && self
                .error_code
                .as_deref()
                .is_some_and(error_codes::is_retryable)
    }
}

/// Provider-side state of a submitted application.
///
/// `status` uses the provider's own vocabulary; the approval terms are only
/// set when that status is an approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    pub application_id: String,
    pub bank_id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(rename = "term", default, skip_serializing_if = "Option::is_none")]
    pub term_months: Option<u32>,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationStatus {
    pub fn is_approved(&self) -> bool {
        self.amount.is_some()
    }
}
