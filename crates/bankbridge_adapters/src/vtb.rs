//! Simulated VTB integration.

use std::time::Duration;

use async_trait::async_trait;
use bankbridge_contract::{
    error_codes, ApplicationEnvelope, ApplicationStatus, ApplicationType, BankInfo, BankResponse,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapter::{AdapterError, BankAdapter};
use crate::client::ClientSections;
use crate::sandbox::{self, ApprovalTerms, Ledger, SandboxProfile};

pub const BANK_ID: &str = "vtb";

const STATUSES: &[&str] = &[
    "under_review",
    "approved",
    "declined",
    "additional_info_required",
];

#[derive(Debug)]
pub struct VtbSandbox {
    info: BankInfo,
    profile: SandboxProfile,
    ledger: Ledger,
}

impl VtbSandbox {
    pub fn new() -> Self {
        Self::with_profile(Self::default_profile())
    }

    pub fn default_profile() -> SandboxProfile {
        SandboxProfile {
            active: true,
            acceptance_rate: 0.75,
            submit_latency: Duration::from_millis(150),
            status_latency: Duration::from_millis(75),
            timeout: Duration::from_secs(45),
            strict_status_lookup: false,
        }
    }

    pub fn with_profile(profile: SandboxProfile) -> Self {
        Self {
            info: BankInfo {
                id: BANK_ID.to_string(),
                name: "VTB".to_string(),
                code: "VTB".to_string(),
                api_endpoint: "https://api.vtb.ru/sandbox".to_string(),
                is_active: profile.active,
                supported_types: vec![ApplicationType::Credit, ApplicationType::Guarantee],
                max_amount: 30_000_000.0,
                min_amount: 50_000.0,
                processing_time: "2-5 business days".to_string(),
            },
            ledger: Ledger::for_profile(&profile),
            profile,
        }
    }

    fn screening_result(&self) -> BankResponse {
        let application_id = self.ledger.issue(&self.info.code);
        let (success, status, message, error_code) = if self.profile.draw_acceptance() {
            (true, "accepted", "Application accepted for consideration", None)
        } else {
            (
                false,
                "rejected",
                "Application did not pass initial screening",
                Some(error_codes::INITIAL_SCREENING_FAILED.to_string()),
            )
        };

        BankResponse {
            success,
            application_id,
            bank_id: BANK_ID.to_string(),
            status: status.to_string(),
            message: message.to_string(),
            error_code,
            timestamp: Utc::now(),
        }
    }

    fn status_for(&self, application_id: &str) -> ApplicationStatus {
        let status = sandbox::pick(STATUSES);
        let (decision, terms, message) = match status {
            "approved" => (
                Some("approved"),
                Some(ApprovalTerms::draw(500_000.0..3_500_000.0, 11.9..15.9, 6..54)),
                "Approved, a manager will contact you within 24 hours",
            ),
            "declined" => (Some("declined"), None, "Declined after credit analysis"),
            "under_review" => (None, None, "Under review by the credit committee"),
            _ => (None, None, "Additional documents must be provided"),
        };

        ApplicationStatus {
            application_id: application_id.to_string(),
            bank_id: BANK_ID.to_string(),
            status: status.to_string(),
            decision: decision.map(str::to_string),
            amount: terms.as_ref().map(|t| t.amount),
            rate: terms.as_ref().map(|t| t.rate),
            term_months: terms.as_ref().map(|t| t.term_months),
            message: message.to_string(),
            updated_at: Utc::now(),
        }
    }
}

impl Default for VtbSandbox {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BankAdapter for VtbSandbox {
    fn bank_info(&self) -> &BankInfo {
        &self.info
    }

    async fn send_application(
        &self,
        envelope: &ApplicationEnvelope,
    ) -> Result<BankResponse, AdapterError> {
        let response =
            sandbox::submit(&self.info, &self.profile, envelope, || self.screening_result()).await;
        Ok(response)
    }

    async fn application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, AdapterError> {
        sandbox::look_up(&self.profile, &self.ledger, application_id, || {
            self.status_for(application_id)
        })
        .await
    }

    fn transform(&self, envelope: &ApplicationEnvelope) -> Value {
        let client = ClientSections::new(&envelope.client_data);
        json!({
            "request_id": envelope.id,
            "product": envelope.application_type.as_str(),
            "amount": envelope.amount,
            "currency": "RUB",
            "applicant": {
                "personal_info": {
                    "last_name": client.identity("lastName"),
                    "first_name": client.identity("firstName"),
                    "middle_name": client.identity("middleName"),
                    "date_of_birth": client.identity("birthDate"),
                    "place_of_birth": client.identity("birthPlace"),
                    "sex": client.identity("gender"),
                    "nationality": client.identity("citizenship"),
                },
                "contact_info": {
                    "mobile_phone": client.contact("primaryPhone"),
                    "email_address": client.contact("email"),
                    "registered_address": client.contact("registrationAddress"),
                },
                "employment_info": {
                    "company_name": client.employment("companyName"),
                    "job_title": client.employment("position"),
                    "salary": client.employment("monthlyIncome"),
                },
            },
            "attachments": envelope.files,
            "scoring_result": envelope.scoring,
        })
    }

    fn call_timeout(&self) -> Option<Duration> {
        Some(self.profile.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankbridge_contract::FileDescriptor;

    fn guarantee(amount: f64) -> ApplicationEnvelope {
        ApplicationEnvelope::new(
            "test_456",
            "guarantee",
            amount,
            json!({ "firstName": "Petr", "lastName": "Petrov" }),
        )
    }

    #[test]
    fn descriptor_differs_from_sberbank() {
        let info = VtbSandbox::new().bank_info().clone();
        assert_eq!(info.id, "vtb");
        assert_eq!(info.min_amount, 50_000.0);
        assert_eq!(info.max_amount, 30_000_000.0);
        assert!(info.max_amount > info.min_amount);
    }

    #[tokio::test]
    async fn accepted_submission() {
        let adapter = VtbSandbox::with_profile(SandboxProfile::deterministic(true));
        let response = adapter.send_application(&guarantee(500_000.0)).await.expect("send");

        assert!(response.success);
        assert_eq!(response.bank_id, "vtb");
        assert_eq!(response.status, "accepted");
        assert!(response.application_id.starts_with("VTB_"));
    }

    #[tokio::test]
    async fn rejected_submission_reports_screening() {
        let adapter = VtbSandbox::with_profile(SandboxProfile::deterministic(false));
        let response = adapter.send_application(&guarantee(500_000.0)).await.expect("send");

        assert!(!response.success);
        assert_eq!(response.status, "rejected");
        assert_eq!(
            response.error_code.as_deref(),
            Some(error_codes::INITIAL_SCREENING_FAILED)
        );
    }

    #[tokio::test]
    async fn amount_above_limit_fails_validation() {
        let adapter = VtbSandbox::with_profile(SandboxProfile::deterministic(true));
        let response = adapter
            .send_application(&guarantee(40_000_000.0))
            .await
            .expect("send");

        assert!(!response.success);
        assert_eq!(response.bank_id, "vtb");
        assert_eq!(
            response.error_code.as_deref(),
            Some(error_codes::VALIDATION_ERROR)
        );
    }

    #[tokio::test]
    async fn guarantee_rejected_when_only_credit_is_offered() {
        let mut adapter = VtbSandbox::with_profile(SandboxProfile::deterministic(true));
        adapter.info.supported_types = vec![ApplicationType::Credit];

        let response = adapter.send_application(&guarantee(500_000.0)).await.expect("send");
        assert!(!response.success);
        assert_eq!(response.status, bankbridge_contract::STATUS_FAILED);
        assert_eq!(
            response.error_code.as_deref(),
            Some(error_codes::VALIDATION_ERROR)
        );
    }

    #[tokio::test]
    async fn status_uses_vtb_vocabulary() {
        let adapter = VtbSandbox::with_profile(SandboxProfile::deterministic(true));
        for _ in 0..40 {
            let status = adapter.application_status("test_456").await.expect("status");
            assert_eq!(status.bank_id, "vtb");
            assert!(STATUSES.contains(&status.status.as_str()));
            assert_eq!(status.is_approved(), status.status == "approved");
            if let Some(term) = status.term_months {
                assert!((6..54).contains(&term));
            }
        }
    }

    #[test]
    fn transform_uses_vtb_field_names_and_keeps_files() {
        let adapter = VtbSandbox::new();
        let file = FileDescriptor {
            id: "f1".to_string(),
            name: "statement.pdf".to_string(),
            file_type: "bank_statement".to_string(),
            size: 2,
            content: vec![0xde, 0xad],
            mime_type: "application/pdf".to_string(),
        };
        let envelope = ApplicationEnvelope::new(
            "app-3",
            "credit",
            900_000.0,
            json!({
                "identity": { "lastName": "Petrov" },
                "contact": { "primaryPhone": "+7 911 111-11-11" },
                "employment": { "position": "accountant" }
            }),
        )
        .with_files(vec![file]);

        let wire = adapter.transform(&envelope);
        assert_eq!(wire["request_id"], json!("app-3"));
        assert_eq!(wire["product"], json!("credit"));
        assert_eq!(wire["applicant"]["personal_info"]["last_name"], json!("Petrov"));
        assert_eq!(
            wire["applicant"]["contact_info"]["mobile_phone"],
            json!("+7 911 111-11-11")
        );
        assert_eq!(wire["applicant"]["employment_info"]["job_title"], json!("accountant"));
        assert_eq!(wire["applicant"]["employment_info"]["company_name"], Value::Null);
        assert_eq!(wire["attachments"][0]["name"], json!("statement.pdf"));
        assert_eq!(wire["attachments"][0]["content"], json!("3q0="));
        assert_eq!(wire["scoring_result"], Value::Null);
    }
}
